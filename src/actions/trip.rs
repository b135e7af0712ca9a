//! `trip.*` actions, wrapping the [`crate::collaborators::TripStore`] collaborator.

use super::{Action, ActionCost, ActionMetadata, ActionRuntimeKind, SideEffect};
use crate::collaborators::trip_store::TripEdit;
use crate::collaborators::TripStore;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

pub struct TripLoadDraft {
    pub store: Arc<dyn TripStore>,
}

#[async_trait]
impl Action for TripLoadDraft {
    fn name(&self) -> &'static str {
        "trip.load_draft"
    }

    fn description(&self) -> &'static str {
        "Load a trip draft and its planned items from the trip store."
    }

    fn metadata(&self) -> ActionMetadata {
        ActionMetadata {
            kind: ActionRuntimeKind::Internal,
            cost: ActionCost::Low,
            side_effect: SideEffect::None,
            preconditions: &[],
            idempotent: true,
            cacheable: false,
        }
    }

    async fn run(&self, input: Value) -> Result<Value, String> {
        #[derive(Deserialize)]
        struct In {
            trip_id: String,
        }
        let In { trip_id } = serde_json::from_value(input).map_err(|e| e.to_string())?;
        match self.store.load_draft(&trip_id).await {
            Some(draft) => Ok(serde_json::json!({ "trip": trip_id, "items": draft.items })),
            None => Err(format!("unknown trip id: {trip_id}")),
        }
    }
}

pub struct TripApplyUserEdit {
    pub store: Arc<dyn TripStore>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireEdit {
    Delete { item_id: String },
    Update { item_id: String, stop: crate::models::schedule::PlannedStop },
    Move { item_id: String, new_start_min: u32 },
}

impl From<WireEdit> for TripEdit {
    fn from(edit: WireEdit) -> Self {
        match edit {
            WireEdit::Delete { item_id } => TripEdit::Delete { item_id },
            WireEdit::Update { item_id, stop } => TripEdit::Update { item_id, stop },
            WireEdit::Move { item_id, new_start_min } => TripEdit::Move { item_id, new_start_min },
        }
    }
}

#[async_trait]
impl Action for TripApplyUserEdit {
    fn name(&self) -> &'static str {
        "trip.apply_user_edit"
    }

    fn description(&self) -> &'static str {
        "Apply a batch of delete/update/move edits to a trip draft."
    }

    fn metadata(&self) -> ActionMetadata {
        ActionMetadata {
            kind: ActionRuntimeKind::Internal,
            cost: ActionCost::Low,
            side_effect: SideEffect::WritesDb,
            preconditions: &["trip.exists"],
            idempotent: false,
            cacheable: false,
        }
    }

    async fn run(&self, input: Value) -> Result<Value, String> {
        #[derive(Deserialize)]
        struct In {
            trip_id: String,
            edits: Vec<WireEdit>,
        }
        let In { trip_id, edits } = serde_json::from_value(input).map_err(|e| e.to_string())?;
        let edits: Vec<TripEdit> = edits.into_iter().map(TripEdit::from).collect();
        match self.store.apply_edits(&trip_id, edits).await {
            Ok(draft) => Ok(serde_json::json!({ "success": true, "results": draft.items })),
            Err(e) => Err(e),
        }
    }
}

pub struct TripPersistPlan {
    pub store: Arc<dyn TripStore>,
}

#[async_trait]
impl Action for TripPersistPlan {
    fn name(&self) -> &'static str {
        "trip.persist_plan"
    }

    fn description(&self) -> &'static str {
        "Persist a finalized stop timeline for a trip."
    }

    fn metadata(&self) -> ActionMetadata {
        ActionMetadata {
            kind: ActionRuntimeKind::Internal,
            cost: ActionCost::Low,
            side_effect: SideEffect::WritesDb,
            preconditions: &[],
            idempotent: true,
            cacheable: false,
        }
    }

    async fn run(&self, input: Value) -> Result<Value, String> {
        #[derive(Deserialize)]
        struct In {
            trip_id: String,
            timeline: Vec<crate::models::schedule::PlannedStop>,
        }
        let In { trip_id, timeline } = serde_json::from_value(input).map_err(|e| e.to_string())?;
        self.store.persist_plan(&trip_id, timeline).await?;
        Ok(serde_json::json!({ "success": true }))
    }
}
