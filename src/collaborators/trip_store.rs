//! `TripStore` collaborator interface, mirroring the `trip.*` actions.

use crate::models::schedule::PlannedStop;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Clone, Default)]
pub struct TripDraft {
    pub trip_id: String,
    pub items: Vec<PlannedStop>,
}

#[derive(Debug, Clone)]
pub enum TripEdit {
    Delete { item_id: String },
    Update { item_id: String, stop: PlannedStop },
    Move { item_id: String, new_start_min: u32 },
}

#[async_trait]
pub trait TripStore: Send + Sync {
    async fn load_draft(&self, trip_id: &str) -> Option<TripDraft>;
    async fn apply_edits(&self, trip_id: &str, edits: Vec<TripEdit>) -> Result<TripDraft, String>;
    async fn persist_plan(&self, trip_id: &str, timeline: Vec<PlannedStop>) -> Result<(), String>;
}

/// In-memory trip store sufficient for integration tests.
#[derive(Default)]
pub struct InMemoryTripStore {
    trips: RwLock<HashMap<String, TripDraft>>,
}

impl InMemoryTripStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, draft: TripDraft) {
        self.trips
            .write()
            .expect("trip store lock poisoned")
            .insert(draft.trip_id.clone(), draft);
    }
}

#[async_trait]
impl TripStore for InMemoryTripStore {
    async fn load_draft(&self, trip_id: &str) -> Option<TripDraft> {
        self.trips
            .read()
            .expect("trip store lock poisoned")
            .get(trip_id)
            .cloned()
    }

    async fn apply_edits(&self, trip_id: &str, edits: Vec<TripEdit>) -> Result<TripDraft, String> {
        let mut guard = self.trips.write().expect("trip store lock poisoned");
        let draft = guard
            .get_mut(trip_id)
            .ok_or_else(|| format!("unknown trip id: {trip_id}"))?;
        for edit in edits {
            match edit {
                TripEdit::Delete { item_id } => draft.items.retain(|s| s.id != item_id),
                TripEdit::Update { item_id, stop } => {
                    if let Some(slot) = draft.items.iter_mut().find(|s| s.id == item_id) {
                        *slot = stop;
                    }
                }
                TripEdit::Move {
                    item_id,
                    new_start_min,
                } => {
                    if let Some(slot) = draft.items.iter_mut().find(|s| s.id == item_id) {
                        let duration = slot.duration_min();
                        slot.start_min = new_start_min;
                        slot.end_min = new_start_min + duration;
                    }
                }
            }
        }
        Ok(draft.clone())
    }

    async fn persist_plan(&self, trip_id: &str, timeline: Vec<PlannedStop>) -> Result<(), String> {
        let mut guard = self.trips.write().expect("trip store lock poisoned");
        let draft = guard
            .entry(trip_id.to_string())
            .or_insert_with(|| TripDraft {
                trip_id: trip_id.to_string(),
                items: vec![],
            });
        draft.items = timeline;
        Ok(())
    }
}
