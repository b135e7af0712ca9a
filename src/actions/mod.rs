//! Action/Agent boundary: a thin dispatcher mapping string action names onto small,
//! independently testable executors. The registry itself contains no business logic, only
//! dispatch.

mod policy;
mod trip;
mod external;

pub use external::{PlacesGetPoiFacts, PlacesResolveEntities, TransportBuildTimeMatrix, WebbrowseBrowse};
pub use policy::{PolicyScoreRobustness, PolicyValidateFeasibility};
pub use trip::{TripApplyUserEdit, TripLoadDraft, TripPersistPlan};

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionRuntimeKind {
    Internal,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCost {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    None,
    WritesDb,
    CallsApi,
    ChargesMoney,
}

/// Metadata a planner (human or agent) needs before invoking an action, without running it.
#[derive(Debug, Clone, Copy)]
pub struct ActionMetadata {
    pub kind: ActionRuntimeKind,
    pub cost: ActionCost,
    pub side_effect: SideEffect,
    pub preconditions: &'static [&'static str],
    pub idempotent: bool,
    pub cacheable: bool,
}

/// A single named action: JSON in, JSON out, plus the metadata the registry exposes alongside
/// it. Each implementor is independently testable without the registry.
#[async_trait]
pub trait Action: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn metadata(&self) -> ActionMetadata;
    async fn run(&self, input: Value) -> Result<Value, String>;
}

/// Dispatch-only registry: looks a name up and forwards the call, nothing more.
#[derive(Default)]
pub struct ActionRegistry {
    actions: HashMap<&'static str, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        ActionRegistry { actions: HashMap::new() }
    }

    pub fn register(&mut self, action: Arc<dyn Action>) {
        self.actions.insert(action.name(), action);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.actions.keys().copied().collect()
    }

    pub async fn dispatch(&self, name: &str, input: Value) -> Result<Value, String> {
        let action = self.get(name).ok_or_else(|| format!("unknown action: {name}"))?;
        action.run(input).await
    }
}
