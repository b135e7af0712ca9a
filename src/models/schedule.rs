//! The output of the Day Scheduler and Replanner: stops, metrics, HP state.

use crate::models::transit::TransitSegment;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum StopKind {
    Poi,
    Rest,
    Meal,
    Hotel,
    Transfer,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlannedStop {
    pub kind: StopKind,
    pub id: String,
    pub name: String,
    pub start_min: u32,
    pub end_min: u32,
    pub lat: f64,
    pub lng: f64,
    pub transit_in: Option<TransitSegment>,
    pub notes: Option<String>,
}

impl PlannedStop {
    pub fn duration_min(&self) -> u32 {
        self.end_min.saturating_sub(self.start_min)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema)]
pub struct DayMetrics {
    pub total_travel_min: f64,
    pub total_walk_min: f64,
    pub total_queue_min: f64,
    pub total_transfers: u32,
    pub overtime_min: f64,
    pub ending_hp: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DaySchedule {
    pub stops: Vec<PlannedStop>,
    pub metrics: DayMetrics,
}

impl DaySchedule {
    pub fn poi_ids(&self) -> Vec<&str> {
        self.stops
            .iter()
            .filter(|s| s.kind == StopKind::Poi)
            .map(|s| s.id.as_str())
            .collect()
    }

    /// Structural signature used by the What-If Engine's dedupe step.
    pub fn signature(&self) -> String {
        self.poi_ids().join(">")
    }
}

/// Mutable fatigue state threaded through the HP Simulator.
#[derive(Debug, Clone, Copy)]
pub struct HpState {
    pub hp: f64,
    pub last_rest_at_min: f64,
    pub last_break_at_min: f64,
}

impl HpState {
    pub fn fresh(hp_max: f64, start_min: f64) -> Self {
        HpState {
            hp: hp_max,
            last_rest_at_min: start_min,
            last_break_at_min: start_min,
        }
    }
}
