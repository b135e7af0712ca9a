//! Output types produced by the What-If Engine and Replanner.

use crate::models::robustness::RobustnessReport;
use crate::models::schedule::DaySchedule;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    ShiftEarlier,
    ReorderAvoidWait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema)]
pub struct DeltaSummary {
    pub miss_delta_pp: f64,
    pub wait_delta_pp: f64,
    pub completion_p10_delta_pp: f64,
    pub on_time_delta_pp: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema)]
pub struct ImpactCost {
    pub total_shift_min: f64,
    pub moved_stop_count: u32,
    pub order_changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WhatIfCandidate {
    pub candidate_id: String,
    pub action: ActionKind,
    pub target_poi_id: String,
    pub schedule: DaySchedule,
    pub report: RobustnessReport,
    pub delta: DeltaSummary,
    pub impact: ImpactCost,
    pub severity: Severity,
    pub confidence: Confidence,
    pub explain_top_drivers: Vec<String>,
    pub warnings: Vec<String>,
    pub seed: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WhatIfReport {
    pub base_schedule: DaySchedule,
    pub base_report: RobustnessReport,
    pub candidates: Vec<WhatIfCandidate>,
    pub winner_candidate_id: Option<String>,
    pub risk_warning: Option<String>,
    pub base_samples: u32,
    pub candidate_samples: u32,
    pub base_seed: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplanEventKind {
    #[default]
    WeatherChanged,
    PoiClosed,
    CrowdSpike,
    TrafficDisruption,
    UserEdit,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ReplanEvent {
    pub kind: ReplanEventKind,
    #[serde(default)]
    pub is_raining: bool,
    pub poi_id: Option<String>,
    pub effective_from_min: Option<u32>,
    /// 1 (minor) .. 3 (severe); used by `TRAFFIC_DISRUPTION`.
    pub severity: Option<u8>,
    #[serde(default)]
    pub removed_stop_ids: Vec<String>,
    #[serde(default)]
    pub pinned_poi_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct ChangeBudget {
    pub max_change_count: u32,
    pub max_time_shift_min: f64,
    pub allow_add_new_poi: bool,
    pub allow_remove_must_see: bool,
}

impl Default for ChangeBudget {
    fn default() -> Self {
        ChangeBudget {
            max_change_count: 3,
            max_time_shift_min: 60.0,
            allow_add_new_poi: false,
            allow_remove_must_see: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiffKind {
    Kept,
    Removed,
    Added,
    Moved,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StopDiff {
    pub poi_id: String,
    pub diff: DiffKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReplanResult {
    pub schedule: DaySchedule,
    pub frozen_count: usize,
    pub diffs: Vec<StopDiff>,
    pub change_count: u32,
    pub explanation: String,
}
