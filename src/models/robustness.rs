//! Output types produced by the Robustness Evaluator.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissReason {
    ClosedDate,
    NoWindowToday,
    MissedLastEntry,
    ClosedRestOfDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeadlineKind {
    LastEntry,
    WindowEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PoiRiskStats {
    pub poi_id: String,
    pub miss_prob: f64,
    pub top_miss_reasons: Vec<MissReason>,
    pub wait_prob: f64,
    pub wait_p50_min: f64,
    pub wait_p90_min: f64,
    pub entry_slack_mean_min: f64,
    pub entry_slack_p10_min: f64,
    pub entry_slack_p50_min: f64,
    pub entry_slack_p90_min: f64,
    pub prob_slack_negative: f64,
    pub top_deadline_kinds: Vec<DeadlineKind>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct CompletionStats {
    pub completed_poi_mean: f64,
    pub completed_poi_p10: f64,
    pub completion_rate_mean: f64,
    pub completion_rate_p10: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuggestionType {
    ShiftEarlier,
    UpgradeTransit,
    ReorderAvoidWait,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OptimizationSuggestion {
    pub suggestion_type: SuggestionType,
    pub poi_id: String,
    pub shift_min: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RobustnessReport {
    pub on_time_prob: f64,
    pub overtime_p90_min: f64,
    pub hp_end_p10: f64,
    pub cost_p90: f64,
    pub time_window_miss_prob: f64,
    pub window_wait_prob: f64,
    pub per_poi: Vec<PoiRiskStats>,
    pub completion: CompletionStats,
    pub risk_level: RiskLevel,
    pub suggestions: Vec<OptimizationSuggestion>,
    pub samples: u32,
    pub seed: u32,
}
