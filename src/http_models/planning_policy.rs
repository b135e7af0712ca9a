//! Wire DTOs for the `/api/planning-policy/*` endpoints.
//!
//! Most endpoints pass core planning types (`Policy`, `Poi`, `DaySchedule`, ...) straight
//! through, since those types are already `Serialize`/`Deserialize`/`ToSchema`. This module
//! only adds the request envelopes and the small number of response shapes that don't
//! correspond to an existing core type.

use crate::collaborators::transit_query::GeoPoint;
use crate::models::poi::{DateContext, Poi};
use crate::models::policy::{Context, Policy, Traveler, TripType};
use crate::models::robustness::OptimizationSuggestion;
use crate::models::rest_stop::RestStop;
use crate::models::schedule::DaySchedule;
use crate::models::whatif::{ChangeBudget, ReplanEvent, WhatIfReport};
use crate::planning::robustness::EvaluationConfig;
use crate::planning::whatif::WhatIfBudget;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

/// Exactly one of `pois` or `place_ids` must be present: an inline POI catalog, or a set of ids
/// to resolve through the [`crate::collaborators::PlacesClient`] collaborator.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PoiSource {
    pub pois: Option<HashMap<String, Poi>>,
    pub place_ids: Option<Vec<String>>,
}

impl PoiSource {
    pub fn validate(&self) -> Result<(), String> {
        match (&self.pois, &self.place_ids) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            (Some(_), Some(_)) => Err("exactly one of `pois` or `place_ids` is allowed, not both".into()),
            (None, None) => Err("one of `pois` or `place_ids` is required".into()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CompilePolicyRequest {
    pub travelers: Vec<Traveler>,
    #[serde(default)]
    pub context: Context,
    pub trip_type: TripType,
    pub budget_per_person_per_day: Option<f64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CompilePolicyResponse {
    pub policy: Policy,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ScheduleDayRequest {
    pub policy: Policy,
    pub date_ctx: DateContext,
    pub start_min: u32,
    pub end_min: u32,
    pub start_location: GeoPoint,
    pub pois: Vec<Poi>,
    #[serde(default)]
    pub rest_stops: Vec<RestStop>,
    #[serde(default)]
    pub must_see_poi_ids: Vec<String>,
    #[serde(default = "default_buffer_min")]
    pub buffer_min: u32,
    pub initial_hp: Option<f64>,
}

fn default_buffer_min() -> u32 {
    10
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScheduleDayResponse {
    pub schedule: DaySchedule,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EvaluationConfigRequest {
    pub samples: Option<u32>,
    pub seed: Option<u32>,
    pub on_time_slack_min: Option<f64>,
}

impl EvaluationConfigRequest {
    pub fn resolve(&self) -> EvaluationConfig {
        let default = EvaluationConfig::default();
        let samples = self
            .samples
            .unwrap_or(default.samples)
            .min(crate::global::PLANNING_MAX_SAMPLE_BUDGET);
        EvaluationConfig {
            samples,
            seed: self.seed.unwrap_or(default.seed),
            on_time_slack_min: self.on_time_slack_min.unwrap_or(default.on_time_slack_min),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EvaluateDayRequest {
    pub policy: Policy,
    pub schedule: DaySchedule,
    pub day_end_min: u32,
    pub date_ctx: DateContext,
    #[serde(flatten)]
    pub poi_source: PoiSource,
    #[serde(default)]
    pub config: Option<EvaluationConfigRequest>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WhatIfBudgetRequest {
    pub base_samples: Option<u32>,
    pub candidate_samples: Option<u32>,
    pub confirm_samples: Option<u32>,
}

impl WhatIfBudgetRequest {
    pub fn resolve(&self) -> WhatIfBudget {
        let default = WhatIfBudget::default();
        let cap = crate::global::PLANNING_MAX_SAMPLE_BUDGET;
        WhatIfBudget {
            base_samples: self.base_samples.unwrap_or(default.base_samples).min(cap),
            candidate_samples: self.candidate_samples.unwrap_or(default.candidate_samples).min(cap),
            confirm_samples: self.confirm_samples.unwrap_or(default.confirm_samples).min(cap),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WhatIfEvaluateRequest {
    pub policy: Policy,
    pub base_schedule: DaySchedule,
    pub day_end_min: u32,
    pub date_ctx: DateContext,
    #[serde(flatten)]
    pub poi_source: PoiSource,
    pub suggestions: Vec<OptimizationSuggestion>,
    pub base_seed: u32,
    #[serde(default)]
    pub budget: Option<WhatIfBudgetRequest>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WhatIfEvaluateResponse {
    #[serde(flatten)]
    pub report: WhatIfReport,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WhatIfApplyRequest {
    pub trip_id: String,
    pub report: WhatIfReport,
    pub candidate_id: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WhatIfApplyResponse {
    pub success: bool,
    pub schedule: DaySchedule,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WhatIfCandidatesResponse {
    pub candidates: Vec<crate::models::whatif::WhatIfCandidate>,
    pub winner_candidate_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RiskWarningRequest {
    pub report: WhatIfReport,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RiskWarningResponse {
    pub winner_candidate_id: Option<String>,
    pub risk_warning: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SeedForCandidateResponse {
    pub seed: u32,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReplanRequestBody {
    pub policy: Policy,
    pub now_min: u32,
    pub current_location: GeoPoint,
    pub previous_schedule: DaySchedule,
    pub fresh_pois: Vec<Poi>,
    #[serde(default)]
    pub rest_stops: Vec<RestStop>,
    pub event: ReplanEvent,
    #[serde(default)]
    pub pinned_poi_ids: Vec<String>,
    #[serde(default)]
    pub change_budget: Option<ChangeBudget>,
    pub date_ctx: DateContext,
    pub day_end_min: u32,
    pub lock_window_min: Option<u32>,
}
