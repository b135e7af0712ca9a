//! Planning policy: the compiled output of the Policy Compiler.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum MobilityTier {
    IronLegs,
    CityPotato,
    ActiveSenior,
    Limited,
}

impl MobilityTier {
    /// Rank used by the weakest-link rule: higher rank wins.
    pub fn rank(self) -> u8 {
        match self {
            MobilityTier::IronLegs => 1,
            MobilityTier::CityPotato => 2,
            MobilityTier::ActiveSenior => 3,
            MobilityTier::Limited => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum InterestTier {
    Adult,
    Elderly,
    Child,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TripType {
    Business,
    Leisure,
    Family,
    Backpacking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PlanStability {
    Low,
    Medium,
    High,
}

/// One member of the traveling group.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Traveler {
    pub mobility: MobilityTier,
    pub interest: InterestTier,
    #[serde(default = "Traveler::default_weight")]
    pub weight: f64,
}

impl Traveler {
    fn default_weight() -> f64 {
        1.0
    }
}

/// Situational context supplied by the caller for a single planning call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema)]
pub struct Context {
    #[serde(default)]
    pub has_luggage: bool,
    #[serde(default)]
    pub has_elderly: bool,
    #[serde(default)]
    pub is_raining: bool,
    #[serde(default)]
    pub has_limited_mobility: bool,
    #[serde(default)]
    pub is_moving_day: bool,
    pub budget_sensitivity: Option<Sensitivity>,
    pub time_sensitivity: Option<Sensitivity>,
    pub risk_tolerance: Option<RiskTolerance>,
    pub plan_stability: Option<PlanStability>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct Pacing {
    pub hp_max: f64,
    /// Fraction of `hp_max` regenerated per hour of rest.
    pub regen_rate_per_hour: f64,
    pub walk_speed_multiplier: f64,
    pub stair_penalty: f64,
    pub forced_rest_interval_min: f64,
    pub forbid_stairs: bool,
    pub wheelchair_only: bool,
    pub continuous_walk_cap_min: f64,
    pub daily_walk_cap_min: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct HardConstraints {
    pub require_wheelchair_access: bool,
    pub forbid_stairs: bool,
    pub max_transfers: u32,
    pub max_single_walk_min: f64,
    pub max_daily_walk_min: f64,
    pub restroom_interval_min: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SoftWeights {
    pub tag_affinity: HashMap<String, f64>,
    pub diversity_penalty: f64,
    pub must_see_boost: f64,
    /// Currency units per minute.
    pub value_of_time_per_min: f64,
    pub walk_pain_per_min: f64,
    pub transfer_pain: f64,
    pub stair_pain: f64,
    pub crowd_pain_per_min: f64,
    pub rain_walk_multiplier: f64,
    pub luggage_transit_penalty: f64,
    pub elderly_transfer_multiplier: f64,
    pub plan_change_penalty: f64,
    pub overtime_penalty_per_min: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct Derived {
    pub group_mobility_worst: MobilityTier,
    /// Fractions over [`InterestTier`], summing to 1.
    pub interest_mix_adult: f64,
    pub interest_mix_elderly: f64,
    pub interest_mix_child: f64,
}

/// The full compiled planning policy: the single object every downstream component consumes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Policy {
    pub pacing: Pacing,
    pub hard_constraints: HardConstraints,
    pub soft_weights: SoftWeights,
    pub context: Context,
    pub derived: Derived,
}
