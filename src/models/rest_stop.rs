//! Rest-stop candidates consumed by the Day Scheduler's forced-rest logic.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RestStop {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// 0..10 subjective comfort rating.
    pub comfort_score: f64,
    #[serde(default)]
    pub has_restroom: bool,
    #[serde(default)]
    pub has_seating: bool,
    #[serde(default)]
    pub is_indoor: bool,
    #[serde(default)]
    pub is_cafe_or_mall: bool,
    #[serde(default)]
    pub wheelchair_reachable: bool,
    /// Extra HP granted on top of the policy's standard regen rate.
    #[serde(default)]
    pub regen_bonus_hp: f64,
    pub recommended_rest_min: f64,
}
