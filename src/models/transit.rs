//! Transit segment data, the cost model's per-edge input.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransitMode {
    Walk,
    Bus,
    Subway,
    Taxi,
    Train,
    Ferry,
}

/// A single leg of travel between two stops.
///
/// Any field left `None` means "unknown"; the cost model and robustness evaluator fill in
/// defaults rather than treating an unknown value as zero.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransitSegment {
    pub mode: TransitMode,
    pub duration_min: f64,
    #[serde(default)]
    pub walk_min: f64,
    #[serde(default)]
    pub transfer_count: u32,
    pub stairs_count: Option<u32>,
    #[serde(default)]
    pub elevator_available: bool,
    #[serde(default)]
    pub wheelchair_accessible: bool,
    pub crowd_level: Option<u8>,
    /// 0..1, how trustworthy the `duration_min` estimate is. Used to derive a Monte Carlo std.
    pub reliability: Option<f64>,
    #[serde(default)]
    pub cost_cny: f64,
}

impl TransitSegment {
    /// A same-spot, zero-cost, zero-duration segment (e.g. chained stops at one location).
    pub fn immediate() -> Self {
        TransitSegment {
            mode: TransitMode::Walk,
            duration_min: 0.0,
            walk_min: 0.0,
            transfer_count: 0,
            stairs_count: None,
            elevator_available: true,
            wheelchair_accessible: true,
            crowd_level: None,
            reliability: Some(1.0),
            cost_cny: 0.0,
        }
    }

    pub fn has_impassable_stairs(&self) -> bool {
        matches!(self.stairs_count, Some(n) if n > 0) && !self.elevator_available
    }
}
