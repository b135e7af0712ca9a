//! Domain data model shared across the planning core.

pub mod poi;
pub mod policy;
pub mod rest_stop;
pub mod robustness;
pub mod schedule;
pub mod transit;
pub mod whatif;

pub use poi::{DateContext, OpeningHours, OpeningWindow, Poi};
pub use policy::{
    Context, Derived, HardConstraints, InterestTier, MobilityTier, Pacing, PlanStability, Policy,
    RiskTolerance, Sensitivity, SoftWeights, Traveler, TripType,
};
pub use rest_stop::RestStop;
pub use schedule::{DayMetrics, DaySchedule, HpState, PlannedStop, StopKind};
pub use transit::{TransitMode, TransitSegment};
