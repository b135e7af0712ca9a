//! Pure edge/itinerary cost functions.

use crate::models::policy::Policy;
use crate::models::transit::{TransitMode, TransitSegment};

/// Cost of traversing a single transit segment under the active policy, in currency units.
///
/// Returns `f64::INFINITY` when the segment violates a hard constraint; callers filter those
/// out rather than treating infinity as a normal magnitude.
pub fn edge_cost(segment: &TransitSegment, policy: &Policy) -> f64 {
    if policy.hard_constraints.require_wheelchair_access && !segment.wheelchair_accessible {
        return f64::INFINITY;
    }
    if policy.hard_constraints.forbid_stairs && segment.has_impassable_stairs() {
        return f64::INFINITY;
    }
    if segment.transfer_count > policy.hard_constraints.max_transfers {
        return f64::INFINITY;
    }

    let w = &policy.soft_weights;
    let ctx = &policy.context;

    let time_cost = segment.duration_min * w.value_of_time_per_min;

    let rain_mult = if ctx.is_raining {
        w.rain_walk_multiplier
    } else {
        1.0
    };
    let walk_pain = segment.walk_min * w.walk_pain_per_min * rain_mult;

    let elderly_mult = if ctx.has_elderly {
        w.elderly_transfer_multiplier
    } else {
        1.0
    };
    let transfer_cost = segment.transfer_count as f64 * w.transfer_pain * elderly_mult;

    let stair_cost = match segment.stairs_count {
        Some(n) if n > 0 => w.stair_pain,
        _ => 0.0,
    };

    let crowd_cost = segment.crowd_level.unwrap_or(0) as f64 * 2.0 * w.crowd_pain_per_min;

    let luggage_cost = if (ctx.has_luggage || ctx.is_moving_day)
        && matches!(segment.mode, TransitMode::Bus | TransitMode::Subway)
    {
        w.luggage_transit_penalty
    } else {
        0.0
    };

    time_cost + walk_pain + transfer_cost + stair_cost + crowd_cost + luggage_cost + segment.cost_cny
}

/// Totals accumulated over a full day, fed into [`itinerary_cost`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ItineraryTotals {
    pub edge_cost_sum: f64,
    pub overtime_min: f64,
    pub plan_change_count: u32,
}

/// Cost of a complete itinerary: the sum of its edge costs plus overtime and plan-change
/// penalties.
pub fn itinerary_cost(totals: ItineraryTotals, policy: &Policy) -> f64 {
    if totals.edge_cost_sum.is_infinite() {
        return f64::INFINITY;
    }
    let w = &policy.soft_weights;
    totals.edge_cost_sum
        + totals.overtime_min * w.overtime_penalty_per_min
        + totals.plan_change_count as f64 * w.plan_change_penalty
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::policy::test_support::default_policy;

    fn segment() -> TransitSegment {
        TransitSegment {
            mode: TransitMode::Walk,
            duration_min: 10.0,
            walk_min: 10.0,
            transfer_count: 0,
            stairs_count: None,
            elevator_available: true,
            wheelchair_accessible: true,
            crowd_level: None,
            reliability: Some(0.9),
            cost_cny: 0.0,
        }
    }

    #[test]
    fn wheelchair_violation_is_infinite() {
        let mut policy = default_policy();
        policy.hard_constraints.require_wheelchair_access = true;
        let mut seg = segment();
        seg.wheelchair_accessible = false;
        assert!(edge_cost(&seg, &policy).is_infinite());
    }

    #[test]
    fn ordinary_segment_is_finite_and_positive() {
        let policy = default_policy();
        let cost = edge_cost(&segment(), &policy);
        assert!(cost.is_finite() && cost > 0.0);
    }

    #[test]
    fn stairs_forbidden_without_elevator_is_infinite() {
        let mut policy = default_policy();
        policy.hard_constraints.forbid_stairs = true;
        let mut seg = segment();
        seg.stairs_count = Some(3);
        seg.elevator_available = false;
        assert!(edge_cost(&seg, &policy).is_infinite());
    }
}
