//! Stamina accounting: fatigue accrual and rest recovery.

use crate::models::policy::{MobilityTier, Policy};
use crate::models::schedule::HpState;

struct FatigueRates {
    walk_hp_per_min: f64,
    stand_hp_per_min: f64,
    stairs_hp_per_unit: f64,
}

fn fatigue_rates(tier: MobilityTier) -> FatigueRates {
    match tier {
        MobilityTier::IronLegs => FatigueRates {
            walk_hp_per_min: 0.25,
            stand_hp_per_min: 0.12,
            stairs_hp_per_unit: 0.5,
        },
        MobilityTier::CityPotato => FatigueRates {
            walk_hp_per_min: 0.40,
            stand_hp_per_min: 0.18,
            stairs_hp_per_unit: 0.9,
        },
        MobilityTier::ActiveSenior => FatigueRates {
            walk_hp_per_min: 0.55,
            stand_hp_per_min: 0.25,
            stairs_hp_per_unit: 999.0,
        },
        MobilityTier::Limited => FatigueRates {
            walk_hp_per_min: 0.70,
            stand_hp_per_min: 0.32,
            stairs_hp_per_unit: 999.0,
        },
    }
}

fn rest_threshold(tier: MobilityTier) -> f64 {
    if tier == MobilityTier::IronLegs { 18.0 } else { 22.0 }
}

/// Inputs describing a single travel leg, for [`apply_travel_fatigue`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TravelLoad {
    pub walk_min: f64,
    pub stairs_count: u32,
    pub queue_min: f64,
}

/// Deduct fatigue for a travel leg (walking, stair climbing, standing in queue) from `state`.
pub fn apply_travel_fatigue(policy: &Policy, state: &mut HpState, load: TravelLoad, now_min: f64) {
    let rates = fatigue_rates(policy.derived.group_mobility_worst);
    let continuous_penalty = if load.walk_min > policy.pacing.continuous_walk_cap_min {
        1.25
    } else {
        1.0
    };
    let rain_penalty = if policy.context.is_raining { 1.15 } else { 1.0 };

    let walk_cost = load.walk_min * rates.walk_hp_per_min * continuous_penalty * rain_penalty;
    let stand_cost = load.queue_min * rates.stand_hp_per_min;
    let stair_cost = if load.stairs_count > 0 {
        load.stairs_count as f64 * rates.stairs_hp_per_unit
    } else {
        0.0
    };

    state.hp = (state.hp - walk_cost - stand_cost - stair_cost).max(0.0);
    state.last_break_at_min = now_min;
}

/// Restore HP after a rest stop of `rest_min` minutes, optionally boosted by `rest_benefit_hp`
/// (e.g. a particularly comfortable rest stop).
pub fn apply_rest_recovery(
    policy: &Policy,
    state: &mut HpState,
    rest_min: f64,
    now_min: f64,
    rest_benefit_hp: f64,
) {
    let regen = policy.pacing.hp_max * policy.pacing.regen_rate_per_hour * (rest_min / 60.0);
    state.hp = (state.hp + regen + rest_benefit_hp).min(policy.pacing.hp_max);
    state.last_rest_at_min = now_min;
    state.last_break_at_min = now_min;
}

/// Whether the traveler needs a forced rest at `now_min` given accumulated fatigue.
pub fn rest_needed(policy: &Policy, hp: f64, now_min: f64, state: &HpState) -> bool {
    let interval_elapsed = now_min - state.last_rest_at_min >= policy.pacing.forced_rest_interval_min;
    let low_hp = hp <= rest_threshold(policy.derived.group_mobility_worst);
    interval_elapsed || low_hp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::policy::test_support::default_policy;

    #[test]
    fn travel_fatigue_reduces_hp_and_clamps_at_zero() {
        let policy = default_policy();
        let mut state = HpState::fresh(policy.pacing.hp_max, 0.0);
        apply_travel_fatigue(
            &policy,
            &mut state,
            TravelLoad {
                walk_min: 10_000.0,
                stairs_count: 0,
                queue_min: 0.0,
            },
            0.0,
        );
        assert_eq!(state.hp, 0.0);
    }

    #[test]
    fn rest_recovery_clamps_at_hp_max() {
        let policy = default_policy();
        let mut state = HpState::fresh(policy.pacing.hp_max, 0.0);
        state.hp = 10.0;
        apply_rest_recovery(&policy, &mut state, 10_000.0, 100.0, 0.0);
        assert_eq!(state.hp, policy.pacing.hp_max);
    }

    #[test]
    fn rest_needed_triggers_on_interval() {
        let policy = default_policy();
        let state = HpState::fresh(policy.pacing.hp_max, 0.0);
        assert!(rest_needed(
            &policy,
            policy.pacing.hp_max,
            policy.pacing.forced_rest_interval_min + 1.0,
            &state
        ));
    }

    #[test]
    fn rest_needed_triggers_on_low_hp() {
        let policy = default_policy();
        let state = HpState::fresh(policy.pacing.hp_max, 0.0);
        assert!(rest_needed(&policy, 5.0, 1.0, &state));
    }
}
