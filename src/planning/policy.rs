//! Policy Compiler: fuses travelers and context into a single scoring policy.

use crate::models::policy::{
    Context, Derived, HardConstraints, InterestTier, MobilityTier, Pacing, Policy, RiskTolerance,
    Sensitivity, SoftWeights, Traveler, TripType,
};
use std::collections::HashMap;

/// Per-mobility-tier pacing table. Index matches [`MobilityTier::rank`] - 1.
fn pacing_for_tier(tier: MobilityTier) -> Pacing {
    let (hp_max, regen, walk_cap_continuous, walk_cap_daily) = match tier {
        MobilityTier::IronLegs => (120.0, 0.45, 90.0, 480.0),
        MobilityTier::CityPotato => (100.0, 0.35, 60.0, 300.0),
        MobilityTier::ActiveSenior => (85.0, 0.30, 45.0, 210.0),
        MobilityTier::Limited => (70.0, 0.25, 30.0, 150.0),
    };
    Pacing {
        hp_max,
        regen_rate_per_hour: regen,
        walk_speed_multiplier: match tier {
            MobilityTier::IronLegs => 1.1,
            MobilityTier::CityPotato => 1.0,
            MobilityTier::ActiveSenior => 0.85,
            MobilityTier::Limited => 0.7,
        },
        stair_penalty: match tier {
            MobilityTier::IronLegs => 0.5,
            MobilityTier::CityPotato => 0.9,
            MobilityTier::ActiveSenior => 999.0,
            MobilityTier::Limited => 999.0,
        },
        forced_rest_interval_min: match tier {
            MobilityTier::IronLegs => 240.0,
            MobilityTier::CityPotato => 180.0,
            MobilityTier::ActiveSenior => 120.0,
            MobilityTier::Limited => 90.0,
        },
        forbid_stairs: matches!(tier, MobilityTier::ActiveSenior | MobilityTier::Limited),
        wheelchair_only: matches!(tier, MobilityTier::Limited),
        continuous_walk_cap_min: walk_cap_continuous,
        daily_walk_cap_min: walk_cap_daily,
    }
}

fn base_tag_affinity() -> HashMap<String, f64> {
    [
        ("museum", 0.5),
        ("culture", 0.5),
        ("nature", 0.5),
        ("shopping", 0.4),
        ("playground", 0.1),
        ("indoor", 0.3),
        ("wheelchair", 0.2),
        ("stairs", 0.0),
        ("photoSpot", 0.4),
        ("interactive", 0.3),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn apply_interest_boosts(affinity: &mut HashMap<String, f64>, interest: InterestTier, share: f64) {
    let boosts: &[(&str, f64)] = match interest {
        InterestTier::Child => &[("playground", 0.6), ("interactive", 0.5), ("indoor", 0.2)],
        InterestTier::Elderly => &[("culture", 0.3), ("nature", 0.2), ("indoor", 0.15)],
        InterestTier::Adult => &[("museum", 0.2), ("photoSpot", 0.2), ("shopping", 0.1)],
    };
    for (tag, boost) in boosts {
        *affinity.entry((*tag).to_string()).or_insert(0.0) += boost * share;
    }
}

fn value_of_time_base(sensitivity: Sensitivity) -> f64 {
    match sensitivity {
        Sensitivity::Low => 4.0,
        Sensitivity::Medium => 2.0,
        Sensitivity::High => 0.8,
    }
}

fn trip_type_multiplier(trip_type: TripType) -> f64 {
    match trip_type {
        TripType::Business => 1.4,
        TripType::Leisure => 1.0,
        TripType::Family => 0.8,
        TripType::Backpacking => 0.7,
    }
}

fn time_sensitivity_multiplier(sensitivity: Sensitivity) -> f64 {
    match sensitivity {
        Sensitivity::High => 1.3,
        Sensitivity::Medium => 1.0,
        Sensitivity::Low => 0.85,
    }
}

/// Optional per-person-per-day budget, used to bump the value-of-time estimate by up to ±15%.
fn budget_bump(budget_per_person_per_day: Option<f64>) -> f64 {
    match budget_per_person_per_day {
        Some(b) if b <= 50.0 => 1.15,
        Some(b) if b >= 400.0 => 0.85,
        _ => 1.0,
    }
}

/// Compile a [`Policy`] from the traveling group, trip context, and optional budget.
pub fn compile_policy(
    travelers: &[Traveler],
    context: Context,
    trip_type: TripType,
    budget_per_person_per_day: Option<f64>,
) -> Policy {
    let worst = travelers
        .iter()
        .map(|t| t.mobility)
        .max_by_key(|m| m.rank())
        .unwrap_or(MobilityTier::CityPotato);

    let total_weight: f64 = travelers.iter().map(|t| t.weight.max(0.0)).sum();
    let (mut adult, mut elderly, mut child) = (0.0, 0.0, 0.0);
    if total_weight > 0.0 {
        for t in travelers {
            let share = t.weight.max(0.0) / total_weight;
            match t.interest {
                InterestTier::Adult => adult += share,
                InterestTier::Elderly => elderly += share,
                InterestTier::Child => child += share,
            }
        }
    } else {
        adult = 1.0;
    }

    let mut affinity = base_tag_affinity();
    if total_weight > 0.0 {
        for t in travelers {
            let share = t.weight.max(0.0) / total_weight;
            apply_interest_boosts(&mut affinity, t.interest, share);
        }
    }

    let budget_sensitivity = context.budget_sensitivity.unwrap_or(Sensitivity::Medium);
    let time_sensitivity = context.time_sensitivity.unwrap_or(Sensitivity::Medium);
    let risk_tolerance = context.risk_tolerance.unwrap_or(RiskTolerance::Medium);
    let plan_stability = context
        .plan_stability
        .unwrap_or(crate::models::policy::PlanStability::Medium);

    let value_of_time_per_min = value_of_time_base(budget_sensitivity)
        * trip_type_multiplier(trip_type)
        * time_sensitivity_multiplier(time_sensitivity)
        * budget_bump(budget_per_person_per_day);

    let require_wheelchair_access =
        context.has_limited_mobility || worst == MobilityTier::Limited;
    let forbid_stairs =
        matches!(worst, MobilityTier::ActiveSenior | MobilityTier::Limited);

    let restroom_interval_min = if travelers.iter().any(|t| t.interest == InterestTier::Child) {
        90.0
    } else if travelers.iter().any(|t| t.interest == InterestTier::Elderly) || context.has_elderly
    {
        120.0
    } else {
        180.0
    };

    let pacing = pacing_for_tier(worst);

    let hard_constraints = HardConstraints {
        require_wheelchair_access,
        forbid_stairs,
        max_transfers: if context.has_elderly { 1 } else { 2 },
        max_single_walk_min: pacing.continuous_walk_cap_min,
        max_daily_walk_min: pacing.daily_walk_cap_min,
        restroom_interval_min,
    };

    let rain_walk_multiplier = if context.is_raining { 2.2 } else { 1.3 };
    let elderly_transfer_multiplier = if context.has_elderly { 1.6 } else { 1.0 };
    let luggage_transit_penalty = if context.has_luggage || context.is_moving_day {
        18.0
    } else {
        0.0
    };
    let plan_change_penalty = match plan_stability {
        crate::models::policy::PlanStability::High => 18.0,
        crate::models::policy::PlanStability::Medium => 10.0,
        crate::models::policy::PlanStability::Low => 4.0,
    };
    let overtime_penalty_per_min = match risk_tolerance {
        RiskTolerance::Low => 1.2,
        RiskTolerance::Medium => 2.0,
        RiskTolerance::High => 3.0,
    };

    let soft_weights = SoftWeights {
        tag_affinity: affinity,
        diversity_penalty: 0.3,
        must_see_boost: 4.0,
        value_of_time_per_min,
        walk_pain_per_min: 0.15,
        transfer_pain: 3.0,
        stair_pain: 2.0,
        crowd_pain_per_min: 0.2,
        rain_walk_multiplier,
        luggage_transit_penalty,
        elderly_transfer_multiplier,
        plan_change_penalty,
        overtime_penalty_per_min,
    };

    let derived = Derived {
        group_mobility_worst: worst,
        interest_mix_adult: adult,
        interest_mix_elderly: elderly,
        interest_mix_child: child,
    };

    Policy {
        pacing,
        hard_constraints,
        soft_weights,
        context,
        derived,
    }
}

/// Default-policy fixtures shared by other planning modules' unit tests.
#[cfg(test)]
pub mod test_support {
    use super::*;

    pub fn default_policy() -> Policy {
        compile_policy(
            &[Traveler {
                mobility: MobilityTier::CityPotato,
                interest: InterestTier::Adult,
                weight: 1.0,
            }],
            Context::default(),
            TripType::Leisure,
            None,
        )
    }
}
