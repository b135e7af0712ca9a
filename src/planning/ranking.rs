//! Ranking Service: scores candidate POIs using feasibility-aware features.

use crate::models::poi::Poi;
use crate::models::policy::Policy;
use std::collections::HashSet;

/// Interest score for a POI under the active policy's tag-affinity table, boosted for
/// must-see POIs and halved for weather-sensitive outdoor POIs on rainy days.
pub fn interest_score(poi: &Poi, policy: &Policy, must_see: bool) -> f64 {
    let mut score: f64 = poi
        .tags
        .iter()
        .filter_map(|t| policy.soft_weights.tag_affinity.get(t))
        .sum();

    if must_see {
        score += policy.soft_weights.must_see_boost;
    }

    if policy.context.is_raining && poi.is_weather_sensitive() {
        score *= 0.5;
    }

    score
}

/// Diversity-penalized score: discourages repeatedly picking the same tag cluster within a
/// single day by subtracting the policy's diversity penalty per tag already seen.
pub fn diversity_adjusted_score(
    poi: &Poi,
    policy: &Policy,
    must_see: bool,
    tags_seen: &HashSet<String>,
) -> f64 {
    let base = interest_score(poi, policy, must_see);
    let repeats = poi.tags.iter().filter(|t| tags_seen.contains(*t)).count() as f64;
    base - repeats * policy.soft_weights.diversity_penalty
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::policy::test_support::default_policy;

    fn poi(tags: &[&str]) -> Poi {
        Poi {
            id: "p".into(),
            name: "p".into(),
            lat: 0.0,
            lng: 0.0,
            tags: tags.iter().map(|s| s.to_string()).collect(),
            opening_hours: None,
            avg_visit_min: 30.0,
            visit_min_std: None,
            queue_min_mean: None,
            queue_min_std: None,
            wheelchair_access: true,
            stairs_required: false,
            seating_available: false,
            restroom_nearby: false,
            weather_sensitivity: 0,
            crowding_key: None,
        }
    }

    #[test]
    fn must_see_increases_score() {
        let policy = default_policy();
        let p = poi(&["museum"]);
        let normal = interest_score(&p, &policy, false);
        let must_see = interest_score(&p, &policy, true);
        assert!(must_see > normal);
    }

    #[test]
    fn rain_halves_weather_sensitive_outdoor_score() {
        let mut policy = default_policy();
        policy.context.is_raining = true;
        let mut p = poi(&["nature"]);
        p.weather_sensitivity = 2;
        let dry_policy = default_policy();
        let dry = interest_score(&p, &dry_policy, false);
        let wet = interest_score(&p, &policy, false);
        assert!((wet - dry / 2.0).abs() < 1e-9);
    }

    #[test]
    fn diversity_penalty_reduces_repeated_tags() {
        let policy = default_policy();
        let p = poi(&["museum"]);
        let mut seen = HashSet::new();
        let first = diversity_adjusted_score(&p, &policy, false, &seen);
        seen.insert("museum".to_string());
        let second = diversity_adjusted_score(&p, &policy, false, &seen);
        assert!(second < first);
    }
}
