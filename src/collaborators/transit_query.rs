//! `TransitQuery` collaborator interface: turns two points into a travel segment.
//!
//! A single async method behind a trait, with an in-crate stub good enough to drive the
//! scheduler and evaluator in tests.

use crate::models::policy::Policy;
use crate::models::transit::{TransitMode, TransitSegment};
use crate::planning::time::haversine_km;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[async_trait]
pub trait TransitQuery: Send + Sync {
    async fn segment(&self, from: GeoPoint, to: GeoPoint, policy: &Policy) -> TransitSegment;
}

/// Derives a plausible walk-or-transit segment from great-circle distance alone.
///
/// A real deployment would substitute an implementation backed by a routing API; this stand-in
/// exists so the scheduler and evaluator can be exercised without network access. A failed live
/// query degrades to a fixed estimate rather than aborting the call.
pub struct HaversineTransitEstimator {
    /// Average walking speed in km/h before the policy's `walk_speed_multiplier` is applied.
    pub base_walk_kmh: f64,
    /// Distance beyond which the estimator switches from "walk" to "taxi".
    pub walk_cutoff_km: f64,
}

impl Default for HaversineTransitEstimator {
    fn default() -> Self {
        HaversineTransitEstimator {
            base_walk_kmh: 4.5,
            walk_cutoff_km: 1.2,
        }
    }
}

/// Fixed fallback used when a live transit query fails: 30 minutes for the nominal estimate,
/// 45 minutes for the more conservative "robust" estimate.
pub const FALLBACK_API_ESTIMATE_MIN: f64 = 30.0;
pub const FALLBACK_ROBUST_ESTIMATE_MIN: f64 = 45.0;

#[async_trait]
impl TransitQuery for HaversineTransitEstimator {
    async fn segment(&self, from: GeoPoint, to: GeoPoint, policy: &Policy) -> TransitSegment {
        let km = haversine_km(from.lat, from.lng, to.lat, to.lng);
        let walk_speed = self.base_walk_kmh * policy.pacing.walk_speed_multiplier;

        if km <= self.walk_cutoff_km {
            let minutes = (km / walk_speed) * 60.0;
            return TransitSegment {
                mode: TransitMode::Walk,
                duration_min: minutes,
                walk_min: minutes,
                transfer_count: 0,
                stairs_count: None,
                elevator_available: true,
                wheelchair_accessible: true,
                crowd_level: Some(0),
                reliability: Some(0.95),
                cost_cny: 0.0,
            };
        }

        let taxi_minutes = (km / 25.0) * 60.0 + 5.0;
        TransitSegment {
            mode: TransitMode::Taxi,
            duration_min: taxi_minutes,
            walk_min: 0.2,
            transfer_count: 0,
            stairs_count: None,
            elevator_available: true,
            wheelchair_accessible: true,
            crowd_level: Some(0),
            reliability: Some(0.85),
            cost_cny: km * 3.0,
        }
    }
}

/// Builds the `time_matrix_api` / `time_matrix_robust` pair for `transport.build_time_matrix`.
/// `time_matrix_robust` is always `round(api * 1.2 + 15)`.
pub fn build_time_matrix(points: &[GeoPoint], base_walk_kmh: f64) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
    let n = points.len();
    let mut api = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let km = haversine_km(points[i].lat, points[i].lng, points[j].lat, points[j].lng);
            api[i][j] = (km / base_walk_kmh) * 60.0;
        }
    }
    let robust = api
        .iter()
        .map(|row| row.iter().map(|v| (v * 1.2 + 15.0).round()).collect())
        .collect();
    (api, robust)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::policy::test_support::default_policy;

    #[tokio::test]
    async fn short_distance_yields_walk_segment() {
        let estimator = HaversineTransitEstimator::default();
        let policy = default_policy();
        let seg = estimator
            .segment(
                GeoPoint { lat: 0.0, lng: 0.0 },
                GeoPoint {
                    lat: 0.001,
                    lng: 0.001,
                },
                &policy,
            )
            .await;
        assert_eq!(seg.mode, TransitMode::Walk);
    }

    #[tokio::test]
    async fn long_distance_yields_taxi_segment() {
        let estimator = HaversineTransitEstimator::default();
        let policy = default_policy();
        let seg = estimator
            .segment(
                GeoPoint { lat: 0.0, lng: 0.0 },
                GeoPoint {
                    lat: 10.0,
                    lng: 10.0,
                },
                &policy,
            )
            .await;
        assert_eq!(seg.mode, TransitMode::Taxi);
    }

    #[test]
    fn robust_matrix_is_linear_transform_of_api_matrix() {
        let pts = vec![
            GeoPoint { lat: 0.0, lng: 0.0 },
            GeoPoint { lat: 1.0, lng: 1.0 },
        ];
        let (api, robust) = build_time_matrix(&pts, 4.5);
        assert_eq!(robust[0][1], (api[0][1] * 1.2 + 15.0).round());
    }
}
