//! Day Scheduler: greedy, fatigue-aware day construction.

use crate::collaborators::transit_query::{GeoPoint, TransitQuery};
use crate::models::poi::{DateContext, Poi};
use crate::models::policy::Policy;
use crate::models::rest_stop::RestStop;
use crate::models::schedule::{DayMetrics, DaySchedule, HpState, PlannedStop, StopKind};
use crate::planning::cost::edge_cost;
use crate::planning::feasibility::is_poi_feasible;
use crate::planning::hp::{apply_rest_recovery, apply_travel_fatigue, rest_needed, TravelLoad};
use crate::planning::ranking::interest_score;
use std::collections::HashSet;

/// Terminate the main loop once fewer than this many minutes remain in the day — not enough
/// time to productively add another stop.
const END_OF_DAY_MARGIN_MIN: f64 = 30.0;
/// Acceptable wait, in minutes, before the scheduler skips a POI rather than waiting for it.
const SCHEDULER_MAX_WAIT_MIN: f64 = 45.0;
const SAFETY_REST_HP_THRESHOLD: f64 = 8.0;
const FALLBACK_REST_MAX_MIN: f64 = 20.0;

pub struct DayRequest {
    pub date_ctx: DateContext,
    pub start_min: u32,
    pub end_min: u32,
    pub start_location: GeoPoint,
    pub pois: Vec<Poi>,
    pub rest_stops: Vec<RestStop>,
    pub must_see_poi_ids: HashSet<String>,
    pub buffer_min: u32,
    /// Starting stamina; `None` means fresh at `hp_max` (a brand-new day). The Replanner (C10)
    /// threads the frozen prefix's ending HP through here rather than resetting to full.
    pub initial_hp: Option<f64>,
}

impl DayRequest {
    pub fn new(date_ctx: DateContext, start_min: u32, end_min: u32, start_location: GeoPoint) -> Self {
        DayRequest {
            date_ctx,
            start_min,
            end_min,
            start_location,
            pois: vec![],
            rest_stops: vec![],
            must_see_poi_ids: HashSet::new(),
            buffer_min: 10,
            initial_hp: None,
        }
    }
}

fn distance_score(km: f64) -> f64 {
    if km <= 0.5 {
        1.0
    } else if km <= 2.0 {
        1.0 - (km - 0.5) / 1.5 * 0.5
    } else {
        0.3
    }
}

fn rest_stop_score(rest: &RestStop, from: GeoPoint, policy: &Policy) -> f64 {
    let km = crate::planning::time::haversine_km(from.lat, from.lng, rest.lat, rest.lng);
    let accessibility = if policy.hard_constraints.require_wheelchair_access && rest.wheelchair_reachable {
        1.2
    } else {
        1.0
    };
    let facilities = 0.15 * rest.has_restroom as u8 as f64
        + 0.15 * rest.has_seating as u8 as f64
        + 0.1 * rest.is_indoor as u8 as f64
        + 0.1 * rest.is_cafe_or_mall as u8 as f64;
    (rest.comfort_score / 10.0 + facilities) * accessibility * distance_score(km) + rest.regen_bonus_hp / 20.0
}

fn pick_rest_stop<'a>(rests: &'a [RestStop], from: GeoPoint, policy: &Policy) -> Option<&'a RestStop> {
    rests
        .iter()
        .filter(|r| !policy.hard_constraints.require_wheelchair_access || r.wheelchair_reachable)
        .max_by(|a, b| {
            rest_stop_score(a, from, policy)
                .partial_cmp(&rest_stop_score(b, from, policy))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

struct PoiSelection {
    index: usize,
    arrival_min: f64,
    wait_min: f64,
    segment: crate::models::transit::TransitSegment,
}

async fn best_poi_selection(
    pois: &[Poi],
    loc: GeoPoint,
    now_min: f64,
    policy: &Policy,
    date_ctx: DateContext,
    must_see: &HashSet<String>,
    transit: &dyn TransitQuery,
) -> Option<PoiSelection> {
    let mut best: Option<(PoiSelection, f64)> = None;

    for (idx, poi) in pois.iter().enumerate() {
        let poi_loc = GeoPoint {
            lat: poi.lat,
            lng: poi.lng,
        };
        let segment = transit.segment(loc, poi_loc, policy).await;
        let cost = edge_cost(&segment, policy);
        if cost.is_infinite() {
            continue;
        }
        if segment.walk_min > policy.hard_constraints.max_single_walk_min {
            continue;
        }

        let arrival_min = now_min + segment.duration_min;
        let arrival_clock = ((arrival_min as u32) % 1440) as u16;
        let feas = is_poi_feasible(poi, arrival_clock, policy, date_ctx);
        if !feas.feasible {
            continue;
        }
        if feas.wait_min as f64 > SCHEDULER_MAX_WAIT_MIN {
            continue;
        }

        let interest = interest_score(poi, policy, must_see.contains(&poi.id));
        let wait_penalty = feas.wait_min as f64 * 0.4 * policy.soft_weights.overtime_penalty_per_min;
        let fatigue_penalty = segment.walk_min * 0.4 * 0.3
            + segment.stairs_count.unwrap_or(0) as f64 * 0.3;
        let gain = interest * 10.0 - cost - wait_penalty - fatigue_penalty;

        let selection = PoiSelection {
            index: idx,
            arrival_min,
            wait_min: feas.wait_min as f64,
            segment,
        };

        match &best {
            Some((_, best_gain)) if *best_gain >= gain => {}
            _ => best = Some((selection, gain)),
        }
    }

    best.map(|(s, _)| s)
}

/// Construct a single day's schedule. `transit` is consulted once per candidate POI
/// per iteration; callers wanting to avoid repeat queries should memoize at that boundary.
pub async fn schedule_day(policy: &Policy, req: DayRequest, transit: &dyn TransitQuery) -> DaySchedule {
    let mut now_min = req.start_min as f64;
    let mut loc = req.start_location;
    let mut hp_state = match req.initial_hp {
        Some(hp) => HpState {
            hp: hp.clamp(0.0, policy.pacing.hp_max),
            last_rest_at_min: now_min,
            last_break_at_min: now_min,
        },
        None => HpState::fresh(policy.pacing.hp_max, now_min),
    };
    let mut remaining: Vec<Poi> = req.pois;
    let mut stops: Vec<PlannedStop> = vec![];
    let mut metrics = DayMetrics::default();

    loop {
        if now_min >= req.end_min as f64 - END_OF_DAY_MARGIN_MIN {
            break;
        }

        if rest_needed(policy, hp_state.hp, now_min, &hp_state) {
            match pick_rest_stop(&req.rest_stops, loc, policy) {
                Some(rest) => {
                    let seg = transit.segment(loc, GeoPoint { lat: rest.lat, lng: rest.lng }, policy).await;
                    apply_travel_fatigue(
                        policy,
                        &mut hp_state,
                        TravelLoad {
                            walk_min: seg.walk_min,
                            stairs_count: seg.stairs_count.unwrap_or(0),
                            queue_min: 0.0,
                        },
                        now_min,
                    );
                    metrics.total_travel_min += seg.duration_min;
                    metrics.total_walk_min += seg.walk_min;
                    metrics.total_transfers += seg.transfer_count;
                    now_min += seg.duration_min;

                    let rest_min = rest.recommended_rest_min;
                    apply_rest_recovery(policy, &mut hp_state, rest_min, now_min + rest_min, rest.regen_bonus_hp);
                    stops.push(PlannedStop {
                        kind: StopKind::Rest,
                        id: rest.id.clone(),
                        name: rest.name.clone(),
                        start_min: now_min as u32,
                        end_min: (now_min + rest_min) as u32,
                        lat: rest.lat,
                        lng: rest.lng,
                        transit_in: Some(seg),
                        notes: Some("forced rest".to_string()),
                    });
                    now_min += rest_min;
                    loc = GeoPoint { lat: rest.lat, lng: rest.lng };
                    continue;
                }
                None => break,
            }
        }

        let selection = best_poi_selection(
            &remaining,
            loc,
            now_min,
            policy,
            req.date_ctx,
            &req.must_see_poi_ids,
            transit,
        )
        .await;

        match selection {
            Some(sel) => {
                let poi = remaining.remove(sel.index);
                apply_travel_fatigue(
                    policy,
                    &mut hp_state,
                    TravelLoad {
                        walk_min: sel.segment.walk_min,
                        stairs_count: sel.segment.stairs_count.unwrap_or(0),
                        queue_min: 0.0,
                    },
                    now_min,
                );
                metrics.total_travel_min += sel.segment.duration_min;
                metrics.total_walk_min += sel.segment.walk_min;
                metrics.total_transfers += sel.segment.transfer_count;

                if sel.wait_min > 0.0 {
                    apply_travel_fatigue(
                        policy,
                        &mut hp_state,
                        TravelLoad {
                            walk_min: 0.0,
                            stairs_count: 0,
                            queue_min: sel.wait_min,
                        },
                        sel.arrival_min,
                    );
                    metrics.total_queue_min += sel.wait_min;
                }

                let entry_min = sel.arrival_min + sel.wait_min;
                let end_min = entry_min + poi.avg_visit_min;

                stops.push(PlannedStop {
                    kind: StopKind::Poi,
                    id: poi.id.clone(),
                    name: poi.name.clone(),
                    start_min: entry_min as u32,
                    end_min: end_min as u32,
                    lat: poi.lat,
                    lng: poi.lng,
                    transit_in: Some(sel.segment),
                    notes: None,
                });

                now_min = end_min + req.buffer_min as f64;
                loc = GeoPoint { lat: poi.lat, lng: poi.lng };

                if hp_state.hp <= SAFETY_REST_HP_THRESHOLD {
                    if let Some(rest) = pick_rest_stop(&req.rest_stops, loc, policy) {
                        let rest_min = rest.recommended_rest_min.min(FALLBACK_REST_MAX_MIN);
                        apply_rest_recovery(policy, &mut hp_state, rest_min, now_min + rest_min, rest.regen_bonus_hp);
                        stops.push(PlannedStop {
                            kind: StopKind::Rest,
                            id: rest.id.clone(),
                            name: rest.name.clone(),
                            start_min: now_min as u32,
                            end_min: (now_min + rest_min) as u32,
                            lat: rest.lat,
                            lng: rest.lng,
                            transit_in: None,
                            notes: Some("safety rest".to_string()),
                        });
                        now_min += rest_min;
                        loc = GeoPoint { lat: rest.lat, lng: rest.lng };
                    }
                }
            }
            None => match pick_rest_stop(&req.rest_stops, loc, policy) {
                Some(rest) => {
                    let rest_min = rest.recommended_rest_min.min(FALLBACK_REST_MAX_MIN);
                    apply_rest_recovery(policy, &mut hp_state, rest_min, now_min + rest_min, rest.regen_bonus_hp);
                    stops.push(PlannedStop {
                        kind: StopKind::Rest,
                        id: rest.id.clone(),
                        name: rest.name.clone(),
                        start_min: now_min as u32,
                        end_min: (now_min + rest_min) as u32,
                        lat: rest.lat,
                        lng: rest.lng,
                        transit_in: None,
                        notes: Some("no gainable poi".to_string()),
                    });
                    now_min += rest_min;
                    loc = GeoPoint { lat: rest.lat, lng: rest.lng };
                }
                None => break,
            },
        }
    }

    if now_min > req.end_min as f64 {
        metrics.overtime_min = now_min - req.end_min as f64;
    }
    metrics.ending_hp = hp_state.hp;

    DaySchedule { stops, metrics }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::transit_query::HaversineTransitEstimator;
    use crate::models::poi::{OpeningHours, OpeningWindow};
    use crate::planning::policy::test_support::default_policy;
    use chrono::NaiveDate;

    fn date_ctx() -> DateContext {
        DateContext {
            date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            day_of_week: 1,
            is_holiday: false,
        }
    }

    fn poi(id: &str, lat: f64, lng: f64) -> Poi {
        Poi {
            id: id.into(),
            name: id.into(),
            lat,
            lng,
            tags: vec!["museum".into()],
            opening_hours: Some(OpeningHours {
                windows: vec![OpeningWindow {
                    day_of_week: None,
                    start_min: 0,
                    end_min: 1440,
                    holiday_dates: vec![],
                    holidays_only: false,
                }],
                last_entry_min: None,
                closed_dates: vec![],
            }),
            avg_visit_min: 60.0,
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

    #[tokio::test]
    async fn schedules_nearby_pois_in_order() {
        let policy = default_policy();
        let transit = HaversineTransitEstimator::default();
        let mut req = DayRequest::new(date_ctx(), 9 * 60, 18 * 60, GeoPoint { lat: 0.0, lng: 0.0 });
        req.pois = vec![poi("p1", 0.001, 0.001), poi("p2", 0.002, 0.002)];
        let schedule = schedule_day(&policy, req, &transit).await;
        let ids: Vec<&str> = schedule.poi_ids();
        assert!(ids.contains(&"p1"));
        assert!(ids.len() <= 2);
    }

    #[tokio::test]
    async fn each_poi_appears_at_most_once() {
        let policy = default_policy();
        let transit = HaversineTransitEstimator::default();
        let mut req = DayRequest::new(date_ctx(), 9 * 60, 20 * 60, GeoPoint { lat: 0.0, lng: 0.0 });
        req.pois = (0..5)
            .map(|i| poi(&format!("p{i}"), 0.001 * i as f64, 0.001 * i as f64))
            .collect();
        let schedule = schedule_day(&policy, req, &transit).await;
        let ids = schedule.poi_ids();
        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(ids.len(), unique.len());
    }

    #[tokio::test]
    async fn stops_do_not_overlap() {
        let policy = default_policy();
        let transit = HaversineTransitEstimator::default();
        let mut req = DayRequest::new(date_ctx(), 9 * 60, 20 * 60, GeoPoint { lat: 0.0, lng: 0.0 });
        req.pois = (0..4)
            .map(|i| poi(&format!("p{i}"), 0.01 * i as f64, 0.01 * i as f64))
            .collect();
        let schedule = schedule_day(&policy, req, &transit).await;
        for w in schedule.stops.windows(2) {
            assert!(w[0].end_min <= w[1].start_min);
        }
    }
}
