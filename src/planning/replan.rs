//! Replanner: a minimal-edit repair that freezes the already-executed or imminent portion of
//! a day's schedule and re-threads the remainder around a new event under an explicit change
//! budget.

use crate::collaborators::transit_query::{GeoPoint, TransitQuery};
use crate::models::poi::{DateContext, Poi};
use crate::models::policy::Policy;
use crate::models::rest_stop::RestStop;
use crate::models::schedule::{DayMetrics, DaySchedule, HpState, PlannedStop, StopKind};
use crate::models::whatif::{
    ChangeBudget, DiffKind, ReplanEvent, ReplanEventKind, ReplanResult, StopDiff,
};
use crate::planning::cost::{edge_cost, itinerary_cost, ItineraryTotals};
use crate::planning::hp::{apply_rest_recovery, apply_travel_fatigue, TravelLoad};
use crate::planning::scheduler::{schedule_day, DayRequest};
use std::collections::{HashMap, HashSet};

/// Default lock window: a stop starting within this many minutes of "now" is frozen along
/// with anything already past or in progress.
pub const DEFAULT_LOCK_WINDOW_MIN: u32 = 30;
/// Extra (non-pinned, non-original) POIs considered for candidate list (b).
const EXTRA_POOL_LIMIT_B: usize = 10;
/// A POI is "moved" rather than "kept" once its start shifts by at least this many minutes.
const MOVED_THRESHOLD_MIN: i64 = 45;

pub struct ReplanRequest {
    pub now_min: u32,
    pub current_location: GeoPoint,
    pub previous_schedule: DaySchedule,
    pub fresh_pois: Vec<Poi>,
    pub rest_stops: Vec<RestStop>,
    pub event: ReplanEvent,
    pub pinned_poi_ids: Vec<String>,
    pub change_budget: ChangeBudget,
    pub date_ctx: DateContext,
    pub day_end_min: u32,
    pub lock_window_min: u32,
}

impl ReplanRequest {
    pub fn new(
        now_min: u32,
        current_location: GeoPoint,
        previous_schedule: DaySchedule,
        fresh_pois: Vec<Poi>,
        event: ReplanEvent,
        date_ctx: DateContext,
        day_end_min: u32,
    ) -> Self {
        ReplanRequest {
            now_min,
            current_location,
            previous_schedule,
            fresh_pois,
            rest_stops: vec![],
            event,
            pinned_poi_ids: vec![],
            change_budget: ChangeBudget::default(),
            date_ctx,
            day_end_min,
            lock_window_min: DEFAULT_LOCK_WINDOW_MIN,
        }
    }
}

fn is_frozen(stop: &PlannedStop, now_min: u32, lock_window_min: u32) -> bool {
    stop.end_min <= now_min || stop.start_min <= now_min + lock_window_min
}

/// Raise `rainWalkMultiplier`, scale `valueOfTimePerMin`, or discount `planChangePenalty`
/// according to the event that triggered this replan.
fn adjust_policy_for_event(policy: &Policy, event: &ReplanEvent) -> Policy {
    let mut adjusted = policy.clone();
    match event.kind {
        ReplanEventKind::WeatherChanged => {
            if event.is_raining {
                adjusted.soft_weights.rain_walk_multiplier =
                    adjusted.soft_weights.rain_walk_multiplier.max(2.2);
                adjusted.context.is_raining = true;
            }
        }
        ReplanEventKind::TrafficDisruption => {
            let multiplier = match event.severity.unwrap_or(1) {
                0 | 1 => 1.06,
                2 => 1.12,
                _ => 1.25,
            };
            adjusted.soft_weights.value_of_time_per_min *= multiplier;
        }
        ReplanEventKind::UserEdit => {
            adjusted.soft_weights.plan_change_penalty *= 0.7;
        }
        ReplanEventKind::PoiClosed | ReplanEventKind::CrowdSpike => {}
    }
    adjusted
}

/// POI ids banned from every candidate list: the target of a `POI_CLOSED` event (its closure
/// always falls within today's planning window, so the event itself is the ban trigger — the
/// per-sample `effectiveFromMin` check belongs to the Feasibility Service and Robustness
/// Evaluator, which reason about a specific simulated arrival time, not "now"), plus any stop
/// the user explicitly removed.
fn ban_list(event: &ReplanEvent) -> HashSet<String> {
    let mut banned = HashSet::new();
    if event.kind == ReplanEventKind::PoiClosed {
        if let Some(id) = &event.poi_id {
            banned.insert(id.clone());
        }
    }
    for id in &event.removed_stop_ids {
        banned.insert(id.clone());
    }
    banned
}

fn pinned_ids(req: &ReplanRequest, banned: &HashSet<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    req.pinned_poi_ids
        .iter()
        .chain(req.event.pinned_poi_ids.iter())
        .filter(|id| !banned.contains(*id))
        .filter(|id| seen.insert((*id).clone()))
        .cloned()
        .collect()
}

fn remaining_poi_ids(remaining: &[PlannedStop], banned: &HashSet<String>) -> Vec<String> {
    remaining
        .iter()
        .filter(|s| s.kind == StopKind::Poi && !banned.contains(&s.id))
        .map(|s| s.id.clone())
        .collect()
}

fn extra_ids(fresh_pois: &[Poi], exclude: &HashSet<&str>, banned: &HashSet<String>) -> Vec<String> {
    fresh_pois
        .iter()
        .map(|p| p.id.clone())
        .filter(|id| !exclude.contains(id.as_str()) && !banned.contains(id))
        .collect()
}

fn dedup_concat(lists: &[&[String]]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = vec![];
    for list in lists {
        for id in *list {
            if seen.insert(id.clone()) {
                out.push(id.clone());
            }
        }
    }
    out
}

fn resolve_pois(ids: &[String], pool: &HashMap<String, Poi>) -> Vec<Poi> {
    ids.iter().filter_map(|id| pool.get(id).cloned()).collect()
}

/// Replay HP consumption across the frozen prefix so the tail scheduling run picks up fatigue
/// where the prefix actually left off, rather than resetting to a fresh `hpMax`.
fn simulate_prefix_hp(policy: &Policy, stops: &[PlannedStop]) -> f64 {
    let day_start = stops.first().map(|s| s.start_min).unwrap_or(0);
    let mut state = HpState::fresh(policy.pacing.hp_max, day_start as f64);
    for stop in stops {
        if let Some(seg) = &stop.transit_in {
            apply_travel_fatigue(
                policy,
                &mut state,
                TravelLoad {
                    walk_min: seg.walk_min,
                    stairs_count: seg.stairs_count.unwrap_or(0),
                    queue_min: 0.0,
                },
                stop.start_min as f64,
            );
        }
        if stop.kind == StopKind::Rest {
            let rest_min = stop.duration_min() as f64;
            apply_rest_recovery(policy, &mut state, rest_min, stop.end_min as f64, 0.0);
        }
    }
    state.hp
}

fn prefix_metrics(stops: &[PlannedStop]) -> DayMetrics {
    let mut metrics = DayMetrics::default();
    for stop in stops {
        if let Some(seg) = &stop.transit_in {
            metrics.total_travel_min += seg.duration_min;
            metrics.total_walk_min += seg.walk_min;
            metrics.total_transfers += seg.transfer_count;
        }
    }
    metrics
}

fn combine_metrics(prefix: DayMetrics, tail: DayMetrics) -> DayMetrics {
    DayMetrics {
        total_travel_min: prefix.total_travel_min + tail.total_travel_min,
        total_walk_min: prefix.total_walk_min + tail.total_walk_min,
        total_queue_min: prefix.total_queue_min + tail.total_queue_min,
        total_transfers: prefix.total_transfers + tail.total_transfers,
        overtime_min: tail.overtime_min,
        ending_hp: tail.ending_hp,
    }
}

struct DiffOutcome {
    diffs: Vec<StopDiff>,
    change_count: u32,
    max_shift_min: f64,
    added_any: bool,
}

/// Classify each POI touched by either schedule as kept / removed / added / moved, comparing
/// the previous *remaining* portion against the new tail.
fn diff_schedules(previous_remaining: &[PlannedStop], new_tail: &[PlannedStop]) -> DiffOutcome {
    let old_starts: HashMap<&str, u32> = previous_remaining
        .iter()
        .filter(|s| s.kind == StopKind::Poi)
        .map(|s| (s.id.as_str(), s.start_min))
        .collect();
    let new_starts: HashMap<&str, u32> = new_tail
        .iter()
        .filter(|s| s.kind == StopKind::Poi)
        .map(|s| (s.id.as_str(), s.start_min))
        .collect();

    let mut ids: Vec<&str> = old_starts.keys().chain(new_starts.keys()).copied().collect();
    ids.sort_unstable();
    ids.dedup();

    let mut diffs = vec![];
    let mut change_count = 0u32;
    let mut max_shift_min = 0.0_f64;
    let mut added_any = false;

    for id in ids {
        match (old_starts.get(id), new_starts.get(id)) {
            (Some(&old_start), Some(&new_start)) => {
                let shift = (new_start as i64 - old_start as i64).unsigned_abs() as f64;
                if shift >= MOVED_THRESHOLD_MIN as f64 {
                    diffs.push(StopDiff {
                        poi_id: id.to_string(),
                        diff: DiffKind::Moved,
                    });
                    change_count += 1;
                    max_shift_min = max_shift_min.max(shift);
                } else {
                    diffs.push(StopDiff {
                        poi_id: id.to_string(),
                        diff: DiffKind::Kept,
                    });
                }
            }
            (Some(_), None) => {
                diffs.push(StopDiff {
                    poi_id: id.to_string(),
                    diff: DiffKind::Removed,
                });
                change_count += 1;
            }
            (None, Some(_)) => {
                diffs.push(StopDiff {
                    poi_id: id.to_string(),
                    diff: DiffKind::Added,
                });
                change_count += 1;
                added_any = true;
            }
            (None, None) => unreachable!(),
        }
    }

    DiffOutcome {
        diffs,
        change_count,
        max_shift_min,
        added_any,
    }
}

fn within_budget(outcome: &DiffOutcome, budget: &ChangeBudget) -> bool {
    outcome.change_count <= budget.max_change_count
        && (!outcome.added_any || budget.allow_add_new_poi)
        && outcome.max_shift_min <= budget.max_time_shift_min
}

fn itinerary_totals_for(schedule: &DaySchedule, policy: &Policy, change_count: u32) -> ItineraryTotals {
    let edge_cost_sum = schedule
        .stops
        .iter()
        .filter_map(|s| s.transit_in.as_ref())
        .map(|seg| edge_cost(seg, policy))
        .sum();
    ItineraryTotals {
        edge_cost_sum,
        overtime_min: schedule.metrics.overtime_min,
        plan_change_count: change_count,
    }
}

fn explanation_for(event: &ReplanEvent, change_count: u32) -> String {
    match event.kind {
        ReplanEventKind::PoiClosed => {
            let poi = event.poi_id.as_deref().unwrap_or("unknown");
            format!(
                "景点闭馆 (POI_CLOSED): {poi} has closed and was removed from the itinerary; \
                 rescheduled the remainder with {change_count} change(s)."
            )
        }
        ReplanEventKind::WeatherChanged => format!(
            "WEATHER_CHANGED: raised walk/wait penalties for rain and rescheduled the \
             remainder with {change_count} change(s)."
        ),
        ReplanEventKind::CrowdSpike => format!(
            "CROWD_SPIKE: rescheduled the remainder to avoid the crowded window \
             ({change_count} change(s))."
        ),
        ReplanEventKind::TrafficDisruption => format!(
            "TRAFFIC_DISRUPTION: raised the value-of-time penalty for travel and rescheduled \
             the remainder with {change_count} change(s)."
        ),
        ReplanEventKind::UserEdit => {
            format!("USER_EDIT: applied the requested edits ({change_count} change(s)).")
        }
    }
}

fn fallback_explanation(event: &ReplanEvent) -> String {
    format!(
        "No candidate schedule satisfied the change budget after event {:?}; kept the frozen \
         prefix unchanged.",
        event.kind
    )
}

struct Candidate {
    schedule: DaySchedule,
    diff: DiffOutcome,
    cost: f64,
}

/// Freeze the executed/imminent prefix of `req.previous_schedule` and re-thread the remainder
/// around `req.event` under `req.change_budget`.
pub async fn replan_day(policy: &Policy, req: ReplanRequest, transit: &dyn TransitQuery) -> ReplanResult {
    let frozen: Vec<PlannedStop> = req
        .previous_schedule
        .stops
        .iter()
        .take_while(|s| is_frozen(s, req.now_min, req.lock_window_min))
        .cloned()
        .collect();
    let remaining_prev: Vec<PlannedStop> = req.previous_schedule.stops[frozen.len()..].to_vec();

    let (tail_start_min, tail_start_loc) = match frozen.last() {
        Some(stop) => (
            stop.end_min,
            GeoPoint {
                lat: stop.lat,
                lng: stop.lng,
            },
        ),
        None => (req.now_min, req.current_location),
    };
    let tail_initial_hp = simulate_prefix_hp(policy, &frozen);

    let adjusted_policy = adjust_policy_for_event(policy, &req.event);
    let banned = ban_list(&req.event);
    let pinned = pinned_ids(&req, &banned);
    let original = remaining_poi_ids(&remaining_prev, &banned);

    let exclude: HashSet<&str> = pinned
        .iter()
        .map(String::as_str)
        .chain(original.iter().map(String::as_str))
        .collect();
    let extras = extra_ids(&req.fresh_pois, &exclude, &banned);

    let list_a = dedup_concat(&[&pinned, &original, &extras]);
    let extras_b: Vec<String> = extras.iter().take(EXTRA_POOL_LIMIT_B).cloned().collect();
    let list_b = dedup_concat(&[&pinned, &original, &extras_b]);
    let list_c = dedup_concat(&[&pinned, &extras]);

    let pool: HashMap<String, Poi> = req.fresh_pois.iter().map(|p| (p.id.clone(), p.clone())).collect();
    let prefix_metrics_value = prefix_metrics(&frozen);

    let mut best: Option<Candidate> = None;
    for ids in [list_a, list_b, list_c] {
        let pois = resolve_pois(&ids, &pool);
        let mut day_req = DayRequest::new(req.date_ctx, tail_start_min, req.day_end_min, tail_start_loc);
        day_req.pois = pois;
        day_req.rest_stops = req.rest_stops.clone();
        day_req.initial_hp = Some(tail_initial_hp);
        let tail_schedule = schedule_day(&adjusted_policy, day_req, transit).await;

        let diff = diff_schedules(&remaining_prev, &tail_schedule.stops);
        if !within_budget(&diff, &req.change_budget) {
            continue;
        }

        let mut full_stops = frozen.clone();
        full_stops.extend(tail_schedule.stops.clone());
        let full_metrics = combine_metrics(prefix_metrics_value, tail_schedule.metrics);
        let full_schedule = DaySchedule {
            stops: full_stops,
            metrics: full_metrics,
        };

        let totals = itinerary_totals_for(&full_schedule, &adjusted_policy, diff.change_count);
        let cost = itinerary_cost(totals, &adjusted_policy);
        if cost.is_infinite() {
            continue;
        }

        let candidate = Candidate {
            schedule: full_schedule,
            diff,
            cost,
        };
        match &best {
            Some(b) if b.cost <= candidate.cost => {}
            _ => best = Some(candidate),
        }
    }

    match best {
        Some(candidate) => ReplanResult {
            schedule: candidate.schedule,
            frozen_count: frozen.len(),
            change_count: candidate.diff.change_count,
            explanation: explanation_for(&req.event, candidate.diff.change_count),
            diffs: candidate.diff.diffs,
        },
        None => ReplanResult {
            schedule: DaySchedule {
                metrics: prefix_metrics_value,
                stops: frozen.clone(),
            },
            frozen_count: frozen.len(),
            change_count: 0,
            explanation: fallback_explanation(&req.event),
            diffs: vec![],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::transit_query::HaversineTransitEstimator;
    use crate::models::poi::{OpeningHours, OpeningWindow};
    use crate::models::transit::{TransitMode, TransitSegment};
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

    fn seg() -> TransitSegment {
        TransitSegment {
            mode: TransitMode::Walk,
            duration_min: 10.0,
            walk_min: 10.0,
            transfer_count: 0,
            stairs_count: None,
            elevator_available: true,
            wheelchair_accessible: true,
            crowd_level: Some(0),
            reliability: Some(0.9),
            cost_cny: 0.0,
        }
    }

    fn stop(kind: StopKind, id: &str, start: u32, end: u32, lat: f64, lng: f64) -> PlannedStop {
        PlannedStop {
            kind,
            id: id.into(),
            name: id.into(),
            start_min: start,
            end_min: end,
            lat,
            lng,
            transit_in: Some(seg()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn frozen_prefix_is_verbatim_sublist() {
        let policy = default_policy();
        let transit = HaversineTransitEstimator::default();
        let previous = DaySchedule {
            stops: vec![
                stop(StopKind::Poi, "p1", 540, 600, 0.0, 0.0),
                stop(StopKind::Poi, "p2", 650, 710, 0.001, 0.001),
            ],
            metrics: DayMetrics::default(),
        };

        let mut req = ReplanRequest::new(
            555,
            GeoPoint { lat: 0.0, lng: 0.0 },
            previous.clone(),
            vec![poi("p2", 0.001, 0.001), poi("p3", 0.002, 0.002)],
            ReplanEvent {
                kind: ReplanEventKind::WeatherChanged,
                is_raining: true,
                ..Default::default()
            },
            date_ctx(),
            18 * 60,
        );
        req.lock_window_min = 30;

        let result = replan_day(&policy, req, &transit).await;
        assert_eq!(result.frozen_count, 1);
        assert_eq!(result.schedule.stops[0].id, previous.stops[0].id);
        assert_eq!(result.schedule.stops[0].start_min, previous.stops[0].start_min);
        assert_eq!(result.schedule.stops[0].end_min, previous.stops[0].end_min);
    }

    #[tokio::test]
    async fn poi_closed_event_removes_the_closed_poi() {
        let policy = default_policy();
        let transit = HaversineTransitEstimator::default();
        let previous = DaySchedule {
            stops: vec![
                stop(StopKind::Poi, "p1", 480, 540, 0.0, 0.0),
                stop(StopKind::Poi, "p2", 600, 660, 0.005, 0.005),
            ],
            metrics: DayMetrics::default(),
        };

        let req = ReplanRequest::new(
            540,
            GeoPoint { lat: 0.0, lng: 0.0 },
            previous,
            vec![poi("p2", 0.005, 0.005)],
            ReplanEvent {
                kind: ReplanEventKind::PoiClosed,
                poi_id: Some("p2".to_string()),
                effective_from_min: Some(600),
                ..Default::default()
            },
            date_ctx(),
            18 * 60,
        );

        let result = replan_day(&policy, req, &transit).await;
        assert!(!result.schedule.poi_ids().contains(&"p2"));
        assert!(result.explanation.contains("景点闭馆"));
    }

    #[tokio::test]
    async fn change_count_never_exceeds_budget() {
        let policy = default_policy();
        let transit = HaversineTransitEstimator::default();
        let previous = DaySchedule {
            stops: vec![stop(StopKind::Poi, "p1", 480, 540, 0.0, 0.0)],
            metrics: DayMetrics::default(),
        };

        let mut req = ReplanRequest::new(
            480,
            GeoPoint { lat: 0.0, lng: 0.0 },
            previous,
            (0..8).map(|i| poi(&format!("extra{i}"), 0.001 * i as f64, 0.001 * i as f64)).collect(),
            ReplanEvent {
                kind: ReplanEventKind::UserEdit,
                ..Default::default()
            },
            date_ctx(),
            18 * 60,
        );
        req.change_budget.max_change_count = 3;
        req.change_budget.allow_add_new_poi = true;

        let result = replan_day(&policy, req, &transit).await;
        assert!(result.change_count <= 3);
    }

    #[tokio::test]
    async fn no_feasible_candidate_falls_back_to_frozen_prefix() {
        let policy = default_policy();
        let transit = HaversineTransitEstimator::default();
        let previous = DaySchedule {
            stops: vec![stop(StopKind::Poi, "p1", 480, 540, 0.0, 0.0)],
            metrics: DayMetrics::default(),
        };

        // `allow_add_new_poi` defaults to false, and the only candidate POI is a fresh
        // addition (not part of the previous remaining portion), so every candidate list is
        // rejected by the change budget and the replan must fall back to the frozen prefix.
        let req = ReplanRequest::new(
            480,
            GeoPoint { lat: 0.0, lng: 0.0 },
            previous,
            vec![poi("extra", 0.001, 0.001)],
            ReplanEvent {
                kind: ReplanEventKind::CrowdSpike,
                ..Default::default()
            },
            date_ctx(),
            18 * 60,
        );

        let result = replan_day(&policy, req, &transit).await;
        assert_eq!(result.schedule.stops.len(), result.frozen_count);
        assert!(result.schedule.poi_ids().is_empty());
    }
}
