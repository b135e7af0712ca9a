//! What-If Engine: derives, re-evaluates, and selects among perturbed candidate schedules.

use crate::models::poi::{DateContext, Poi};
use crate::models::policy::Policy;
use crate::models::robustness::{OptimizationSuggestion, RiskLevel, RobustnessReport, SuggestionType};
use crate::models::schedule::{DaySchedule, StopKind};
use crate::models::whatif::{
    ActionKind, Confidence, DeltaSummary, ImpactCost, Severity, WhatIfCandidate, WhatIfReport,
};
use crate::planning::robustness::{evaluate_day_robustness, EvaluationConfig};
use crate::planning::rng::seed_for_candidate;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
pub struct WhatIfBudget {
    pub base_samples: u32,
    pub candidate_samples: u32,
    pub confirm_samples: u32,
}

impl Default for WhatIfBudget {
    fn default() -> Self {
        WhatIfBudget {
            base_samples: 300,
            candidate_samples: 300,
            confirm_samples: 600,
        }
    }
}

const MAX_CANDIDATE_SUGGESTIONS: usize = 3;
const SHIFT_CLAMP_MAX_COUNT: u32 = 2;
const LARGE_SHIFT_THRESHOLD_MIN: f64 = 90.0;

struct RawCandidate {
    action: ActionKind,
    target_poi_id: String,
    candidate_id: String,
    schedule: DaySchedule,
    clamped_count: u32,
    total_shift_min: f64,
    warnings: Vec<String>,
}

fn shift_earlier(base: &DaySchedule, target_poi_id: &str, shift_min: f64) -> Option<RawCandidate> {
    let idx = base
        .stops
        .iter()
        .position(|s| s.kind == StopKind::Poi && s.id == target_poi_id)?;

    let mut stops = base.stops.clone();
    let mut clamped_count = 0u32;
    let mut total_shift = 0.0_f64;

    for stop in stops.iter_mut().skip(idx) {
        let new_start = stop.start_min as f64 - shift_min;
        let new_end = stop.end_min as f64 - shift_min;
        let clamped_start = new_start.max(0.0);
        let clamped_end = new_end.max(stop.duration_min() as f64);
        if clamped_start == 0.0 && new_start < 0.0 {
            clamped_count += 1;
        }
        total_shift += (stop.start_min as f64 - clamped_start).abs();
        stop.start_min = clamped_start as u32;
        stop.end_min = clamped_end as u32;
    }

    if clamped_count > SHIFT_CLAMP_MAX_COUNT {
        return None;
    }
    if shift_min > LARGE_SHIFT_THRESHOLD_MIN && stops.first().map(|s| s.start_min) == Some(0) {
        return None;
    }
    let mut warnings = vec![];
    if clamped_count > 0 {
        warnings.push("SHIFT_CLAMPED".to_string());
    }

    Some(RawCandidate {
        action: ActionKind::ShiftEarlier,
        target_poi_id: target_poi_id.to_string(),
        candidate_id: format!("SHIFT:{target_poi_id}:{}", shift_min as i64),
        schedule: DaySchedule {
            stops,
            metrics: base.metrics,
        },
        clamped_count,
        total_shift_min: total_shift,
        warnings,
    })
}

fn reorder_avoid_wait(base: &DaySchedule, target_poi_id: &str) -> Vec<RawCandidate> {
    let Some(idx) = base
        .stops
        .iter()
        .position(|s| s.kind == StopKind::Poi && s.id == target_poi_id)
    else {
        return vec![];
    };

    let mut neighbor_indices = vec![];
    if idx > 0 {
        neighbor_indices.push(idx - 1);
    }
    if idx + 1 < base.stops.len() {
        neighbor_indices.push(idx + 1);
    }

    neighbor_indices
        .into_iter()
        .filter_map(|neighbor_idx| {
            let neighbor_id = base.stops[neighbor_idx].id.clone();
            let mut stops = base.stops.clone();
            // Swap identity/location, keep original time slots: the timeline is not
            // re-threaded in this version (see DESIGN.md Open Question #2).
            let (kind_a, id_a, name_a, lat_a, lng_a) = {
                let s = &stops[idx];
                (s.kind, s.id.clone(), s.name.clone(), s.lat, s.lng)
            };
            let (kind_b, id_b, name_b, lat_b, lng_b) = {
                let s = &stops[neighbor_idx];
                (s.kind, s.id.clone(), s.name.clone(), s.lat, s.lng)
            };
            {
                let a = &mut stops[idx];
                a.kind = kind_b;
                a.id = id_b;
                a.name = name_b;
                a.lat = lat_b;
                a.lng = lng_b;
            }
            {
                let b = &mut stops[neighbor_idx];
                b.kind = kind_a;
                b.id = id_a;
                b.name = name_a;
                b.lat = lat_a;
                b.lng = lng_a;
            }

            Some(RawCandidate {
                action: ActionKind::ReorderAvoidWait,
                target_poi_id: target_poi_id.to_string(),
                candidate_id: format!("REORDER:{target_poi_id}:{neighbor_id}"),
                schedule: DaySchedule {
                    stops,
                    metrics: base.metrics,
                },
                clamped_count: 0,
                total_shift_min: 0.0,
                warnings: vec!["TIMELINE_BROKEN".to_string()],
            })
        })
        .collect()
}

fn generate_raw_candidates(base: &DaySchedule, suggestions: &[OptimizationSuggestion]) -> Vec<RawCandidate> {
    let mut out = vec![];
    for suggestion in suggestions.iter().take(MAX_CANDIDATE_SUGGESTIONS) {
        match suggestion.suggestion_type {
            SuggestionType::UpgradeTransit => continue,
            SuggestionType::ShiftEarlier => {
                if let Some(shift) = suggestion.shift_min {
                    if let Some(c) = shift_earlier(base, &suggestion.poi_id, shift) {
                        out.push(c);
                    }
                }
            }
            SuggestionType::ReorderAvoidWait => {
                if suggestion.poi_id != "GLOBAL" {
                    out.extend(reorder_avoid_wait(base, &suggestion.poi_id));
                }
            }
        }
    }
    out
}

fn severity_for(action: ActionKind, total_shift_min: f64, order_changed: bool) -> Severity {
    if order_changed {
        return Severity::Medium;
    }
    match action {
        ActionKind::ShiftEarlier => {
            if total_shift_min < 15.0 {
                Severity::Low
            } else if total_shift_min < 45.0 {
                Severity::Medium
            } else {
                Severity::High
            }
        }
        ActionKind::ReorderAvoidWait => Severity::Medium,
    }
}

fn confidence_for(miss_delta_pp: f64, completion_delta_pp: f64) -> Confidence {
    if miss_delta_pp >= 10.0 || completion_delta_pp >= 10.0 {
        Confidence::High
    } else if miss_delta_pp >= 5.0 || completion_delta_pp >= 5.0 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

fn top_drivers(delta: &DeltaSummary) -> Vec<String> {
    let mut entries = vec![
        ("missProb".to_string(), delta.miss_delta_pp),
        ("waitProb".to_string(), delta.wait_delta_pp),
        ("completionP10".to_string(), delta.completion_p10_delta_pp),
        ("onTimeProb".to_string(), delta.on_time_delta_pp),
    ];
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    entries
        .into_iter()
        .take(3)
        .map(|(name, pp)| format!("{name} {pp:+.1}pp"))
        .collect()
}

fn risk_rank(level: RiskLevel) -> u8 {
    match level {
        RiskLevel::Low => 0,
        RiskLevel::Medium => 1,
        RiskLevel::High => 2,
    }
}

/// Produce the full what-if report for `base_schedule` under `policy`.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_what_if(
    policy: &Policy,
    base_schedule: &DaySchedule,
    day_end_min: u32,
    ctx: DateContext,
    pois: &HashMap<String, Poi>,
    suggestions: &[OptimizationSuggestion],
    base_seed: u32,
    budget: WhatIfBudget,
) -> WhatIfReport {
    let base_config = EvaluationConfig {
        samples: budget.base_samples,
        seed: base_seed,
        on_time_slack_min: 15.0,
    };
    let base_report = evaluate_day_robustness(policy, base_schedule, day_end_min, ctx, pois, base_config);

    let raw_candidates = generate_raw_candidates(base_schedule, suggestions);

    let mut by_signature: HashMap<String, WhatIfCandidate> = HashMap::new();

    for raw in raw_candidates {
        let signature = raw.schedule.signature();
        let seed = seed_for_candidate(base_seed, &raw.candidate_id);
        let config = EvaluationConfig {
            samples: budget.candidate_samples,
            seed,
            on_time_slack_min: 15.0,
        };
        let report = evaluate_day_robustness(policy, &raw.schedule, day_end_min, ctx, pois, config);

        let delta = DeltaSummary {
            miss_delta_pp: (base_report.time_window_miss_prob - report.time_window_miss_prob) * 100.0,
            wait_delta_pp: (base_report.window_wait_prob - report.window_wait_prob) * 100.0,
            completion_p10_delta_pp: (report.completion.completion_rate_p10
                - base_report.completion.completion_rate_p10)
                * 100.0,
            on_time_delta_pp: (report.on_time_prob - base_report.on_time_prob) * 100.0,
        };

        let order_changed = raw.action == ActionKind::ReorderAvoidWait;
        let moved_stop_count = raw
            .schedule
            .stops
            .iter()
            .zip(base_schedule.stops.iter())
            .filter(|(a, b)| a.start_min != b.start_min || a.id != b.id)
            .count() as u32;

        let impact = ImpactCost {
            total_shift_min: raw.total_shift_min,
            moved_stop_count,
            order_changed,
        };

        let severity = severity_for(raw.action, raw.total_shift_min, order_changed);
        let confidence = confidence_for(delta.miss_delta_pp, delta.completion_p10_delta_pp);
        let explain_top_drivers = top_drivers(&delta);
        let benefit_score = delta.miss_delta_pp + delta.completion_p10_delta_pp;

        let candidate = WhatIfCandidate {
            candidate_id: raw.candidate_id,
            action: raw.action,
            target_poi_id: raw.target_poi_id,
            schedule: raw.schedule,
            report,
            delta,
            impact,
            severity,
            confidence,
            explain_top_drivers,
            warnings: raw.warnings,
            seed,
        };

        // Structural dedupe: keep the better-scoring candidate per schedule signature
        // (scored after evaluation, since a meaningful benefit score requires it).
        match by_signature.get(&signature) {
            Some(existing) => {
                let existing_score =
                    existing.delta.miss_delta_pp + existing.delta.completion_p10_delta_pp;
                if benefit_score > existing_score {
                    by_signature.insert(signature, candidate);
                }
            }
            None => {
                by_signature.insert(signature, candidate);
            }
        }
    }

    let mut candidates: Vec<WhatIfCandidate> = by_signature.into_values().collect();
    candidates.sort_by(|a, b| a.candidate_id.cmp(&b.candidate_id));

    let winner_id = select_winner(&base_report, &candidates);
    let risk_warning = winner_id
        .as_ref()
        .and_then(|id| candidates.iter().find(|c| &c.candidate_id == id))
        .and_then(|winner| {
            if winner.severity == Severity::High
                && winner.confidence != Confidence::High
                && winner.delta.miss_delta_pp < 10.0
            {
                Some(
                    "change is large but benefit limited; consider reorder or local shift first"
                        .to_string(),
                )
            } else {
                None
            }
        });

    WhatIfReport {
        base_schedule: base_schedule.clone(),
        base_report,
        candidates,
        winner_candidate_id: winner_id,
        risk_warning,
        base_samples: budget.base_samples,
        candidate_samples: budget.candidate_samples,
        base_seed,
    }
}

/// Two-stage winner selection against the admission gates.
fn select_winner(base_report: &RobustnessReport, candidates: &[WhatIfCandidate]) -> Option<String> {
    let survivors: Vec<&WhatIfCandidate> = candidates
        .iter()
        .filter(|c| admits(base_report, c))
        .collect();

    if survivors.is_empty() {
        return None;
    }

    let mut ranked = survivors;
    ranked.sort_by(|a, b| {
        let score_a = a.delta.miss_delta_pp + a.delta.completion_p10_delta_pp;
        let score_b = b.delta.miss_delta_pp + b.delta.completion_p10_delta_pp;
        score_b.partial_cmp(&score_a).unwrap_or(std::cmp::Ordering::Equal)
    });
    let top_two: Vec<&WhatIfCandidate> = ranked.into_iter().take(2).collect();

    let winner = top_two.into_iter().min_by(|a, b| {
        let sev_cmp = severity_rank(a.severity).cmp(&severity_rank(b.severity));
        if sev_cmp != std::cmp::Ordering::Equal {
            return sev_cmp;
        }
        let score_a = a.delta.miss_delta_pp + a.delta.completion_p10_delta_pp;
        let score_b = b.delta.miss_delta_pp + b.delta.completion_p10_delta_pp;
        score_b.partial_cmp(&score_a).unwrap_or(std::cmp::Ordering::Equal)
    });

    winner.map(|c| c.candidate_id.clone())
}

fn severity_rank(s: Severity) -> u8 {
    match s {
        Severity::Low => 0,
        Severity::Medium => 1,
        Severity::High => 2,
    }
}

fn admits(base: &RobustnessReport, candidate: &WhatIfCandidate) -> bool {
    let d = &candidate.delta;

    if d.completion_p10_delta_pp < -5.0 && d.miss_delta_pp <= 15.0 {
        return false;
    }
    if d.miss_delta_pp < 0.0 && d.completion_p10_delta_pp <= 15.0 {
        return false;
    }
    if risk_rank(candidate.report.risk_level) > risk_rank(base.risk_level)
        && d.miss_delta_pp < 15.0
        && d.completion_p10_delta_pp < 15.0
    {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schedule::{DayMetrics, PlannedStop};
    use crate::models::transit::{TransitMode, TransitSegment};
    use chrono::NaiveDate;

    fn date_ctx() -> DateContext {
        DateContext {
            date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            day_of_week: 1,
            is_holiday: false,
        }
    }

    fn poi(id: &str) -> Poi {
        Poi {
            id: id.into(),
            name: id.into(),
            lat: 0.0,
            lng: 0.0,
            tags: vec![],
            opening_hours: None,
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

    fn stop(id: &str, start: u32, end: u32) -> PlannedStop {
        PlannedStop {
            kind: StopKind::Poi,
            id: id.into(),
            name: id.into(),
            start_min: start,
            end_min: end,
            lat: 0.0,
            lng: 0.0,
            transit_in: Some(seg()),
            notes: None,
        }
    }

    #[test]
    fn shift_earlier_clamps_at_zero_and_flags_the_clamp() {
        let base = DaySchedule {
            stops: vec![stop("p1", 30, 90), stop("p2", 100, 160)],
            metrics: DayMetrics::default(),
        };
        let candidate = shift_earlier(&base, "p1", 35.0).unwrap();
        assert_eq!(candidate.schedule.stops[0].start_min, 0);
        assert!(candidate.warnings.iter().any(|w| w == "SHIFT_CLAMPED"));
    }

    #[test]
    fn shift_earlier_rejects_a_large_shift_that_zeroes_the_first_stop() {
        let base = DaySchedule {
            stops: vec![stop("p1", 30, 90), stop("p2", 100, 160)],
            metrics: DayMetrics::default(),
        };
        assert!(shift_earlier(&base, "p1", 9999.0).is_none());
    }

    #[test]
    fn winner_selection_admits_clear_improvement() {
        let base_report = RobustnessReport {
            on_time_prob: 0.7,
            overtime_p90_min: 20.0,
            hp_end_p10: 30.0,
            cost_p90: 50.0,
            time_window_miss_prob: 0.18,
            window_wait_prob: 0.2,
            per_poi: vec![],
            completion: crate::models::robustness::CompletionStats {
                completed_poi_mean: 3.0,
                completed_poi_p10: 2.0,
                completion_rate_mean: 0.8,
                completion_rate_p10: 0.68,
            },
            risk_level: RiskLevel::Medium,
            suggestions: vec![],
            samples: 300,
            seed: 1,
        };

        let mut improved = base_report.clone();
        improved.time_window_miss_prob = 0.06;
        improved.completion.completion_rate_p10 = 0.82;
        improved.risk_level = RiskLevel::Low;

        let candidate = WhatIfCandidate {
            candidate_id: "SHIFT:poi-1:35".to_string(),
            action: ActionKind::ShiftEarlier,
            target_poi_id: "poi-1".to_string(),
            schedule: DaySchedule {
                stops: vec![],
                metrics: DayMetrics::default(),
            },
            report: improved,
            delta: DeltaSummary {
                miss_delta_pp: 12.0,
                wait_delta_pp: 0.0,
                completion_p10_delta_pp: 14.0,
                on_time_delta_pp: 5.0,
            },
            impact: ImpactCost::default(),
            severity: Severity::Low,
            confidence: Confidence::High,
            explain_top_drivers: vec![],
            warnings: vec![],
            seed: 1,
        };

        let winner = select_winner(&base_report, &[candidate]);
        assert_eq!(winner, Some("SHIFT:poi-1:35".to_string()));
    }

    #[test]
    fn winner_selection_rejects_regressing_candidates() {
        let base_report = RobustnessReport {
            on_time_prob: 0.8,
            overtime_p90_min: 10.0,
            hp_end_p10: 40.0,
            cost_p90: 50.0,
            time_window_miss_prob: 0.05,
            window_wait_prob: 0.05,
            per_poi: vec![],
            completion: crate::models::robustness::CompletionStats {
                completed_poi_mean: 3.0,
                completed_poi_p10: 3.0,
                completion_rate_mean: 0.95,
                completion_rate_p10: 0.9,
            },
            risk_level: RiskLevel::Low,
            suggestions: vec![],
            samples: 300,
            seed: 1,
        };

        let mut regressed = base_report.clone();
        regressed.time_window_miss_prob = 0.07;

        let candidate = WhatIfCandidate {
            candidate_id: "SHIFT:poi-1:10".to_string(),
            action: ActionKind::ShiftEarlier,
            target_poi_id: "poi-1".to_string(),
            schedule: DaySchedule {
                stops: vec![],
                metrics: DayMetrics::default(),
            },
            report: regressed,
            delta: DeltaSummary {
                miss_delta_pp: -2.0,
                wait_delta_pp: 0.0,
                completion_p10_delta_pp: 0.0,
                on_time_delta_pp: 0.0,
            },
            impact: ImpactCost::default(),
            severity: Severity::Low,
            confidence: Confidence::Low,
            explain_top_drivers: vec![],
            warnings: vec![],
            seed: 1,
        };

        assert_eq!(select_winner(&base_report, &[candidate]), None);
    }
}
