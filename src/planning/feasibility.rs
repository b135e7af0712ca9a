//! Feasibility Service: "may this POI be entered now?" with reason and wait.

use crate::models::poi::{DateContext, Poi};
use crate::models::policy::Policy;
use crate::models::whatif::{ReplanEvent, ReplanEventKind};
use crate::planning::time::probe_opening_hours;

/// Maximum acceptable wait before a POI is treated as infeasible rather than "worth waiting
/// for".
pub const MAX_ACCEPTABLE_WAIT_MIN: u16 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfeasibleReason {
    WheelchairRequired,
    StairsForbidden,
    ClosedDate,
    NoOpenWindow,
    PastLastEntry,
    ClosedRestOfDay,
    WaitTooLong,
}

impl InfeasibleReason {
    pub fn code(self) -> &'static str {
        match self {
            InfeasibleReason::WheelchairRequired => "POI_NOT_WHEELCHAIR_ACCESSIBLE",
            InfeasibleReason::StairsForbidden => "POI_REQUIRES_STAIRS",
            InfeasibleReason::ClosedDate => "CLOSED_DATE",
            InfeasibleReason::NoOpenWindow => "NO_OPEN_WINDOW",
            InfeasibleReason::PastLastEntry => "PAST_LAST_ENTRY",
            InfeasibleReason::ClosedRestOfDay => "CLOSED_REST_OF_DAY",
            InfeasibleReason::WaitTooLong => "WAIT_TOO_LONG",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FeasibilityResult {
    pub feasible: bool,
    pub reason: Option<InfeasibleReason>,
    pub wait_min: u16,
    pub in_open_window: bool,
    pub past_last_entry: bool,
    pub is_closed_date: bool,
}

/// Evaluate whether `poi` may be entered at `now_min` under `policy`, short-circuiting at the
/// first failing check in decision order.
pub fn is_poi_feasible(
    poi: &Poi,
    now_min: u16,
    policy: &Policy,
    ctx: DateContext,
) -> FeasibilityResult {
    if policy.hard_constraints.require_wheelchair_access && !poi.wheelchair_access {
        return FeasibilityResult {
            feasible: false,
            reason: Some(InfeasibleReason::WheelchairRequired),
            wait_min: 0,
            in_open_window: false,
            past_last_entry: false,
            is_closed_date: false,
        };
    }
    if policy.hard_constraints.forbid_stairs && poi.stairs_required {
        return FeasibilityResult {
            feasible: false,
            reason: Some(InfeasibleReason::StairsForbidden),
            wait_min: 0,
            in_open_window: false,
            past_last_entry: false,
            is_closed_date: false,
        };
    }

    let Some(hours) = &poi.opening_hours else {
        return FeasibilityResult {
            feasible: true,
            reason: None,
            wait_min: 0,
            in_open_window: true,
            past_last_entry: false,
            is_closed_date: false,
        };
    };

    let probe = probe_opening_hours(hours, now_min, ctx);

    if probe.is_closed_date {
        return FeasibilityResult {
            feasible: false,
            reason: Some(InfeasibleReason::ClosedDate),
            wait_min: 0,
            in_open_window: false,
            past_last_entry: false,
            is_closed_date: true,
        };
    }

    if !probe.has_applicable_window {
        return FeasibilityResult {
            feasible: false,
            reason: Some(InfeasibleReason::NoOpenWindow),
            wait_min: 0,
            in_open_window: false,
            past_last_entry: false,
            is_closed_date: false,
        };
    }

    if probe.in_open_window {
        return FeasibilityResult {
            feasible: true,
            reason: None,
            wait_min: 0,
            in_open_window: true,
            past_last_entry: false,
            is_closed_date: false,
        };
    }

    if probe.past_last_entry {
        return FeasibilityResult {
            feasible: false,
            reason: Some(InfeasibleReason::PastLastEntry),
            wait_min: 0,
            in_open_window: false,
            past_last_entry: true,
            is_closed_date: false,
        };
    }

    match probe.next_open_in_min {
        None => FeasibilityResult {
            feasible: false,
            reason: Some(InfeasibleReason::ClosedRestOfDay),
            wait_min: 0,
            in_open_window: false,
            past_last_entry: false,
            is_closed_date: false,
        },
        Some(wait) if wait > MAX_ACCEPTABLE_WAIT_MIN => FeasibilityResult {
            feasible: false,
            reason: Some(InfeasibleReason::WaitTooLong),
            wait_min: wait,
            in_open_window: false,
            past_last_entry: false,
            is_closed_date: false,
        },
        Some(wait) => FeasibilityResult {
            feasible: true,
            reason: None,
            wait_min: wait,
            in_open_window: false,
            past_last_entry: false,
            is_closed_date: false,
        },
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WaitEstimate {
    pub wait_min: Option<u16>,
    pub reason: Option<InfeasibleReason>,
}

/// Estimate the wait for `poi` at `now_min`, also accounting for a pending `POI_CLOSED`
/// replan event that has already taken effect.
pub fn estimate_wait(
    poi: &Poi,
    now_min: u16,
    ctx: DateContext,
    event: Option<&ReplanEvent>,
) -> WaitEstimate {
    if let Some(ev) = event {
        if ev.kind == ReplanEventKind::PoiClosed
            && ev.poi_id.as_deref() == Some(poi.id.as_str())
            && ev.effective_from_min.is_some_and(|from| from <= now_min as u32)
        {
            return WaitEstimate {
                wait_min: None,
                reason: Some(InfeasibleReason::ClosedRestOfDay),
            };
        }
    }

    let Some(hours) = &poi.opening_hours else {
        return WaitEstimate {
            wait_min: Some(0),
            reason: None,
        };
    };
    let probe = probe_opening_hours(hours, now_min, ctx);
    if probe.is_closed_date {
        return WaitEstimate {
            wait_min: None,
            reason: Some(InfeasibleReason::ClosedDate),
        };
    }
    if !probe.has_applicable_window {
        return WaitEstimate {
            wait_min: None,
            reason: Some(InfeasibleReason::NoOpenWindow),
        };
    }
    if probe.in_open_window {
        return WaitEstimate {
            wait_min: Some(0),
            reason: None,
        };
    }
    match probe.next_open_in_min {
        Some(wait) => WaitEstimate {
            wait_min: Some(wait),
            reason: None,
        },
        None => WaitEstimate {
            wait_min: None,
            reason: Some(InfeasibleReason::ClosedRestOfDay),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::poi::{OpeningHours, OpeningWindow};
    use crate::planning::policy::test_support::default_policy;
    use chrono::NaiveDate;

    fn mon() -> DateContext {
        DateContext {
            date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            day_of_week: 1,
            is_holiday: false,
        }
    }

    fn poi_with_hours() -> Poi {
        Poi {
            id: "poi-1".into(),
            name: "Museum".into(),
            lat: 0.0,
            lng: 0.0,
            tags: vec![],
            opening_hours: Some(OpeningHours {
                windows: vec![OpeningWindow {
                    day_of_week: Some(1),
                    start_min: 9 * 60,
                    end_min: 18 * 60,
                    holiday_dates: vec![],
                    holidays_only: false,
                }],
                last_entry_min: Some(17 * 60),
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

    #[test]
    fn scenario_table_from_spec() {
        let policy = default_policy();
        let poi = poi_with_hours();

        let r = is_poi_feasible(&poi, 9 * 60, &policy, mon());
        assert!(r.feasible && r.in_open_window);

        let r = is_poi_feasible(&poi, 8 * 60, &policy, mon());
        assert!(r.feasible);
        assert_eq!(r.wait_min, 60);
        assert!(!r.in_open_window);

        let r = is_poi_feasible(&poi, 17 * 60 + 30, &policy, mon());
        assert!(!r.feasible);
        assert_eq!(r.reason, Some(InfeasibleReason::PastLastEntry));

        let tue = DateContext {
            day_of_week: 2,
            ..mon()
        };
        let r = is_poi_feasible(&poi, 9 * 60, &policy, tue);
        assert!(!r.feasible);
        assert_eq!(r.reason, Some(InfeasibleReason::NoOpenWindow));
    }

    #[test]
    fn wheelchair_gate_rejects_before_checking_hours() {
        let mut policy = default_policy();
        policy.hard_constraints.require_wheelchair_access = true;
        let mut poi = poi_with_hours();
        poi.wheelchair_access = false;
        let r = is_poi_feasible(&poi, 9 * 60, &policy, mon());
        assert!(!r.feasible);
        assert_eq!(r.reason, Some(InfeasibleReason::WheelchairRequired));
    }

    #[test]
    fn no_hours_descriptor_is_always_feasible() {
        let policy = default_policy();
        let mut poi = poi_with_hours();
        poi.opening_hours = None;
        let r = is_poi_feasible(&poi, 3 * 60, &policy, mon());
        assert!(r.feasible);
    }
}
