//! Minutes-of-day arithmetic, haversine distance and opening-hour evaluation.

use crate::models::poi::{DateContext, OpeningHours, OpeningWindow};

const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Great-circle distance between two lat/lng points, in kilometers.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (lat1_rad, lat2_rad) = (lat1.to_radians(), lat2.to_radians());
    let dlat = lat2_rad - lat1_rad;
    let dlng = (lng2 - lng1).to_radians();
    let a = (dlat / 2.0).sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_KM * c
}

/// Whether `min` falls within `[start, end)` on a 1440-minute clock.
pub fn in_minute_range(min: u16, start: u16, end: u16) -> bool {
    min >= start && min < end
}

/// Why a window does or does not apply on a given date.
fn window_applies(window: &OpeningWindow, ctx: DateContext) -> bool {
    if !window.holiday_dates.is_empty() {
        return window.holiday_dates.contains(&ctx.date);
    }
    if window.holidays_only {
        return ctx.is_holiday;
    }
    match window.day_of_week {
        Some(dow) => dow == ctx.day_of_week,
        None => true,
    }
}

/// The set of windows applicable to `ctx`, in declaration order.
pub fn applicable_windows<'a>(
    hours: &'a OpeningHours,
    ctx: DateContext,
) -> Vec<&'a OpeningWindow> {
    hours
        .windows
        .iter()
        .filter(|w| window_applies(w, ctx))
        .collect()
}

/// Result of probing opening hours at a specific minute-of-day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowProbe {
    pub in_open_window: bool,
    pub past_last_entry: bool,
    pub is_closed_date: bool,
    pub has_applicable_window: bool,
    /// Minutes until the next applicable window opens, if any (only meaningful when
    /// `in_open_window` is false and a future window exists today).
    pub next_open_in_min: Option<u16>,
}

/// Evaluate a POI's opening-hours descriptor at `now_min` on the given date.
///
/// `hours` being `None` means "always open"; callers should special-case that
/// before calling this function if they want to skip the windowed logic entirely.
pub fn probe_opening_hours(hours: &OpeningHours, now_min: u16, ctx: DateContext) -> WindowProbe {
    if hours.closed_dates.contains(&ctx.date) {
        return WindowProbe {
            in_open_window: false,
            past_last_entry: false,
            is_closed_date: true,
            has_applicable_window: false,
            next_open_in_min: None,
        };
    }

    let windows = applicable_windows(hours, ctx);
    if windows.is_empty() {
        return WindowProbe {
            in_open_window: false,
            past_last_entry: false,
            is_closed_date: false,
            has_applicable_window: false,
            next_open_in_min: None,
        };
    }

    for w in &windows {
        if in_minute_range(now_min, w.start_min, w.end_min) {
            let last_entry = hours.last_entry_min.unwrap_or(w.end_min);
            let past_last_entry = now_min >= last_entry;
            return WindowProbe {
                in_open_window: !past_last_entry,
                past_last_entry,
                is_closed_date: false,
                has_applicable_window: true,
                next_open_in_min: Some(0),
            };
        }
    }

    let next_start = windows
        .iter()
        .map(|w| w.start_min)
        .filter(|&start| start > now_min)
        .min();

    WindowProbe {
        in_open_window: false,
        past_last_entry: false,
        is_closed_date: false,
        has_applicable_window: true,
        next_open_in_min: next_start.map(|start| start - now_min),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn mon() -> DateContext {
        DateContext {
            date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            day_of_week: 1,
            is_holiday: false,
        }
    }

    fn simple_hours() -> OpeningHours {
        OpeningHours {
            windows: vec![OpeningWindow {
                day_of_week: Some(1),
                start_min: 9 * 60,
                end_min: 18 * 60,
                holiday_dates: vec![],
                holidays_only: false,
            }],
            last_entry_min: Some(17 * 60),
            closed_dates: vec![],
        }
    }

    #[test]
    fn inside_window_before_last_entry_is_open() {
        let probe = probe_opening_hours(&simple_hours(), 9 * 60, mon());
        assert!(probe.in_open_window);
        assert!(!probe.past_last_entry);
    }

    #[test]
    fn before_window_reports_wait() {
        let probe = probe_opening_hours(&simple_hours(), 8 * 60, mon());
        assert!(!probe.in_open_window);
        assert_eq!(probe.next_open_in_min, Some(60));
    }

    #[test]
    fn past_last_entry_inside_window_is_flagged() {
        let probe = probe_opening_hours(&simple_hours(), 17 * 60 + 30, mon());
        assert!(probe.past_last_entry);
        assert!(!probe.in_open_window);
    }

    #[test]
    fn wrong_day_has_no_applicable_window() {
        let tue = DateContext {
            day_of_week: 2,
            ..mon()
        };
        let probe = probe_opening_hours(&simple_hours(), 9 * 60, tue);
        assert!(!probe.has_applicable_window);
    }

    #[test]
    fn haversine_zero_distance() {
        assert!(haversine_km(10.0, 20.0, 10.0, 20.0) < 1e-9);
    }

    #[test]
    fn haversine_known_distance_order_of_magnitude() {
        // Roughly Beijing to Shanghai, ~1060km.
        let km = haversine_km(39.9042, 116.4074, 31.2304, 121.4737);
        assert!((900.0..1200.0).contains(&km), "got {km}");
    }
}
