//! Point-of-interest and opening-hours domain types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single weekly or dated interval during which a [`Poi`] is enterable.
///
/// `dayOfWeek` follows the wire convention of 0 = Sunday .. 6 = Saturday. A window with
/// `holiday_dates` set applies only on those exact ISO dates regardless of weekday; a window
/// with `holidays_only` set applies on any date flagged as a holiday by the caller's calendar
/// (callers pass holiday status in explicitly, see [`DateContext`]).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OpeningWindow {
    pub day_of_week: Option<u8>,
    pub start_min: u16,
    pub end_min: u16,
    #[serde(default)]
    pub holiday_dates: Vec<NaiveDate>,
    #[serde(default)]
    pub holidays_only: bool,
}

/// Full opening-hours descriptor for a [`Poi`].
///
/// A POI with no descriptor at all is treated as always open (see [`Poi::opening_hours`]).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct OpeningHours {
    pub windows: Vec<OpeningWindow>,
    /// Last-entry minute-of-day, applied to every window unless a window overrides it.
    pub last_entry_min: Option<u16>,
    /// Dates on which the POI is closed outright, overriding any window.
    #[serde(default)]
    pub closed_dates: Vec<NaiveDate>,
}

/// Context needed to evaluate opening hours and feasibility at a point in time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct DateContext {
    pub date: NaiveDate,
    /// 0 = Sunday .. 6 = Saturday, matching the wire contract.
    pub day_of_week: u8,
    pub is_holiday: bool,
}

/// A candidate point of interest.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Poi {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub opening_hours: Option<OpeningHours>,
    pub avg_visit_min: f64,
    pub visit_min_std: Option<f64>,
    pub queue_min_mean: Option<f64>,
    pub queue_min_std: Option<f64>,
    #[serde(default)]
    pub wheelchair_access: bool,
    #[serde(default)]
    pub stairs_required: bool,
    #[serde(default)]
    pub seating_available: bool,
    #[serde(default)]
    pub restroom_nearby: bool,
    /// 0 (not sensitive) .. 3 (very sensitive).
    #[serde(default)]
    pub weather_sensitivity: u8,
    pub crowding_key: Option<String>,
}

impl Poi {
    /// Fraction of `avg_visit_min` used when `visit_min_std` is absent.
    pub const DEFAULT_VISIT_STD_RATIO: f64 = 0.25;
    /// Fraction of `queue_min_mean` used when `queue_min_std` is absent.
    pub const DEFAULT_QUEUE_STD_RATIO: f64 = 0.35;

    pub fn visit_std(&self) -> f64 {
        self.visit_min_std
            .unwrap_or(self.avg_visit_min * Self::DEFAULT_VISIT_STD_RATIO)
    }

    pub fn queue_mean(&self) -> f64 {
        self.queue_min_mean.unwrap_or(0.0)
    }

    pub fn queue_std(&self) -> f64 {
        self.queue_min_std
            .unwrap_or(self.queue_mean() * Self::DEFAULT_QUEUE_STD_RATIO)
    }

    pub fn is_weather_sensitive(&self) -> bool {
        self.weather_sensitivity > 0 && !self.tags.iter().any(|t| t == "indoor")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poi(avg_visit: f64) -> Poi {
        Poi {
            id: "p1".into(),
            name: "Test POI".into(),
            lat: 0.0,
            lng: 0.0,
            tags: vec![],
            opening_hours: None,
            avg_visit_min: avg_visit,
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
    fn default_visit_std_is_fraction_of_mean() {
        let p = poi(60.0);
        assert_eq!(p.visit_std(), 15.0);
    }

    #[test]
    fn explicit_visit_std_is_respected() {
        let mut p = poi(60.0);
        p.visit_min_std = Some(5.0);
        assert_eq!(p.visit_std(), 5.0);
    }
}
