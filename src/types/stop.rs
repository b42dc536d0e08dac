//! Stop, depot and time window types

use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both components finite and inside the WGS84 range
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Ordering hint for a stop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    #[default]
    #[serde(alias = "Auto", alias = "AUTO")]
    Auto,
    #[serde(alias = "First", alias = "FIRST")]
    First,
    #[serde(alias = "Last", alias = "LAST")]
    Last,
}

impl OrderType {
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderType::Auto => "auto",
            OrderType::First => "first",
            OrderType::Last => "last",
        }
    }
}

/// Delivery time window, on the same clock as the route start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn width(&self) -> Duration {
        self.end - self.start
    }

    /// `end <= start`
    pub fn is_malformed(&self) -> bool {
        self.end <= self.start
    }

    pub fn ends_before(&self, route_start: NaiveDateTime) -> bool {
        self.end < route_start
    }

    /// A window can only be satisfied if it is non-empty and not already over
    /// when the route starts.
    pub fn is_satisfiable(&self, route_start: NaiveDateTime) -> bool {
        !self.is_malformed() && !self.ends_before(route_start)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.date() == self.end.date() {
            write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
        } else {
            write!(
                f,
                "{} - {}",
                self.start.format("%Y-%m-%d %H:%M"),
                self.end.format("%Y-%m-%d %H:%M")
            )
        }
    }
}

/// A customer visit to be placed on the route
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub coordinates: Coordinates,
    pub service_duration_minutes: u32,
    pub time_window: Option<TimeWindow>,
    pub customer_id: Option<Uuid>,
    #[serde(default)]
    pub order_type: OrderType,
}

impl Stop {
    pub fn new(id: impl Into<String>, name: impl Into<String>, coordinates: Coordinates) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            coordinates,
            service_duration_minutes: crate::defaults::DEFAULT_SERVICE_DURATION_MINUTES,
            time_window: None,
            customer_id: None,
            order_type: OrderType::Auto,
        }
    }

    pub fn with_service_minutes(mut self, minutes: u32) -> Self {
        self.service_duration_minutes = minutes;
        self
    }

    pub fn with_time_window(mut self, window: TimeWindow) -> Self {
        self.time_window = Some(window);
        self
    }

    pub fn with_order_type(mut self, order_type: OrderType) -> Self {
        self.order_type = order_type;
        self
    }
}

/// Start and end point of the route
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Depot {
    pub id: Option<Uuid>,
    pub coordinates: Coordinates,
}

/// Clock reference and duration cap shared by every time window of a route
#[derive(Debug, Clone, Copy)]
pub struct RouteContext {
    pub route_start: NaiveDateTime,
    pub max_route_duration: Duration,
}

impl RouteContext {
    pub fn new(route_start: NaiveDateTime, max_route_duration: Duration) -> Self {
        Self {
            route_start,
            max_route_duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_window_display_same_day() {
        let tw = TimeWindow::new(at(9, 0), at(9, 5));
        assert_eq!(tw.to_string(), "09:00-09:05");
    }

    #[test]
    fn test_window_display_across_days() {
        let end = NaiveDate::from_ymd_opt(2026, 3, 3)
            .unwrap()
            .and_hms_opt(1, 30, 0)
            .unwrap();
        let tw = TimeWindow::new(at(22, 0), end);
        assert_eq!(tw.to_string(), "2026-03-02 22:00 - 2026-03-03 01:30");
    }

    #[test]
    fn test_window_satisfiability() {
        let route_start = at(8, 0);

        assert!(TimeWindow::new(at(9, 0), at(10, 0)).is_satisfiable(route_start));
        // end before start
        assert!(!TimeWindow::new(at(10, 0), at(9, 0)).is_satisfiable(route_start));
        // empty window
        assert!(!TimeWindow::new(at(10, 0), at(10, 0)).is_satisfiable(route_start));
        // already over when the route starts
        assert!(!TimeWindow::new(at(6, 0), at(7, 0)).is_satisfiable(route_start));
        // ends exactly at route start is still reachable
        assert!(TimeWindow::new(at(7, 0), at(8, 0)).is_satisfiable(route_start));
    }

    #[test]
    fn test_order_type_deserializes_both_cases() {
        let lower: OrderType = serde_json::from_str("\"first\"").unwrap();
        let pascal: OrderType = serde_json::from_str("\"Last\"").unwrap();
        assert_eq!(lower, OrderType::First);
        assert_eq!(pascal, OrderType::Last);
    }

    #[test]
    fn test_coordinates_validity() {
        assert!(Coordinates::new(50.0755, 14.4378).is_valid());
        assert!(!Coordinates::new(f64::NAN, 14.0).is_valid());
        assert!(!Coordinates::new(91.0, 14.0).is_valid());
    }
}
