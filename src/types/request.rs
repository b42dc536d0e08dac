//! Optimization request as received from the job layer

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::defaults::DEFAULT_MAX_ROUTE_DURATION_MINUTES;
use crate::error::EngineError;

use super::{Coordinates, Depot, OrderType, RouteContext, Stop, TimeWindow};

/// A stop as it appears on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestStop {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub service_time_minutes: u32,
    pub time_window_start: Option<NaiveDateTime>,
    pub time_window_end: Option<NaiveDateTime>,
    pub customer_id: Option<Uuid>,
    #[serde(default)]
    pub order_type: OrderType,
}

/// Input for a single optimization call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationRequest {
    pub depot_id: Option<Uuid>,
    pub depot_latitude: f64,
    pub depot_longitude: f64,
    pub stops: Vec<RequestStop>,
    pub route_start_time: NaiveDateTime,
    /// Cap on total elapsed route time, in minutes
    pub max_route_duration: Option<u32>,
}

/// Request split into the engine's domain types
#[derive(Debug, Clone)]
pub struct RouteInput {
    pub depot: Depot,
    pub stops: Vec<Stop>,
    pub context: RouteContext,
}

impl OptimizationRequest {
    /// Validate coordinates and convert into engine types.
    ///
    /// Time windows are passed through untouched even when malformed; the
    /// model builder turns those into unsatisfiable ranges. A window with only
    /// one bound is ignored.
    pub fn into_route_input(self) -> Result<RouteInput, EngineError> {
        let depot_coordinates = Coordinates::new(self.depot_latitude, self.depot_longitude);
        if !depot_coordinates.is_valid() {
            return Err(EngineError::InvalidRequest(format!(
                "depot coordinates ({}, {}) are out of range",
                self.depot_latitude, self.depot_longitude
            )));
        }

        let mut stops = Vec::with_capacity(self.stops.len());
        for stop in self.stops {
            let coordinates = Coordinates::new(stop.latitude, stop.longitude);
            if !coordinates.is_valid() {
                return Err(EngineError::InvalidRequest(format!(
                    "stop '{}' has invalid coordinates ({}, {})",
                    stop.name, stop.latitude, stop.longitude
                )));
            }

            let time_window = match (stop.time_window_start, stop.time_window_end) {
                (Some(start), Some(end)) => Some(TimeWindow::new(start, end)),
                (None, None) => None,
                _ => {
                    warn!("Stop '{}' has a half-open time window, ignoring it", stop.name);
                    None
                }
            };

            stops.push(Stop {
                id: stop.id,
                name: stop.name,
                coordinates,
                service_duration_minutes: stop.service_time_minutes,
                time_window,
                customer_id: stop.customer_id,
                order_type: stop.order_type,
            });
        }

        let max_minutes = self
            .max_route_duration
            .unwrap_or(DEFAULT_MAX_ROUTE_DURATION_MINUTES);

        Ok(RouteInput {
            depot: Depot {
                id: self.depot_id,
                coordinates: depot_coordinates,
            },
            stops,
            context: RouteContext::new(self.route_start_time, Duration::minutes(i64::from(max_minutes))),
        })
    }
}
