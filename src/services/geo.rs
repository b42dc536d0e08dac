//! Geographic calculations

use crate::types::Coordinates;

/// Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Road distance coefficient (straight line to road)
pub const ROAD_COEFFICIENT: f64 = 1.3;

/// Speed buckets for travel time estimation: (distance below km, speed km/h).
/// Short hops crawl through city streets, long legs reach main roads.
const SPEED_BUCKETS: [(f64, f64); 4] = [(1.0, 15.0), (3.0, 25.0), (8.0, 40.0), (15.0, 55.0)];

const OPEN_ROAD_SPEED_KMH: f64 = 70.0;

/// Estimated distance and travel time of a single leg
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TravelEstimate {
    pub distance_meters: u64,
    pub duration_seconds: u64,
}

/// Calculate Haversine distance between two points in kilometers
pub fn haversine_distance(from: &Coordinates, to: &Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lng - from.lng).to_radians();

    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Estimate road distance from straight-line distance
pub fn road_distance(from: &Coordinates, to: &Coordinates) -> f64 {
    haversine_distance(from, to) * ROAD_COEFFICIENT
}

/// Average speed expected over a leg of the given road distance
pub fn estimated_speed_kmh(road_distance_km: f64) -> f64 {
    SPEED_BUCKETS
        .iter()
        .find(|(below_km, _)| road_distance_km < *below_km)
        .map(|(_, speed)| *speed)
        .unwrap_or(OPEN_ROAD_SPEED_KMH)
}

/// Estimate travel time in minutes
pub fn travel_time_minutes(from: &Coordinates, to: &Coordinates) -> f64 {
    let distance = road_distance(from, to);
    (distance / estimated_speed_kmh(distance)) * 60.0
}

/// Estimate a leg when no routing data is available
pub fn estimate_travel(from: &Coordinates, to: &Coordinates) -> TravelEstimate {
    let distance_km = road_distance(from, to);
    let hours = distance_km / estimated_speed_kmh(distance_km);

    TravelEstimate {
        distance_meters: (distance_km * 1000.0).round() as u64,
        duration_seconds: (hours * 3600.0).round() as u64,
    }
}
