//! Distance and travel-time matrices for one optimization call
//!
//! Index 0 is the depot, indices 1..=N are the stops in input order. The
//! routing provider is asked for the sequential legs depot → stop 1 → … →
//! stop N → depot only; every other pair is mirrored from a known leg or
//! estimated geodesically.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::defaults::DEFAULT_MAX_WAYPOINTS;
use crate::services::geo;
use crate::services::routing::{RouteLeg, RoutingService};
use crate::types::{Coordinates, Depot, Stop};

/// Where the matrix entries came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixSource {
    /// Sequential legs from the routing provider, remaining pairs estimated
    Provider,
    /// Everything estimated from great-circle distance
    Estimated,
}

impl MatrixSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            MatrixSource::Provider => "provider",
            MatrixSource::Estimated => "estimated",
        }
    }
}

/// Distance and time matrices between locations
#[derive(Debug, Clone)]
pub struct DistanceTimeMatrices {
    /// Distance in meters [i][j] from location i to location j
    pub distances: Vec<Vec<u64>>,
    /// Duration in seconds [i][j] from location i to location j
    pub durations: Vec<Vec<u64>>,
    /// Number of locations
    pub size: usize,
    pub source: MatrixSource,
}

impl DistanceTimeMatrices {
    /// Get distance from location i to location j in meters
    pub fn distance(&self, from: usize, to: usize) -> u64 {
        self.distances[from][to]
    }

    /// Get duration from location i to location j in seconds
    pub fn duration(&self, from: usize, to: usize) -> u64 {
        self.durations[from][to]
    }

    /// Full geodesic estimate for the given points
    pub fn estimated(points: &[Coordinates]) -> Self {
        let n = points.len();
        let mut distances = vec![vec![0u64; n]; n];
        let mut durations = vec![vec![0u64; n]; n];

        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let estimate = geo::estimate_travel(&points[i], &points[j]);
                    distances[i][j] = estimate.distance_meters;
                    durations[i][j] = estimate.duration_seconds;
                }
            }
        }

        Self {
            distances,
            durations,
            size: n,
            source: MatrixSource::Estimated,
        }
    }

    /// Sequential legs populate (k, k+1) and the closing leg (N, 0); the rest
    /// is mirrored from a leg or estimated.
    ///
    /// `legs` must hold exactly `points.len()` entries.
    pub fn from_sequential_legs(points: &[Coordinates], legs: &[RouteLeg]) -> Self {
        let n = points.len();
        let mut distances = vec![vec![0u64; n]; n];
        let mut durations = vec![vec![0u64; n]; n];
        let mut from_leg = vec![vec![false; n]; n];

        for (k, leg) in legs.iter().enumerate() {
            let (from, to) = (k, (k + 1) % n);
            if from == to {
                continue;
            }
            distances[from][to] = leg.distance_meters;
            durations[from][to] = leg.duration_seconds;
            from_leg[from][to] = true;
        }

        for i in 0..n {
            for j in 0..n {
                if i == j || from_leg[i][j] {
                    continue;
                }
                if from_leg[j][i] {
                    distances[i][j] = distances[j][i];
                    durations[i][j] = durations[j][i];
                } else {
                    let estimate = geo::estimate_travel(&points[i], &points[j]);
                    distances[i][j] = estimate.distance_meters;
                    durations[i][j] = estimate.duration_seconds;
                }
            }
        }

        Self {
            distances,
            durations,
            size: n,
            source: MatrixSource::Provider,
        }
    }
}

/// Builds the matrices, preferring the routing provider
#[derive(Clone)]
pub struct MatrixBuilder {
    provider: Option<Arc<dyn RoutingService>>,
    max_waypoints: usize,
}

impl Default for MatrixBuilder {
    fn default() -> Self {
        Self::estimating()
    }
}

impl MatrixBuilder {
    pub fn new(provider: Option<Arc<dyn RoutingService>>, max_waypoints: usize) -> Self {
        Self {
            provider,
            max_waypoints,
        }
    }

    /// Builder that never calls a provider
    pub fn estimating() -> Self {
        Self::new(None, DEFAULT_MAX_WAYPOINTS)
    }

    /// Build matrices for depot + stops. Never fails: any provider trouble
    /// degrades to geodesic estimation.
    pub async fn build(&self, depot: &Depot, stops: &[Stop]) -> DistanceTimeMatrices {
        let mut points = Vec::with_capacity(stops.len() + 1);
        points.push(depot.coordinates);
        points.extend(stops.iter().map(|s| s.coordinates));

        if stops.is_empty() {
            return DistanceTimeMatrices::estimated(&points);
        }

        let Some(provider) = &self.provider else {
            debug!("No routing provider configured, estimating {} locations", points.len());
            return DistanceTimeMatrices::estimated(&points);
        };

        if stops.len() > self.max_waypoints {
            warn!(
                "{} stops exceed the {} waypoint ceiling of {}, using estimated matrix",
                stops.len(),
                self.max_waypoints,
                provider.name()
            );
            return DistanceTimeMatrices::estimated(&points);
        }

        // depot → stops… → depot
        let mut waypoints = points.clone();
        waypoints.push(depot.coordinates);

        match provider.route_legs(&waypoints).await {
            Ok(legs) if legs.len() == points.len() => {
                info!("Built travel matrix from {} legs of {}", legs.len(), provider.name());
                DistanceTimeMatrices::from_sequential_legs(&points, &legs)
            }
            Ok(legs) if legs.is_empty() => {
                warn!("{} returned no legs, using estimated matrix", provider.name());
                DistanceTimeMatrices::estimated(&points)
            }
            Ok(legs) => {
                warn!(
                    "{} returned {} legs, expected {}; using estimated matrix",
                    provider.name(),
                    legs.len(),
                    points.len()
                );
                DistanceTimeMatrices::estimated(&points)
            }
            Err(e) => {
                warn!("{} failed: {:#}. Using estimated matrix.", provider.name(), e);
                DistanceTimeMatrices::estimated(&points)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::routing::MockRoutingService;

    fn depot() -> Depot {
        Depot {
            id: None,
            coordinates: Coordinates { lat: 50.0755, lng: 14.4378 },
        }
    }

    fn stops() -> Vec<Stop> {
        vec![
            Stop::new("a", "A", Coordinates::new(50.10, 14.40)),
            Stop::new("b", "B", Coordinates::new(50.05, 14.50)),
            Stop::new("c", "C", Coordinates::new(50.02, 14.35)),
        ]
    }

    fn assert_zero_diagonal(matrices: &DistanceTimeMatrices) {
        for i in 0..matrices.size {
            assert_eq!(matrices.distance(i, i), 0);
            assert_eq!(matrices.duration(i, i), 0);
        }
    }

    #[tokio::test]
    async fn test_no_stops_gives_single_cell() {
        let builder = MatrixBuilder::new(Some(Arc::new(MockRoutingService::new())), 25);
        let matrices = builder.build(&depot(), &[]).await;

        assert_eq!(matrices.size, 1);
        assert_eq!(matrices.distances, vec![vec![0]]);
    }

    #[tokio::test]
    async fn test_estimated_without_provider() {
        let matrices = MatrixBuilder::estimating().build(&depot(), &stops()).await;

        assert_eq!(matrices.size, 4);
        assert_eq!(matrices.source, MatrixSource::Estimated);
        assert_zero_diagonal(&matrices);
        // geodesic estimate is symmetric
        assert_eq!(matrices.distance(1, 3), matrices.distance(3, 1));
        assert!(matrices.distance(0, 1) > 0);
    }

    #[tokio::test]
    async fn test_provider_legs_fill_sequential_entries() {
        let provider = Arc::new(MockRoutingService::new());
        let builder = MatrixBuilder::new(Some(provider.clone()), 25);
        let matrices = builder.build(&depot(), &stops()).await;

        assert_eq!(matrices.source, MatrixSource::Provider);
        assert_zero_diagonal(&matrices);

        let mut waypoints = vec![depot().coordinates];
        waypoints.extend(stops().iter().map(|s| s.coordinates));
        waypoints.push(depot().coordinates);
        let legs = provider.route_legs(&waypoints).await.unwrap();

        assert_eq!(matrices.distance(0, 1), legs[0].distance_meters);
        assert_eq!(matrices.duration(1, 2), legs[1].duration_seconds);
        assert_eq!(matrices.distance(2, 3), legs[2].distance_meters);
        assert_eq!(matrices.duration(3, 0), legs[3].duration_seconds);

        // mirrored
        assert_eq!(matrices.distance(1, 0), legs[0].distance_meters);
        assert_eq!(matrices.duration(2, 1), legs[1].duration_seconds);
        assert_eq!(matrices.distance(0, 3), legs[3].distance_meters);

        // neither leg nor mirror: estimated
        let estimate = geo::estimate_travel(&stops()[0].coordinates, &stops()[2].coordinates);
        assert_eq!(matrices.distance(1, 3), estimate.distance_meters);
        assert_eq!(matrices.duration(1, 3), estimate.duration_seconds);
    }

    #[tokio::test]
    async fn test_provider_failure_degrades_to_estimate() {
        let builder = MatrixBuilder::new(Some(Arc::new(MockRoutingService::unavailable())), 25);
        let matrices = builder.build(&depot(), &stops()).await;

        assert_eq!(matrices.source, MatrixSource::Estimated);
        let expected = DistanceTimeMatrices::estimated(&{
            let mut points = vec![depot().coordinates];
            points.extend(stops().iter().map(|s| s.coordinates));
            points
        });
        assert_eq!(matrices.distances, expected.distances);
        assert_eq!(matrices.durations, expected.durations);
    }

    #[tokio::test]
    async fn test_waypoint_ceiling_skips_provider() {
        let builder = MatrixBuilder::new(Some(Arc::new(MockRoutingService::new())), 2);
        let matrices = builder.build(&depot(), &stops()).await;
        assert_eq!(matrices.source, MatrixSource::Estimated);
    }

    #[test]
    fn test_single_stop_legs() {
        let points = vec![Coordinates::new(50.0, 14.0), Coordinates::new(50.1, 14.1)];
        let legs = vec![
            RouteLeg { distance_meters: 15_000, duration_seconds: 900 },
            RouteLeg { distance_meters: 16_000, duration_seconds: 960 },
        ];
        let matrices = DistanceTimeMatrices::from_sequential_legs(&points, &legs);

        assert_eq!(matrices.distance(0, 1), 15_000);
        assert_eq!(matrices.distance(1, 0), 16_000);
        assert_eq!(matrices.duration(1, 0), 960);
    }
}
