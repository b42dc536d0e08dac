//! Routing provider for real travel legs
//!
//! Uses Valhalla for production, mock for tests.

mod valhalla;

pub use valhalla::{ValhallaClient, ValhallaConfig};

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::Coordinates;

/// One leg between two consecutive waypoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteLeg {
    /// Distance in meters
    pub distance_meters: u64,
    /// Duration in seconds
    pub duration_seconds: u64,
}

/// Routing service trait for abstraction (Valhalla, mock, etc.)
#[async_trait]
pub trait RoutingService: Send + Sync {
    /// Travel legs along the given waypoints in order.
    /// `waypoints.len() - 1` legs are expected back.
    async fn route_legs(&self, waypoints: &[Coordinates]) -> Result<Vec<RouteLeg>>;

    /// Get service name for logging
    fn name(&self) -> &str;
}

/// Mock routing service for tests
/// Uses Haversine distance × coefficient at a flat average speed
pub struct MockRoutingService {
    /// Coefficient for converting straight-line to road distance (default: 1.3)
    road_coefficient: f64,
    /// Average speed in km/h for time estimation (default: 40)
    average_speed_kmh: f64,
    /// Reply with an error instead of legs
    unavailable: bool,
}

impl Default for MockRoutingService {
    fn default() -> Self {
        Self {
            road_coefficient: 1.3,
            average_speed_kmh: 40.0,
            unavailable: false,
        }
    }
}

impl MockRoutingService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(road_coefficient: f64, average_speed_kmh: f64) -> Self {
        Self {
            road_coefficient,
            average_speed_kmh,
            unavailable: false,
        }
    }

    /// A provider that fails every request
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl RoutingService for MockRoutingService {
    async fn route_legs(&self, waypoints: &[Coordinates]) -> Result<Vec<RouteLeg>> {
        use crate::services::geo::haversine_distance;

        if self.unavailable {
            anyhow::bail!("mock routing service is unavailable");
        }

        let legs = waypoints
            .windows(2)
            .map(|pair| {
                let road_km = haversine_distance(&pair[0], &pair[1]) * self.road_coefficient;
                RouteLeg {
                    distance_meters: (road_km * 1000.0) as u64,
                    duration_seconds: (road_km / self.average_speed_kmh * 3600.0) as u64,
                }
            })
            .collect();

        Ok(legs)
    }

    fn name(&self) -> &str {
        "MockRouting"
    }
}

/// Create routing service with automatic Valhalla detection
///
/// Returns `None` when Valhalla is not configured or does not answer its
/// status endpoint, in which case matrices are estimated geodesically.
pub async fn create_routing_service_with_fallback(
    valhalla_url: Option<String>,
    timeout_seconds: u64,
) -> Option<Arc<dyn RoutingService>> {
    use tracing::{info, warn};

    let Some(url) = valhalla_url else {
        info!("Valhalla not configured, travel matrices will be estimated");
        return None;
    };

    let config = ValhallaConfig {
        base_url: url.clone(),
        timeout_seconds,
    };

    match check_valhalla_health(&url).await {
        Ok(()) => match ValhallaClient::new(config) {
            Ok(client) => {
                info!("Valhalla routing service available at {}", url);
                Some(Arc::new(client))
            }
            Err(e) => {
                warn!("Failed to create Valhalla client: {}. Using estimation.", e);
                None
            }
        },
        Err(e) => {
            warn!("Valhalla not available at {}: {}. Using estimation.", url, e);
            None
        }
    }
}

/// Check if Valhalla is healthy by making a simple status request
async fn check_valhalla_health(base_url: &str) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()?;

    let url = format!("{}/status", base_url);
    let response = client.get(&url).send().await?;

    if response.status().is_success() {
        Ok(())
    } else {
        anyhow::bail!("Valhalla returned status {}", response.status())
    }
}
