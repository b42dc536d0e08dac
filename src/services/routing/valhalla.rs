//! Valhalla routing engine client
//!
//! Valhalla API documentation:
//! https://valhalla.github.io/valhalla/api/turn-by-turn/api-reference/

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::Coordinates;
use super::{RouteLeg, RoutingService};

/// Valhalla client configuration
#[derive(Debug, Clone)]
pub struct ValhallaConfig {
    /// Base URL of Valhalla server (e.g., "http://localhost:8002")
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for ValhallaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8002".to_string(),
            timeout_seconds: crate::defaults::DEFAULT_VALHALLA_TIMEOUT_SECONDS,
        }
    }
}

impl ValhallaConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// Valhalla routing client
pub struct ValhallaClient {
    client: Client,
    config: ValhallaConfig,
}

impl ValhallaClient {
    pub fn new(config: ValhallaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// Build the route request for sequential legs
    fn build_route_request(&self, waypoints: &[Coordinates]) -> RouteRequest {
        let locations = waypoints
            .iter()
            .map(|c| ValhallaLocation {
                lat: c.lat,
                lon: c.lng,
                // 500m radius – geocoded coordinates may sit on a building
                // centroid rather than the road edge
                radius: Some(500),
            })
            .collect();

        RouteRequest {
            locations,
            costing: "auto".to_string(),
            units: "kilometers".to_string(),
            directions_type: "none".to_string(),
        }
    }
}

#[async_trait]
impl RoutingService for ValhallaClient {
    async fn route_legs(&self, waypoints: &[Coordinates]) -> Result<Vec<RouteLeg>> {
        if waypoints.len() < 2 {
            return Ok(vec![]);
        }

        let request = self.build_route_request(waypoints);
        let url = format!("{}/route", self.config.base_url);

        debug!("Requesting route legs from Valhalla for {} waypoints", waypoints.len());

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send route request to Valhalla")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Valhalla route returned error {}: {}", status, body);
        }

        let route_response: RouteResponse = response
            .json()
            .await
            .context("Failed to parse Valhalla route response")?;

        let legs = legs_from_response(&route_response);
        debug!("Received {} legs from Valhalla", legs.len());

        Ok(legs)
    }

    fn name(&self) -> &str {
        "Valhalla"
    }
}

fn legs_from_response(response: &RouteResponse) -> Vec<RouteLeg> {
    response
        .trip
        .legs
        .iter()
        .map(|leg| RouteLeg {
            // length is in kilometers with units="kilometers"
            distance_meters: (leg.summary.length * 1000.0).round().max(0.0) as u64,
            duration_seconds: leg.summary.time.round().max(0.0) as u64,
        })
        .collect()
}

// Valhalla API types

#[derive(Debug, Serialize, Clone)]
struct ValhallaLocation {
    lat: f64,
    lon: f64,
    /// Radius in meters for snapping to roads
    #[serde(skip_serializing_if = "Option::is_none")]
    radius: Option<u32>,
}

#[derive(Debug, Serialize)]
struct RouteRequest {
    locations: Vec<ValhallaLocation>,
    costing: String,
    units: String,
    directions_type: String,
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    trip: Trip,
}

#[derive(Debug, Deserialize)]
struct Trip {
    legs: Vec<Leg>,
}

#[derive(Debug, Deserialize)]
struct Leg {
    summary: LegSummary,
}

#[derive(Debug, Deserialize)]
struct LegSummary {
    /// Distance in kilometers
    length: f64,
    /// Time in seconds
    time: f64,
}
