//! Adapter to build vrp-pragmatic inputs from a `RoutingModel`.
//!
//! Locations are model nodes, so the depot is location 0 and stop node `i`
//! is location `i`. Times are offsets from route start placed on a fixed
//! anchor date.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use tracing::debug;
use vrp_pragmatic::format::problem::Matrix;

use super::model::{RouteNode, RoutingModel, TimeRange, DEPOT};

pub const DEFAULT_PROFILE: &str = "car";
pub const DEFAULT_VEHICLE_ID: &str = "vehicle_1";
pub const DEFAULT_VEHICLE_TYPE: &str = "vehicle";

/// Reserved relation ids for the tour start and end
const DEPARTURE: &str = "departure";
const ARRIVAL: &str = "arrival";

const JOB_PREFIX: &str = "stop-";

/// 2026-01-01T00:00:00Z, the instant standing for route start
const ANCHOR_TIMESTAMP: i64 = 1_767_225_600;

pub fn job_id(node: usize) -> String {
    format!("{}{}", JOB_PREFIX, node)
}

/// Model node of a job id written by `job_id`
pub fn parse_job_id(id: &str) -> Option<usize> {
    id.strip_prefix(JOB_PREFIX)?.parse().ok()
}

/// A window some cumul inside the time dimension can satisfy
fn is_reachable(range: TimeRange, capacity: i64) -> bool {
    range.min <= range.max && range.max >= 0 && range.min <= capacity
}

/// Strict job sequences, one per chain of next-constraints. A chain hanging
/// off the route start opens with `departure`, one running into the route
/// end closes with `arrival`.
pub fn forced_sequences(model: &RoutingModel<'_>) -> Vec<Vec<String>> {
    let heads = std::iter::once(RouteNode::Start).chain(
        (1..model.node_count())
            .filter(|&node| model.forced_predecessor(node).is_none() && model.forced_successor(node).is_some())
            .map(RouteNode::Stop),
    );

    let mut sequences = Vec::new();
    for head in heads {
        let (mut jobs, mut current) = match head {
            RouteNode::Start => (vec![DEPARTURE.to_string()], DEPOT),
            RouteNode::Stop(node) => (vec![job_id(node)], node),
            RouteNode::End => continue,
        };

        for _ in 0..model.node_count() {
            match model.forced_successor(current) {
                Some(RouteNode::Stop(next)) => {
                    jobs.push(job_id(next));
                    current = next;
                }
                Some(RouteNode::End) => {
                    jobs.push(ARRIVAL.to_string());
                    break;
                }
                _ => break,
            }
        }

        if jobs.len() > 1 {
            sequences.push(jobs);
        }
    }
    sequences
}

/// Build pragmatic problem JSON: one job per reachable stop node, a single
/// vehicle whose shift spans the time dimension, and strict relations for
/// the ordering constraints. Service time is left out of the jobs because
/// transit is travel time only.
pub fn build_pragmatic_problem(model: &RoutingModel<'_>) -> Result<Value> {
    let capacity = model.time_dimension().capacity;

    let mut jobs = Vec::with_capacity(model.stop_count());
    for node in 1..model.node_count() {
        let mut place = json!({
            "location": { "index": node },
            "duration": 0,
        });

        if let Some(range) = model.time_window(node) {
            if !is_reachable(range, capacity) {
                debug!("Node {} has no reachable window, left out of the problem", node);
                continue;
            }
            place["times"] = json!([[
                format_offset(range.min.max(0))?,
                format_offset(range.max.min(capacity))?
            ]]);
        }

        jobs.push(json!({
            "id": job_id(node),
            "services": [{
                "places": [place]
            }]
        }));
    }

    let mut plan = json!({ "jobs": jobs });
    let relations: Vec<Value> = forced_sequences(model)
        .into_iter()
        .map(|jobs| {
            json!({
                "type": "strict",
                "jobs": jobs,
                "vehicleId": DEFAULT_VEHICLE_ID
            })
        })
        .collect();
    if !relations.is_empty() {
        plan["relations"] = Value::Array(relations);
    }

    let route_start = format_offset(0)?;
    Ok(json!({
        "plan": plan,
        "fleet": {
            "vehicles": [{
                "typeId": DEFAULT_VEHICLE_TYPE,
                "vehicleIds": [DEFAULT_VEHICLE_ID],
                "profile": { "matrix": DEFAULT_PROFILE },
                "costs": {
                    "fixed": 0.0,
                    "distance": 1.0,
                    "time": 0.0
                },
                "shifts": [{
                    "start": {
                        "earliest": route_start,
                        "latest": route_start,
                        "location": { "index": DEPOT }
                    },
                    "end": {
                        "latest": format_offset(capacity)?,
                        "location": { "index": DEPOT }
                    }
                }],
                "capacity": [1]
            }],
            "profiles": [{
                "name": DEFAULT_PROFILE
            }]
        }
    }))
}

/// Build pragmatic routing matrix over model nodes.
pub fn build_pragmatic_matrix(model: &RoutingModel<'_>, profile: &str) -> Matrix {
    let size = model.node_count();
    let mut travel_times = Vec::with_capacity(size * size);
    let mut distances = Vec::with_capacity(size * size);

    for from in 0..size {
        for to in 0..size {
            travel_times.push(model.transit(from, to));
            distances.push(model.arc_cost(from, to));
        }
    }

    Matrix {
        profile: Some(profile.to_string()),
        timestamp: None,
        travel_times,
        distances,
        error_codes: None,
    }
}

fn format_offset(seconds: i64) -> Result<String> {
    let instant = ANCHOR_TIMESTAMP
        .checked_add(seconds)
        .and_then(|timestamp| DateTime::<Utc>::from_timestamp(timestamp, 0))
        .with_context(|| format!("time offset {}s out of range", seconds))?;
    Ok(instant.to_rfc3339_opts(SecondsFormat::Secs, true))
}
