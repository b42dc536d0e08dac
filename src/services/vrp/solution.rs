//! Solution extraction
//!
//! Converts a solved `Assignment` back into stop indices and route totals.

use super::model::RoutingModel;
use super::search::Assignment;
use crate::types::{OptimizationResult, Stop};

/// Extracted route plus the stops the solver left out
#[derive(Debug, Clone)]
pub struct ExtractedSolution {
    pub result: OptimizationResult,
    /// Indices into the stop list, ascending
    pub dropped: Vec<usize>,
}

/// Walk the assignment from the depot back to the depot.
///
/// Distance is the sum of arc costs. Duration is the arrival back at the
/// depot on the earliest feasible schedule plus the service time of every
/// visited stop.
pub fn extract_solution(model: &RoutingModel<'_>, assignment: &Assignment, stops: &[Stop]) -> ExtractedSolution {
    let optimized_order: Vec<usize> = assignment.route.iter().map(|&node| node - 1).collect();

    let mut visited = vec![false; stops.len()];
    for &index in &optimized_order {
        visited[index] = true;
    }

    let service_minutes: u64 = optimized_order
        .iter()
        .map(|&index| u64::from(stops[index].service_duration_minutes))
        .sum();

    let arc_cost: i64 = std::iter::once(0)
        .chain(assignment.route.iter().copied())
        .zip(assignment.route.iter().copied().chain(std::iter::once(0)))
        .map(|(from, to)| model.arc_cost(from, to))
        .sum();

    let total_distance_km = arc_cost as f64 / 1000.0;
    let total_duration_minutes = assignment.evaluation.end_cumul as f64 / 60.0 + service_minutes as f64;

    let dropped: Vec<usize> = (0..stops.len()).filter(|&i| !visited[i]).collect();

    let message = if dropped.is_empty() {
        format!("Route optimized with {} stops", optimized_order.len())
    } else {
        format!(
            "Route optimized with {} of {} stops",
            optimized_order.len(),
            stops.len()
        )
    };

    ExtractedSolution {
        result: OptimizationResult {
            success: true,
            message,
            optimized_order,
            total_distance_km,
            total_duration_minutes,
            solver_log: vec![format!("algorithm={}", assignment.algorithm)],
        },
        dropped,
    }
}
