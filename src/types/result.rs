//! Optimization output shapes

use serde::{Deserialize, Serialize};

use super::Stop;

/// Result of route optimization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub success: bool,
    pub message: String,
    /// Indices into the original stops array, in visiting order
    pub optimized_order: Vec<usize>,
    pub total_distance_km: f64,
    pub total_duration_minutes: f64,
    /// Per-attempt trace of the strategy ladder
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub solver_log: Vec<String>,
}

impl OptimizationResult {
    /// Successful result for a request without stops
    pub fn empty() -> Self {
        Self {
            success: true,
            message: "No stops to optimize".to_string(),
            optimized_order: vec![],
            total_distance_km: 0.0,
            total_duration_minutes: 0.0,
            solver_log: vec![],
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            optimized_order: vec![],
            total_distance_km: 0.0,
            total_duration_minutes: 0.0,
            solver_log: vec![],
        }
    }
}

/// A stop the optimizer left off the route
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcludedStop {
    pub stop: Stop,
    pub reason: String,
    /// Formatted time window, empty when the stop had none
    pub time_window_conflict: String,
}

/// Result of an optimization that was allowed to drop stops
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResultWithExclusions {
    #[serde(flatten)]
    pub result: OptimizationResult,
    pub excluded_stops: Vec<ExcludedStop>,
}

/// Status recorded against an optimization job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    SucceededFull,
    SucceededWithExclusions,
    Failed,
}

impl OutcomeStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            OutcomeStatus::SucceededFull => "succeeded_full",
            OutcomeStatus::SucceededWithExclusions => "succeeded_with_exclusions",
            OutcomeStatus::Failed => "failed",
        }
    }
}

/// Everything an optimization call can return
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OptimizationOutcome {
    Optimized(OptimizationResult),
    OptimizedWithExclusions(OptimizationResultWithExclusions),
    Failed(OptimizationResult),
}

impl OptimizationOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        OptimizationOutcome::Failed(OptimizationResult::failure(message))
    }

    pub fn status(&self) -> OutcomeStatus {
        match self {
            OptimizationOutcome::Optimized(_) => OutcomeStatus::SucceededFull,
            OptimizationOutcome::OptimizedWithExclusions(_) => OutcomeStatus::SucceededWithExclusions,
            OptimizationOutcome::Failed(_) => OutcomeStatus::Failed,
        }
    }

    pub fn result(&self) -> &OptimizationResult {
        match self {
            OptimizationOutcome::Optimized(result) | OptimizationOutcome::Failed(result) => result,
            OptimizationOutcome::OptimizedWithExclusions(with_exclusions) => &with_exclusions.result,
        }
    }

    pub fn result_mut(&mut self) -> &mut OptimizationResult {
        match self {
            OptimizationOutcome::Optimized(result) | OptimizationOutcome::Failed(result) => result,
            OptimizationOutcome::OptimizedWithExclusions(with_exclusions) => &mut with_exclusions.result,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result().success
    }

    pub fn excluded_stops(&self) -> &[ExcludedStop] {
        match self {
            OptimizationOutcome::OptimizedWithExclusions(with_exclusions) => &with_exclusions.excluded_stops,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Coordinates;

    #[test]
    fn test_outcome_status_mapping() {
        assert_eq!(
            OptimizationOutcome::Optimized(OptimizationResult::empty()).status(),
            OutcomeStatus::SucceededFull
        );
        assert_eq!(OptimizationOutcome::failed("nope").status(), OutcomeStatus::Failed);
    }

    #[test]
    fn test_exclusions_serialize_flat() {
        let outcome = OptimizationOutcome::OptimizedWithExclusions(OptimizationResultWithExclusions {
            result: OptimizationResult {
                success: true,
                message: "1 stop excluded".to_string(),
                optimized_order: vec![1],
                total_distance_km: 3.5,
                total_duration_minutes: 42.0,
                solver_log: vec![],
            },
            excluded_stops: vec![ExcludedStop {
                stop: Stop::new("s0", "Bakery", Coordinates::new(50.0, 14.0)),
                reason: "optimization trade-off".to_string(),
                time_window_conflict: String::new(),
            }],
        });

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["optimizedOrder"], serde_json::json!([1]));
        assert_eq!(json["excludedStops"][0]["reason"], "optimization trade-off");
        // empty solver log is not emitted
        assert!(json.get("solverLog").is_none());
    }
}
