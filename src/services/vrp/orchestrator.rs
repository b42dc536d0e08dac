//! Strategy ladder and the async optimization entry point
//!
//! Matrices are built once per call. The ladder then tries, in order:
//! every stop mandatory, stops droppable at a penalty, and finally each
//! problematic stop pinned to one of the first route positions. The first
//! attempt that yields a feasible route wins.

use std::sync::Arc;
use std::time::Instant;

use chrono::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::SolverConfig;
use super::model::{ModelBuilder, PinnedPosition};
use super::search::SolverRunner;
use super::solution::extract_solution;
use crate::defaults::{
    DEFAULT_DROP_PENALTY, DEFAULT_PIN_SLOTS, DEFAULT_TIGHT_DEADLINE_HOURS, DEFAULT_TIGHT_WINDOW_HOURS,
};
use crate::error::EngineError;
use crate::services::matrix::{DistanceTimeMatrices, MatrixBuilder};
use crate::types::{
    ExcludedStop, OptimizationOutcome, OptimizationRequest, OptimizationResult,
    OptimizationResultWithExclusions, RouteContext, RouteInput, Stop,
};

/// Tight windows quoted in a failure message
const MAX_DIAGNOSTIC_EXAMPLES: usize = 3;

/// One rung of the ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Every stop must be visited
    Mandatory,
    /// Auto stops may be dropped at the drop penalty
    AllowExclusions,
    /// Stop (input index) fixed at a 0-based route position, all stops mandatory
    PinPosition { stop: usize, slot: usize },
}

impl Strategy {
    pub fn label(&self) -> String {
        match self {
            Strategy::Mandatory => "mandatory".to_string(),
            Strategy::AllowExclusions => "allow-exclusions".to_string(),
            Strategy::PinPosition { stop, slot } => format!("pin stop {} at position {}", stop, slot + 1),
        }
    }
}

/// Knobs of the ladder itself
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    /// Cost of leaving an optional stop out; dominates any realistic route length
    pub drop_penalty: i64,
    /// Windows narrower than this are problematic
    pub tight_window_width: Duration,
    /// Windows ending within this horizon after route start are problematic
    pub tight_deadline_horizon: Duration,
    /// Route positions tried per problematic stop
    pub pin_slots: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            drop_penalty: DEFAULT_DROP_PENALTY,
            tight_window_width: Duration::hours(DEFAULT_TIGHT_WINDOW_HOURS),
            tight_deadline_horizon: Duration::hours(DEFAULT_TIGHT_DEADLINE_HOURS),
            pin_slots: DEFAULT_PIN_SLOTS,
        }
    }
}

/// Runs strategies against shared matrices until one succeeds
#[derive(Debug, Clone, Default)]
pub struct StrategyLadder {
    config: StrategyConfig,
    solver: SolverRunner,
}

impl StrategyLadder {
    pub fn new(config: StrategyConfig, solver_config: SolverConfig) -> Self {
        Self {
            config,
            solver: SolverRunner::new(solver_config),
        }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Windowed stops that are narrow or due soon, earliest deadline first
    pub fn problematic_stops(&self, stops: &[Stop], context: &RouteContext) -> Vec<usize> {
        let deadline_horizon = context.route_start + self.config.tight_deadline_horizon;

        let mut problematic: Vec<usize> = stops
            .iter()
            .enumerate()
            .filter_map(|(i, stop)| {
                let tw = stop.time_window?;
                let tight = tw.width() < self.config.tight_window_width || tw.end <= deadline_horizon;
                tight.then_some(i)
            })
            .collect();

        problematic.sort_by_key(|&i| (stops[i].time_window.map(|tw| tw.end), i));
        problematic
    }

    /// Every attempt in ladder order
    pub fn strategies(&self, stops: &[Stop], context: &RouteContext) -> Vec<Strategy> {
        let mut strategies = vec![Strategy::Mandatory, Strategy::AllowExclusions];
        let slots = self.config.pin_slots.min(stops.len());
        for stop in self.problematic_stops(stops, context) {
            for slot in 0..slots {
                strategies.push(Strategy::PinPosition { stop, slot });
            }
        }
        strategies
    }

    /// Run the ladder. Never fails: errors become a failed outcome.
    pub fn run(
        &self,
        stops: &[Stop],
        matrices: &DistanceTimeMatrices,
        context: &RouteContext,
        cancel: &CancellationToken,
    ) -> OptimizationOutcome {
        if stops.is_empty() {
            return OptimizationOutcome::Optimized(OptimizationResult::empty());
        }

        let mut log = vec![format!(
            "matrix={} stops={}",
            matrices.source.as_str(),
            stops.len()
        )];

        for strategy in self.strategies(stops, context) {
            if cancel.is_cancelled() {
                return with_log(OptimizationOutcome::failed(EngineError::Cancelled.to_string()), log);
            }

            let started = Instant::now();
            match self.attempt(strategy, stops, matrices, context, cancel) {
                Ok(Some(outcome)) => {
                    info!(
                        "Strategy {} succeeded in {}ms",
                        strategy.label(),
                        started.elapsed().as_millis()
                    );
                    log.push(format!(
                        "strategy={} result=solved time_ms={}",
                        strategy.label(),
                        started.elapsed().as_millis()
                    ));
                    return with_log(outcome, log);
                }
                Ok(None) => {
                    debug!("Strategy {} found no feasible route", strategy.label());
                    log.push(format!(
                        "strategy={} result=infeasible time_ms={}",
                        strategy.label(),
                        started.elapsed().as_millis()
                    ));
                }
                Err(e) => {
                    error!("Strategy {} failed: {}", strategy.label(), e);
                    log.push(format!("strategy={} error={}", strategy.label(), e));
                    return with_log(OptimizationOutcome::failed(e.to_string()), log);
                }
            }
        }

        if cancel.is_cancelled() {
            return with_log(OptimizationOutcome::failed(EngineError::Cancelled.to_string()), log);
        }

        warn!("No strategy found a feasible route for {} stops", stops.len());
        let message = self.failure_diagnostic(stops, context);
        with_log(OptimizationOutcome::failed(message), log)
    }

    /// Single strategy attempt. `Ok(None)` means no feasible route.
    pub fn attempt(
        &self,
        strategy: Strategy,
        stops: &[Stop],
        matrices: &DistanceTimeMatrices,
        context: &RouteContext,
        cancel: &CancellationToken,
    ) -> Result<Option<OptimizationOutcome>, EngineError> {
        let builder = ModelBuilder::new(self.config.drop_penalty);

        match strategy {
            Strategy::Mandatory => {
                let model = builder.build(stops, matrices, context, false, None)?;
                let Some(assignment) = self.solver.solve(&model, cancel) else {
                    return Ok(None);
                };
                let extracted = extract_solution(&model, &assignment, stops);
                Ok(Some(OptimizationOutcome::Optimized(extracted.result)))
            }
            Strategy::AllowExclusions => {
                let model = builder.build(stops, matrices, context, true, None)?;
                let Some(assignment) = self.solver.solve(&model, cancel) else {
                    return Ok(None);
                };
                let extracted = extract_solution(&model, &assignment, stops);
                if extracted.dropped.is_empty() {
                    return Ok(Some(OptimizationOutcome::Optimized(extracted.result)));
                }

                let excluded_stops: Vec<ExcludedStop> = extracted
                    .dropped
                    .iter()
                    .map(|&i| excluded_stop(&stops[i]))
                    .collect();
                let mut result = extracted.result;
                result.message = format!(
                    "Route optimized with {} of {} stops, {} excluded",
                    result.optimized_order.len(),
                    stops.len(),
                    excluded_stops.len()
                );
                Ok(Some(OptimizationOutcome::OptimizedWithExclusions(
                    OptimizationResultWithExclusions {
                        result,
                        excluded_stops,
                    },
                )))
            }
            Strategy::PinPosition { stop, slot } => {
                if stop >= stops.len() {
                    return Err(EngineError::Internal(format!("pinned stop {} does not exist", stop)));
                }

                // pinned stop first, the rest keep their input order
                let permutation: Vec<usize> = std::iter::once(stop)
                    .chain((0..stops.len()).filter(|&i| i != stop))
                    .collect();
                let reordered: Vec<Stop> = permutation.iter().map(|&i| stops[i].clone()).collect();
                let matrix_indices: Vec<usize> = permutation.iter().map(|&i| i + 1).collect();

                let model = builder.build_with_indices(
                    &reordered,
                    &matrix_indices,
                    matrices,
                    context,
                    false,
                    Some(PinnedPosition { stop: 0, slot }),
                )?;
                let Some(assignment) = self.solver.solve(&model, cancel) else {
                    return Ok(None);
                };

                let mut extracted = extract_solution(&model, &assignment, &reordered);
                for index in extracted.result.optimized_order.iter_mut() {
                    *index = permutation[*index];
                }
                if extracted.result.optimized_order.get(slot) != Some(&stop) {
                    warn!(
                        "Pinned stop {} missed position {}: {:?}",
                        stop,
                        slot + 1,
                        extracted.result.optimized_order
                    );
                    return Ok(None);
                }
                extracted.result.message = format!(
                    "Route optimized with {} stops, '{}' fixed at position {}",
                    stops.len(),
                    stops[stop].name,
                    slot + 1
                );
                Ok(Some(OptimizationOutcome::Optimized(extracted.result)))
            }
        }
    }

    /// Human-readable reason why no strategy worked
    pub fn failure_diagnostic(&self, stops: &[Stop], context: &RouteContext) -> String {
        let windowed = stops.iter().filter(|s| s.time_window.is_some()).count();
        let mut parts = vec![format!(
            "No feasible route found: {} of {} stops have time windows.",
            windowed,
            stops.len()
        )];

        let malformed: Vec<String> = stops
            .iter()
            .filter_map(|s| s.time_window.filter(|tw| tw.is_malformed()).map(|tw| describe(s, tw)))
            .collect();
        if !malformed.is_empty() {
            parts.push(format!("Windows ending before they start: {}.", malformed.join(", ")));
        }

        let expired: Vec<String> = stops
            .iter()
            .filter_map(|s| {
                s.time_window
                    .filter(|tw| !tw.is_malformed() && tw.ends_before(context.route_start))
                    .map(|tw| describe(s, tw))
            })
            .collect();
        if !expired.is_empty() {
            parts.push(format!(
                "Windows ending before the route start {}: {}.",
                context.route_start.format("%H:%M"),
                expired.join(", ")
            ));
        }

        let tight: Vec<String> = self
            .problematic_stops(stops, context)
            .into_iter()
            .filter_map(|i| stops[i].time_window.map(|tw| describe(&stops[i], tw)))
            .take(MAX_DIAGNOSTIC_EXAMPLES)
            .collect();
        if !tight.is_empty() {
            parts.push(format!("Tight windows: {}.", tight.join(", ")));
        }

        parts.push("Try an earlier route start time or wider time windows.".to_string());
        parts.join(" ")
    }
}

fn describe(stop: &Stop, tw: crate::types::TimeWindow) -> String {
    format!("{} ({})", stop.name, tw)
}

fn excluded_stop(stop: &Stop) -> ExcludedStop {
    match stop.time_window {
        Some(tw) => ExcludedStop {
            stop: stop.clone(),
            reason: "time-window conflict".to_string(),
            time_window_conflict: tw.to_string(),
        },
        None => ExcludedStop {
            stop: stop.clone(),
            reason: "optimization trade-off".to_string(),
            time_window_conflict: String::new(),
        },
    }
}

/// Ladder log first, then whatever the solve itself recorded
fn with_log(mut outcome: OptimizationOutcome, mut log: Vec<String>) -> OptimizationOutcome {
    let result = outcome.result_mut();
    log.append(&mut result.solver_log);
    result.solver_log = log;
    outcome
}

/// Async entry point: validates the request, builds matrices once and runs
/// the ladder on the blocking pool
#[derive(Clone)]
pub struct Optimizer {
    matrix_builder: MatrixBuilder,
    ladder: Arc<StrategyLadder>,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new(MatrixBuilder::estimating(), StrategyLadder::default())
    }
}

impl Optimizer {
    pub fn new(matrix_builder: MatrixBuilder, ladder: StrategyLadder) -> Self {
        Self {
            matrix_builder,
            ladder: Arc::new(ladder),
        }
    }

    pub fn matrix_builder(&self) -> &MatrixBuilder {
        &self.matrix_builder
    }

    /// Optimize a wire request. Always returns an outcome.
    pub async fn optimize(&self, request: OptimizationRequest, cancel: CancellationToken) -> OptimizationOutcome {
        match request.into_route_input() {
            Ok(input) => self.optimize_input(input, cancel).await,
            Err(e) => {
                warn!("Rejected optimization request: {}", e);
                OptimizationOutcome::failed(e.to_string())
            }
        }
    }

    pub async fn optimize_input(&self, input: RouteInput, cancel: CancellationToken) -> OptimizationOutcome {
        let RouteInput { depot, stops, context } = input;

        if stops.is_empty() {
            debug!("No stops to optimize, returning empty route");
            return OptimizationOutcome::Optimized(OptimizationResult::empty());
        }

        info!(
            "Optimizing route with {} stops starting {}",
            stops.len(),
            context.route_start
        );

        let matrices = tokio::select! {
            _ = cancel.cancelled() => {
                return OptimizationOutcome::failed(EngineError::Cancelled.to_string());
            }
            matrices = self.matrix_builder.build(&depot, &stops) => matrices,
        };

        let ladder = Arc::clone(&self.ladder);
        let handle = tokio::task::spawn_blocking(move || ladder.run(&stops, &matrices, &context, &cancel));

        match handle.await {
            Ok(outcome) => {
                info!("Optimization finished: {}", outcome.status().as_str());
                outcome
            }
            Err(e) => {
                let reason = if e.is_panic() {
                    panic_message(e.into_panic())
                } else {
                    e.to_string()
                };
                error!("Optimization task aborted: {}", reason);
                OptimizationOutcome::failed(EngineError::Internal(reason).to_string())
            }
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "solver panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::matrix::MatrixSource;
    use crate::types::{Coordinates, OrderType, OutcomeStatus, TimeWindow};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn context() -> RouteContext {
        RouteContext::new(at(8, 0), Duration::hours(10))
    }

    fn stop(id: &str) -> Stop {
        Stop::new(id, format!("Customer {}", id.to_uppercase()), Coordinates::new(50.0, 14.0))
            .with_service_minutes(10)
    }

    /// Points on a line at the given km; 1 km takes 60 s
    fn line_matrices(km: &[u64]) -> DistanceTimeMatrices {
        let n = km.len();
        let mut distances = vec![vec![0u64; n]; n];
        let mut durations = vec![vec![0u64; n]; n];
        for i in 0..n {
            for j in 0..n {
                let d = km[i].abs_diff(km[j]);
                distances[i][j] = d * 1000;
                durations[i][j] = d * 60;
            }
        }
        DistanceTimeMatrices {
            distances,
            durations,
            size: n,
            source: MatrixSource::Estimated,
        }
    }

    fn run(stops: &[Stop], matrices: &DistanceTimeMatrices) -> OptimizationOutcome {
        StrategyLadder::default().run(stops, matrices, &context(), &CancellationToken::new())
    }

    #[test]
    fn test_empty_stops() {
        let outcome = run(&[], &line_matrices(&[0]));
        assert_eq!(outcome.status(), OutcomeStatus::SucceededFull);
        assert!(outcome.result().optimized_order.is_empty());
        assert_eq!(outcome.result().total_distance_km, 0.0);
    }

    #[test]
    fn test_mandatory_succeeds_first() {
        let stops = vec![stop("a"), stop("b"), stop("c")];
        let outcome = run(&stops, &line_matrices(&[0, 30, 10, 20]));

        assert_eq!(outcome.status(), OutcomeStatus::SucceededFull);
        // out to 30 km and back
        assert_eq!(outcome.result().total_distance_km, 60.0);
        let log = &outcome.result().solver_log;
        assert_eq!(log.len(), 3);
        assert!(log[1].starts_with("strategy=mandatory result=solved"));
        assert_eq!(log[2], "algorithm=vrp-pragmatic");
    }

    #[test]
    fn test_exclusions_report_conflicting_window() {
        let stops = vec![
            stop("a"),
            stop("b").with_time_window(TimeWindow::new(at(6, 0), at(7, 0))),
            stop("c"),
        ];
        let outcome = run(&stops, &line_matrices(&[0, 5, 8, 10]));

        assert_eq!(outcome.status(), OutcomeStatus::SucceededWithExclusions);
        let mut order = outcome.result().optimized_order.clone();
        order.sort_unstable();
        assert_eq!(order, vec![0, 2]);
        let excluded = outcome.excluded_stops();
        assert_eq!(excluded.len(), 1);
        assert_eq!(excluded[0].stop.id, "b");
        assert_eq!(excluded[0].reason, "time-window conflict");
        assert_eq!(excluded[0].time_window_conflict, "06:00-07:00");
    }

    #[test]
    fn test_excluded_without_window_is_trade_off() {
        // a 200 km detour does not fit into a 3 hour route
        let stops = vec![stop("near"), stop("far")];
        let matrices = line_matrices(&[0, 5, 200]);
        let short = RouteContext::new(at(8, 0), Duration::hours(3));
        let outcome = StrategyLadder::default().run(&stops, &matrices, &short, &CancellationToken::new());

        assert_eq!(outcome.status(), OutcomeStatus::SucceededWithExclusions);
        assert_eq!(outcome.excluded_stops()[0].reason, "optimization trade-off");
        assert_eq!(outcome.excluded_stops()[0].time_window_conflict, "");
    }

    #[test]
    fn test_problematic_stops_sorted_by_deadline() {
        let stops = vec![
            stop("wide").with_time_window(TimeWindow::new(at(8, 0), at(18, 0))),
            stop("late").with_time_window(TimeWindow::new(at(14, 0), at(15, 0))),
            stop("early").with_time_window(TimeWindow::new(at(9, 0), at(9, 30))),
            stop("none"),
            stop("due-soon").with_time_window(TimeWindow::new(at(6, 0), at(10, 0))),
        ];
        let ladder = StrategyLadder::default();
        assert_eq!(ladder.problematic_stops(&stops, &context()), vec![2, 4, 1]);
    }

    #[test]
    fn test_deadline_exactly_at_horizon_is_problematic() {
        let stops = vec![
            stop("at-horizon").with_time_window(TimeWindow::new(at(6, 0), at(11, 0))),
            stop("past-horizon").with_time_window(TimeWindow::new(at(6, 0), at(11, 1))),
        ];
        let ladder = StrategyLadder::default();
        assert_eq!(ladder.problematic_stops(&stops, &context()), vec![0]);
    }

    #[test]
    fn test_strategies_order() {
        let stops = vec![
            stop("a").with_time_window(TimeWindow::new(at(9, 0), at(9, 30))),
            stop("b"),
        ];
        let strategies = StrategyLadder::default().strategies(&stops, &context());
        assert_eq!(
            strategies,
            vec![
                Strategy::Mandatory,
                Strategy::AllowExclusions,
                Strategy::PinPosition { stop: 0, slot: 0 },
                Strategy::PinPosition { stop: 0, slot: 1 },
            ]
        );
    }

    #[test]
    fn test_pinned_attempt_maps_back_to_input_indices() {
        let stops = vec![stop("a"), stop("b"), stop("c")];
        let matrices = line_matrices(&[0, 10, 20, 30]);
        let outcome = StrategyLadder::default()
            .attempt(
                Strategy::PinPosition { stop: 2, slot: 0 },
                &stops,
                &matrices,
                &context(),
                &CancellationToken::new(),
            )
            .unwrap()
            .unwrap();

        assert_eq!(outcome.result().optimized_order[0], 2);
        let mut order = outcome.result().optimized_order.clone();
        order.sort_unstable();
        assert_eq!(order, vec![0, 1, 2]);
        assert!(outcome.result().message.contains("Customer C"));
    }

    #[test]
    fn test_pinned_middle_slots_fix_the_position() {
        // depot 0, a 2, b 4, c 1, s 3 km: c is the cheapest first stop
        let stops = vec![stop("a"), stop("b"), stop("c"), stop("s")];
        let matrices = line_matrices(&[0, 2, 4, 1, 3]);
        let ladder = StrategyLadder::default();

        for slot in 1..=2 {
            let outcome = ladder
                .attempt(
                    Strategy::PinPosition { stop: 3, slot },
                    &stops,
                    &matrices,
                    &context(),
                    &CancellationToken::new(),
                )
                .unwrap()
                .unwrap();

            let order = &outcome.result().optimized_order;
            assert_eq!(order[slot], 3, "slot {}: {:?}", slot, order);
            let mut sorted = order.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, vec![0, 1, 2, 3]);
            assert!(outcome
                .result()
                .message
                .ends_with(&format!("'Customer S' fixed at position {}", slot + 1)));
        }
    }

    #[test]
    fn test_failure_diagnostic_lists_causes() {
        // every stop is First: no strategy can satisfy that
        let stops = vec![
            stop("a").with_order_type(OrderType::First),
            stop("b")
                .with_order_type(OrderType::First)
                .with_time_window(TimeWindow::new(at(9, 0), at(9, 5))),
            stop("c").with_time_window(TimeWindow::new(at(11, 0), at(10, 0))),
            stop("d").with_time_window(TimeWindow::new(at(5, 0), at(6, 0))),
        ];
        let outcome = run(&stops, &line_matrices(&[0, 1, 2, 3, 4]));

        assert_eq!(outcome.status(), OutcomeStatus::Failed);
        let message = &outcome.result().message;
        assert!(message.contains("3 of 4 stops have time windows"));
        assert!(message.contains("Customer C (11:00-10:00)"));
        assert!(message.contains("Customer D (05:00-06:00)"));
        assert!(message.contains("Customer B (09:00-09:05)"));
        assert!(message.contains("earlier route start"));
    }

    #[test]
    fn test_cancelled_before_start() {
        let stops = vec![stop("a")];
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = StrategyLadder::default().run(&stops, &line_matrices(&[0, 1]), &context(), &cancel);

        assert_eq!(outcome.status(), OutcomeStatus::Failed);
        assert_eq!(outcome.result().message, "optimization cancelled");
    }

    #[test]
    fn test_oversized_drop_penalty_fails_cleanly() {
        let stops = vec![
            stop("a"),
            stop("expired").with_time_window(TimeWindow::new(at(6, 0), at(7, 0))),
        ];
        let config = StrategyConfig {
            drop_penalty: i64::MAX / 2,
            ..StrategyConfig::default()
        };
        let ladder = StrategyLadder::new(config, SolverConfig::default());
        let outcome = ladder.run(&stops, &line_matrices(&[0, 5, 8]), &context(), &CancellationToken::new());

        assert_eq!(outcome.status(), OutcomeStatus::Failed);
        assert!(outcome.result().message.starts_with("arithmetic overflow"));
    }

    #[test]
    fn test_invalid_matrix_becomes_failed_outcome() {
        let stops = vec![stop("a"), stop("b")];
        let outcome = run(&stops, &line_matrices(&[0, 1]));

        assert_eq!(outcome.status(), OutcomeStatus::Failed);
        assert!(outcome.result().message.starts_with("invalid routing model"));
    }

    #[tokio::test]
    async fn test_optimizer_rejects_invalid_coordinates() {
        let request = OptimizationRequest {
            depot_id: None,
            depot_latitude: 123.0,
            depot_longitude: 14.0,
            stops: vec![],
            route_start_time: at(8, 0),
            max_route_duration: None,
        };
        let outcome = Optimizer::default().optimize(request, CancellationToken::new()).await;
        assert_eq!(outcome.status(), OutcomeStatus::Failed);
    }

    #[tokio::test]
    async fn test_optimizer_cancelled_before_matrices() {
        let input = RouteInput {
            depot: crate::types::Depot {
                id: None,
                coordinates: Coordinates::new(50.0, 14.0),
            },
            stops: vec![Stop::new("a", "A", Coordinates::new(50.1, 14.1))],
            context: context(),
        };
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = Optimizer::default().optimize_input(input, cancel).await;
        assert_eq!(outcome.result().message, "optimization cancelled");
    }
}
