//! Bounded search over a `RoutingModel`
//!
//! vrp-pragmatic solves the model first. Its route is accepted only when the
//! model itself finds it feasible. Otherwise a depth-first cheapest-arc
//! construction that backtracks on dead ends runs as a fallback, and optional
//! nodes it left out are offered cheapest insertion.

use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::SolverConfig;
use super::model::{RouteEvaluation, RouteNode, RoutingModel, DEPOT};
use super::pragmatic::solve_pragmatic;

pub const ALGORITHM_PRAGMATIC: &str = "vrp-pragmatic";
pub const ALGORITHM_HEURISTIC: &str = "heuristic";

/// Solved route: stop nodes in visiting order and their schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub route: Vec<usize>,
    pub evaluation: RouteEvaluation,
    /// Which search produced the route
    pub algorithm: &'static str,
}

impl Assignment {
    fn evaluate(model: &RoutingModel<'_>, route: Vec<usize>, algorithm: &'static str) -> Option<Self> {
        let evaluation = model.evaluate(&route)?;
        Some(Self {
            route,
            evaluation,
            algorithm,
        })
    }

    pub fn objective(&self) -> i64 {
        self.evaluation.objective()
    }

    pub fn visits(&self, node: usize) -> bool {
        self.route.contains(&node)
    }
}

struct SearchLimits<'a> {
    deadline: Instant,
    cancel: &'a CancellationToken,
}

impl SearchLimits<'_> {
    fn exhausted(&self) -> bool {
        self.cancel.is_cancelled() || Instant::now() >= self.deadline
    }
}

/// Runs one solve under a `SolverConfig`
#[derive(Debug, Clone, Default)]
pub struct SolverRunner {
    config: SolverConfig,
}

impl SolverRunner {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Best assignment found within the limits, `None` when no feasible
    /// route was found or the search was cancelled.
    pub fn solve(&self, model: &RoutingModel<'_>, cancel: &CancellationToken) -> Option<Assignment> {
        let started = Instant::now();
        if cancel.is_cancelled() {
            return None;
        }

        if let Some(reason) = model.contradiction() {
            debug!("Skipping solve of contradictory model: {}", reason);
            return None;
        }

        if let Some(node) = unreachable_mandatory_node(model) {
            debug!("Node {} can never be served inside its window", node);
            return None;
        }

        if model.stop_count() == 0 {
            return Assignment::evaluate(model, Vec::new(), "none");
        }

        match solve_pragmatic(model, &self.config, cancel) {
            Ok(route) => match Assignment::evaluate(model, route, ALGORITHM_PRAGMATIC) {
                Some(assignment) if !cancel.is_cancelled() => {
                    info!(
                        "VRP solved with vrp-pragmatic in {}ms: {} stops, objective {}",
                        started.elapsed().as_millis(),
                        assignment.route.len(),
                        assignment.objective()
                    );
                    return Some(assignment);
                }
                Some(_) => return None,
                None => debug!("vrp-pragmatic route is infeasible for the model, falling back to heuristic"),
            },
            Err(err) => warn!("vrp-pragmatic failed, falling back to heuristic: {}", err),
        }

        let limits = SearchLimits {
            deadline: started + self.config.time_limit,
            cancel,
        };
        let assignment = construct_with_limits(model, &limits, self.config.max_construction_steps)?;
        if cancel.is_cancelled() {
            return None;
        }

        info!(
            "VRP solved with heuristic in {}ms: {} stops, objective {}",
            started.elapsed().as_millis(),
            assignment.route.len(),
            assignment.objective()
        );
        Some(assignment)
    }
}

/// Fallback search alone: construction plus insertion of dropped optional
/// nodes, bounded by `time_limit` and `max_steps`
pub fn construct(
    model: &RoutingModel<'_>,
    time_limit: std::time::Duration,
    max_steps: usize,
    cancel: &CancellationToken,
) -> Option<Assignment> {
    let limits = SearchLimits {
        deadline: Instant::now() + time_limit,
        cancel,
    };
    construct_with_limits(model, &limits, max_steps)
}

fn construct_with_limits(model: &RoutingModel<'_>, limits: &SearchLimits<'_>, max_steps: usize) -> Option<Assignment> {
    if model.contradiction().is_some() || unreachable_mandatory_node(model).is_some() {
        return None;
    }

    let mut construction = Construction::new(model, limits, max_steps);
    let route = construction.run()?;
    debug!(
        "Constructed first route of {} stops in {} steps",
        route.len(),
        construction.steps
    );

    let route = insert_dropped(model, route, limits);
    Assignment::evaluate(model, route, ALGORITHM_HEURISTIC)
}

/// A mandatory node whose window cannot contain any cumul
fn unreachable_mandatory_node(model: &RoutingModel<'_>) -> Option<usize> {
    (1..model.node_count()).find(|&node| {
        !model.is_optional(node)
            && model
                .time_window(node)
                .is_some_and(|range| range.max < 0 || range.min > model.time_dimension().capacity)
    })
}


/// Depth-first cheapest-arc construction
struct Construction<'a, 'm> {
    model: &'a RoutingModel<'m>,
    limits: &'a SearchLimits<'a>,
    route: Vec<usize>,
    visited: Vec<bool>,
    mandatory_left: usize,
    /// Shortest transit into each node from anywhere
    min_transit_in: Vec<i64>,
    steps: usize,
    max_steps: usize,
    aborted: bool,
}

impl<'a, 'm> Construction<'a, 'm> {
    fn new(model: &'a RoutingModel<'m>, limits: &'a SearchLimits<'a>, max_steps: usize) -> Self {
        let nodes = model.node_count();
        let mandatory_left = (1..nodes).filter(|&n| !model.is_optional(n)).count();
        let min_transit_in = (0..nodes)
            .map(|to| {
                (0..nodes)
                    .filter(|&from| from != to)
                    .map(|from| model.transit(from, to))
                    .min()
                    .unwrap_or(0)
            })
            .collect();

        Self {
            model,
            limits,
            route: Vec::with_capacity(nodes),
            visited: vec![false; nodes],
            mandatory_left,
            min_transit_in,
            steps: 0,
            max_steps,
            aborted: false,
        }
    }

    fn run(&mut self) -> Option<Vec<usize>> {
        if self.extend(DEPOT, 0) {
            Some(std::mem::take(&mut self.route))
        } else {
            if self.aborted {
                debug!("Construction gave up after {} steps", self.steps);
            }
            None
        }
    }

    fn extend(&mut self, last: usize, cumul: i64) -> bool {
        self.steps += 1;
        if self.steps > self.max_steps || (self.steps % 128 == 0 && self.limits.exhausted()) {
            self.aborted = true;
        }
        if self.aborted {
            return false;
        }

        match self.model.forced_successor(last) {
            Some(RouteNode::End) => return self.close(last, cumul),
            Some(RouteNode::Stop(next)) => {
                if self.visited[next] {
                    return false;
                }
                return match self.model.arrival_cumul(last, cumul, next) {
                    Some(next_cumul) => self.descend(next, next_cumul),
                    None => false,
                };
            }
            Some(RouteNode::Start) => return false,
            None => {}
        }

        for (node, next_cumul) in self.candidates(last, cumul) {
            if self.descend(node, next_cumul) {
                return true;
            }
            if self.aborted {
                return false;
            }
        }

        self.close(last, cumul)
    }

    fn descend(&mut self, node: usize, cumul: i64) -> bool {
        if !self.remaining_windows_reachable(node, cumul) {
            return false;
        }

        self.route.push(node);
        self.visited[node] = true;
        let mandatory = !self.model.is_optional(node);
        if mandatory {
            self.mandatory_left -= 1;
        }

        if self.extend(node, cumul) {
            return true;
        }

        self.route.pop();
        self.visited[node] = false;
        if mandatory {
            self.mandatory_left += 1;
        }
        false
    }

    fn close(&self, last: usize, cumul: i64) -> bool {
        self.mandatory_left == 0 && self.model.end_cumul(last, cumul).is_some()
    }

    /// Unvisited nodes reachable from `last`, cheapest arc first. Chains that
    /// must end the route are tried last.
    fn candidates(&self, last: usize, cumul: i64) -> Vec<(usize, i64)> {
        let mut candidates: Vec<(bool, i64, usize, i64)> = Vec::new();

        for node in 1..self.model.node_count() {
            if self.visited[node] || self.model.forced_predecessor(node).is_some() {
                continue;
            }
            let optional = self.model.is_optional(node);
            if self.mandatory_left == 0 && !optional {
                continue;
            }

            let (chain_mandatory, ends_route) = self.chain_from(node);
            if ends_route && chain_mandatory < self.mandatory_left {
                continue;
            }

            let Some(next_cumul) = self.model.arrival_cumul(last, cumul, node) else {
                continue;
            };
            // with only optional nodes left, never step somewhere we cannot return from
            if self.mandatory_left == 0 && self.model.end_cumul(node, next_cumul).is_none() {
                continue;
            }

            candidates.push((ends_route, self.model.arc_cost(last, node), node, next_cumul));
        }

        candidates.sort_unstable_by_key(|&(ends_route, cost, node, _)| (ends_route, cost, node));
        candidates
            .into_iter()
            .map(|(_, _, node, next_cumul)| (node, next_cumul))
            .collect()
    }

    /// Mandatory nodes on the forced chain starting at `node`, and whether
    /// the chain runs into the route end
    fn chain_from(&self, node: usize) -> (usize, bool) {
        let mut mandatory = 0;
        let mut current = node;
        for _ in 0..self.model.node_count() {
            if !self.model.is_optional(current) {
                mandatory += 1;
            }
            match self.model.forced_successor(current) {
                Some(RouteNode::Stop(next)) if !self.visited[next] && next != node => current = next,
                Some(RouteNode::End) => return (mandatory, true),
                _ => return (mandatory, false),
            }
        }
        (mandatory, false)
    }

    /// Cumuls never decrease, so a mandatory window already out of reach
    /// from `cumul` stays out of reach
    fn remaining_windows_reachable(&self, next: usize, cumul: i64) -> bool {
        let capacity = self.model.time_dimension().capacity;
        (1..self.model.node_count()).all(|node| {
            if node == next || self.visited[node] || self.model.is_optional(node) {
                return true;
            }
            let earliest = cumul + self.min_transit_in[node];
            let latest = self
                .model
                .time_window(node)
                .map_or(capacity, |range| range.max.min(capacity));
            earliest <= latest
        })
    }
}

/// Cheapest feasible insertion of optional nodes the construction left out
fn insert_dropped(model: &RoutingModel<'_>, mut route: Vec<usize>, limits: &SearchLimits<'_>) -> Vec<usize> {
    if !model.has_optional_nodes() {
        return route;
    }

    loop {
        if limits.exhausted() {
            return route;
        }
        let Some(current) = model.evaluate(&route) else {
            return route;
        };

        let mut best: Option<(i64, Vec<usize>)> = None;
        for node in 1..model.node_count() {
            if route.contains(&node) {
                continue;
            }
            for position in 0..=route.len() {
                let mut candidate = route.clone();
                candidate.insert(position, node);
                let Some(evaluation) = model.evaluate(&candidate) else {
                    continue;
                };
                let objective = evaluation.objective();
                if objective < current.objective() && best.as_ref().map_or(true, |(b, _)| objective < *b) {
                    best = Some((objective, candidate));
                }
            }
        }

        match best {
            Some((_, improved)) => route = improved,
            None => return route,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::matrix::{DistanceTimeMatrices, MatrixSource};
    use crate::services::vrp::model::{ModelBuilder, PinnedPosition};
    use crate::types::{Coordinates, OrderType, RouteContext, Stop, TimeWindow};
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn context() -> RouteContext {
        RouteContext::new(at(8, 0), Duration::hours(12))
    }

    fn stop(id: &str) -> Stop {
        Stop::new(id, id.to_uppercase(), Coordinates::new(50.0, 14.0))
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

    fn solve(model: &RoutingModel<'_>, config: SolverConfig) -> Option<Assignment> {
        SolverRunner::new(config).solve(model, &CancellationToken::new())
    }

    fn heuristic(model: &RoutingModel<'_>) -> Option<Assignment> {
        construct(model, std::time::Duration::from_secs(5), 200_000, &CancellationToken::new())
    }

    #[test]
    fn test_empty_model_solves_to_empty_route() {
        let matrices = line_matrices(&[0]);
        let model = ModelBuilder::new(1_000).build(&[], &matrices, &context(), false, None).unwrap();

        let assignment = solve(&model, SolverConfig::default()).unwrap();
        assert!(assignment.route.is_empty());
        assert_eq!(assignment.objective(), 0);
    }

    #[test]
    fn test_solve_uses_vrp_pragmatic() {
        // depot at 0, stops at 30, 10, 20 km: out and back is 60 km
        let matrices = line_matrices(&[0, 30, 10, 20]);
        let stops = vec![stop("a"), stop("b"), stop("c")];
        let model = ModelBuilder::new(1_000).build(&stops, &matrices, &context(), false, None).unwrap();

        let assignment = solve(&model, SolverConfig::default()).unwrap();
        assert_eq!(assignment.algorithm, ALGORITHM_PRAGMATIC);
        assert_eq!(assignment.evaluation.arc_cost, 60_000);
        assert!(model.evaluate(&assignment.route).is_some());
    }

    #[test]
    fn test_heuristic_cheapest_arc_order_on_a_line() {
        let matrices = line_matrices(&[0, 30, 10, 20]);
        let stops = vec![stop("a"), stop("b"), stop("c")];
        let model = ModelBuilder::new(1_000).build(&stops, &matrices, &context(), false, None).unwrap();

        let assignment = heuristic(&model).unwrap();
        assert_eq!(assignment.route, vec![2, 3, 1]);
        assert_eq!(assignment.algorithm, ALGORITHM_HEURISTIC);
        assert_eq!(assignment.evaluation.arc_cost, 60_000);
    }

    #[test]
    fn test_heuristic_backtracks_to_meet_a_deadline() {
        // depot at 20 km: going to the near stop at 10 first reaches the far
        // stop at 50 after 50 minutes, too late for its 08:35 deadline
        let matrices = line_matrices(&[20, 10, 50]);
        let stops = vec![
            stop("near"),
            stop("far").with_time_window(TimeWindow::new(at(8, 0), at(8, 35))),
        ];
        let model = ModelBuilder::new(1_000).build(&stops, &matrices, &context(), false, None).unwrap();

        assert_eq!(heuristic(&model).unwrap().route, vec![2, 1]);
        assert_eq!(solve(&model, SolverConfig::default()).unwrap().route, vec![2, 1]);
    }

    #[test]
    fn test_infeasible_mandatory_returns_none() {
        let matrices = line_matrices(&[0, 60]);
        let stops = vec![stop("far").with_time_window(TimeWindow::new(at(8, 0), at(8, 30)))];
        let model = ModelBuilder::new(1_000).build(&stops, &matrices, &context(), false, None).unwrap();

        assert!(solve(&model, SolverConfig::instant()).is_none());
        assert!(heuristic(&model).is_none());
    }

    #[test]
    fn test_exclusions_drop_the_unreachable_stop() {
        let matrices = line_matrices(&[0, 5, 60, 10]);
        let stops = vec![
            stop("a"),
            stop("late").with_time_window(TimeWindow::new(at(8, 0), at(8, 30))),
            stop("c"),
        ];
        let model = ModelBuilder::new(1_000_000).build(&stops, &matrices, &context(), true, None).unwrap();

        for assignment in [solve(&model, SolverConfig::default()).unwrap(), heuristic(&model).unwrap()] {
            assert!(!assignment.visits(2));
            assert!(assignment.visits(1) && assignment.visits(3));
            assert_eq!(assignment.evaluation.drop_penalty, 1_000_000);
        }
    }

    #[test]
    fn test_order_types_are_honoured() {
        let matrices = line_matrices(&[0, 10, 20, 30]);
        let stops = vec![
            stop("a").with_order_type(OrderType::Last),
            stop("b"),
            stop("c").with_order_type(OrderType::First),
        ];
        let model = ModelBuilder::new(1_000).build(&stops, &matrices, &context(), false, None).unwrap();

        for assignment in [solve(&model, SolverConfig::default()).unwrap(), heuristic(&model).unwrap()] {
            assert_eq!(assignment.route, vec![3, 2, 1]);
        }
    }

    #[test]
    fn test_pinned_middle_slot_lands_at_its_index() {
        // s pinned at slot 1 with a, b, c after it in the list; c at 1 km
        // would be the cheapest first stop
        let matrices = line_matrices(&[0, 3, 2, 4, 1]);
        let stops = vec![stop("s"), stop("a"), stop("b"), stop("c")];

        for slot in 1..=2 {
            let pin = PinnedPosition { stop: 0, slot };
            let model = ModelBuilder::new(1_000)
                .build(&stops, &matrices, &context(), false, Some(pin))
                .unwrap();

            for assignment in [solve(&model, SolverConfig::default()).unwrap(), heuristic(&model).unwrap()] {
                assert_eq!(assignment.route[slot], 1, "slot {}", slot);
                assert_eq!(assignment.route.len(), 4);
            }
        }
    }

    #[test]
    fn test_contradiction_returns_none() {
        let matrices = line_matrices(&[0, 10, 20]);
        let stops = vec![
            stop("a").with_order_type(OrderType::First),
            stop("b").with_order_type(OrderType::First),
        ];
        let model = ModelBuilder::new(1_000).build(&stops, &matrices, &context(), false, None).unwrap();

        assert!(solve(&model, SolverConfig::default()).is_none());
    }

    #[test]
    fn test_cancelled_token_returns_none() {
        let matrices = line_matrices(&[0, 10, 20]);
        let stops = vec![stop("a"), stop("b")];
        let model = ModelBuilder::new(1_000).build(&stops, &matrices, &context(), false, None).unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(SolverRunner::default().solve(&model, &cancel).is_none());
    }

    #[test]
    fn test_quality_search_untangles_crossing_route() {
        // depot in the middle: greedy goes left first, then has to cross back
        let matrices = line_matrices(&[50, 45, 60, 20, 90]);
        let stops = vec![stop("a"), stop("b"), stop("c"), stop("d")];
        let model = ModelBuilder::new(1_000).build(&stops, &matrices, &context(), false, None).unwrap();

        let improved = solve(
            &model,
            SolverConfig::quality().with_time_limit(std::time::Duration::from_secs(2)),
        )
        .unwrap();
        // any route covering 20..90 and back costs at least 140 km
        assert_eq!(improved.evaluation.arc_cost, 140_000);
        assert!(heuristic(&model).unwrap().evaluation.arc_cost >= improved.evaluation.arc_cost);
    }

    #[test]
    fn test_solve_is_deterministic() {
        let matrices = line_matrices(&[0, 14, 3, 27, 9, 21]);
        let stops: Vec<Stop> = ["a", "b", "c", "d", "e"].iter().map(|id| stop(id)).collect();
        let model = ModelBuilder::new(1_000).build(&stops, &matrices, &context(), false, None).unwrap();

        let first = solve(&model, SolverConfig::default()).unwrap();
        let second = solve(&model, SolverConfig::default()).unwrap();
        assert_eq!(first, second);
    }
}
