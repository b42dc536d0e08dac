//! Routing model for a single vehicle
//!
//! Node 0 is the depot, which is both the start and the end of the route.
//! Stop `i` of the list passed to the builder is node `i + 1`. Costs and
//! transits are read through `stop_matrix_indices`, so a reordered stop list
//! can reuse the matrices built for the original order.

use tracing::debug;

use crate::error::EngineError;
use crate::services::matrix::DistanceTimeMatrices;
use crate::types::{OrderType, RouteContext, Stop};

/// Depot node
pub const DEPOT: usize = 0;

/// Larger matrix entries cannot be summed over a route without overflow risk
const MAX_MATRIX_ENTRY: u64 = 1 << 40;

/// Allowed range for a node's cumulative time, in seconds from route start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub min: i64,
    pub max: i64,
}

impl TimeRange {
    /// No cumulative time satisfies this range; cumuls never go negative.
    pub const IMPOSSIBLE: TimeRange = TimeRange { min: -2, max: -1 };

    pub fn contains(&self, value: i64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Cumulative elapsed-time dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeDimension {
    /// Upper bound on every cumul, seconds
    pub capacity: i64,
    /// Longest wait allowed before a node, seconds
    pub slack_max: i64,
}

/// Endpoint of a next-constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteNode {
    Start,
    End,
    /// Stop node (1-based model index)
    Stop(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    OrderFirst,
    OrderLast,
    PinnedPosition,
}

/// `next(from) == to`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextConstraint {
    pub from: RouteNode,
    pub to: RouteNode,
    pub kind: ConstraintKind,
}

/// Fix the stop at `stop` (index into the builder's stop list) to `slot`
/// (0-based position in the visiting order)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinnedPosition {
    pub stop: usize,
    pub slot: usize,
}

/// Schedule of a complete route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEvaluation {
    /// Sum of arc costs including the legs from and to the depot, meters
    pub arc_cost: i64,
    /// Sum of drop penalties of stops left out
    pub drop_penalty: i64,
    /// Earliest feasible cumul per visited node, parallel to the route
    pub cumuls: Vec<i64>,
    /// Arrival back at the depot
    pub end_cumul: i64,
}

impl RouteEvaluation {
    pub fn objective(&self) -> i64 {
        self.arc_cost + self.drop_penalty
    }
}

/// Everything the search needs to know about one attempt
#[derive(Debug, Clone)]
pub struct RoutingModel<'m> {
    matrices: &'m DistanceTimeMatrices,
    /// Matrix index per node; `[0]` is the depot
    matrix_index: Vec<usize>,
    time: TimeDimension,
    windows: Vec<Option<TimeRange>>,
    drop_penalties: Vec<Option<i64>>,
    constraints: Vec<NextConstraint>,
    /// Forced successor per node, `[0]` holds the start's
    successor: Vec<Option<RouteNode>>,
    /// Forced predecessor per node, `[0]` holds the end's
    predecessor: Vec<Option<RouteNode>>,
    contradiction: Option<String>,
}

impl<'m> RoutingModel<'m> {
    pub fn node_count(&self) -> usize {
        self.matrix_index.len()
    }

    pub fn stop_count(&self) -> usize {
        self.matrix_index.len() - 1
    }

    pub fn arc_cost(&self, from: usize, to: usize) -> i64 {
        self.matrices
            .distance(self.matrix_index[from], self.matrix_index[to]) as i64
    }

    pub fn transit(&self, from: usize, to: usize) -> i64 {
        self.matrices
            .duration(self.matrix_index[from], self.matrix_index[to]) as i64
    }

    pub fn time_dimension(&self) -> TimeDimension {
        self.time
    }

    pub fn time_window(&self, node: usize) -> Option<TimeRange> {
        self.windows[node]
    }

    /// Drop penalty when the node sits in a disjunction
    pub fn drop_penalty(&self, node: usize) -> Option<i64> {
        self.drop_penalties[node]
    }

    pub fn is_optional(&self, node: usize) -> bool {
        self.drop_penalties[node].is_some()
    }

    pub fn has_optional_nodes(&self) -> bool {
        self.drop_penalties.iter().any(Option::is_some)
    }

    pub fn constraints(&self) -> &[NextConstraint] {
        &self.constraints
    }

    /// Set when two constraints demand different neighbours of one node
    pub fn contradiction(&self) -> Option<&str> {
        self.contradiction.as_deref()
    }

    /// Forced successor of `node`, where `DEPOT` stands for the route start
    pub fn forced_successor(&self, node: usize) -> Option<RouteNode> {
        self.successor[node]
    }

    /// Forced predecessor of a stop node
    pub fn forced_predecessor(&self, node: usize) -> Option<RouteNode> {
        self.predecessor[node]
    }

    /// Earliest feasible cumul at `node` after leaving `prev` at `prev_cumul`
    pub fn arrival_cumul(&self, prev: usize, prev_cumul: i64, node: usize) -> Option<i64> {
        let arrival = prev_cumul + self.transit(prev, node);
        let range = self.windows[node];
        let cumul = match range {
            Some(range) => arrival.max(range.min),
            None => arrival,
        };

        if cumul - arrival > self.time.slack_max || cumul > self.time.capacity {
            return None;
        }
        if let Some(range) = range {
            if !range.contains(cumul) {
                return None;
            }
        }
        Some(cumul)
    }

    /// Arrival back at the depot after leaving `last` at `cumul`
    pub fn end_cumul(&self, last: usize, cumul: i64) -> Option<i64> {
        let arrival = cumul + self.transit(last, DEPOT);
        (arrival <= self.time.capacity).then_some(arrival)
    }

    /// Full feasibility check of a route given as stop nodes in visiting order.
    /// Returns `None` when any constraint is violated.
    pub fn evaluate(&self, route: &[usize]) -> Option<RouteEvaluation> {
        if self.contradiction.is_some() {
            return None;
        }

        let nodes = self.node_count();
        let mut position = vec![None; nodes];
        for (pos, &node) in route.iter().enumerate() {
            if node == DEPOT || node >= nodes || position[node].is_some() {
                return None;
            }
            position[node] = Some(pos);
        }

        let mut drop_penalty = 0i64;
        for node in 1..nodes {
            if position[node].is_none() {
                drop_penalty = drop_penalty.checked_add(self.drop_penalties[node]?)?;
            }
        }

        for constraint in &self.constraints {
            let actual_next = match constraint.from {
                RouteNode::Start => route.first().map_or(RouteNode::End, |&n| RouteNode::Stop(n)),
                RouteNode::Stop(node) => {
                    let pos = position[node]?;
                    route.get(pos + 1).map_or(RouteNode::End, |&n| RouteNode::Stop(n))
                }
                RouteNode::End => return None,
            };
            if actual_next != constraint.to {
                return None;
            }
        }

        let mut cumuls = Vec::with_capacity(route.len());
        let mut arc_cost = 0i64;
        let mut cumul = 0i64;
        let mut prev = DEPOT;
        for &node in route {
            cumul = self.arrival_cumul(prev, cumul, node)?;
            arc_cost += self.arc_cost(prev, node);
            cumuls.push(cumul);
            prev = node;
        }
        let end_cumul = self.end_cumul(prev, cumul)?;
        arc_cost += self.arc_cost(prev, DEPOT);

        Some(RouteEvaluation {
            arc_cost,
            drop_penalty,
            cumuls,
            end_cumul,
        })
    }
}

/// Builds a `RoutingModel` per strategy attempt
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    drop_penalty: i64,
}

impl ModelBuilder {
    pub fn new(drop_penalty: i64) -> Self {
        Self { drop_penalty }
    }

    /// Build a model for stops in their matrix order
    pub fn build<'m>(
        &self,
        stops: &[Stop],
        matrices: &'m DistanceTimeMatrices,
        context: &RouteContext,
        allow_exclusions: bool,
        pinned: Option<PinnedPosition>,
    ) -> Result<RoutingModel<'m>, EngineError> {
        let identity: Vec<usize> = (1..=stops.len()).collect();
        self.build_with_indices(stops, &identity, matrices, context, allow_exclusions, pinned)
    }

    /// Build a model where `stops[i]` lives at matrix index
    /// `stop_matrix_indices[i]`
    pub fn build_with_indices<'m>(
        &self,
        stops: &[Stop],
        stop_matrix_indices: &[usize],
        matrices: &'m DistanceTimeMatrices,
        context: &RouteContext,
        allow_exclusions: bool,
        pinned: Option<PinnedPosition>,
    ) -> Result<RoutingModel<'m>, EngineError> {
        let n = stops.len();
        validate_matrices(matrices)?;

        if stop_matrix_indices.len() != n {
            return Err(EngineError::InvalidModel(format!(
                "{} stops but {} matrix indices",
                n,
                stop_matrix_indices.len()
            )));
        }
        if let Some(&bad) = stop_matrix_indices
            .iter()
            .find(|&&idx| idx == 0 || idx >= matrices.size)
        {
            return Err(EngineError::InvalidModel(format!(
                "matrix index {} outside 1..{}",
                bad, matrices.size
            )));
        }
        if let Some(pin) = pinned {
            if pin.stop >= n || pin.slot >= n {
                return Err(EngineError::InvalidModel(format!(
                    "pinned stop {} at slot {} outside {} stops",
                    pin.stop, pin.slot, n
                )));
            }
        }

        let mut matrix_index = Vec::with_capacity(n + 1);
        matrix_index.push(0);
        matrix_index.extend_from_slice(stop_matrix_indices);

        let horizon = context.max_route_duration.num_seconds().max(0);
        let time = TimeDimension {
            capacity: horizon,
            slack_max: horizon,
        };

        let mut windows = vec![None; n + 1];
        for (i, stop) in stops.iter().enumerate() {
            windows[i + 1] = stop.time_window.map(|tw| {
                if !tw.is_satisfiable(context.route_start) {
                    debug!("Stop '{}' has an unsatisfiable window {}", stop.name, tw);
                    return TimeRange::IMPOSSIBLE;
                }
                TimeRange {
                    min: (tw.start - context.route_start).num_seconds().max(0),
                    max: (tw.end - context.route_start).num_seconds(),
                }
            });
        }

        let constraints = ordering_constraints(stops, pinned);

        let mut drop_penalties = vec![None; n + 1];
        if allow_exclusions {
            check_objective_bound(self.drop_penalty, n)?;
            for (i, stop) in stops.iter().enumerate() {
                let is_pinned = pinned.is_some_and(|pin| pin.stop == i);
                if stop.order_type == OrderType::Auto && !is_pinned {
                    drop_penalties[i + 1] = Some(self.drop_penalty);
                }
            }
            // a node with a fixed neighbour has to be visited
            for constraint in &constraints {
                for end in [constraint.from, constraint.to] {
                    if let RouteNode::Stop(node) = end {
                        drop_penalties[node] = None;
                    }
                }
            }
        }

        let (successor, predecessor, contradiction) = link_constraints(n + 1, &constraints);
        if let Some(reason) = &contradiction {
            debug!("Routing model is contradictory: {}", reason);
        }

        Ok(RoutingModel {
            matrices,
            matrix_index,
            time,
            windows,
            drop_penalties,
            constraints,
            successor,
            predecessor,
            contradiction,
        })
    }
}

fn validate_matrices(matrices: &DistanceTimeMatrices) -> Result<(), EngineError> {
    let n = matrices.size;
    if matrices.distances.len() != n || matrices.durations.len() != n {
        return Err(EngineError::InvalidModel(format!(
            "matrix of size {} has {}x{} rows",
            n,
            matrices.distances.len(),
            matrices.durations.len()
        )));
    }
    for (distances, durations) in matrices.distances.iter().zip(&matrices.durations) {
        if distances.len() != n || durations.len() != n {
            return Err(EngineError::InvalidModel("matrix is not square".to_string()));
        }
        if distances.iter().chain(durations).any(|&v| v > MAX_MATRIX_ENTRY) {
            return Err(EngineError::ArithmeticOverflow("reading travel matrix entries"));
        }
    }
    Ok(())
}

/// Every stop dropped plus the longest possible route must fit an `i64`
fn check_objective_bound(drop_penalty: i64, stops: usize) -> Result<(), EngineError> {
    let stops = i64::try_from(stops).map_err(|_| EngineError::ArithmeticOverflow("counting stops"))?;
    let longest_route = stops
        .checked_add(1)
        .and_then(|legs| legs.checked_mul(MAX_MATRIX_ENTRY as i64));
    drop_penalty
        .checked_mul(stops)
        .zip(longest_route)
        .and_then(|(penalties, route)| penalties.checked_add(route))
        .map(|_| ())
        .ok_or(EngineError::ArithmeticOverflow("summing drop penalties"))
}

/// First/Last order types plus the optional pinned position
fn ordering_constraints(stops: &[Stop], pinned: Option<PinnedPosition>) -> Vec<NextConstraint> {
    let mut constraints = Vec::new();

    for (i, stop) in stops.iter().enumerate() {
        match stop.order_type {
            OrderType::First => constraints.push(NextConstraint {
                from: RouteNode::Start,
                to: RouteNode::Stop(i + 1),
                kind: ConstraintKind::OrderFirst,
            }),
            OrderType::Last => constraints.push(NextConstraint {
                from: RouteNode::Stop(i + 1),
                to: RouteNode::End,
                kind: ConstraintKind::OrderLast,
            }),
            OrderType::Auto => {}
        }
    }

    if let Some(pin) = pinned {
        let node = RouteNode::Stop(pin.stop + 1);
        let last_slot = stops.len() - 1;
        // stop list without the pinned stop
        let others: Vec<usize> = (0..stops.len()).filter(|&i| i != pin.stop).collect();
        let mut pin_edge = |from, to| {
            constraints.push(NextConstraint {
                from,
                to,
                kind: ConstraintKind::PinnedPosition,
            })
        };

        if pin.slot == 0 {
            pin_edge(RouteNode::Start, node);
        }
        if pin.slot == last_slot {
            pin_edge(node, RouteNode::End);
        }
        if pin.slot > 0 && pin.slot < last_slot {
            // fixed prefix: Start -> others[0] -> .. -> others[slot - 1] -> pinned -> others[slot]
            let mut prev = RouteNode::Start;
            for &other in &others[..pin.slot] {
                let next = RouteNode::Stop(other + 1);
                pin_edge(prev, next);
                prev = next;
            }
            pin_edge(prev, node);
            pin_edge(node, RouteNode::Stop(others[pin.slot] + 1));
        }
    }

    constraints
}

type Links = (Vec<Option<RouteNode>>, Vec<Option<RouteNode>>, Option<String>);

fn link_constraints(nodes: usize, constraints: &[NextConstraint]) -> Links {
    let mut successor: Vec<Option<RouteNode>> = vec![None; nodes];
    let mut predecessor: Vec<Option<RouteNode>> = vec![None; nodes];
    let mut contradiction = None;

    for constraint in constraints {
        let from = match constraint.from {
            RouteNode::Start => 0,
            RouteNode::Stop(node) => node,
            RouteNode::End => {
                contradiction = Some("route end cannot have a successor".to_string());
                continue;
            }
        };
        let to = match constraint.to {
            RouteNode::End => 0,
            RouteNode::Stop(node) => node,
            RouteNode::Start => {
                contradiction = Some("route start cannot have a predecessor".to_string());
                continue;
            }
        };

        if constraint.from == constraint.to {
            contradiction = Some(format!("node {} cannot follow itself", from));
            continue;
        }

        match successor[from] {
            Some(existing) if existing != constraint.to => {
                contradiction = Some(format!(
                    "{:?} must be followed by both {:?} and {:?}",
                    constraint.from, existing, constraint.to
                ));
            }
            _ => successor[from] = Some(constraint.to),
        }
        match predecessor[to] {
            Some(existing) if existing != constraint.from => {
                contradiction = Some(format!(
                    "{:?} must be preceded by both {:?} and {:?}",
                    constraint.to, existing, constraint.from
                ));
            }
            _ => predecessor[to] = Some(constraint.from),
        }
    }

    (successor, predecessor, contradiction)
}
