//! VRP (Vehicle Routing Problem) solver for a single vehicle with time windows
//!
//! `ModelBuilder` turns stops and matrices into a `RoutingModel`,
//! `SolverRunner` hands it to vrp-pragmatic (with a construction heuristic
//! as fallback), `extract_solution` reads the result back and
//! `StrategyLadder` retries with relaxed models until one is feasible.

mod adapter;
mod config;
mod model;
mod orchestrator;
mod pragmatic;
mod search;
mod solution;

pub use adapter::{build_pragmatic_matrix, build_pragmatic_problem, forced_sequences, DEFAULT_PROFILE};
pub use config::SolverConfig;
pub use model::{
    ConstraintKind, ModelBuilder, NextConstraint, PinnedPosition, RouteEvaluation, RouteNode, RoutingModel,
    TimeDimension, TimeRange, DEPOT,
};
pub use orchestrator::{Optimizer, Strategy, StrategyConfig, StrategyLadder};
pub use pragmatic::solve_pragmatic;
pub use search::{construct, Assignment, SolverRunner, ALGORITHM_HEURISTIC, ALGORITHM_PRAGMATIC};
pub use solution::{extract_solution, ExtractedSolution};
