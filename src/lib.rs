//! Route optimizer - single-vehicle routing with time windows
//!
//! Orders a day's stops for one vehicle leaving from and returning to a
//! depot, honouring time windows, first/last ordering hints and a route
//! duration cap. When no order visits every stop, stops are dropped or
//! problematic stops pinned until a feasible route is found.

pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod services;
pub mod types;

pub use error::EngineError;
pub use services::vrp::{Optimizer, SolverConfig, Strategy, StrategyConfig, StrategyLadder};
