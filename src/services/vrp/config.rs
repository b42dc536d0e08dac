//! VRP Solver configuration

use std::time::Duration;

use crate::defaults::DEFAULT_SOLVER_TIME_LIMIT_SECONDS;

/// Configuration for a single bounded solve
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Wall-clock limit per solve, shared by vrp-pragmatic and the fallback
    pub time_limit: Duration,
    /// Maximum generations for the vrp-pragmatic metaheuristic
    pub max_generations: usize,
    /// Seeded random source so identical input gives an identical route
    pub repeatable: bool,
    /// Node expansions allowed in the fallback construction
    pub max_construction_steps: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::interactive()
    }
}

impl SolverConfig {
    /// Interactive callers: few generations, a good first route quickly
    pub fn interactive() -> Self {
        Self {
            time_limit: Duration::from_secs(DEFAULT_SOLVER_TIME_LIMIT_SECONDS),
            max_generations: 100,
            repeatable: true,
            max_construction_steps: 200_000,
        }
    }

    /// Quality configuration for background processing
    /// - Longer solve time (~30 seconds)
    /// - Better optimization results
    pub fn quality() -> Self {
        Self {
            time_limit: Duration::from_secs(30),
            max_generations: 3000,
            repeatable: true,
            max_construction_steps: 1_000_000,
        }
    }

    /// Instant configuration for very fast response
    /// - Short construction budget, may miss feasible orders
    pub fn instant() -> Self {
        Self {
            time_limit: Duration::from_secs(2),
            max_generations: 10,
            repeatable: true,
            max_construction_steps: 20_000,
        }
    }

    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    /// Time limit in whole seconds, at least one
    pub fn max_time_seconds(&self) -> usize {
        self.time_limit.as_secs().max(1) as usize
    }
}
