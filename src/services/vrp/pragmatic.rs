//! vrp-pragmatic solver integration.

use std::io::BufWriter;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use vrp_core::prelude::VrpConfigBuilder;
use vrp_core::rosomaxa::utils::{DefaultRandom, Environment, Quota};
use vrp_core::solver::Solver;
use vrp_pragmatic::format::problem::{Matrix, PragmaticProblem, Problem};
use vrp_pragmatic::format::solution::{write_pragmatic, PragmaticOutputType, Solution as PragmaticSolution};

use super::adapter::{build_pragmatic_matrix, build_pragmatic_problem, parse_job_id, DEFAULT_PROFILE};
use super::config::SolverConfig;
use super::model::RoutingModel;

/// Stops the metaheuristic on cancellation or once the solve deadline passes
struct SolveQuota {
    deadline: Instant,
    cancel: CancellationToken,
}

impl Quota for SolveQuota {
    fn is_reached(&self) -> bool {
        self.cancel.is_cancelled() || Instant::now() >= self.deadline
    }
}

/// Route found by vrp-pragmatic, as model stop nodes in visiting order.
/// Nodes it left unassigned are simply absent.
pub fn solve_pragmatic(
    model: &RoutingModel<'_>,
    config: &SolverConfig,
    cancel: &CancellationToken,
) -> Result<Vec<usize>> {
    if model.stop_count() == 0 {
        return Ok(Vec::new());
    }

    let problem_json = build_pragmatic_problem(model)?;
    let problem_format: Problem =
        serde_json::from_value(problem_json).context("Failed to deserialize pragmatic problem")?;

    let matrix: Matrix = build_pragmatic_matrix(model, DEFAULT_PROFILE);
    let core_problem = (problem_format, vec![matrix])
        .read_pragmatic()
        .map_err(|e| anyhow!("Failed to build core problem from pragmatic format: {}", e))?;
    let core_problem = Arc::new(core_problem);

    let solver_config = VrpConfigBuilder::new(core_problem.clone())
        .set_environment(build_environment(config, cancel))
        .prebuild()
        .map_err(|e| anyhow!("Failed to create solver builder: {}", e))?
        .with_max_time(Some(config.max_time_seconds()))
        .with_max_generations(Some(config.max_generations))
        .build()
        .map_err(|e| anyhow!("Failed to build solver configuration: {}", e))?;

    let solution = Solver::new(core_problem.clone(), solver_config)
        .solve()
        .map_err(|e| anyhow!("Failed to solve VRP with vrp-pragmatic: {}", e))?;

    let pragmatic = write_pragmatic_solution(core_problem.as_ref(), &solution)?;
    Ok(map_route(&pragmatic))
}

fn build_environment(config: &SolverConfig, cancel: &CancellationToken) -> Arc<Environment> {
    let random = if config.repeatable {
        DefaultRandom::new_repeatable()
    } else {
        DefaultRandom::default()
    };

    Arc::new(Environment {
        random: Arc::new(random),
        quota: Some(Arc::new(SolveQuota {
            deadline: Instant::now() + config.time_limit,
            cancel: cancel.clone(),
        })),
        logger: Arc::new(|message: &str| debug!("vrp-core: {}", message)),
        ..Environment::default()
    })
}

fn write_pragmatic_solution(
    problem: &vrp_core::models::Problem,
    solution: &vrp_core::models::Solution,
) -> Result<PragmaticSolution> {
    let mut writer = BufWriter::new(Vec::new());
    write_pragmatic(problem, solution, PragmaticOutputType::default(), &mut writer)
        .map_err(|e| anyhow!("Failed to serialize pragmatic solution: {}", e))?;

    let bytes = writer.into_inner().context("Failed to flush solution writer")?;
    let parsed: PragmaticSolution =
        serde_json::from_slice(&bytes).context("Failed to parse pragmatic solution JSON")?;

    Ok(parsed)
}

fn map_route(solution: &PragmaticSolution) -> Vec<usize> {
    let mut route = Vec::new();
    if let Some(tour) = solution.tours.first() {
        for stop in &tour.stops {
            for activity in stop.activities() {
                // departure and arrival carry no stop node
                if let Some(node) = parse_job_id(&activity.job_id) {
                    route.push(node);
                }
            }
        }
    }

    if let Some(unassigned) = &solution.unassigned {
        for job in unassigned {
            let codes: Vec<&str> = job.reasons.iter().map(|r| r.code.as_str()).collect();
            debug!("vrp-pragmatic left {} unassigned: {}", job.job_id, codes.join(", "));
        }
    }

    route
}
