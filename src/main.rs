//! Route Optimizer - orders a single vehicle's stops under time windows
//!
//! Reads an optimization request from a JSON file and writes the outcome.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use route_optimizer::cli::{Cli, Command};
use route_optimizer::config::{Config, SearchMode};
use route_optimizer::services::cancellation::RUNS;
use route_optimizer::services::matrix::MatrixBuilder;
use route_optimizer::services::routing::create_routing_service_with_fallback;
use route_optimizer::types::OptimizationRequest;
use route_optimizer::{Optimizer, StrategyLadder};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    std::fs::create_dir_all(&config.logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &config.logs_dir, "route-optimizer.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // stderr keeps stdout free for results
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,route_optimizer=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    info!("Configuration loaded");

    let provider = create_routing_service_with_fallback(config.valhalla_url.clone(), config.valhalla_timeout_seconds).await;
    let matrix_builder = MatrixBuilder::new(provider, config.max_waypoints);

    match cli.command {
        Command::Optimize { request, output, mode } => {
            let mode = mode.unwrap_or(config.search_mode);
            optimize(&config, matrix_builder, mode, &request, output.as_deref()).await
        }
        Command::Matrix { request } => print_matrix(matrix_builder, &request).await,
    }
}

fn read_request(path: &Path) -> Result<OptimizationRequest> {
    let body = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&body).with_context(|| format!("Failed to parse request {}", path.display()))
}

async fn optimize(
    config: &Config,
    matrix_builder: MatrixBuilder,
    mode: SearchMode,
    request_path: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let request = read_request(request_path)?;
    let run_key = request
        .depot_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| request_path.display().to_string());

    let owner_id = Uuid::new_v4();
    let guard = RUNS.register(run_key.clone(), owner_id)?;

    // Ctrl-C cancels the run; the optimizer still returns an outcome
    let cancel_key = run_key.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling optimization");
            if let Err(e) = RUNS.cancel(&cancel_key, owner_id) {
                warn!("Failed to cancel {}: {}", cancel_key, e);
            }
        }
    });

    let ladder = StrategyLadder::new(config.strategy_config(), config.solver_config(mode));
    let optimizer = Optimizer::new(matrix_builder, ladder);

    info!("Optimizing {} ({:?} mode)", run_key, mode);
    let outcome = optimizer.optimize(request, guard.token()).await;
    info!("Outcome: {} - {}", outcome.status().as_str(), outcome.result().message);

    let json = serde_json::to_string_pretty(&outcome)?;
    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Result written to {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

async fn print_matrix(matrix_builder: MatrixBuilder, request_path: &Path) -> Result<()> {
    let input = read_request(request_path)?.into_route_input()?;
    let matrices = matrix_builder.build(&input.depot, &input.stops).await;

    let json = serde_json::json!({
        "source": matrices.source.as_str(),
        "size": matrices.size,
        "distancesMeters": matrices.distances,
        "durationsSeconds": matrices.durations,
    });
    println!("{}", serde_json::to_string_pretty(&json)?);

    Ok(())
}
