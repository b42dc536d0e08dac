//! CLI argument parsing for the route-optimizer binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::SearchMode;

#[derive(Parser)]
#[command(name = "route-optimizer", about = "Single-vehicle route optimizer with time windows")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Optimize the stop order of a JSON optimization request
    Optimize {
        /// Request file (camelCase JSON)
        #[arg(long)]
        request: PathBuf,
        /// Write the result here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Solver preset, defaults to OPTIMIZER_SEARCH_MODE
        #[arg(long, value_enum)]
        mode: Option<SearchMode>,
    },
    /// Print the distance and time matrices built for a request
    Matrix {
        #[arg(long)]
        request: PathBuf,
    },
}
