//! Configuration management

use std::str::FromStr;

use anyhow::{self, Context, Result};
use chrono::Duration;

use crate::defaults::{
    DEFAULT_DROP_PENALTY, DEFAULT_MAX_WAYPOINTS, DEFAULT_PIN_SLOTS, DEFAULT_TIGHT_DEADLINE_HOURS, DEFAULT_TIGHT_WINDOW_HOURS, DEFAULT_VALHALLA_TIMEOUT_SECONDS,
};
use crate::services::vrp::{SolverConfig, StrategyConfig};

/// Solver preset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SearchMode {
    /// First feasible route
    #[default]
    Interactive,
    /// Guided local search for the whole time limit
    Quality,
    /// Small construction budget, answers within a couple of seconds
    Instant,
}

impl SearchMode {
    pub fn solver_config(self) -> SolverConfig {
        match self {
            SearchMode::Interactive => SolverConfig::interactive(),
            SearchMode::Quality => SolverConfig::quality(),
            SearchMode::Instant => SolverConfig::instant(),
        }
    }
}

impl FromStr for SearchMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "interactive" => Ok(SearchMode::Interactive),
            "quality" => Ok(SearchMode::Quality),
            "instant" => Ok(SearchMode::Instant),
            other => anyhow::bail!("unknown search mode '{}' (interactive, quality, instant)", other),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Valhalla routing engine URL (optional, matrices are estimated without it)
    pub valhalla_url: Option<String>,

    pub valhalla_timeout_seconds: u64,

    /// Largest stop count sent to the routing provider in one request
    pub max_waypoints: usize,

    pub search_mode: SearchMode,

    /// Overrides the preset's time limit when set
    pub solver_time_limit_seconds: Option<u64>,

    pub drop_penalty: i64,

    pub tight_window_hours: i64,

    pub tight_deadline_hours: i64,

    pub pin_slots: usize,

    /// Directory for the rolling log file
    pub logs_dir: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let valhalla_url = lookup("VALHALLA_URL").filter(|url| !url.trim().is_empty());

        let search_mode = match lookup("OPTIMIZER_SEARCH_MODE") {
            Some(mode) => mode.parse().context("OPTIMIZER_SEARCH_MODE")?,
            None => SearchMode::default(),
        };

        let drop_penalty: i64 = parse_or(&lookup, "OPTIMIZER_DROP_PENALTY", DEFAULT_DROP_PENALTY)?;
        if drop_penalty <= 0 {
            anyhow::bail!("OPTIMIZER_DROP_PENALTY must be positive (got {})", drop_penalty);
        }

        Ok(Self {
            valhalla_url,
            valhalla_timeout_seconds: parse_or(&lookup, "VALHALLA_TIMEOUT_SECONDS", DEFAULT_VALHALLA_TIMEOUT_SECONDS)?,
            max_waypoints: parse_or(&lookup, "OPTIMIZER_MAX_WAYPOINTS", DEFAULT_MAX_WAYPOINTS)?,
            search_mode,
            solver_time_limit_seconds: lookup("OPTIMIZER_TIME_LIMIT_SECONDS")
                .map(|v| v.trim().parse().context("OPTIMIZER_TIME_LIMIT_SECONDS must be a number"))
                .transpose()?,
            drop_penalty,
            tight_window_hours: parse_or(&lookup, "OPTIMIZER_TIGHT_WINDOW_HOURS", DEFAULT_TIGHT_WINDOW_HOURS)?,
            tight_deadline_hours: parse_or(&lookup, "OPTIMIZER_TIGHT_DEADLINE_HOURS", DEFAULT_TIGHT_DEADLINE_HOURS)?,
            pin_slots: parse_or(&lookup, "OPTIMIZER_PIN_SLOTS", DEFAULT_PIN_SLOTS)?,
            logs_dir: lookup("LOGS_DIR").unwrap_or_else(|| "./logs".to_string()),
        })
    }

    /// Solver settings for `mode`, honouring the configured time limit
    pub fn solver_config(&self, mode: SearchMode) -> SolverConfig {
        let config = mode.solver_config();
        match self.solver_time_limit_seconds {
            Some(seconds) => config.with_time_limit(std::time::Duration::from_secs(seconds)),
            None => config,
        }
    }

    pub fn strategy_config(&self) -> StrategyConfig {
        StrategyConfig {
            drop_penalty: self.drop_penalty,
            tight_window_width: Duration::hours(self.tight_window_hours),
            tight_deadline_horizon: Duration::hours(self.tight_deadline_hours),
            pin_slots: self.pin_slots,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} must be a number (got '{}')", key, value)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = config_from(&[]).unwrap();

        assert!(config.valhalla_url.is_none());
        assert_eq!(config.valhalla_timeout_seconds, 30);
        assert_eq!(config.max_waypoints, 25);
        assert_eq!(config.search_mode, SearchMode::Interactive);
        assert_eq!(config.drop_penalty, 10_000_000);
        assert_eq!(config.pin_slots, 3);
        assert_eq!(config.logs_dir, "./logs");
    }

    #[test]
    fn test_config_valhalla_url_some_when_set() {
        let config = config_from(&[("VALHALLA_URL", "http://localhost:8002")]).unwrap();
        assert_eq!(config.valhalla_url, Some("http://localhost:8002".to_string()));
    }

    #[test]
    fn test_config_blank_valhalla_url_is_none() {
        let config = config_from(&[("VALHALLA_URL", "  ")]).unwrap();
        assert!(config.valhalla_url.is_none());
    }

    #[test]
    fn test_config_overrides() {
        let config = config_from(&[
            ("OPTIMIZER_SEARCH_MODE", "Quality"),
            ("OPTIMIZER_TIME_LIMIT_SECONDS", "5"),
            ("OPTIMIZER_PIN_SLOTS", "2"),
            ("OPTIMIZER_TIGHT_WINDOW_HOURS", "2"),
        ])
        .unwrap();

        assert_eq!(config.search_mode, SearchMode::Quality);
        let solver = config.solver_config(config.search_mode);
        assert_eq!(solver.time_limit, std::time::Duration::from_secs(5));

        let strategy = config.strategy_config();
        assert_eq!(strategy.pin_slots, 2);
        assert_eq!(strategy.tight_window_width, Duration::hours(2));
    }

    #[test]
    fn test_config_rejects_garbage_numbers() {
        assert!(config_from(&[("OPTIMIZER_PIN_SLOTS", "three")]).is_err());
        assert!(config_from(&[("OPTIMIZER_TIME_LIMIT_SECONDS", "-1")]).is_err());
        assert!(config_from(&[("OPTIMIZER_DROP_PENALTY", "0")]).is_err());
        assert!(config_from(&[("OPTIMIZER_SEARCH_MODE", "thorough")]).is_err());
    }

    #[test]
    fn test_quality_keeps_preset_time_limit() {
        let config = config_from(&[]).unwrap();
        assert_eq!(
            config.solver_config(SearchMode::Quality).time_limit,
            SolverConfig::quality().time_limit
        );
    }
}
