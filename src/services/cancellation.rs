//! Cancellation registry for running optimizations
//!
//! One optimization per run key (typically a route or depot id) at a time.
//! Cancelling requires the owner that registered the run. The `RunGuard`
//! removes the entry when dropped.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Global run registry
pub static RUNS: Lazy<RunRegistry> = Lazy::new(RunRegistry::default);

struct RunEntry {
    token: CancellationToken,
    owner_id: Uuid,
}

/// Keeps a run registered; hand `token()` to the optimizer
pub struct RunGuard {
    run_key: String,
    token: CancellationToken,
    registry: RunRegistry,
}

impl RunGuard {
    pub fn run_key(&self) -> &str {
        &self.run_key
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.registry.remove(&self.run_key);
    }
}

#[derive(Debug, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("an optimization is already running for '{0}'")]
    AlreadyRunning(String),

    #[error("optimization belongs to another caller")]
    NotOwner,
}

/// Thread-safe map of running optimizations and their tokens
#[derive(Clone, Default)]
pub struct RunRegistry {
    runs: Arc<Mutex<HashMap<String, RunEntry>>>,
}

impl RunRegistry {
    /// Register a run. Fails while another run holds the same key.
    pub fn register(&self, run_key: impl Into<String>, owner_id: Uuid) -> Result<RunGuard, RegistryError> {
        let run_key = run_key.into();
        let mut runs = self.runs.lock();
        if runs.contains_key(&run_key) {
            return Err(RegistryError::AlreadyRunning(run_key));
        }

        let token = CancellationToken::new();
        runs.insert(
            run_key.clone(),
            RunEntry {
                token: token.clone(),
                owner_id,
            },
        );

        Ok(RunGuard {
            run_key,
            token,
            registry: self.clone(),
        })
    }

    /// Cancel a run, only for its owner.
    ///
    /// `Ok(false)` when nothing runs under the key.
    pub fn cancel(&self, run_key: &str, caller_id: Uuid) -> Result<bool, RegistryError> {
        let runs = self.runs.lock();
        match runs.get(run_key) {
            Some(entry) if entry.owner_id != caller_id => Err(RegistryError::NotOwner),
            Some(entry) => {
                entry.token.cancel();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn is_running(&self, run_key: &str) -> bool {
        self.runs.lock().contains_key(run_key)
    }

    pub fn is_cancelled(&self, run_key: &str) -> bool {
        self.runs
            .lock()
            .get(run_key)
            .is_some_and(|entry| entry.token.is_cancelled())
    }

    fn remove(&self, run_key: &str) {
        self.runs.lock().remove(run_key);
    }
}
