use std::{env, time::Duration};

use dotenvy::dotenv;

use crate::error::WorkerError;

pub const DEFAULT_CANCEL_WAIT_MS: u64 = 3000;
pub const DEFAULT_THREAD_PREFIX: &str = "bgwork";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Upper bound `cancel` blocks for while the worker thread winds down.
    pub cancel_wait: Duration,
    pub thread_name_prefix: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cancel_wait: Duration::from_millis(DEFAULT_CANCEL_WAIT_MS),
            thread_name_prefix: DEFAULT_THREAD_PREFIX.to_string(),
        }
    }
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, WorkerError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, WorkerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cancel_wait_ms: u64 = lookup("WORKER_CANCEL_WAIT_MS")
            .unwrap_or_else(|| DEFAULT_CANCEL_WAIT_MS.to_string())
            .trim()
            .parse()
            .map_err(|err| WorkerError::Config(format!("invalid WORKER_CANCEL_WAIT_MS: {err}")))?;

        let thread_name_prefix = lookup("WORKER_THREAD_PREFIX")
            .map(|raw| raw.trim().to_string())
            .unwrap_or_else(|| DEFAULT_THREAD_PREFIX.to_string());
        if thread_name_prefix.is_empty() || thread_name_prefix.contains('\0') {
            return Err(WorkerError::Config(
                "WORKER_THREAD_PREFIX must be a non-empty name".into(),
            ));
        }

        Ok(Self {
            cancel_wait: Duration::from_millis(cancel_wait_ms),
            thread_name_prefix,
        })
    }
}
