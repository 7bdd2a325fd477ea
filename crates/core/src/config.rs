// SPDX-License-Identifier: MIT

//! Process-wide tunables for the worker pool (spec.md §3 "Config", §4.G "Pool sizing").

use std::time::Duration;

/// Idle workers are terminated after this long without a new job (spec.md §4.G).
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Warn once the live worker count exceeds `available_parallelism() * this` (spec.md §4.G).
pub const DEFAULT_POOL_WARNING_MULTIPLIER: usize = 4;

/// Tunables read once at startup and threaded through `ispawn-runtime`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// How long an idle worker lingers before the pool reaps it.
    pub idle_timeout: Duration,
    /// Multiplier applied to hardware concurrency before logging an oversubscription warning.
    pub pool_warning_multiplier: usize,
    /// Directory worker stdout/stderr transcripts are written to, if set.
    pub worker_log_dir: Option<std::path::PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            pool_warning_multiplier: DEFAULT_POOL_WARNING_MULTIPLIER,
            worker_log_dir: None,
        }
    }
}

impl Config {
    /// The worker count past which the pool should log a warning, given a core count.
    pub fn warning_threshold(&self, available_cores: usize) -> usize {
        available_cores.saturating_mul(self.pool_warning_multiplier)
    }

    /// Reads `ISPAWN_IDLE_TIMEOUT_SECS`, `ISPAWN_POOL_WARNING_MULTIPLIER`, and
    /// `ISPAWN_LOG_DIR` (spec.md §6 "Environment"), falling back to [`Config::default`] for any
    /// variable that is unset or fails to parse.
    pub fn from_env() -> Self {
        let default = Self::default();
        let idle_timeout = std::env::var("ISPAWN_IDLE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(default.idle_timeout);
        let pool_warning_multiplier = std::env::var("ISPAWN_POOL_WARNING_MULTIPLIER")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(default.pool_warning_multiplier);
        let worker_log_dir = std::env::var_os("ISPAWN_LOG_DIR").map(std::path::PathBuf::from);

        Self {
            idle_timeout,
            pool_warning_multiplier,
            worker_log_dir,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
