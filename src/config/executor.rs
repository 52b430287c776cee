// src/config/executor.rs
// Parallel Executor pool sizing, draining, and rate/back-off governance (§4.H)

use serde::{Deserialize, Serialize};

use super::helpers::{env_f64, env_usize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    pub workers: usize,
    pub batch_size: usize,
    pub drain_timeout_seconds: u64,
    pub rate_floor_seconds: u64,
    pub failure_backoff_seconds: u64,
    pub failure_rate_threshold: f64,
    pub failure_rate_window: usize,
    /// Orphaned `processing` rows older than this are reset to `pending` at startup.
    pub orphan_grace_minutes: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            batch_size: 10,
            drain_timeout_seconds: 30,
            rate_floor_seconds: 1,
            failure_backoff_seconds: 60,
            failure_rate_threshold: 0.2,
            failure_rate_window: 50,
            orphan_grace_minutes: 15,
        }
    }
}

impl ExecutorConfig {
    pub fn from_env(default: Self) -> Self {
        Self {
            workers: env_usize("EXECUTOR_WORKERS", default.workers),
            batch_size: env_usize("EXECUTOR_BATCH_SIZE", default.batch_size),
            drain_timeout_seconds: env_usize(
                "EXECUTOR_DRAIN_TIMEOUT_SECONDS",
                default.drain_timeout_seconds as usize,
            ) as u64,
            rate_floor_seconds: env_usize(
                "EXECUTOR_RATE_FLOOR_SECONDS",
                default.rate_floor_seconds as usize,
            ) as u64,
            failure_backoff_seconds: env_usize(
                "EXECUTOR_FAILURE_BACKOFF_SECONDS",
                default.failure_backoff_seconds as usize,
            ) as u64,
            failure_rate_threshold: env_f64(
                "EXECUTOR_FAILURE_RATE_THRESHOLD",
                default.failure_rate_threshold,
            ),
            failure_rate_window: env_usize(
                "EXECUTOR_FAILURE_RATE_WINDOW",
                default.failure_rate_window,
            ),
            orphan_grace_minutes: env_usize(
                "EXECUTOR_ORPHAN_GRACE_MINUTES",
                default.orphan_grace_minutes as usize,
            ) as u64,
        }
    }
}
