// src/executor/mod.rs
// Parallel Executor: a fixed worker pool draining the pending queue (§4.H)

pub mod stats;
pub mod worker;

pub use stats::{ExecutorStats, StatsSnapshot};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::llmclient::LlmClient;
use crate::persistence::Repository;

/// Owns the worker pool's join handles and the shared cancellation token
/// used to drain them on shutdown, mirroring the teacher's `TaskManager`.
pub struct Executor {
    config: Arc<PipelineConfig>,
    repository: Arc<Repository>,
    llm_client: Arc<dyn LlmClient>,
    stats: Arc<ExecutorStats>,
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Executor {
    pub fn new(
        config: Arc<PipelineConfig>,
        repository: Arc<Repository>,
        llm_client: Arc<dyn LlmClient>,
    ) -> Self {
        let stats = Arc::new(ExecutorStats::new(config.executor.failure_rate_window));
        Self {
            config,
            repository,
            llm_client,
            stats,
            cancel: CancellationToken::new(),
            handles: Vec::new(),
        }
    }

    pub fn stats(&self) -> Arc<ExecutorStats> {
        self.stats.clone()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Spawns `config.executor.workers` worker tasks, each bound to the
    /// shared `llm_semaphore` so the inference endpoint never sees more
    /// concurrent requests than there are workers (§4.H).
    pub fn spawn(&mut self) {
        let llm_semaphore = Arc::new(Semaphore::new(self.config.executor.workers.max(1)));
        info!(workers = self.config.executor.workers, "starting executor worker pool");

        for index in 0..self.config.executor.workers {
            let worker_id = format!("worker-{index}");
            let repository = self.repository.clone();
            let llm_client = self.llm_client.clone();
            let llm_semaphore = llm_semaphore.clone();
            let config = self.config.clone();
            let stats = self.stats.clone();
            let cancel = self.cancel.clone();

            let handle = tokio::spawn(async move {
                worker::run(worker_id, repository, llm_client, llm_semaphore, config, stats, cancel).await;
            });
            self.handles.push(handle);
        }
    }

    /// Requests all workers stop claiming new batches, then waits up to
    /// `drain_timeout_seconds` for in-flight work to finish before abandoning
    /// the remaining handles (§4.H graceful shutdown).
    pub async fn shutdown(mut self) {
        info!("executor shutdown requested, draining workers");
        self.cancel.cancel();

        let drain = Duration::from_secs(self.config.executor.drain_timeout_seconds);
        let join_all = futures_join_all(std::mem::take(&mut self.handles));

        match tokio::time::timeout(drain, join_all).await {
            Ok(_) => info!("executor drained cleanly"),
            Err(_) => warn!(
                drain_timeout_seconds = self.config.executor.drain_timeout_seconds,
                "executor drain timed out, abandoning remaining in-flight work"
            ),
        }
    }
}

async fn futures_join_all(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        let _ = handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llmclient::MockLlmClient;
    use crate::persistence::{build_pool, ensure_schema};

    async fn test_repository() -> Arc<Repository> {
        let pool = build_pool("sqlite::memory:", 2).await.unwrap();
        ensure_schema(&pool).await.unwrap();
        Arc::new(Repository::new(pool))
    }

    #[tokio::test]
    async fn spawns_and_drains_without_pending_work() {
        let config = Arc::new(PipelineConfig::default());
        let repository = test_repository().await;
        let llm_client: Arc<dyn LlmClient> = Arc::new(MockLlmClient::respond_with("{}"));

        let mut executor = Executor::new(config, repository, llm_client);
        executor.spawn();
        // Give workers a tick to observe the empty queue and idle-sleep.
        tokio::time::sleep(Duration::from_millis(10)).await;
        executor.shutdown().await;
    }
}
