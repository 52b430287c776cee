// src/monitor/mod.rs
// Quality Monitor: periodic rolling-window aggregate and threshold alerting (§4.I)

pub mod aggregate;

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::persistence::Repository;

pub use aggregate::QualityAggregate;

/// Receives a structured alert whenever the rolling window breaches a
/// configured threshold. The logging sink is always installed; additional
/// sinks (paging, webhook) can be layered on by composing this trait.
pub trait AlertSink: Send + Sync {
    fn alert(&self, metric: &'static str, aggregate: &QualityAggregate);
}

/// Default sink: a structured warning log line, mirroring the teacher's
/// `TaskMetrics::report` style.
pub struct LoggingAlertSink;

impl AlertSink for LoggingAlertSink {
    fn alert(&self, metric: &'static str, aggregate: &QualityAggregate) {
        warn!(
            metric,
            sample_size = aggregate.sample_size,
            avg_confidence = aggregate.avg_confidence,
            error_rate = aggregate.error_rate,
            "quality threshold breached"
        );
        crate::metrics::record_quality_alert(metric);
    }
}

pub struct QualityMonitor {
    config: Arc<PipelineConfig>,
    repository: Arc<Repository>,
    sink: Arc<dyn AlertSink>,
}

impl QualityMonitor {
    pub fn new(config: Arc<PipelineConfig>, repository: Arc<Repository>) -> Self {
        Self {
            config,
            repository,
            sink: Arc::new(LoggingAlertSink),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Spawns the periodic monitor task; returns its handle so callers can
    /// fold it into the same shutdown drain as the executor's workers.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let interval = std::time::Duration::from_secs(self.config.monitor.interval_seconds);
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

            info!(interval_seconds = self.config.monitor.interval_seconds, "quality monitor started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = cancel.cancelled() => break,
                }

                if let Err(err) = self.run_once().await {
                    warn!(error = %err, "quality monitor window check failed");
                }
            }

            info!("quality monitor stopped");
        })
    }

    async fn run_once(&self) -> anyhow::Result<()> {
        let since = Utc::now() - ChronoDuration::hours(self.config.monitor.window_hours as i64);
        let results = self.repository.fetch_recent_results(since).await?;
        let failed = self.repository.count_failed_since(since).await?;

        let aggregate = QualityAggregate::compute(&results, failed);
        let breaches = aggregate.breaches(&self.config.monitor.thresholds);

        if breaches.is_empty() {
            info!(
                sample_size = aggregate.sample_size,
                avg_confidence = aggregate.avg_confidence,
                error_rate = aggregate.error_rate,
                "quality window healthy"
            );
        } else {
            for metric in breaches {
                self.sink.alert(metric, &aggregate);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{build_pool, ensure_schema};
    use std::sync::Mutex;

    struct RecordingSink {
        seen: Mutex<Vec<&'static str>>,
    }

    impl AlertSink for RecordingSink {
        fn alert(&self, metric: &'static str, _aggregate: &QualityAggregate) {
            self.seen.lock().unwrap().push(metric);
        }
    }

    #[tokio::test]
    async fn empty_window_produces_no_alerts() {
        let pool = build_pool("sqlite::memory:", 2).await.unwrap();
        ensure_schema(&pool).await.unwrap();
        let repository = Arc::new(Repository::new(pool));
        let config = Arc::new(PipelineConfig::default());

        let sink = Arc::new(RecordingSink { seen: Mutex::new(Vec::new()) });
        let monitor = QualityMonitor::new(config, repository).with_sink(sink.clone());
        monitor.run_once().await.unwrap();

        assert!(sink.seen.lock().unwrap().is_empty());
    }
}
