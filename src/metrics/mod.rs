// src/metrics/mod.rs
// Prometheus metrics and health/metrics HTTP surface (§1 ambient Metrics)

use std::sync::OnceLock;
use std::time::Instant;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub fn init_metrics() {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install prometheus recorder");

    PROMETHEUS_HANDLE
        .set(handle)
        .expect("prometheus handle already initialized");

    info!("prometheus metrics initialized");
}

async fn metrics_handler() -> impl IntoResponse {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics not initialized".to_string()),
    }
}

async fn healthz_handler() -> impl IntoResponse {
    StatusCode::OK
}

/// Builds the `/healthz` + `/metrics` router served alongside the executor.
pub fn router() -> Router {
    Router::new()
        .route("/healthz", get(healthz_handler))
        .route("/metrics", get(metrics_handler))
}

/// Records the outcome of analyzing a single email (§4.H, §5's per-phase
/// tallies).
pub fn record_analysis(phase_used: u8, method_tag: &str, duration_seconds: f64) {
    counter!("inboxflow_emails_analyzed_total", "phase" => phase_used.to_string(), "method" => method_tag.to_string())
        .increment(1);
    histogram!("inboxflow_analysis_duration_seconds", "phase" => phase_used.to_string())
        .record(duration_seconds);
}

pub fn record_failure(kind: &str) {
    counter!("inboxflow_emails_failed_total", "kind" => kind.to_string()).increment(1);
}

pub fn record_llm_call(outcome: &str) {
    counter!("inboxflow_llm_calls_total", "outcome" => outcome.to_string()).increment(1);
}

pub fn set_queue_depth(pending: i64, processing: i64) {
    gauge!("inboxflow_queue_pending").set(pending as f64);
    gauge!("inboxflow_queue_processing").set(processing as f64);
}

pub fn record_quality_alert(metric: &str) {
    counter!("inboxflow_quality_alerts_total", "metric" => metric.to_string()).increment(1);
}

/// Timer helper following the teacher's `RequestTimer` pattern: records the
/// analysis metrics on drop regardless of which branch returns.
pub struct AnalysisTimer {
    start: Instant,
    phase_used: u8,
    method_tag: String,
}

impl AnalysisTimer {
    pub fn new(phase_used: u8, method_tag: &str) -> Self {
        Self {
            start: Instant::now(),
            phase_used,
            method_tag: method_tag.to_string(),
        }
    }
}

impl Drop for AnalysisTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        record_analysis(self.phase_used, &self.method_tag, duration);
    }
}
