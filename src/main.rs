// src/main.rs
// inboxflow -- adaptive three-phase email analysis pipeline

use std::sync::Arc;

use chrono::Duration as ChronoDuration;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use inboxflow::config::CONFIG;
use inboxflow::executor::Executor;
use inboxflow::llmclient::{HttpLlmClient, LlmClient};
use inboxflow::metrics;
use inboxflow::monitor::QualityMonitor;
use inboxflow::persistence::{build_pool, ensure_schema, Repository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    if let Err(err) = CONFIG.validate() {
        error!(error = %err, "invalid configuration, exiting");
        std::process::exit(1);
    }

    info!(
        workers = CONFIG.executor.workers,
        database_url = %CONFIG.database.url,
        "starting inboxflow"
    );

    metrics::init_metrics();

    let pool = build_pool(&CONFIG.database.url, CONFIG.executor.workers).await?;
    ensure_schema(&pool).await?;

    let repository = Arc::new(Repository::new(pool));
    let orphan_grace = ChronoDuration::minutes(CONFIG.executor.orphan_grace_minutes as i64);
    repository.recover_orphans(orphan_grace).await?;

    let llm_client: Arc<dyn LlmClient> = Arc::new(HttpLlmClient::new(CONFIG.llm.endpoint_url.clone()));

    let mut executor = Executor::new(Arc::new(CONFIG.clone()), repository.clone(), llm_client);
    executor.spawn();
    let monitor_cancel = executor.cancellation_token();
    let monitor_handle =
        QualityMonitor::new(Arc::new(CONFIG.clone()), repository.clone()).spawn(monitor_cancel);

    let server = tokio::spawn(serve_health_and_metrics());

    shutdown_signal().await;
    info!("shutdown signal received, draining");

    executor.shutdown().await;
    let _ = monitor_handle.await;
    server.abort();

    info!("inboxflow stopped");
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(CONFIG.logging.level.clone()));

    if CONFIG.logging.json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt().with_env_filter(filter).init();
    }
}

async fn serve_health_and_metrics() {
    let addr = CONFIG.bind_address();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(address = %addr, error = %err, "failed to bind health/metrics listener");
            return;
        }
    };
    info!(address = %addr, "health/metrics server listening");

    if let Err(err) = axum::serve(listener, metrics::router()).await {
        error!(error = %err, "health/metrics server exited");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => error!(error = %err, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
