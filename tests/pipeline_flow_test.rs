// tests/pipeline_flow_test.rs
// End-to-end flow: ingest -> chain -> executor claim/analyze/persist -> quality monitor

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use inboxflow::chain::build_chains;
use inboxflow::classify::classify_workflow;
use inboxflow::config::PipelineConfig;
use inboxflow::domain::{Email, Importance, RecordState};
use inboxflow::executor::Executor;
use inboxflow::llmclient::{LlmClient, MockLlmClient};
use inboxflow::monitor::QualityMonitor;
use inboxflow::persistence::{build_pool, ensure_schema, Repository};

fn sample_email(id: &str, subject: &str) -> Email {
    Email {
        id: id.to_string(),
        subject: subject.to_string(),
        body: "Please send a quote for 500 units as soon as possible.".to_string(),
        sender: "buyer@example.com".to_string(),
        recipients: vec!["sales@example.com".to_string()],
        received_at: Utc::now(),
        conversation_id: None,
        has_attachments: false,
        importance: Importance::Normal,
    }
}

async fn setup() -> (Arc<Repository>, Arc<PipelineConfig>) {
    let pool = build_pool("sqlite::memory:", 4).await.expect("open pool");
    ensure_schema(&pool).await.expect("create schema");
    (Arc::new(Repository::new(pool)), Arc::new(PipelineConfig::default()))
}

#[tokio::test]
async fn single_email_is_ingested_analyzed_and_persisted() {
    let (repository, config) = setup().await;

    let email = sample_email("email-1", "RFQ for 500 units");
    let chains = build_chains(&[email.clone()], &config.chain, |e| {
        classify_workflow(&e.text(), &config.chain.workflow_keywords)
    });
    assert_eq!(chains.len(), 1, "a single email forms its own chain");
    let chain = &chains[0];

    repository.upsert_chain(chain).await.expect("upsert chain");
    repository.insert_email(&email, chain).await.expect("insert email");

    assert_eq!(repository.count_by_state(RecordState::Pending).await.unwrap(), 1);

    let llm_client: Arc<dyn LlmClient> = Arc::new(MockLlmClient::respond_with("{}"));
    let mut executor = Executor::new(config.clone(), repository.clone(), llm_client);
    executor.spawn();

    tokio::time::sleep(Duration::from_millis(200)).await;
    executor.shutdown().await;

    assert_eq!(repository.count_by_state(RecordState::Pending).await.unwrap(), 0);
    let analyzed = repository.count_by_state(RecordState::Analyzed).await.unwrap();
    let failed = repository.count_by_state(RecordState::Failed).await.unwrap();
    assert_eq!(
        analyzed + failed,
        1,
        "the only claimed row reaches a terminal state"
    );

    let recent = repository.fetch_recent_results(Utc::now() - chrono::Duration::hours(1)).await.unwrap();
    if analyzed == 1 {
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].email_id, "email-1");
    }
}

#[tokio::test]
async fn quality_monitor_reports_healthy_window_with_no_data() {
    let (repository, config) = setup().await;
    let monitor = QualityMonitor::new(config, repository);
    let cancel = CancellationToken::new();
    let handle = monitor.spawn(cancel.clone());
    cancel.cancel();
    handle.await.expect("monitor task joins cleanly");
}
