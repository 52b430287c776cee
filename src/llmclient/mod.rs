// src/llmclient/mod.rs

pub mod http_client;
pub mod mock_client;

pub use http_client::HttpLlmClient;
pub use mock_client::MockLlmClient;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Outcome of a single LLM call attempt, distinguishing the cases the §4.E/F
/// retry policy must branch on (rate limiting vs. timeout vs. any other
/// transient failure).
#[derive(Debug, Error)]
pub enum LlmCallError {
    #[error("rate limited{}", .retry_after.map(|d| format!(", retry after {d:?}")).unwrap_or_default())]
    RateLimited { retry_after: Option<Duration> },
    #[error("call timed out")]
    Timeout,
    #[error("transient error: {0}")]
    Transient(String),
}

/// A single completion request against the external inference endpoint
/// (§6: model/prompt/system/stream=false/options JSON contract).
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub model: String,
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: f64,
    pub top_p: f64,
    pub num_predict: u32,
    pub timeout_seconds: u64,
    pub read_timeout_seconds: u64,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Issues a single completion call and returns the raw text response
    /// (the inference endpoint's `response` field, §6). Retry/backoff is the
    /// caller's responsibility (§4.E/F), so implementations perform exactly
    /// one HTTP attempt per call.
    async fn complete(&self, request: &LlmRequest) -> Result<String, LlmCallError>;
}
