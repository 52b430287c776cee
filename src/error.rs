// src/error.rs
// Error taxonomy (§7)

use thiserror::Error;

/// Pipeline operation error type, used where callers branch on the *kind* of
/// failure (retry policy, quality gate, terminal state). Call sites that
/// cross an async boundary or talk to an external system otherwise return
/// `anyhow::Result`.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("transient network error: {0}")]
    TransientNetwork(String),

    #[error("LLM call timed out after {0:?}")]
    LlmTimeout(std::time::Duration),

    #[error("failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("quality gate rejected result: {0}")]
    QualityGateFail(String),

    #[error("persistence busy: {0}")]
    PersistenceBusy(String),

    #[error("persistence integrity violation: {0}")]
    PersistenceIntegrity(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("fatal error: {0}")]
    Fatal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn transient_network(msg: impl Into<String>) -> Self {
        Self::TransientNetwork(msg.into())
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    pub fn quality_gate_fail(msg: impl Into<String>) -> Self {
        Self::QualityGateFail(msg.into())
    }

    pub fn persistence_busy(msg: impl Into<String>) -> Self {
        Self::PersistenceBusy(msg.into())
    }

    pub fn persistence_integrity(msg: impl Into<String>) -> Self {
        Self::PersistenceIntegrity(msg.into())
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    /// Whether the worker should retry the operation that produced this error
    /// before giving up and recording a terminal row state (§7 policy).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::TransientNetwork(_) | PipelineError::PersistenceBusy(_)
        )
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Extension trait to lift foreign errors into `PipelineError` with context,
/// mirroring the teacher's `IntoGitErrorResult` pattern.
pub trait IntoPipelineErrorResult<T> {
    fn into_pipeline_error(self, context: &str) -> PipelineResult<T>;
}

impl<T, E: std::fmt::Display> IntoPipelineErrorResult<T> for Result<T, E> {
    fn into_pipeline_error(self, context: &str) -> PipelineResult<T> {
        self.map_err(|e| PipelineError::Fatal(format!("{context}: {e}")))
    }
}

impl From<sqlx::Error> for PipelineError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                PipelineError::PersistenceBusy(err.to_string())
            }
            sqlx::Error::Database(db_err) if db_err.message().contains("locked") => {
                PipelineError::PersistenceBusy(err.to_string())
            }
            _ => PipelineError::PersistenceIntegrity(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PipelineError::LlmTimeout(std::time::Duration::default())
        } else {
            PipelineError::TransientNetwork(err.to_string())
        }
    }
}
