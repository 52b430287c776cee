// src/domain/state.rs
// EmailRecord persistence state machine (§3)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    Pending,
    Processing,
    Analyzed,
    Failed,
    Timeout,
}

impl RecordState {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordState::Pending => "pending",
            RecordState::Processing => "processing",
            RecordState::Analyzed => "analyzed",
            RecordState::Failed => "failed",
            RecordState::Timeout => "timeout",
        }
    }

    /// `failed` and `timeout` rows are re-queued by the next run (§3).
    pub fn is_requeueable(self) -> bool {
        matches!(
            self,
            RecordState::Pending | RecordState::Failed | RecordState::Timeout
        )
    }
}

impl std::str::FromStr for RecordState {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RecordState::Pending),
            "processing" => Ok(RecordState::Processing),
            "analyzed" => Ok(RecordState::Analyzed),
            "failed" => Ok(RecordState::Failed),
            "timeout" => Ok(RecordState::Timeout),
            other => anyhow::bail!("unknown record state: {other}"),
        }
    }
}

impl std::fmt::Display for RecordState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
