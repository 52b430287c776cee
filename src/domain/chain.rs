// src/domain/chain.rs
// Derived conversation chains (§3 EmailChain, §4.C)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completeness {
    Complete,
    Partial,
    Broken,
}

impl Completeness {
    /// Bucket a score per §3's invariant: `score >= complete ⇒ complete`,
    /// `partial <= score < complete ⇒ partial`, else `broken`.
    pub fn from_score(score: f64, complete_threshold: f64, partial_threshold: f64) -> Self {
        if score >= complete_threshold {
            Completeness::Complete
        } else if score >= partial_threshold {
            Completeness::Partial
        } else {
            Completeness::Broken
        }
    }

    /// §3 invariant: `recommended_phase = 1 if complete else 2 if partial else 3`.
    pub fn recommended_phase(self) -> u8 {
        match self {
            Completeness::Complete => 1,
            Completeness::Partial => 2,
            Completeness::Broken => 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailChain {
    pub chain_id: String,
    pub member_ids: Vec<String>,
    pub participants: Vec<String>,
    pub completeness: Completeness,
    pub completeness_score: f64,
    pub workflow_type: String,
    pub recommended_phase: u8,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}
