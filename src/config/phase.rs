// src/config/phase.rs
// Analyzer phase configuration (§4.E, §4.G, §6)

use serde::{Deserialize, Serialize};

use super::helpers::env_usize;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseConfig {
    pub body_truncation_chars: usize,
    pub min_result_bytes: usize,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            body_truncation_chars: 1000,
            min_result_bytes: 100,
        }
    }
}

impl PhaseConfig {
    pub fn from_env(default: Self) -> Self {
        Self {
            body_truncation_chars: env_usize(
                "PHASE_BODY_TRUNCATION_CHARS",
                default.body_truncation_chars,
            ),
            min_result_bytes: env_usize("PHASE_MIN_RESULT_BYTES", default.min_result_bytes),
        }
    }
}
