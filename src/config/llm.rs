// src/config/llm.rs
// LLM inference endpoint configuration (§6, §4.E, §4.F)

use serde::{Deserialize, Serialize};

use super::helpers::{env_or, env_u32, env_usize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub endpoint_url: String,
    pub medium_model: String,
    pub large_model: String,
    /// Total request timeout for the medium-model analyzer (phase 2), seconds.
    pub medium_timeout_seconds: u64,
    /// Total request timeout for the large-model analyzer (phase 3), seconds.
    pub large_timeout_seconds: u64,
    pub read_timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_backoff_seconds: u64,
    pub temperature: f64,
    pub top_p: f64,
    pub num_predict: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint_url: "http://localhost:11434/api/generate".to_string(),
            medium_model: "llama3:8b".to_string(),
            large_model: "llama3:70b".to_string(),
            medium_timeout_seconds: 60,
            large_timeout_seconds: 90,
            read_timeout_seconds: 45,
            max_retries: 3,
            retry_backoff_seconds: 2,
            temperature: 0.2,
            top_p: 0.9,
            num_predict: 1024,
        }
    }
}

impl LlmConfig {
    pub fn from_env(default: Self) -> Self {
        Self {
            endpoint_url: env_or("LLM_ENDPOINT_URL", &default.endpoint_url),
            medium_model: env_or("LLM_MEDIUM_MODEL", &default.medium_model),
            large_model: env_or("LLM_LARGE_MODEL", &default.large_model),
            medium_timeout_seconds: env_u32(
                "LLM_MEDIUM_TIMEOUT_SECONDS",
                default.medium_timeout_seconds as u32,
            ) as u64,
            large_timeout_seconds: env_u32(
                "LLM_LARGE_TIMEOUT_SECONDS",
                default.large_timeout_seconds as u32,
            ) as u64,
            read_timeout_seconds: env_u32(
                "LLM_READ_TIMEOUT_SECONDS",
                default.read_timeout_seconds as u32,
            ) as u64,
            max_retries: env_u32("LLM_MAX_RETRIES", default.max_retries),
            retry_backoff_seconds: env_u32(
                "LLM_RETRY_BACKOFF_SECONDS",
                default.retry_backoff_seconds as u32,
            ) as u64,
            temperature: default.temperature,
            top_p: default.top_p,
            num_predict: env_usize("LLM_NUM_PREDICT", default.num_predict as usize) as u32,
        }
    }
}
