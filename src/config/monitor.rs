// src/config/monitor.rs
// Quality Monitor thresholds and cadence (§4.I)

use serde::{Deserialize, Serialize};

use super::helpers::{env_f64, env_usize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityThresholds {
    pub min_confidence: f64,
    pub min_actions_per_email: f64,
    pub min_entity_extraction_rate: f64,
    pub max_error_rate: f64,
    pub min_priority_detection_rate: f64,
    pub min_business_value_rate: f64,
    pub min_summary_length: usize,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_confidence: 0.7,
            min_actions_per_email: 0.5,
            min_entity_extraction_rate: 0.3,
            max_error_rate: 0.05,
            min_priority_detection_rate: 0.5,
            min_business_value_rate: 0.1,
            min_summary_length: 50,
        }
    }
}

impl QualityThresholds {
    fn from_env(default: Self) -> Self {
        Self {
            min_confidence: env_f64("MONITOR_MIN_CONFIDENCE", default.min_confidence),
            min_actions_per_email: env_f64(
                "MONITOR_MIN_ACTIONS_PER_EMAIL",
                default.min_actions_per_email,
            ),
            min_entity_extraction_rate: env_f64(
                "MONITOR_MIN_ENTITY_EXTRACTION_RATE",
                default.min_entity_extraction_rate,
            ),
            max_error_rate: env_f64("MONITOR_MAX_ERROR_RATE", default.max_error_rate),
            min_priority_detection_rate: env_f64(
                "MONITOR_MIN_PRIORITY_DETECTION_RATE",
                default.min_priority_detection_rate,
            ),
            min_business_value_rate: env_f64(
                "MONITOR_MIN_BUSINESS_VALUE_RATE",
                default.min_business_value_rate,
            ),
            min_summary_length: env_usize(
                "MONITOR_MIN_SUMMARY_LENGTH",
                default.min_summary_length,
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub window_hours: u64,
    pub interval_seconds: u64,
    pub thresholds: QualityThresholds,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            window_hours: 1,
            interval_seconds: 300,
            thresholds: QualityThresholds::default(),
        }
    }
}

impl MonitorConfig {
    pub fn from_env(default: Self) -> Self {
        Self {
            window_hours: env_usize("MONITOR_WINDOW_HOURS", default.window_hours as usize) as u64,
            interval_seconds: env_usize(
                "MONITOR_INTERVAL_SECONDS",
                default.interval_seconds as usize,
            ) as u64,
            thresholds: QualityThresholds::from_env(default.thresholds),
        }
    }
}
