// src/monitor/aggregate.rs
// Rolling-window quality aggregates and threshold comparison (§4.I)

use crate::config::monitor::QualityThresholds;
use crate::domain::{AnalysisResult, Priority};

#[derive(Debug, Clone, Default)]
pub struct QualityAggregate {
    pub sample_size: usize,
    pub avg_confidence: f64,
    pub avg_actions_per_email: f64,
    pub entity_extraction_rate: f64,
    pub error_rate: f64,
    pub priority_detection_rate: f64,
    pub business_value_rate: f64,
    pub avg_summary_length: f64,
}

impl QualityAggregate {
    /// `failed` is the count of rows that ended in {failed, timeout} within
    /// the same window, used for the error-rate denominator.
    pub fn compute(results: &[AnalysisResult], failed: i64) -> Self {
        let sample_size = results.len();
        let total = sample_size as f64 + failed as f64;

        if sample_size == 0 {
            return Self {
                sample_size: 0,
                error_rate: if total > 0.0 { failed as f64 / total } else { 0.0 },
                ..Self::default()
            };
        }

        let n = sample_size as f64;
        let avg_confidence = results.iter().map(|r| r.confidence).sum::<f64>() / n;
        let avg_actions_per_email =
            results.iter().map(|r| r.actionable_items.len() as f64).sum::<f64>() / n;
        let entity_extraction_rate =
            results.iter().filter(|r| !r.entities.is_empty()).count() as f64 / n;
        let priority_detection_rate =
            results.iter().filter(|r| r.priority != Priority::Low).count() as f64 / n;
        let business_value_rate = results
            .iter()
            .filter(|r| r.financial.estimated_value > 0.0)
            .count() as f64
            / n;
        let avg_summary_length =
            results.iter().map(|r| r.summary.chars().count() as f64).sum::<f64>() / n;

        Self {
            sample_size,
            avg_confidence,
            avg_actions_per_email,
            entity_extraction_rate,
            error_rate: failed as f64 / total,
            priority_detection_rate,
            business_value_rate,
            avg_summary_length,
        }
    }

    /// Names of every threshold this aggregate breaches, empty if healthy.
    pub fn breaches(&self, thresholds: &QualityThresholds) -> Vec<&'static str> {
        let mut breaches = Vec::new();
        if self.avg_confidence < thresholds.min_confidence {
            breaches.push("min_confidence");
        }
        if self.avg_actions_per_email < thresholds.min_actions_per_email {
            breaches.push("min_actions_per_email");
        }
        if self.entity_extraction_rate < thresholds.min_entity_extraction_rate {
            breaches.push("min_entity_extraction_rate");
        }
        if self.error_rate > thresholds.max_error_rate {
            breaches.push("max_error_rate");
        }
        if self.priority_detection_rate < thresholds.min_priority_detection_rate {
            breaches.push("min_priority_detection_rate");
        }
        if self.business_value_rate < thresholds.min_business_value_rate {
            breaches.push("min_business_value_rate");
        }
        if self.avg_summary_length < thresholds.min_summary_length as f64 {
            breaches.push("min_summary_length");
        }
        breaches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::{Financial, Stakeholders};
    use crate::domain::{Entities, WorkflowState};
    use chrono::Utc;

    fn result(confidence: f64, summary: &str) -> AnalysisResult {
        AnalysisResult {
            email_id: "e1".to_string(),
            chain_id: "c1".to_string(),
            phase_used: 1,
            method_tag: "phase1_rule_based".to_string(),
            priority: Priority::Low,
            workflow_type: "general_inquiry".to_string(),
            workflow_state: WorkflowState::InProgress,
            confidence,
            entities: Entities::default(),
            actionable_items: Vec::new(),
            financial: Financial::default(),
            stakeholders: Stakeholders::default(),
            summary: summary.to_string(),
            broken_chain_context: None,
            processing_time_ms: 5,
            processed_at: Utc::now(),
        }
    }

    #[test]
    fn empty_window_has_zero_rates_and_no_breach_on_error_rate() {
        let aggregate = QualityAggregate::compute(&[], 0);
        assert_eq!(aggregate.sample_size, 0);
        assert_eq!(aggregate.error_rate, 0.0);
    }

    #[test]
    fn low_confidence_and_short_summary_breach_thresholds() {
        let results = vec![result(0.2, "short")];
        let aggregate = QualityAggregate::compute(&results, 0);
        let thresholds = QualityThresholds::default();
        let breaches = aggregate.breaches(&thresholds);
        assert!(breaches.contains(&"min_confidence"));
        assert!(breaches.contains(&"min_summary_length"));
    }

    #[test]
    fn error_rate_uses_combined_denominator() {
        let results = vec![result(0.9, &"x".repeat(100))];
        let aggregate = QualityAggregate::compute(&results, 1);
        assert_eq!(aggregate.error_rate, 0.5);
    }
}
