// src/phases/phase1.rs
// Phase 1 Analyzer: rule-based, for `complete` chains (§4.D)

use chrono::Utc;

use crate::chain::estimate_business_value;
use crate::classify::{classify_priority, classify_workflow};
use crate::config::chain::ChainConfig;
use crate::domain::analysis::{Financial, Stakeholders};
use crate::domain::{AnalysisResult, Completeness, Email, WorkflowState};
use crate::extract::extract_entities;

/// Rule-based analysis: no external calls, target latency <= 10ms/email (§4.D).
pub fn analyze(
    email: &Email,
    chain_id: &str,
    completeness: Completeness,
    is_first_in_chain: bool,
    config: &ChainConfig,
) -> AnalysisResult {
    let started = std::time::Instant::now();
    let text = email.text();
    let lowered = text.to_lowercase();

    let entities = extract_entities(&email.subject, &text);
    let workflow_type = classify_workflow(&text, &config.workflow_keywords);
    let priority = classify_priority(&text, &config.priority_keywords);

    let has_resolution_indicator = config
        .resolution_keywords
        .iter()
        .any(|kw| lowered.contains(kw.as_str()));

    let workflow_state = if has_resolution_indicator {
        WorkflowState::Completion
    } else if is_first_in_chain {
        WorkflowState::StartPoint
    } else {
        WorkflowState::InProgress
    };

    let mut confidence = 0.7;
    if !entities.is_empty() {
        confidence += 0.1;
    }

    let max_amount = entities.amounts.iter().map(|a| a.value).fold(0.0_f64, f64::max);
    let estimated_value =
        estimate_business_value(max_amount, &workflow_type, completeness, config);

    AnalysisResult {
        email_id: email.id.clone(),
        chain_id: chain_id.to_string(),
        phase_used: 1,
        method_tag: "phase1_rule_based".to_string(),
        priority,
        workflow_type,
        workflow_state,
        confidence,
        entities,
        actionable_items: Vec::new(),
        financial: Financial {
            estimated_value,
            ..Financial::default()
        },
        stakeholders: Stakeholders::default(),
        summary: summarize(email),
        broken_chain_context: None,
        processing_time_ms: started.elapsed().as_millis() as u64,
        processed_at: Utc::now(),
    }
}

fn summarize(email: &Email) -> String {
    let first_line = email.body.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    if first_line.chars().count() > 200 {
        let truncated: String = first_line.chars().take(200).collect();
        format!("{}…", truncated)
    } else {
        first_line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc as ChronoUtc;

    fn email(subject: &str, body: &str) -> Email {
        Email {
            id: "e1".to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            sender: "buyer@example.com".to_string(),
            recipients: vec!["sales@example.com".to_string()],
            received_at: ChronoUtc::now(),
            conversation_id: None,
            has_attachments: false,
            importance: crate::domain::Importance::Normal,
        }
    }

    #[test]
    fn complete_chain_with_resolution_keyword_is_completion_state() {
        let config = ChainConfig::default();
        let e = email(
            "RE: RFQ 500 units Surface Pro — approved",
            "quote approved, $12,500.00",
        );
        let result = analyze(&e, "chain-1", Completeness::Complete, false, &config);
        assert_eq!(result.phase_used, 1);
        assert_eq!(result.workflow_state, WorkflowState::Completion);
        assert!(result.entities.amounts.iter().any(|a| a.value == 12500.0));
    }

    #[test]
    fn urgent_email_is_critical_priority() {
        let config = ChainConfig::default();
        let e = email("where order?", "hasn't arrived yet, urgent");
        let result = analyze(&e, "chain-2", Completeness::Broken, true, &config);
        assert_eq!(result.priority, crate::domain::Priority::Critical);
    }
}
