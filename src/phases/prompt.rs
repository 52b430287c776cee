// src/phases/prompt.rs
// Shared prompt/system-instruction construction for the LLM-backed phases (§4.E/F)

use crate::domain::Email;

const ANALYSIS_RESULT_SCHEMA: &str = r#"{
  "priority": "Critical|High|Medium|Low",
  "workflow_type": "quote_request|order_processing|support_ticket|shipment_tracking|invoice|pricing_agreement|deal_registration|return_merchandise|escalation|general_inquiry",
  "workflow_state": "START_POINT|IN_PROGRESS|COMPLETION",
  "confidence": 0.0,
  "entities": {
    "po_numbers": [], "quote_numbers": [], "spa_codes": [], "case_numbers": [], "part_numbers": [],
    "amounts": [{"value": 0.0, "currency": "USD"}],
    "dates": [{"value": "", "context": ""}],
    "contacts": [{"address": "", "kind": "email|phone"}]
  },
  "actionable_items": [{"task": "", "owner": null, "deadline": null, "impact": ""}],
  "financial": {"estimated_value": 0.0, "opportunity": "High|Medium|Low|None", "risk_level": "High|Medium|Low|None", "budget_mentioned": false},
  "stakeholders": {"decision_makers": [], "technical_contacts": [], "procurement_contacts": []},
  "summary": ""
}"#;

const BROKEN_CHAIN_EXTENSION: &str = r#"
Additionally include these fields at the top level:
  "missing_context": ["..."],
  "required_actions": ["..."],
  "escalation_needed": false
"#;

/// Builds the system instruction describing the closed output schema. The
/// phase 3 (broken-chain) variant asks for the extended fields (§4.F).
pub fn system_instruction(include_broken_chain_extension: bool) -> String {
    let mut instruction = format!(
        "You are a business email analysis engine. Respond with a single JSON object \
         matching exactly this schema, and nothing else — no prose, no markdown fences:\n{ANALYSIS_RESULT_SCHEMA}"
    );
    if include_broken_chain_extension {
        instruction.push_str(BROKEN_CHAIN_EXTENSION);
    }
    instruction
}

/// Builds the user section: subject, sender, truncated body, and the chain's
/// completeness score (§4.E).
pub fn user_prompt(email: &Email, completeness_score: f64, body_truncation_chars: usize) -> String {
    let truncated_body = truncate_chars(&email.body, body_truncation_chars);
    format!(
        "Subject: {}\nFrom: {}\nChain completeness score: {:.2}\nBody:\n{}",
        email.subject, email.sender, completeness_score, truncated_body
    )
}

fn truncate_chars(body: &str, limit: usize) -> &str {
    match body.char_indices().nth(limit) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_body_to_character_budget() {
        let body = "a".repeat(2000);
        let truncated = truncate_chars(&body, 1000);
        assert_eq!(truncated.chars().count(), 1000);
    }

    #[test]
    fn broken_chain_instruction_includes_extension() {
        let base = system_instruction(false);
        let extended = system_instruction(true);
        assert!(!base.contains("escalation_needed"));
        assert!(extended.contains("escalation_needed"));
    }
}
