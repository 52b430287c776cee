// src/phases/phase2.rs
// Phase 2 Analyzer: medium LLM, for `partial` chains (§4.E)

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::warn;

use crate::chain::estimate_business_value;
use crate::config::chain::ChainConfig;
use crate::config::llm::LlmConfig;
use crate::config::phase::PhaseConfig;
use crate::domain::{Completeness, Email};
use crate::extract::extract_entities;
use crate::llmclient::{LlmCallError, LlmClient, LlmRequest};

use super::phase1;
use super::parse::{parse_llm_response, Fallbacks};
use super::prompt::{system_instruction, user_prompt};
use super::PhaseOutcome;

/// Builds, calls, and parses a medium-model analysis for a single email on a
/// `partial` chain. Falls back to the Phase-1 rule-based result, tagged
/// `phase2_fallback`, after exhausting rate-limit/transient retries (§4.E).
/// A timed-out LLM call is never retried and never falls back -- it reports
/// `PhaseOutcome::TimedOut` so the worker marks the row `timeout` (§7).
#[allow(clippy::too_many_arguments)]
pub async fn analyze(
    client: &Arc<dyn LlmClient>,
    email: &Email,
    chain_id: &str,
    completeness_score: f64,
    is_first_in_chain: bool,
    chain_config: &ChainConfig,
    llm_config: &LlmConfig,
    phase_config: &PhaseConfig,
) -> PhaseOutcome {
    let started = std::time::Instant::now();
    let text = email.text();
    let regex_entities = extract_entities(&email.subject, &text);

    let system = system_instruction(false);
    let prompt = user_prompt(email, completeness_score, phase_config.body_truncation_chars);

    let request = LlmRequest {
        model: llm_config.medium_model.clone(),
        system: Some(system),
        prompt,
        temperature: llm_config.temperature,
        top_p: llm_config.top_p,
        num_predict: llm_config.num_predict,
        timeout_seconds: llm_config.medium_timeout_seconds,
        read_timeout_seconds: llm_config.read_timeout_seconds,
    };

    match call_with_retry(client, &request, llm_config).await {
        CallOutcome::Success(raw_response) => {
            let default_priority = phase1::analyze(
                email,
                chain_id,
                Completeness::Partial,
                is_first_in_chain,
                chain_config,
            )
            .priority;

            let fallbacks = Fallbacks {
                regex_entities: &regex_entities,
                default_priority,
                default_workflow_type: "general_inquiry",
                want_broken_chain_extension: false,
            };
            let parsed = parse_llm_response(&raw_response, &fallbacks);

            let confidence = if parsed.any_field_defaulted { 0.5 } else { 0.7 };
            let max_amount = parsed
                .entities
                .amounts
                .iter()
                .map(|a| a.value)
                .fold(0.0_f64, f64::max);
            let estimated_value = if parsed.financial.estimated_value > 0.0 {
                parsed.financial.estimated_value
            } else {
                estimate_business_value(
                    max_amount,
                    &parsed.workflow_type,
                    Completeness::Partial,
                    chain_config,
                )
            };

            PhaseOutcome::Analyzed(crate::domain::AnalysisResult {
                email_id: email.id.clone(),
                chain_id: chain_id.to_string(),
                phase_used: 2,
                method_tag: "phase2_medium_llm".to_string(),
                priority: parsed.priority,
                workflow_type: parsed.workflow_type,
                workflow_state: parsed.workflow_state,
                confidence,
                entities: parsed.entities,
                actionable_items: parsed.actionable_items,
                financial: crate::domain::analysis::Financial {
                    estimated_value,
                    ..parsed.financial
                },
                stakeholders: parsed.stakeholders,
                summary: parsed.summary,
                broken_chain_context: None,
                processing_time_ms: started.elapsed().as_millis() as u64,
                processed_at: Utc::now(),
            })
        }
        CallOutcome::Exhausted => {
            let mut fallback = phase1::analyze(
                email,
                chain_id,
                Completeness::Partial,
                is_first_in_chain,
                chain_config,
            );
            fallback.phase_used = 2;
            fallback.method_tag = "phase2_fallback".to_string();
            fallback.confidence = fallback.confidence.min(0.5);
            fallback.processing_time_ms = started.elapsed().as_millis() as u64;
            PhaseOutcome::Analyzed(fallback)
        }
        CallOutcome::Timeout => PhaseOutcome::TimedOut,
    }
}

/// Result of a single `call_with_retry` run: either a response, a timeout
/// (never retried, §7), or exhaustion of the rate-limit/transient retry
/// budget (still falls back to the rule-based result).
enum CallOutcome {
    Success(String),
    Timeout,
    Exhausted,
}

/// Up to `max_retries` attempts with `2 * attempt` second backoff; honors an
/// explicit `Retry-After` / 429 hint when present. A timeout is reported
/// immediately without retrying (§7); rate-limit/transient errors retry
/// until `max_retries` is exhausted.
async fn call_with_retry(
    client: &Arc<dyn LlmClient>,
    request: &LlmRequest,
    llm_config: &LlmConfig,
) -> CallOutcome {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match client.complete(request).await {
            Ok(response) => return CallOutcome::Success(response),
            Err(LlmCallError::RateLimited { retry_after }) => {
                warn!(attempt, "llm call rate limited");
                if attempt >= llm_config.max_retries {
                    return CallOutcome::Exhausted;
                }
                let wait = retry_after
                    .unwrap_or_else(|| Duration::from_secs(llm_config.retry_backoff_seconds * attempt as u64));
                tokio::time::sleep(wait).await;
            }
            Err(LlmCallError::Timeout) => {
                warn!(attempt, "llm call timed out, not retrying");
                return CallOutcome::Timeout;
            }
            Err(LlmCallError::Transient(msg)) => {
                warn!(attempt, error = %msg, "llm call failed, retrying");
                if attempt >= llm_config.max_retries {
                    return CallOutcome::Exhausted;
                }
                tokio::time::sleep(Duration::from_secs(llm_config.retry_backoff_seconds * attempt as u64)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llmclient::MockLlmClient;

    fn email(subject: &str, body: &str) -> Email {
        Email {
            id: "e1".to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            sender: "buyer@example.com".to_string(),
            recipients: vec!["sales@example.com".to_string()],
            received_at: Utc::now(),
            conversation_id: None,
            has_attachments: false,
            importance: crate::domain::Importance::Normal,
        }
    }

    #[tokio::test]
    async fn regex_floor_survives_an_empty_llm_response() {
        let client: Arc<dyn LlmClient> = Arc::new(MockLlmClient::respond_with("{}"));
        let e = email("Order status", "PO 0505915850 total $9,999.00");
        let outcome = analyze(
            &client,
            &e,
            "chain-1",
            0.45,
            true,
            &ChainConfig::default(),
            &LlmConfig::default(),
            &PhaseConfig::default(),
        )
        .await;
        let result = match outcome {
            PhaseOutcome::Analyzed(result) => result,
            PhaseOutcome::TimedOut => panic!("mock client responds, should not time out"),
        };
        assert!(result.entities.amounts.iter().any(|a| a.value == 9999.0));
        assert!(result
            .entities
            .po_numbers
            .contains(&"0505915850".to_string()));
        assert!(result.confidence <= 0.5);
    }

    #[tokio::test]
    async fn reports_timed_out_without_falling_back() {
        let client: Arc<dyn LlmClient> = Arc::new(MockLlmClient::always_times_out());
        let e = email("where order?", "hasn't arrived yet, urgent");
        let outcome = analyze(
            &client,
            &e,
            "chain-2",
            0.45,
            true,
            &ChainConfig::default(),
            &LlmConfig::default(),
            &PhaseConfig::default(),
        )
        .await;
        assert!(matches!(outcome, PhaseOutcome::TimedOut));
    }

    #[tokio::test]
    async fn falls_back_to_phase1_once_transient_retries_are_exhausted() {
        let client: Arc<dyn LlmClient> = Arc::new(MockLlmClient::sequence(vec![
            Err("boom".to_string()),
            Err("boom".to_string()),
        ]));
        let e = email("where order?", "hasn't arrived yet, urgent");
        let llm_config = LlmConfig {
            max_retries: 2,
            retry_backoff_seconds: 0,
            ..LlmConfig::default()
        };
        let outcome = analyze(
            &client,
            &e,
            "chain-2",
            0.45,
            true,
            &ChainConfig::default(),
            &llm_config,
            &PhaseConfig::default(),
        )
        .await;
        let result = match outcome {
            PhaseOutcome::Analyzed(result) => result,
            PhaseOutcome::TimedOut => panic!("transient errors should fall back, not time out"),
        };
        assert_eq!(result.method_tag, "phase2_fallback");
        assert!(result.confidence <= 0.5);
    }
}
