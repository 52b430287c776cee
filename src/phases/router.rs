// src/phases/router.rs
// Phase Router: dispatches each email to its analyzer by chain completeness (§2, §4.C)

use std::sync::Arc;

use crate::config::chain::ChainConfig;
use crate::config::llm::LlmConfig;
use crate::config::phase::PhaseConfig;
use crate::domain::{Email, EmailChain};
use crate::llmclient::LlmClient;

use super::{phase1, phase2, phase3, PhaseOutcome};

/// Routes `email` through the analyzer matching its chain's
/// `recommended_phase` and returns the resulting outcome. Phase 1 never
/// calls out to the LLM so it always completes; phases 2/3 can report
/// `PhaseOutcome::TimedOut` if the LLM call itself timed out.
pub async fn analyze_email(
    client: &Arc<dyn LlmClient>,
    email: &Email,
    chain: &EmailChain,
    chain_config: &ChainConfig,
    llm_config: &LlmConfig,
    phase_config: &PhaseConfig,
) -> PhaseOutcome {
    let is_first_in_chain = chain.member_ids.first().map(|id| id == &email.id).unwrap_or(false);

    match chain.recommended_phase {
        1 => PhaseOutcome::Analyzed(phase1::analyze(
            email,
            &chain.chain_id,
            chain.completeness,
            is_first_in_chain,
            chain_config,
        )),
        2 => {
            phase2::analyze(
                client,
                email,
                &chain.chain_id,
                chain.completeness_score,
                is_first_in_chain,
                chain_config,
                llm_config,
                phase_config,
            )
            .await
        }
        _ => {
            phase3::analyze(
                client,
                email,
                &chain.chain_id,
                chain.completeness_score,
                is_first_in_chain,
                chain_config,
                llm_config,
                phase_config,
            )
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Completeness;
    use crate::llmclient::MockLlmClient;
    use chrono::Utc;

    fn email() -> Email {
        Email {
            id: "e1".to_string(),
            subject: "RFQ 500 units".to_string(),
            body: "please send a quote".to_string(),
            sender: "buyer@example.com".to_string(),
            recipients: vec!["sales@example.com".to_string()],
            received_at: Utc::now(),
            conversation_id: None,
            has_attachments: false,
            importance: crate::domain::Importance::Normal,
        }
    }

    fn chain(phase: u8, completeness: Completeness) -> EmailChain {
        EmailChain {
            chain_id: "c1".to_string(),
            member_ids: vec!["e1".to_string()],
            participants: vec!["buyer@example.com".to_string()],
            completeness,
            completeness_score: 0.5,
            workflow_type: "quote_request".to_string(),
            recommended_phase: phase,
            first_seen: Utc::now(),
            last_seen: Utc::now(),
        }
    }

    #[tokio::test]
    async fn routes_complete_chain_to_phase1() {
        let client: Arc<dyn LlmClient> = Arc::new(MockLlmClient::respond_with("{}"));
        let outcome = analyze_email(
            &client,
            &email(),
            &chain(1, Completeness::Complete),
            &ChainConfig::default(),
            &LlmConfig::default(),
            &PhaseConfig::default(),
        )
        .await;
        match outcome {
            PhaseOutcome::Analyzed(result) => assert_eq!(result.phase_used, 1),
            PhaseOutcome::TimedOut => panic!("phase 1 never times out"),
        }
    }

    #[tokio::test]
    async fn routes_broken_chain_to_phase3() {
        let client: Arc<dyn LlmClient> = Arc::new(MockLlmClient::respond_with("{}"));
        let outcome = analyze_email(
            &client,
            &email(),
            &chain(3, Completeness::Broken),
            &ChainConfig::default(),
            &LlmConfig::default(),
            &PhaseConfig::default(),
        )
        .await;
        match outcome {
            PhaseOutcome::Analyzed(result) => assert_eq!(result.phase_used, 3),
            PhaseOutcome::TimedOut => panic!("mock client responds, should not time out"),
        }
    }

    #[tokio::test]
    async fn propagates_timeout_from_phase3() {
        let client: Arc<dyn LlmClient> = Arc::new(MockLlmClient::always_times_out());
        let outcome = analyze_email(
            &client,
            &email(),
            &chain(3, Completeness::Broken),
            &ChainConfig::default(),
            &LlmConfig::default(),
            &PhaseConfig::default(),
        )
        .await;
        assert!(matches!(outcome, PhaseOutcome::TimedOut));
    }
}
