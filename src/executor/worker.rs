// src/executor/worker.rs
// Per-worker claim/analyze/persist loop (§4.H)

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::PipelineConfig;
use crate::domain::{Completeness, EmailChain};
use crate::llmclient::LlmClient;
use crate::persistence::{ClaimedEmail, Repository};
use crate::phases::{analyze_email, PhaseOutcome};
use crate::utils::rate_limiter::{self, RateLimiter};

use super::stats::{ExecutorStats, Outcome};

/// Runs until `cancel` fires, claiming batches of work, routing each email
/// through its assigned phase analyzer, and writing the result back.
/// Governs itself against two back-pressure signals: a governor-backed rate
/// floor (never pull a fresh batch more often than `rate_floor_seconds`
/// allows) and a trailing failure-rate threshold (pause
/// `failure_backoff_seconds` once the window looks unhealthy), per §4.H.
pub async fn run(
    worker_id: String,
    repository: Arc<Repository>,
    llm_client: Arc<dyn LlmClient>,
    llm_semaphore: Arc<Semaphore>,
    config: Arc<PipelineConfig>,
    stats: Arc<ExecutorStats>,
    cancel: CancellationToken,
) {
    info!(worker_id = %worker_id, "worker started");

    let rate_limiter = match rate_limiter::from_floor_seconds(config.executor.rate_floor_seconds) {
        Ok(limiter) => limiter,
        Err(err) => {
            error!(worker_id = %worker_id, error = %err, "invalid rate floor, worker exiting");
            return;
        }
    };

    loop {
        if cancel.is_cancelled() {
            break;
        }

        if stats.recent_failure_rate() > config.executor.failure_rate_threshold {
            warn!(
                worker_id = %worker_id,
                failure_rate = stats.recent_failure_rate(),
                "failure rate over threshold, backing off"
            );
            let backoff = Duration::from_secs(config.executor.failure_backoff_seconds);
            tokio::select! {
                _ = tokio::time::sleep(backoff) => {}
                _ = cancel.cancelled() => break,
            }
            continue;
        }

        if !wait_for_rate_limit(&rate_limiter, &cancel).await {
            break;
        }

        let batch = match repository
            .claim_batch(config.executor.batch_size, &worker_id)
            .await
        {
            Ok(batch) => batch,
            Err(err) => {
                error!(worker_id = %worker_id, error = %err, "failed to claim batch");
                continue;
            }
        };

        if batch.is_empty() {
            continue;
        }

        for claimed in batch {
            if cancel.is_cancelled() {
                break;
            }
            process_one(
                &worker_id,
                &repository,
                &llm_client,
                &llm_semaphore,
                &config,
                &stats,
                claimed,
            )
            .await;
        }
    }

    match repository.requeue_in_flight(&worker_id).await {
        Ok(requeued) if requeued > 0 => {
            info!(worker_id = %worker_id, requeued, "requeued in-flight rows on shutdown")
        }
        Ok(_) => {}
        Err(err) => error!(worker_id = %worker_id, error = %err, "failed to requeue in-flight rows"),
    }

    info!(worker_id = %worker_id, "worker stopped");
}

/// Blocks until the rate limiter admits the next batch claim, or returns
/// `false` if `cancel` fires first (so the caller can break its loop).
async fn wait_for_rate_limit(rate_limiter: &RateLimiter, cancel: &CancellationToken) -> bool {
    tokio::select! {
        result = rate_limiter.acquire() => {
            if let Err(err) = result {
                warn!(error = %err, "rate limiter acquire failed");
            }
            true
        }
        _ = cancel.cancelled() => false,
    }
}

async fn process_one(
    worker_id: &str,
    repository: &Arc<Repository>,
    llm_client: &Arc<dyn LlmClient>,
    llm_semaphore: &Arc<Semaphore>,
    config: &Arc<PipelineConfig>,
    stats: &Arc<ExecutorStats>,
    claimed: ClaimedEmail,
) {
    let email_id = claimed.email.id.clone();
    let started = Instant::now();

    let chain = match resolve_chain(repository, &claimed, config).await {
        Some(chain) => chain,
        None => {
            warn!(worker_id = %worker_id, email_id = %email_id, "no chain found for claimed email, marking failed");
            let _ = repository.mark_failed(&email_id).await;
            stats.record(Outcome::Failed, None, started.elapsed().as_millis() as u64);
            return;
        }
    };

    let timeout_seconds = match chain.recommended_phase {
        1 => 5,
        2 => config.llm.medium_timeout_seconds + config.llm.max_retries as u64 * config.llm.retry_backoff_seconds,
        _ => config.llm.large_timeout_seconds + config.llm.max_retries as u64 * config.llm.retry_backoff_seconds,
    };

    // The semaphore bounds concurrent LLM calls; phase-1 (no LLM call) still
    // acquires a permit so its lightweight latency is counted against the
    // same pacing envelope as the LLM-backed phases.
    let _permit = match llm_semaphore.acquire().await {
        Ok(permit) => permit,
        Err(_) => unreachable!("llm semaphore closed"),
    };

    let analysis = tokio::time::timeout(
        Duration::from_secs(timeout_seconds),
        analyze_email(
            llm_client,
            &claimed.email,
            &chain,
            &config.chain,
            &config.llm,
            &config.phase,
        ),
    )
    .await;

    drop(_permit);

    let elapsed_ms = started.elapsed().as_millis() as u64;

    match analysis {
        Ok(PhaseOutcome::Analyzed(result)) => {
            if result_meets_quality_gate(&result, config) {
                match repository.write_result(&result).await {
                    Ok(()) => {
                        debug!(worker_id = %worker_id, email_id = %email_id, phase = result.phase_used, "analyzed");
                        stats.record(Outcome::Analyzed, Some(result.phase_used), elapsed_ms);
                    }
                    Err(err) => {
                        error!(worker_id = %worker_id, email_id = %email_id, error = %err, "failed to write result");
                        let _ = repository.mark_failed(&email_id).await;
                        stats.record(Outcome::Failed, Some(result.phase_used), elapsed_ms);
                    }
                }
            } else {
                warn!(worker_id = %worker_id, email_id = %email_id, "result failed quality gate, marking failed");
                let _ = repository.mark_failed(&email_id).await;
                stats.record(Outcome::Failed, Some(result.phase_used), elapsed_ms);
            }
        }
        Ok(PhaseOutcome::TimedOut) => {
            // The LLM call itself reported a timeout (§4.E/F) -- never
            // retried, never persisted as a fallback (§7).
            warn!(worker_id = %worker_id, email_id = %email_id, "llm call timed out, marking timeout");
            let _ = repository.mark_timeout(&email_id).await;
            stats.record(Outcome::Timeout, None, elapsed_ms);
        }
        Err(_) => {
            warn!(worker_id = %worker_id, email_id = %email_id, timeout_seconds, "analysis timed out");
            let _ = repository.mark_timeout(&email_id).await;
            stats.record(Outcome::Timeout, None, elapsed_ms);
        }
    }
}

/// Quality gate (§4.G/§7): a result below the minimum serialized size is
/// treated as an integrity failure rather than persisted.
fn result_meets_quality_gate(result: &crate::domain::AnalysisResult, config: &PipelineConfig) -> bool {
    match serde_json::to_vec(result) {
        Ok(bytes) => bytes.len() >= config.phase.min_result_bytes,
        Err(_) => false,
    }
}

async fn resolve_chain(
    repository: &Arc<Repository>,
    claimed: &ClaimedEmail,
    config: &PipelineConfig,
) -> Option<EmailChain> {
    let chain_id = claimed.chain_id.clone()?;
    match repository.get_chain(&chain_id).await {
        Ok(Some(chain)) => Some(chain),
        Ok(None) => {
            // Chain row missing (shouldn't happen once ingestion always
            // upserts chains before emails) -- synthesize a minimal singleton
            // so the email is still analyzable instead of stuck.
            let score = claimed.chain_completeness_score.unwrap_or(0.0);
            let completeness = Completeness::from_score(
                score,
                config.chain.completeness_buckets.complete,
                config.chain.completeness_buckets.partial,
            );
            Some(EmailChain {
                chain_id,
                member_ids: vec![claimed.email.id.clone()],
                participants: vec![claimed.email.sender.clone()],
                completeness,
                completeness_score: score,
                workflow_type: "general_inquiry".to_string(),
                recommended_phase: claimed.recommended_phase.unwrap_or(completeness.recommended_phase()),
                first_seen: claimed.email.received_at,
                last_seen: claimed.email.received_at,
            })
        }
        Err(err) => {
            error!(error = %err, "failed to fetch chain");
            None
        }
    }
}
