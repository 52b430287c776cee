// src/persistence/repository.rs
// Batch claim, result write, and orphan recovery (§4.G)

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use tracing::{info, warn};

use crate::domain::{AnalysisResult, Email, EmailChain, RecordState};
use crate::error::PipelineError;

pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn upsert_chain(&self, chain: &EmailChain) -> Result<(), PipelineError> {
        let member_ids = to_json(&chain.member_ids)?;
        let participants = to_json(&chain.participants)?;

        sqlx::query(
            r#"
            INSERT INTO chains (
                chain_id, member_ids, participants, completeness, completeness_score,
                workflow_type, recommended_phase, first_seen, last_seen
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(chain_id) DO UPDATE SET
                member_ids = excluded.member_ids,
                participants = excluded.participants,
                completeness = excluded.completeness,
                completeness_score = excluded.completeness_score,
                workflow_type = excluded.workflow_type,
                recommended_phase = excluded.recommended_phase,
                last_seen = excluded.last_seen
            "#,
        )
        .bind(&chain.chain_id)
        .bind(member_ids)
        .bind(participants)
        .bind(format!("{:?}", chain.completeness).to_lowercase())
        .bind(chain.completeness_score)
        .bind(&chain.workflow_type)
        .bind(chain.recommended_phase as i64)
        .bind(chain.first_seen.to_rfc3339())
        .bind(chain.last_seen.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a raw email as `pending`, tagged with its chain assignment.
    pub async fn insert_email(&self, email: &Email, chain: &EmailChain) -> Result<(), PipelineError> {
        let recipients = to_json(&email.recipients)?;

        sqlx::query(
            r#"
            INSERT INTO emails (
                email_id, subject, body, sender, recipients, received_at, conversation_id,
                has_attachments, importance, state, chain_id, chain_completeness_score,
                chain_bucket, recommended_phase
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?, ?, ?)
            ON CONFLICT(email_id) DO NOTHING
            "#,
        )
        .bind(&email.id)
        .bind(&email.subject)
        .bind(&email.body)
        .bind(&email.sender)
        .bind(recipients)
        .bind(email.received_at.to_rfc3339())
        .bind(&email.conversation_id)
        .bind(email.has_attachments)
        .bind(format!("{:?}", email.importance).to_uppercase())
        .bind(&chain.chain_id)
        .bind(chain.completeness_score)
        .bind(format!("{:?}", chain.completeness).to_lowercase())
        .bind(chain.recommended_phase as i64)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Single transaction: selects up to `limit` rows in {pending, failed,
    /// timeout} ordered timeout-first then chain completeness desc, and
    /// immediately marks them `processing` owned by `worker_id` (§4.G).
    pub async fn claim_batch(
        &self,
        limit: usize,
        worker_id: &str,
    ) -> Result<Vec<ClaimedEmail>, PipelineError> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(
            r#"
            SELECT e.email_id, e.subject, e.body, e.sender, e.recipients, e.received_at,
                   e.conversation_id, e.has_attachments, e.importance,
                   e.chain_id, e.chain_completeness_score, e.recommended_phase
            FROM emails e
            LEFT JOIN chains c ON e.chain_id = c.chain_id
            WHERE e.state IN ('pending', 'failed', 'timeout')
            ORDER BY (e.state = 'timeout') DESC, e.chain_completeness_score DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&mut *tx)
        .await?;

        let mut claimed = Vec::with_capacity(rows.len());
        for row in &rows {
            let email_id: String = row.try_get("email_id")?;
            sqlx::query(
                "UPDATE emails SET state = 'processing', worker_id = ?, claimed_at = ? WHERE email_id = ?",
            )
            .bind(worker_id)
            .bind(Utc::now().to_rfc3339())
            .bind(&email_id)
            .execute(&mut *tx)
            .await?;

            claimed.push(row_to_claimed(row)?);
        }

        tx.commit().await?;
        Ok(claimed)
    }

    /// Single `UPDATE` per email within a transaction, writing state,
    /// `phase_used`, serialized entities/result, and `processed_at`. The
    /// quality gate (§4.G integrity rule: `min_result_bytes`) must be applied
    /// by the caller before calling this — rows failing it should be written
    /// via `mark_failed` instead.
    pub async fn write_result(&self, result: &AnalysisResult) -> Result<(), PipelineError> {
        let entities_json = to_json(&result.entities)?;
        let result_json = to_json(result)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            UPDATE emails SET
                state = 'analyzed',
                phase_used = ?,
                entities = ?,
                result = ?,
                analyzed_at = ?
            WHERE email_id = ?
            "#,
        )
        .bind(result.phase_used as i64)
        .bind(entities_json)
        .bind(result_json)
        .bind(result.processed_at.to_rfc3339())
        .bind(&result.email_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(())
    }

    pub async fn mark_failed(&self, email_id: &str) -> Result<(), PipelineError> {
        sqlx::query("UPDATE emails SET state = 'failed' WHERE email_id = ?")
            .bind(email_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn mark_timeout(&self, email_id: &str) -> Result<(), PipelineError> {
        sqlx::query("UPDATE emails SET state = 'timeout' WHERE email_id = ?")
            .bind(email_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Resets orphaned `processing` rows (no live worker owns them, claimed
    /// past `grace`) back to `pending` at startup (§4.G, P1, P6).
    pub async fn recover_orphans(&self, grace: Duration) -> Result<u64, PipelineError> {
        let cutoff = (Utc::now() - grace).to_rfc3339();
        let result = sqlx::query(
            "UPDATE emails SET state = 'pending', worker_id = NULL, claimed_at = NULL \
             WHERE state = 'processing' AND (claimed_at IS NULL OR claimed_at < ?)",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        let reset = result.rows_affected();
        if reset > 0 {
            warn!(reset, "recovered orphaned processing rows at startup");
        } else {
            info!("no orphaned processing rows found at startup");
        }
        Ok(reset)
    }

    /// Resets every row this run left `processing` back to `pending`, used
    /// during a graceful-shutdown drain (§4.H).
    pub async fn requeue_in_flight(&self, worker_id: &str) -> Result<u64, PipelineError> {
        let result = sqlx::query(
            "UPDATE emails SET state = 'pending', worker_id = NULL, claimed_at = NULL \
             WHERE state = 'processing' AND worker_id = ?",
        )
        .bind(worker_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Fetches the full chain row for `chain_id`, used by the executor to
    /// reconstruct the `EmailChain` a claimed email belongs to (§4.C/§4.H).
    pub async fn get_chain(&self, chain_id: &str) -> Result<Option<EmailChain>, PipelineError> {
        let row = sqlx::query(
            r#"
            SELECT chain_id, member_ids, participants, completeness, completeness_score,
                   workflow_type, recommended_phase, first_seen, last_seen
            FROM chains WHERE chain_id = ?
            "#,
        )
        .bind(chain_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row_to_chain(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn count_by_state(&self, state: RecordState) -> Result<i64, PipelineError> {
        let row = sqlx::query("SELECT COUNT(*) as c FROM emails WHERE state = ?")
            .bind(state.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("c")?)
    }

    /// Deserialized `AnalysisResult` rows analyzed since `since`, used by the
    /// Quality Monitor's rolling-window aggregates (§4.I).
    pub async fn fetch_recent_results(&self, since: DateTime<Utc>) -> Result<Vec<AnalysisResult>, PipelineError> {
        let rows = sqlx::query(
            "SELECT result FROM emails WHERE state = 'analyzed' AND analyzed_at >= ? AND result IS NOT NULL",
        )
        .bind(since.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;

        let mut results = Vec::with_capacity(rows.len());
        for row in &rows {
            let raw: String = row.try_get("result")?;
            let result: AnalysisResult = serde_json::from_str(&raw)
                .map_err(|e| PipelineError::PersistenceIntegrity(e.to_string()))?;
            results.push(result);
        }
        Ok(results)
    }

    /// Count of rows in {failed, timeout} state whose `claimed_at` falls
    /// within the window, for the Quality Monitor's error-rate aggregate.
    pub async fn count_failed_since(&self, since: DateTime<Utc>) -> Result<i64, PipelineError> {
        let row = sqlx::query(
            "SELECT COUNT(*) as c FROM emails WHERE state IN ('failed', 'timeout') AND claimed_at >= ?",
        )
        .bind(since.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get::<i64, _>("c")?)
    }
}

pub struct ClaimedEmail {
    pub email: Email,
    pub chain_id: Option<String>,
    pub chain_completeness_score: Option<f64>,
    pub recommended_phase: Option<u8>,
}

fn row_to_claimed(row: &sqlx::sqlite::SqliteRow) -> Result<ClaimedEmail, PipelineError> {
    let recipients_json: String = row.try_get("recipients")?;
    let recipients: Vec<String> = serde_json::from_str(&recipients_json)
        .map_err(|e| PipelineError::PersistenceIntegrity(e.to_string()))?;
    let received_at: String = row.try_get("received_at")?;
    let received_at = DateTime::parse_from_rfc3339(&received_at)
        .map_err(|e| PipelineError::PersistenceIntegrity(e.to_string()))?
        .with_timezone(&Utc);

    let importance_str: String = row.try_get("importance")?;
    let importance = match importance_str.as_str() {
        "HIGH" => crate::domain::Importance::High,
        "LOW" => crate::domain::Importance::Low,
        _ => crate::domain::Importance::Normal,
    };

    let email = Email {
        id: row.try_get("email_id")?,
        subject: row.try_get("subject")?,
        body: row.try_get("body")?,
        sender: row.try_get("sender")?,
        recipients,
        received_at,
        conversation_id: row.try_get("conversation_id")?,
        has_attachments: row.try_get("has_attachments")?,
        importance,
    };

    Ok(ClaimedEmail {
        email,
        chain_id: row.try_get::<Option<String>, _>("chain_id").ok().flatten(),
        chain_completeness_score: row
            .try_get::<Option<f64>, _>("chain_completeness_score")
            .ok()
            .flatten(),
        recommended_phase: row
            .try_get::<Option<i64>, _>("recommended_phase")
            .ok()
            .flatten()
            .map(|v| v as u8),
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<String, PipelineError> {
    serde_json::to_string(value).map_err(|e| PipelineError::PersistenceIntegrity(e.to_string()))
}

fn row_to_chain(row: &sqlx::sqlite::SqliteRow) -> Result<EmailChain, PipelineError> {
    let member_ids_json: String = row.try_get("member_ids")?;
    let member_ids: Vec<String> = serde_json::from_str(&member_ids_json)
        .map_err(|e| PipelineError::PersistenceIntegrity(e.to_string()))?;
    let participants_json: String = row.try_get("participants")?;
    let participants: Vec<String> = serde_json::from_str(&participants_json)
        .map_err(|e| PipelineError::PersistenceIntegrity(e.to_string()))?;

    let completeness_str: String = row.try_get("completeness")?;
    let completeness = match completeness_str.as_str() {
        "complete" => crate::domain::Completeness::Complete,
        "partial" => crate::domain::Completeness::Partial,
        _ => crate::domain::Completeness::Broken,
    };

    let first_seen: String = row.try_get("first_seen")?;
    let first_seen = DateTime::parse_from_rfc3339(&first_seen)
        .map_err(|e| PipelineError::PersistenceIntegrity(e.to_string()))?
        .with_timezone(&Utc);
    let last_seen: String = row.try_get("last_seen")?;
    let last_seen = DateTime::parse_from_rfc3339(&last_seen)
        .map_err(|e| PipelineError::PersistenceIntegrity(e.to_string()))?
        .with_timezone(&Utc);

    Ok(EmailChain {
        chain_id: row.try_get("chain_id")?,
        member_ids,
        participants,
        completeness,
        completeness_score: row.try_get("completeness_score")?,
        workflow_type: row.try_get("workflow_type")?,
        recommended_phase: row.try_get::<i64, _>("recommended_phase")? as u8,
        first_seen,
        last_seen,
    })
}
