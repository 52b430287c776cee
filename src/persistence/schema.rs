// src/persistence/schema.rs
// Logical persistent store schema (§6)

use sqlx::SqlitePool;

pub async fn ensure_schema(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chains (
            chain_id TEXT PRIMARY KEY,
            member_ids TEXT NOT NULL,
            participants TEXT NOT NULL,
            completeness TEXT NOT NULL,
            completeness_score REAL NOT NULL,
            workflow_type TEXT NOT NULL,
            recommended_phase INTEGER NOT NULL,
            first_seen TEXT NOT NULL,
            last_seen TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS emails (
            email_id TEXT PRIMARY KEY,
            subject TEXT NOT NULL,
            body TEXT NOT NULL,
            sender TEXT NOT NULL,
            recipients TEXT NOT NULL,
            received_at TEXT NOT NULL,
            conversation_id TEXT,
            has_attachments INTEGER NOT NULL DEFAULT 0,
            importance TEXT NOT NULL DEFAULT 'NORMAL',
            state TEXT NOT NULL DEFAULT 'pending',
            chain_id TEXT,
            chain_completeness_score REAL,
            chain_bucket TEXT,
            recommended_phase INTEGER,
            phase_used INTEGER,
            entities TEXT,
            result TEXT,
            analyzed_at TEXT,
            worker_id TEXT,
            claimed_at TEXT,
            FOREIGN KEY (chain_id) REFERENCES chains(chain_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_emails_state ON emails(state)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_emails_chain_id ON emails(chain_id)")
        .execute(pool)
        .await?;

    Ok(())
}
