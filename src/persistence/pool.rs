// src/persistence/pool.rs
// Bounded, pragma-configured SQLite connection pool (§4.G)

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Executor, SqlitePool};
use tracing::info;

/// Opens a pool of `workers + 2` handles, each configured with WAL
/// journaling, a 10s busy timeout, a >=64MiB cache, foreign keys, and
/// memory-mapped I/O, per §4.G's per-handle setup requirement.
pub async fn build_pool(database_url: &str, workers: usize) -> anyhow::Result<SqlitePool> {
    let max_connections = (workers + 2) as u32;
    info!(database_url, max_connections, "opening persistence pool");

    let options: SqliteConnectOptions = database_url
        .parse::<SqliteConnectOptions>()?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("PRAGMA journal_mode=WAL;").await?;
                conn.execute("PRAGMA busy_timeout=10000;").await?;
                conn.execute("PRAGMA cache_size=-65536;").await?;
                conn.execute("PRAGMA foreign_keys=ON;").await?;
                conn.execute("PRAGMA mmap_size=268435456;").await?;
                Ok(())
            })
        })
        .connect_with(options)
        .await?;

    Ok(pool)
}
