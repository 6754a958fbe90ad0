//! Connection pool and schema bootstrap for the SQLite file.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{info, instrument};
use vcard_core::config::DatabaseConfig;

/// Opens the pool, creating the database file when it does not exist yet.
#[instrument(skip(config))]
pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    info!(url = %config.url, "Connected to SQLite database");
    Ok(pool)
}

/// Creates the `contacts` and `scans` tables if they are missing.
#[instrument(skip(pool))]
pub async fn ensure_schema(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database schema ready");
    Ok(())
}

/// Fresh in-memory database with the schema applied.
///
/// Every connection to `sqlite::memory:` sees its own database, so the pool
/// is pinned to one connection that is never recycled.
#[cfg(test)]
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    ensure_schema(&pool).await.unwrap();
    pool
}
