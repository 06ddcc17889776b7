use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::time::Duration;

use crate::{config::StoreConfig, error::AppResult};

/// Creates a SQLite connection pool
///
/// The database file and its parent directories are created when missing.
/// WAL journaling lets readers proceed while a write is committing.
pub async fn create_pool(config: &StoreConfig) -> AppResult<SqlitePool> {
    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(sqlx::Error::Io)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(&config.path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .connect_with(options)
        .await?;

    tracing::info!(
        path = %config.path.display(),
        max_connections = config.max_connections,
        "Opened SQLite pool"
    );

    Ok(pool)
}
