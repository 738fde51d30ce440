//! SQLite pool setup and the one-shot init script.

use crate::error::{AppError, ConfigError};
use crate::settings::Settings;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;

/// Open (creating if missing) the database file named in settings.
pub async fn connect_pool(settings: &Settings) -> Result<SqlitePool, AppError> {
    let opts = SqliteConnectOptions::new()
        .filename(&settings.db)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections.max(1))
        .connect_with(opts)
        .await?;
    tracing::info!(db = %settings.db.display(), "database opened");
    Ok(pool)
}

/// Run every statement in the script. Operator-supplied; no versioning.
pub async fn run_init_script(pool: &SqlitePool, path: &Path) -> Result<(), AppError> {
    let script = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    sqlx::raw_sql(&script).execute(pool).await?;
    tracing::info!(script = %path.display(), "init script applied");
    Ok(())
}
