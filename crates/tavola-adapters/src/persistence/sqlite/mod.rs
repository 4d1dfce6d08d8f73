mod schedule;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use tavola_ports::error::PortError;

/// Row layout of `schedules.data`.
pub(crate) const LEGACY_FORMAT: i64 = 1;
pub(crate) const CANONICAL_FORMAT: i64 = 2;

#[derive(Clone)]
pub struct SqliteDb {
    pool: SqlitePool,
}

impl SqliteDb {
    pub async fn new(url: &str) -> Result<Self, PortError> {
        // Every connection to an in-memory database sees its own database.
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| PortError::Connection(e.to_string()))?;

        let db = Self { pool };
        db.init_schema().await?;
        tracing::debug!(url, "sqlite schedule store ready");
        Ok(db)
    }

    async fn init_schema(&self) -> Result<(), PortError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schedules (
                id TEXT PRIMARY KEY,
                resource_kind TEXT NOT NULL,
                resource_id TEXT NOT NULL,
                format_version INTEGER NOT NULL,
                data TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_schedules_resource
             ON schedules(resource_kind, resource_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
