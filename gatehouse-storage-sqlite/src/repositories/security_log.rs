use async_trait::async_trait;
use gatehouse_core::{
    Error, SecurityEvent, error::StorageError, repositories::SecurityLogRepository,
};
use sqlx::SqlitePool;

/// Append-only writer for the `security_log` table. Rows are never updated
/// or deleted here.
pub struct SqliteSecurityLogRepository {
    pool: SqlitePool,
}

impl SqliteSecurityLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SecurityLogRepository for SqliteSecurityLogRepository {
    async fn append(&self, event: SecurityEvent) -> Result<(), Error> {
        let metadata = event
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        sqlx::query(
            r#"
            INSERT INTO security_log (event_type, user_id, ip_address, user_agent, success, metadata, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(event.kind.as_str())
        .bind(event.user_id.as_ref().map(|id| id.as_str().to_string()))
        .bind(&event.ip_address)
        .bind(&event.user_agent)
        .bind(event.success)
        .bind(metadata)
        .bind(event.created_at.timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(())
    }
}
