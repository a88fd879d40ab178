use crate::SqliteSession;
use async_trait::async_trait;
use chrono::Utc;
use gatehouse_core::{
    Error, Session, UserId,
    error::StorageError,
    repositories::SessionRepository,
    session::SessionToken,
};
use sqlx::SqlitePool;

pub struct SqliteSessionRepository {
    pool: SqlitePool,
}

impl SqliteSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    async fn replace_for_user(&self, session: Session) -> Result<Session, Error> {
        // The UNIQUE constraint on user_id plus the upsert make the
        // rotation a single atomic statement: there is no window where a
        // user has zero or two live sessions.
        let row = sqlx::query_as::<_, SqliteSession>(
            r#"
            INSERT INTO sessions (token, user_id, user_agent, ip_address, created_at, expires_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(user_id) DO UPDATE SET
                token = excluded.token,
                user_agent = excluded.user_agent,
                ip_address = excluded.ip_address,
                created_at = excluded.created_at,
                expires_at = excluded.expires_at
            RETURNING token, user_id, user_agent, ip_address, created_at, expires_at
            "#,
        )
        .bind(session.token.as_str())
        .bind(session.user_id.as_str())
        .bind(&session.user_agent)
        .bind(&session.ip_address)
        .bind(session.created_at.timestamp())
        .bind(session.expires_at.timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create session");
            Error::Storage(StorageError::Database(e.to_string()))
        })?;

        Ok(row.into())
    }

    async fn find_by_token(&self, token: &SessionToken) -> Result<Option<Session>, Error> {
        let row = sqlx::query_as::<_, SqliteSession>(
            r#"
            SELECT token, user_id, user_agent, ip_address, created_at, expires_at
            FROM sessions
            WHERE token = ?1
            "#,
        )
        .bind(token.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(row.map(|s| s.into()))
    }

    async fn delete(&self, token: &SessionToken) -> Result<(), Error> {
        sqlx::query("DELETE FROM sessions WHERE token = ?1")
            .bind(token.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(())
    }

    async fn delete_by_user_id(&self, user_id: &UserId) -> Result<(), Error> {
        sqlx::query("DELETE FROM sessions WHERE user_id = ?1")
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<(), Error> {
        sqlx::query("DELETE FROM sessions WHERE expires_at < ?1")
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(())
    }
}
