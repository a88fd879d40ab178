use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use gatehouse_core::{
    Error, UserId,
    crypto::{generate_secure_token, hash_token},
    error::StorageError,
    repositories::{SecureToken, TokenPurpose, TokenRepository},
};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Row type for the `secure_tokens` table. Only the hash is stored; the
/// raw token exists solely in the return value of `create_token`.
#[derive(Debug, Clone, sqlx::FromRow)]
struct SqliteSecureToken {
    user_id: String,
    token_hash: String,
    purpose: String,
    used_at: Option<i64>,
    expires_at: i64,
    created_at: i64,
    updated_at: i64,
}

impl SqliteSecureToken {
    fn into_secure_token(self, raw_token: String) -> Result<SecureToken, Error> {
        Ok(SecureToken {
            user_id: UserId::new(&self.user_id),
            token: raw_token,
            purpose: TokenPurpose::from_str(&self.purpose)?,
            used_at: self.used_at.and_then(|ts| DateTime::from_timestamp(ts, 0)),
            expires_at: DateTime::from_timestamp(self.expires_at, 0).unwrap_or_default(),
            created_at: DateTime::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        })
    }
}

pub struct SqliteTokenRepository {
    pool: SqlitePool,
}

impl SqliteTokenRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for SqliteTokenRepository {
    async fn create_token(
        &self,
        user_id: &UserId,
        purpose: TokenPurpose,
        expires_in: Duration,
    ) -> Result<SecureToken, Error> {
        let raw_token = generate_secure_token();
        let token_hash = hash_token(&raw_token);
        let now = Utc::now();
        let expires_at = now + expires_in;

        let row = sqlx::query_as::<_, SqliteSecureToken>(
            r#"
            INSERT INTO secure_tokens (user_id, token_hash, purpose, expires_at, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING user_id, token_hash, purpose, used_at, expires_at, created_at, updated_at
            "#,
        )
        .bind(user_id.as_str())
        .bind(&token_hash)
        .bind(purpose.as_str())
        .bind(expires_at.timestamp())
        .bind(now.timestamp())
        .bind(now.timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        row.into_secure_token(raw_token)
    }

    async fn verify_token(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<Option<SecureToken>, Error> {
        // Consuming is conditional on the row still being live, so two
        // concurrent redemptions cannot both succeed
        let row = sqlx::query_as::<_, SqliteSecureToken>(
            r#"
            UPDATE secure_tokens
            SET used_at = ?1, updated_at = ?1
            WHERE token_hash = ?2 AND purpose = ?3 AND used_at IS NULL AND expires_at > ?1
            RETURNING user_id, token_hash, purpose, used_at, expires_at, created_at, updated_at
            "#,
        )
        .bind(Utc::now().timestamp())
        .bind(hash_token(token))
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        row.map(|r| r.into_secure_token(token.to_string()))
            .transpose()
    }

    async fn check_token(&self, token: &str, purpose: TokenPurpose) -> Result<bool, Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM secure_tokens
                WHERE token_hash = ?1 AND purpose = ?2 AND used_at IS NULL AND expires_at > ?3
            )
            "#,
        )
        .bind(hash_token(token))
        .bind(purpose.as_str())
        .bind(Utc::now().timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(exists)
    }

    async fn cleanup_expired_tokens(&self) -> Result<(), Error> {
        sqlx::query("DELETE FROM secure_tokens WHERE expires_at < ?1")
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_provider;
    use gatehouse_core::{
        repositories::{TokenRepositoryProvider, UserRepository, UserRepositoryProvider},
        user::NewUser,
    };

    async fn create_user(provider: &crate::SqliteRepositoryProvider) -> UserId {
        provider
            .user()
            .create(NewUser::new(
                "test@example.com".to_string(),
                "test".to_string(),
            ))
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_create_and_verify_consumes() {
        let provider = test_provider().await;
        let user_id = create_user(&provider).await;
        let repo = provider.token();

        let token = repo
            .create_token(&user_id, TokenPurpose::PasswordReset, Duration::minutes(15))
            .await
            .unwrap();

        let verified = repo
            .verify_token(&token.token, TokenPurpose::PasswordReset)
            .await
            .unwrap();
        assert_eq!(verified.unwrap().user_id, user_id);

        // Already consumed
        let again = repo
            .verify_token(&token.token, TokenPurpose::PasswordReset)
            .await
            .unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_purpose_isolation() {
        let provider = test_provider().await;
        let user_id = create_user(&provider).await;
        let repo = provider.token();

        let token = repo
            .create_token(&user_id, TokenPurpose::PasswordReset, Duration::minutes(15))
            .await
            .unwrap();

        // A reset token is not redeemable as a verification token
        let wrong = repo
            .verify_token(&token.token, TokenPurpose::EmailVerification)
            .await
            .unwrap();
        assert!(wrong.is_none());

        // And it is still live for its real purpose
        assert!(
            repo.check_token(&token.token, TokenPurpose::PasswordReset)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_check_does_not_consume() {
        let provider = test_provider().await;
        let user_id = create_user(&provider).await;
        let repo = provider.token();

        let token = repo
            .create_token(&user_id, TokenPurpose::EmailVerification, Duration::hours(24))
            .await
            .unwrap();

        assert!(
            repo.check_token(&token.token, TokenPurpose::EmailVerification)
                .await
                .unwrap()
        );
        assert!(
            repo.verify_token(&token.token, TokenPurpose::EmailVerification)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_expired_token_rejected_and_swept() {
        let provider = test_provider().await;
        let user_id = create_user(&provider).await;
        let repo = provider.token();

        let token = repo
            .create_token(&user_id, TokenPurpose::PasswordReset, Duration::minutes(-1))
            .await
            .unwrap();

        assert!(
            !repo
                .check_token(&token.token, TokenPurpose::PasswordReset)
                .await
                .unwrap()
        );

        repo.cleanup_expired_tokens().await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM secure_tokens")
            .fetch_one(provider.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_only_hash_is_stored() {
        let provider = test_provider().await;
        let user_id = create_user(&provider).await;

        let token = provider
            .token()
            .create_token(&user_id, TokenPurpose::PasswordReset, Duration::minutes(15))
            .await
            .unwrap();

        let stored: String = sqlx::query_scalar("SELECT token_hash FROM secure_tokens")
            .fetch_one(provider.pool())
            .await
            .unwrap();
        assert_ne!(stored, token.token);
        assert_eq!(stored, hash_token(&token.token));
    }
}
