use async_trait::async_trait;
use chrono::Utc;
use gatehouse_core::{
    Error, UserId, error::StorageError, repositories::PasswordRepository,
};
use sqlx::SqlitePool;

/// Password hashes live in a column on the users table; this repository
/// is the only reader and writer of that column.
pub struct SqlitePasswordRepository {
    pool: SqlitePool,
}

impl SqlitePasswordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PasswordRepository for SqlitePasswordRepository {
    async fn set_password_hash(&self, user_id: &UserId, hash: &str) -> Result<(), Error> {
        sqlx::query("UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(hash)
            .bind(Utc::now().timestamp())
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(())
    }

    async fn get_password_hash(&self, user_id: &UserId) -> Result<Option<String>, Error> {
        let hash: Option<Option<String>> =
            sqlx::query_scalar("SELECT password_hash FROM users WHERE id = ?1")
                .bind(user_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(hash.flatten())
    }

    async fn remove_password_hash(&self, user_id: &UserId) -> Result<(), Error> {
        sqlx::query("UPDATE users SET password_hash = NULL, updated_at = ?1 WHERE id = ?2")
            .bind(Utc::now().timestamp())
            .bind(user_id.as_str())
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
        repositories::{PasswordRepositoryProvider, UserRepository, UserRepositoryProvider},
        user::NewUser,
    };

    #[tokio::test]
    async fn test_set_get_remove() {
        let provider = test_provider().await;
        let user = provider
            .user()
            .create(NewUser::new(
                "test@example.com".to_string(),
                "test".to_string(),
            ))
            .await
            .unwrap();
        let repo = provider.password();

        assert!(repo.get_password_hash(&user.id).await.unwrap().is_none());

        repo.set_password_hash(&user.id, "argon2-hash").await.unwrap();
        assert_eq!(
            repo.get_password_hash(&user.id).await.unwrap().as_deref(),
            Some("argon2-hash")
        );

        repo.remove_password_hash(&user.id).await.unwrap();
        assert!(repo.get_password_hash(&user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_for_unknown_user() {
        let provider = test_provider().await;

        let hash = provider
            .password()
            .get_password_hash(&UserId::new_random())
            .await
            .unwrap();
        assert!(hash.is_none());
    }
}
