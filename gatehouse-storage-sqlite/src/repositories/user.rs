use crate::SqliteUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatehouse_core::{
    Error, User, UserId,
    error::StorageError,
    repositories::UserRepository,
    user::NewUser,
};
use sqlx::SqlitePool;

const USER_COLUMNS: &str = "id, email, username, email_verified_at, is_active, is_admin, \
     failed_login_attempts, locked_until, last_login_at, created_at, updated_at";

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, Error> {
        let now = Utc::now().timestamp();
        let email_verified_timestamp = user.email_verified_at.map(|dt| dt.timestamp());

        let sqlite_user = sqlx::query_as::<_, SqliteUser>(&format!(
            r#"
            INSERT INTO users (id, email, username, email_verified_at, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(user.id.as_str())
        .bind(&user.email)
        .bind(&user.username)
        .bind(email_verified_timestamp)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Error::Storage(StorageError::Constraint(e.to_string()))
            }
            _ => Error::Storage(StorageError::Database(e.to_string())),
        })?;

        Ok(sqlite_user.into())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
        let sqlite_user = sqlx::query_as::<_, SqliteUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(sqlite_user.map(|u| u.into()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let sqlite_user = sqlx::query_as::<_, SqliteUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(sqlite_user.map(|u| u.into()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        let sqlite_user = sqlx::query_as::<_, SqliteUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(sqlite_user.map(|u| u.into()))
    }

    async fn update(&self, user: &User) -> Result<User, Error> {
        let now = Utc::now().timestamp();

        let sqlite_user = sqlx::query_as::<_, SqliteUser>(&format!(
            r#"
            UPDATE users
            SET email = ?2, username = ?3, email_verified_at = ?4, is_active = ?5,
                is_admin = ?6, updated_at = ?7
            WHERE id = ?1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(user.id.as_str())
        .bind(&user.email)
        .bind(&user.username)
        .bind(user.email_verified_at.map(|dt| dt.timestamp()))
        .bind(user.is_active)
        .bind(user.is_admin)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(sqlite_user.into())
    }

    async fn delete(&self, id: &UserId) -> Result<(), Error> {
        sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(())
    }

    async fn mark_email_verified(&self, user_id: &UserId) -> Result<(), Error> {
        let now = Utc::now().timestamp();

        sqlx::query("UPDATE users SET email_verified_at = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(now)
            .bind(now)
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(())
    }

    async fn set_active(&self, user_id: &UserId, is_active: bool) -> Result<(), Error> {
        sqlx::query("UPDATE users SET is_active = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(is_active)
            .bind(Utc::now().timestamp())
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(())
    }

    async fn record_login_failure(&self, user_id: &UserId) -> Result<u32, Error> {
        // Increment and read back in one statement so concurrent failures
        // each observe a distinct count
        let count: i64 = sqlx::query_scalar(
            r#"
            UPDATE users
            SET failed_login_attempts = failed_login_attempts + 1, updated_at = ?1
            WHERE id = ?2
            RETURNING failed_login_attempts
            "#,
        )
        .bind(Utc::now().timestamp())
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?
        .ok_or(Error::Storage(StorageError::NotFound))?;

        Ok(count.max(0) as u32)
    }

    async fn lock_until(&self, user_id: &UserId, locked_until: DateTime<Utc>) -> Result<(), Error> {
        sqlx::query("UPDATE users SET locked_until = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(locked_until.timestamp())
            .bind(Utc::now().timestamp())
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(())
    }

    async fn reset_lockout(&self, user_id: &UserId) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET failed_login_attempts = 0, locked_until = NULL, updated_at = ?1
            WHERE id = ?2
            "#,
        )
        .bind(Utc::now().timestamp())
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(())
    }

    async fn record_login_success(&self, user_id: &UserId) -> Result<(), Error> {
        let now = Utc::now().timestamp();

        sqlx::query(
            r#"
            UPDATE users
            SET failed_login_attempts = 0, locked_until = NULL, last_login_at = ?1,
                updated_at = ?2
            WHERE id = ?3
            "#,
        )
        .bind(now)
        .bind(now)
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;

        Ok(())
    }
}
