//! Repository implementations for SQLite storage

pub mod password;
pub mod security_log;
pub mod session;
pub mod token;
pub mod user;

pub use password::SqlitePasswordRepository;
pub use security_log::SqliteSecurityLogRepository;
pub use session::SqliteSessionRepository;
pub use token::SqliteTokenRepository;
pub use user::SqliteUserRepository;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;

use gatehouse_core::{
    Error,
    error::StorageError,
    repositories::{
        PasswordRepositoryProvider, RepositoryProvider, SecurityLogRepositoryProvider,
        SessionRepositoryProvider, TokenRepositoryProvider, UserRepositoryProvider,
    },
};

/// Repository provider implementation for SQLite
///
/// Implements the individual repository provider traits as well as the
/// unified `RepositoryProvider` trait.
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    user: Arc<SqliteUserRepository>,
    session: Arc<SqliteSessionRepository>,
    password: Arc<SqlitePasswordRepository>,
    token: Arc<SqliteTokenRepository>,
    security_log: Arc<SqliteSecurityLogRepository>,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        let user = Arc::new(SqliteUserRepository::new(pool.clone()));
        let session = Arc::new(SqliteSessionRepository::new(pool.clone()));
        let password = Arc::new(SqlitePasswordRepository::new(pool.clone()));
        let token = Arc::new(SqliteTokenRepository::new(pool.clone()));
        let security_log = Arc::new(SqliteSecurityLogRepository::new(pool.clone()));

        Self {
            pool,
            user,
            session,
            password,
            token,
            security_log,
        }
    }

    /// Open a pool for the given URL and wrap it in a provider.
    ///
    /// Enables foreign keys and creates the database file when missing.
    /// `sqlite::memory:` works for tests.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| Error::Storage(StorageError::Connection(e.to_string())))?
            .create_if_missing(true)
            .foreign_keys(true);

        let mut pool_options = SqlitePoolOptions::new();
        if url.contains(":memory:") {
            // Every pooled connection would otherwise get its own empty db
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| Error::Storage(StorageError::Connection(e.to_string())))?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl UserRepositoryProvider for SqliteRepositoryProvider {
    type UserRepo = SqliteUserRepository;

    fn user(&self) -> &Self::UserRepo {
        &self.user
    }
}

impl SessionRepositoryProvider for SqliteRepositoryProvider {
    type SessionRepo = SqliteSessionRepository;

    fn session(&self) -> &Self::SessionRepo {
        &self.session
    }
}

impl PasswordRepositoryProvider for SqliteRepositoryProvider {
    type PasswordRepo = SqlitePasswordRepository;

    fn password(&self) -> &Self::PasswordRepo {
        &self.password
    }
}

impl TokenRepositoryProvider for SqliteRepositoryProvider {
    type TokenRepo = SqliteTokenRepository;

    fn token(&self) -> &Self::TokenRepo {
        &self.token
    }
}

impl SecurityLogRepositoryProvider for SqliteRepositoryProvider {
    type SecurityLogRepo = SqliteSecurityLogRepository;

    fn security_log(&self) -> &Self::SecurityLogRepo {
        &self.security_log
    }
}

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        use crate::migrations::{SqliteMigrationManager, all_migrations};

        let manager = SqliteMigrationManager::new(self.pool.clone());
        manager.initialize().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to initialize migrations");
            Error::Storage(StorageError::Migration(
                "Failed to initialize migrations".to_string(),
            ))
        })?;

        manager.up(&all_migrations()).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            Error::Storage(StorageError::Migration(
                "Failed to run migrations".to_string(),
            ))
        })?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) async fn test_provider() -> SqliteRepositoryProvider {
    let provider = SqliteRepositoryProvider::connect("sqlite::memory:")
        .await
        .unwrap();
    provider.migrate().await.unwrap();
    provider
}
