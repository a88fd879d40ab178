//! Versioned schema migrations.
//!
//! SQLite is the only backend this workspace ships, so the machinery is
//! concrete: a [`Migration`] is one versioned schema change over a
//! `SqliteConnection`, and [`SqliteMigrationManager`] applies pending ones
//! in order, each inside its own transaction, recording what ran in
//! `_gatehouse_migrations`.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;

const MIGRATION_TABLE: &str = "_gatehouse_migrations";

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A single versioned schema change.
#[async_trait]
pub trait Migration: Send + Sync {
    /// Unique version number for ordering migrations
    fn version(&self) -> i64;

    /// Human readable name of the migration
    fn name(&self) -> &str;

    /// Execute the migration
    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError>;

    /// Rollback the migration
    async fn down(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError>;
}

/// One row of the migration tracking table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: i64,
}

/// Applies and rolls back migrations against a SQLite pool.
pub struct SqliteMigrationManager {
    pool: SqlitePool,
}

impl SqliteMigrationManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the tracking table if it does not exist yet.
    pub async fn initialize(&self) -> Result<(), MigrationError> {
        sqlx::query(
            format!(
                r#"
            CREATE TABLE IF NOT EXISTS {MIGRATION_TABLE} (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at INTEGER NOT NULL DEFAULT (unixepoch())
            );"#
            )
            .as_str(),
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Apply every migration that has not run yet, in order.
    pub async fn up(&self, migrations: &[Box<dyn Migration>]) -> Result<(), MigrationError> {
        for migration in migrations {
            if !self.is_applied(migration.version()).await? {
                let mut tx = self.pool.begin().await?;

                tracing::info!(
                    "Applying migration {} ({})",
                    migration.name(),
                    migration.version()
                );

                migration.up(&mut *tx).await?;

                sqlx::query(
                    format!(
                        "INSERT INTO {MIGRATION_TABLE} (version, name, applied_at) VALUES (?, ?, ?)"
                    )
                    .as_str(),
                )
                .bind(migration.version())
                .bind(migration.name())
                .bind(Utc::now().timestamp())
                .execute(&mut *tx)
                .await?;

                tx.commit().await?;
            }
        }
        Ok(())
    }

    /// Roll back every applied migration in the given list.
    pub async fn down(&self, migrations: &[Box<dyn Migration>]) -> Result<(), MigrationError> {
        for migration in migrations {
            if self.is_applied(migration.version()).await? {
                let mut tx = self.pool.begin().await?;

                tracing::info!(
                    "Rolling back migration {} ({})",
                    migration.name(),
                    migration.version()
                );

                migration.down(&mut *tx).await?;

                sqlx::query(
                    format!("DELETE FROM {MIGRATION_TABLE} WHERE version = ?").as_str(),
                )
                .bind(migration.version())
                .execute(&mut *tx)
                .await?;

                tx.commit().await?;
            }
        }
        Ok(())
    }

    pub async fn applied_migrations(&self) -> Result<Vec<MigrationRecord>, MigrationError> {
        let records = sqlx::query_as::<_, MigrationRecord>(
            format!("SELECT version, name, applied_at FROM {MIGRATION_TABLE} ORDER BY version")
                .as_str(),
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    pub async fn is_applied(&self, version: i64) -> Result<bool, MigrationError> {
        let result: bool = sqlx::query_scalar(
            format!("SELECT EXISTS(SELECT 1 FROM {MIGRATION_TABLE} WHERE version = ?)").as_str(),
        )
        .bind(version)
        .fetch_one(&self.pool)
        .await?;
        Ok(result)
    }
}

/// The full schema, in application order.
pub fn all_migrations() -> Vec<Box<dyn Migration>> {
    vec![
        Box::new(CreateUsersTable),
        Box::new(CreateSessionsTable),
        Box::new(CreateSecureTokensTable),
        Box::new(CreateSecurityLogTable),
        Box::new(CreateIndexes),
    ]
}

/// Users carry their credential state inline: the password hash, the
/// account flags, and the lockout counter pair.
pub struct CreateUsersTable;

#[async_trait]
impl Migration for CreateUsersTable {
    fn version(&self) -> i64 {
        1
    }

    fn name(&self) -> &str {
        "CreateUsersTable"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                username TEXT NOT NULL,
                email_verified_at INTEGER,
                password_hash TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                is_admin INTEGER NOT NULL DEFAULT 0,
                failed_login_attempts INTEGER NOT NULL DEFAULT 0,
                locked_until INTEGER,
                last_login_at INTEGER,
                created_at INTEGER NOT NULL DEFAULT (unixepoch()),
                updated_at INTEGER NOT NULL DEFAULT (unixepoch()),
                UNIQUE(email),
                UNIQUE(username)
            );"#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn down(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE IF EXISTS users")
            .execute(conn)
            .await?;
        Ok(())
    }
}

/// Sessions keyed by token, with a unique constraint on user_id so the
/// per-user upsert can atomically replace the prior login.
pub struct CreateSessionsTable;

#[async_trait]
impl Migration for CreateSessionsTable {
    fn version(&self) -> i64 {
        2
    }

    fn name(&self) -> &str {
        "CreateSessionsTable"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                user_id TEXT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
                user_agent TEXT,
                ip_address TEXT,
                created_at INTEGER NOT NULL DEFAULT (unixepoch()),
                expires_at INTEGER NOT NULL
            );"#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn down(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE IF EXISTS sessions")
            .execute(conn)
            .await?;
        Ok(())
    }
}

/// Single-use tokens for password reset and email verification, stored
/// as SHA256 hashes.
pub struct CreateSecureTokensTable;

#[async_trait]
impl Migration for CreateSecureTokensTable {
    fn version(&self) -> i64 {
        3
    }

    fn name(&self) -> &str {
        "CreateSecureTokensTable"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS secure_tokens (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                token_hash TEXT NOT NULL UNIQUE,
                purpose TEXT NOT NULL,
                used_at INTEGER,
                expires_at INTEGER NOT NULL,
                created_at INTEGER NOT NULL DEFAULT (unixepoch()),
                updated_at INTEGER NOT NULL DEFAULT (unixepoch())
            );"#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn down(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE IF EXISTS secure_tokens")
            .execute(conn)
            .await?;
        Ok(())
    }
}

/// Append-only audit trail. No foreign key on user_id: log rows outlive
/// the accounts they mention.
pub struct CreateSecurityLogTable;

#[async_trait]
impl Migration for CreateSecurityLogTable {
    fn version(&self) -> i64 {
        4
    }

    fn name(&self) -> &str {
        "CreateSecurityLogTable"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS security_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_type TEXT NOT NULL,
                user_id TEXT,
                ip_address TEXT,
                user_agent TEXT,
                success INTEGER NOT NULL,
                metadata TEXT,
                created_at INTEGER NOT NULL DEFAULT (unixepoch())
            );"#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn down(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE IF EXISTS security_log")
            .execute(conn)
            .await?;
        Ok(())
    }
}

pub struct CreateIndexes;

#[async_trait]
impl Migration for CreateIndexes {
    fn version(&self) -> i64 {
        5
    }

    fn name(&self) -> &str {
        "CreateIndexes"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        // One statement per query; SQLite rejects multi-statement strings here
        for stmt in [
            "CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at)",
            "CREATE INDEX IF NOT EXISTS idx_secure_tokens_expires_at ON secure_tokens(expires_at)",
            "CREATE INDEX IF NOT EXISTS idx_security_log_user_id ON security_log(user_id)",
            "CREATE INDEX IF NOT EXISTS idx_security_log_created_at ON security_log(created_at)",
        ] {
            sqlx::query(stmt).execute(&mut *conn).await?;
        }
        Ok(())
    }

    async fn down(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        for stmt in [
            "DROP INDEX IF EXISTS idx_sessions_expires_at",
            "DROP INDEX IF EXISTS idx_secure_tokens_expires_at",
            "DROP INDEX IF EXISTS idx_security_log_user_id",
            "DROP INDEX IF EXISTS idx_security_log_created_at",
        ] {
            sqlx::query(stmt).execute(&mut *conn).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;

    async fn memory_pool() -> SqlitePool {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .foreign_keys(true);
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_up_applies_once_and_records_versions() {
        let pool = memory_pool().await;
        let manager = SqliteMigrationManager::new(pool.clone());

        manager.initialize().await.unwrap();
        manager.up(&all_migrations()).await.unwrap();
        // Second run is a no-op, not a duplicate-insert failure
        manager.up(&all_migrations()).await.unwrap();

        let applied = manager.applied_migrations().await.unwrap();
        let versions: Vec<i64> = applied.iter().map(|r| r.version).collect();
        assert_eq!(versions, vec![1, 2, 3, 4, 5]);

        // The schema is actually there
        sqlx::query("SELECT id FROM users").fetch_all(&pool).await.unwrap();
        sqlx::query("SELECT token FROM sessions").fetch_all(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_down_unwinds_applied_migrations() {
        let pool = memory_pool().await;
        let manager = SqliteMigrationManager::new(pool.clone());

        manager.initialize().await.unwrap();
        manager.up(&all_migrations()).await.unwrap();

        let mut reversed = all_migrations();
        reversed.reverse();
        manager.down(&reversed).await.unwrap();

        assert!(manager.applied_migrations().await.unwrap().is_empty());
        assert!(sqlx::query("SELECT id FROM users").fetch_all(&pool).await.is_err());
    }
}
