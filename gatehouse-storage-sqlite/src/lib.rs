//! SQLite storage backend.
//!
//! Implements the gatehouse repository traits over a `sqlx` SQLite pool.
//! All timestamps are stored as integer unix seconds; booleans as 0/1.
//! Single-use tokens are stored as SHA256 hashes, never raw.

pub mod migrations;
pub mod repositories;

pub use repositories::{
    SqlitePasswordRepository, SqliteRepositoryProvider, SqliteSecurityLogRepository,
    SqliteSessionRepository, SqliteTokenRepository, SqliteUserRepository,
};

use chrono::DateTime;
use gatehouse_core::{Session, SessionToken, User, UserId};

/// Row type for the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SqliteUser {
    id: String,
    email: String,
    username: String,
    email_verified_at: Option<i64>,
    is_active: bool,
    is_admin: bool,
    failed_login_attempts: i64,
    locked_until: Option<i64>,
    last_login_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl From<SqliteUser> for User {
    fn from(user: SqliteUser) -> Self {
        User {
            id: UserId::new(&user.id),
            email: user.email,
            username: user.username,
            email_verified_at: user
                .email_verified_at
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
            is_active: user.is_active,
            is_admin: user.is_admin,
            failed_login_attempts: user.failed_login_attempts.max(0) as u32,
            locked_until: user
                .locked_until
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
            last_login_at: user
                .last_login_at
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
            created_at: DateTime::from_timestamp(user.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::from_timestamp(user.updated_at, 0).unwrap_or_default(),
        }
    }
}

/// Row type for the `sessions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SqliteSession {
    token: String,
    user_id: String,
    user_agent: Option<String>,
    ip_address: Option<String>,
    created_at: i64,
    expires_at: i64,
}

impl From<SqliteSession> for Session {
    fn from(session: SqliteSession) -> Self {
        Session {
            token: SessionToken::new(&session.token),
            user_id: UserId::new(&session.user_id),
            user_agent: session.user_agent,
            ip_address: session.ip_address,
            created_at: DateTime::from_timestamp(session.created_at, 0).unwrap_or_default(),
            expires_at: DateTime::from_timestamp(session.expires_at, 0).unwrap_or_default(),
        }
    }
}
