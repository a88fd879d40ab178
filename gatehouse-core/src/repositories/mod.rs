//! Repository traits for the data access layer
//!
//! Services interact with storage exclusively through these traits. Every
//! mutation is a single atomic statement on the backend; services never
//! hold multi-statement transactions open.
//!
//! The provider hierarchy mirrors the data domains: individual
//! `*Repository` traits define the operations, `*RepositoryProvider`
//! traits expose each repository, and [`RepositoryProvider`] combines them
//! with lifecycle methods so a backend can be passed around as one object.

pub mod adapter;
pub mod password;
pub mod security_log;
pub mod session;
pub mod token;
pub mod user;

pub use adapter::{
    PasswordRepositoryAdapter, SecurityLogRepositoryAdapter, SessionRepositoryAdapter,
    TokenRepositoryAdapter, UserRepositoryAdapter,
};
pub use password::PasswordRepository;
pub use security_log::SecurityLogRepository;
pub use session::SessionRepository;
pub use token::{SecureToken, TokenPurpose, TokenRepository};
pub use user::UserRepository;

use async_trait::async_trait;

use crate::Error;

/// Provider trait for user repository access.
pub trait UserRepositoryProvider: Send + Sync + 'static {
    type UserRepo: UserRepository;

    fn user(&self) -> &Self::UserRepo;
}

/// Provider trait for session repository access.
pub trait SessionRepositoryProvider: Send + Sync + 'static {
    type SessionRepo: SessionRepository;

    fn session(&self) -> &Self::SessionRepo;
}

/// Provider trait for password repository access.
pub trait PasswordRepositoryProvider: Send + Sync + 'static {
    type PasswordRepo: PasswordRepository;

    fn password(&self) -> &Self::PasswordRepo;
}

/// Provider trait for secure token repository access.
pub trait TokenRepositoryProvider: Send + Sync + 'static {
    type TokenRepo: TokenRepository;

    fn token(&self) -> &Self::TokenRepo;
}

/// Provider trait for security log repository access.
pub trait SecurityLogRepositoryProvider: Send + Sync + 'static {
    type SecurityLogRepo: SecurityLogRepository;

    fn security_log(&self) -> &Self::SecurityLogRepo;
}

/// Provider trait that storage backends implement to supply every
/// repository plus migrations and health checks.
#[async_trait]
pub trait RepositoryProvider:
    UserRepositoryProvider
    + SessionRepositoryProvider
    + PasswordRepositoryProvider
    + TokenRepositoryProvider
    + SecurityLogRepositoryProvider
{
    /// Run migrations for all repositories
    async fn migrate(&self) -> Result<(), Error>;

    /// Health check for all repositories
    async fn health_check(&self) -> Result<(), Error>;
}
