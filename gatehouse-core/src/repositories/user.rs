use crate::{Error, User, UserId, user::NewUser};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository for user data access
///
/// The lockout mutations (`record_login_failure`, `set_lock`,
/// `record_login_success`) must each be a single atomic statement; the
/// lockout policy depends on the increment-and-return being race-free.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Create a new user
    async fn create(&self, user: NewUser) -> Result<User, Error>;

    /// Find a user by ID
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error>;

    /// Find a user by username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error>;

    /// Update an existing user
    async fn update(&self, user: &User) -> Result<User, Error>;

    /// Delete a user by ID; dependent rows cascade
    async fn delete(&self, id: &UserId) -> Result<(), Error>;

    /// Mark a user's email as verified
    async fn mark_email_verified(&self, user_id: &UserId) -> Result<(), Error>;

    /// Activate or deactivate an account
    async fn set_active(&self, user_id: &UserId, is_active: bool) -> Result<(), Error>;

    /// Atomically increment the failed login counter, returning the new count
    async fn record_login_failure(&self, user_id: &UserId) -> Result<u32, Error>;

    /// Lock the account until the given instant
    async fn lock_until(&self, user_id: &UserId, locked_until: DateTime<Utc>) -> Result<(), Error>;

    /// Clear any lock and zero the failure counter without recording a login
    async fn reset_lockout(&self, user_id: &UserId) -> Result<(), Error>;

    /// Reset the failure counter, clear any lock, and stamp last_login_at
    async fn record_login_success(&self, user_id: &UserId) -> Result<(), Error>;
}
