use crate::{Error, UserId};
use async_trait::async_trait;

/// Repository for password hash storage
#[async_trait]
pub trait PasswordRepository: Send + Sync + 'static {
    /// Store or replace the password hash for a user
    async fn set_password_hash(&self, user_id: &UserId, hash: &str) -> Result<(), Error>;

    /// Retrieve the password hash for a user
    async fn get_password_hash(&self, user_id: &UserId) -> Result<Option<String>, Error>;

    /// Remove the password hash for a user
    async fn remove_password_hash(&self, user_id: &UserId) -> Result<(), Error>;
}
