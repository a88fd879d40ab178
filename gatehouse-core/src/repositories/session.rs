use crate::{Error, Session, UserId, session::SessionToken};
use async_trait::async_trait;

/// Repository for session ledger access
#[async_trait]
pub trait SessionRepository: Send + Sync + 'static {
    /// Insert a session, atomically replacing any existing row for the
    /// same user.
    ///
    /// Backends enforce at-most-one-session with a unique constraint on
    /// the user id and an upsert; there is no delete-then-insert window.
    async fn replace_for_user(&self, session: Session) -> Result<Session, Error>;

    /// Find a session by token
    async fn find_by_token(&self, token: &SessionToken) -> Result<Option<Session>, Error>;

    /// Delete a session by token
    async fn delete(&self, token: &SessionToken) -> Result<(), Error>;

    /// Delete all sessions for a user
    async fn delete_by_user_id(&self, user_id: &UserId) -> Result<(), Error>;

    /// Clean up expired sessions
    async fn cleanup_expired(&self) -> Result<(), Error>;
}
