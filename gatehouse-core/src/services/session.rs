use crate::{
    Error, Session, UserId,
    repositories::SessionRepository,
    session::SessionToken,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Service for session ledger operations
///
/// The ledger holds at most one row per user. Creating a session rotates
/// the user's login: the backend upsert replaces any prior row, so the
/// previous token stops authorizing the moment the new one exists.
pub struct SessionService<R: SessionRepository> {
    repository: Arc<R>,
}

impl<R: SessionRepository> SessionService<R> {
    /// Create a new SessionService with the given repository
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Rotate the user's session to a freshly signed token
    pub async fn rotate(
        &self,
        user_id: &UserId,
        token: SessionToken,
        expires_at: DateTime<Utc>,
        user_agent: Option<String>,
        ip_address: Option<String>,
    ) -> Result<Session, Error> {
        let session = Session::builder()
            .token(token)
            .user_id(user_id.clone())
            .user_agent(user_agent)
            .ip_address(ip_address)
            .expires_at(expires_at)
            .build()
            .map_err(Error::Validation)?;

        self.repository.replace_for_user(session).await
    }

    /// Look up a live session by token
    ///
    /// Expired rows are reported as absent; deleting them is left to
    /// [`Self::cleanup_expired`].
    pub async fn get_live(&self, token: &SessionToken) -> Result<Option<Session>, Error> {
        let session = self.repository.find_by_token(token).await?;

        if let Some(ref s) = session
            && s.is_expired()
        {
            return Ok(None);
        }

        Ok(session)
    }

    /// Revoke a session by token
    pub async fn revoke(&self, token: &SessionToken) -> Result<(), Error> {
        self.repository.delete(token).await
    }

    /// Revoke all sessions for a user
    pub async fn revoke_all(&self, user_id: &UserId) -> Result<(), Error> {
        self.repository.delete_by_user_id(user_id).await
    }

    /// Clean up expired sessions
    pub async fn cleanup_expired(&self) -> Result<(), Error> {
        self.repository.cleanup_expired().await
    }
}
