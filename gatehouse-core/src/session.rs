//! Session ledger rows
//!
//! A [`Session`] is the persisted record of one active login. The bearer
//! token itself is a signed JWT (see [`crate::token`]); the ledger row is
//! what makes server-side revocation effective before the token's embedded
//! expiry. A request is authorized only when both agree.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::ValidationError, user::UserId};

/// A signed bearer token string.
///
/// Wraps the compact JWT produced by [`crate::token::TokenCodec`]. Treated
/// as opaque everywhere except the codec.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: &str) -> Self {
        SessionToken(token.to_string())
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One active login for a user.
///
/// The storage layer enforces at most one live row per user: creating a
/// session for a user atomically replaces any prior row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The bearer token this row anchors.
    pub token: SessionToken,

    /// The owning user.
    pub user_id: UserId,

    /// The user agent of the client that created the session.
    pub user_agent: Option<String>,

    /// The IP address of the client that created the session.
    pub ip_address: Option<String>,

    /// When the session was created.
    pub created_at: DateTime<Utc>,

    /// When the session expires. Expired rows are simply treated as
    /// unauthorized on lookup.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

#[derive(Default)]
pub struct SessionBuilder {
    token: Option<SessionToken>,
    user_id: Option<UserId>,
    user_agent: Option<String>,
    ip_address: Option<String>,
    created_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
}

impl SessionBuilder {
    pub fn token(mut self, token: SessionToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn ip_address(mut self, ip_address: Option<String>) -> Self {
        self.ip_address = ip_address;
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn build(self) -> Result<Session, ValidationError> {
        let now = Utc::now();
        Ok(Session {
            token: self.token.ok_or(ValidationError::MissingField(
                "Session token is required".to_string(),
            ))?,
            user_id: self.user_id.ok_or(ValidationError::MissingField(
                "User ID is required".to_string(),
            ))?,
            user_agent: self.user_agent,
            ip_address: self.ip_address,
            created_at: self.created_at.unwrap_or(now),
            expires_at: self.expires_at.unwrap_or(now + Duration::days(7)),
        })
    }
}
