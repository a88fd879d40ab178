//! Security audit trail
//!
//! An append-only log written synchronously around every security-relevant
//! action. Rows are never mutated or deleted by this subsystem. Failures to
//! write are swallowed: an audit outage must never break the primary flow
//! it is recording.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{repositories::SecurityLogRepository, user::UserId};

/// The kinds of security events recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityEventKind {
    Login,
    Logout,
    PasswordResetRequest,
    PasswordResetSuccess,
    PasswordChange,
    FailedLogin,
    AccountLocked,
    EmailVerification,
    SessionCreated,
    SessionRevoked,
}

impl SecurityEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Logout => "logout",
            Self::PasswordResetRequest => "password_reset_request",
            Self::PasswordResetSuccess => "password_reset_success",
            Self::PasswordChange => "password_change",
            Self::FailedLogin => "failed_login",
            Self::AccountLocked => "account_locked",
            Self::EmailVerification => "email_verification",
            Self::SessionCreated => "session_created",
            Self::SessionRevoked => "session_revoked",
        }
    }
}

impl std::fmt::Display for SecurityEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One security event, before or after persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub kind: SecurityEventKind,
    pub user_id: Option<UserId>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl SecurityEvent {
    pub fn new(kind: SecurityEventKind, success: bool) -> Self {
        Self {
            kind,
            user_id: None,
            ip_address: None,
            user_agent: None,
            success,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    pub fn user(mut self, user_id: &UserId) -> Self {
        self.user_id = Some(user_id.clone());
        self
    }

    pub fn ip(mut self, ip_address: Option<String>) -> Self {
        self.ip_address = ip_address;
        self
    }

    pub fn agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Writes security events, swallowing storage failures.
pub struct SecurityLogger<R: SecurityLogRepository> {
    repository: Arc<R>,
}

impl<R: SecurityLogRepository> SecurityLogger<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Append an event to the audit trail.
    ///
    /// Errors are logged and dropped; the caller's primary action has
    /// already happened and must not be unwound by an audit failure.
    pub async fn record(&self, event: SecurityEvent) {
        let kind = event.kind;
        if let Err(e) = self.repository.append(event).await {
            tracing::warn!(event = %kind, error = %e, "Failed to write security log entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, error::StorageError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MockSecurityLogRepository {
        events: Mutex<Vec<SecurityEvent>>,
        fail: bool,
    }

    #[async_trait]
    impl SecurityLogRepository for MockSecurityLogRepository {
        async fn append(&self, event: SecurityEvent) -> Result<(), Error> {
            if self.fail {
                return Err(Error::Storage(StorageError::Database("down".to_string())));
            }
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_record_appends_event() {
        let repo = Arc::new(MockSecurityLogRepository {
            events: Mutex::new(Vec::new()),
            fail: false,
        });
        let logger = SecurityLogger::new(repo.clone());

        let user_id = UserId::new_random();
        logger
            .record(
                SecurityEvent::new(SecurityEventKind::Login, true)
                    .user(&user_id)
                    .ip(Some("127.0.0.1".to_string())),
            )
            .await;

        let events = repo.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, SecurityEventKind::Login);
        assert_eq!(events[0].user_id.as_ref(), Some(&user_id));
    }

    #[tokio::test]
    async fn test_record_swallows_failures() {
        let repo = Arc::new(MockSecurityLogRepository {
            events: Mutex::new(Vec::new()),
            fail: true,
        });
        let logger = SecurityLogger::new(repo);

        // Must not panic or propagate
        logger
            .record(SecurityEvent::new(SecurityEventKind::FailedLogin, false))
            .await;
    }

    #[test]
    fn test_event_kind_names() {
        assert_eq!(SecurityEventKind::PasswordResetRequest.as_str(), "password_reset_request");
        assert_eq!(SecurityEventKind::AccountLocked.to_string(), "account_locked");
    }
}
