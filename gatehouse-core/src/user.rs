//! User accounts
//!
//! Users are the core of the authentication system. Beyond identity fields,
//! the user row carries the account-state flags the login flow depends on:
//! `is_active` (honored on every authorized request), `is_admin`, and the
//! lockout pair `failed_login_attempts`/`locked_until`.

use crate::{
    error::ValidationError,
    id::{generate_prefixed_id, validate_prefixed_id},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A unique, stable identifier for a specific user.
///
/// This value should be treated as opaque; it is not a UUID even if it may
/// look like one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: &str) -> Self {
        UserId(id.to_string())
    }

    pub fn new_random() -> Self {
        UserId(generate_prefixed_id("usr"))
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this ID has the correct format for a user ID
    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "usr")
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user account as stored in the credential store.
///
/// The password hash is deliberately absent from this struct; it only moves
/// through [`crate::repositories::PasswordRepository`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// The unique identifier for the user.
    pub id: UserId,

    /// The unique email of the user.
    pub email: String,

    /// The unique username of the user.
    pub username: String,

    /// When the user's email was verified, if ever.
    pub email_verified_at: Option<DateTime<Utc>>,

    /// Deactivated accounts fail authorization even with a valid token.
    pub is_active: bool,

    /// Grants access to admin-only routes.
    pub is_admin: bool,

    /// Consecutive failed password checks since the last success.
    pub failed_login_attempts: u32,

    /// While set and in the future, login attempts are rejected without a
    /// password comparison. Cleared lazily on the next attempt once past.
    pub locked_until: Option<DateTime<Utc>>,

    /// The timestamp of the last successful login.
    pub last_login_at: Option<DateTime<Utc>>,

    /// The created at timestamp.
    pub created_at: DateTime<Utc>,

    /// The updated at timestamp.
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn builder() -> UserBuilder {
        UserBuilder::default()
    }

    /// Check if the user's email has been verified.
    pub fn is_email_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }

    /// Check if a lock is currently in force.
    pub fn is_locked(&self) -> bool {
        self.locked_until.is_some_and(|until| until > Utc::now())
    }
}

#[derive(Default)]
pub struct UserBuilder {
    id: Option<UserId>,
    email: Option<String>,
    username: Option<String>,
    email_verified_at: Option<DateTime<Utc>>,
    is_active: Option<bool>,
    is_admin: Option<bool>,
    failed_login_attempts: Option<u32>,
    locked_until: Option<DateTime<Utc>>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl UserBuilder {
    pub fn id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn email(mut self, email: String) -> Self {
        self.email = Some(email);
        self
    }

    pub fn username(mut self, username: String) -> Self {
        self.username = Some(username);
        self
    }

    pub fn email_verified_at(mut self, email_verified_at: Option<DateTime<Utc>>) -> Self {
        self.email_verified_at = email_verified_at;
        self
    }

    pub fn is_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn is_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = Some(is_admin);
        self
    }

    pub fn failed_login_attempts(mut self, attempts: u32) -> Self {
        self.failed_login_attempts = Some(attempts);
        self
    }

    pub fn locked_until(mut self, locked_until: Option<DateTime<Utc>>) -> Self {
        self.locked_until = locked_until;
        self
    }

    pub fn last_login_at(mut self, last_login_at: Option<DateTime<Utc>>) -> Self {
        self.last_login_at = last_login_at;
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    pub fn build(self) -> Result<User, ValidationError> {
        let now = Utc::now();
        Ok(User {
            id: self.id.unwrap_or_default(),
            email: self
                .email
                .ok_or(ValidationError::MissingField("Email is required".to_string()))?,
            username: self.username.ok_or(ValidationError::MissingField(
                "Username is required".to_string(),
            ))?,
            email_verified_at: self.email_verified_at,
            is_active: self.is_active.unwrap_or(true),
            is_admin: self.is_admin.unwrap_or(false),
            failed_login_attempts: self.failed_login_attempts.unwrap_or(0),
            locked_until: self.locked_until,
            last_login_at: self.last_login_at,
            created_at: self.created_at.unwrap_or(now),
            updated_at: self.updated_at.unwrap_or(now),
        })
    }
}

/// The fields required to create a new user row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub email_verified_at: Option<DateTime<Utc>>,
}

impl NewUser {
    pub fn new(email: String, username: String) -> Self {
        Self {
            id: UserId::new_random(),
            email,
            username,
            email_verified_at: None,
        }
    }

    pub fn with_id(id: UserId, email: String, username: String) -> Self {
        Self {
            id,
            email,
            username,
            email_verified_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_user_id() {
        let user_id = UserId::new("test");
        assert_eq!(user_id.as_str(), "test");

        let user_id_from_str = UserId::from(user_id.as_str());
        assert_eq!(user_id_from_str, user_id);

        let user_id_random = UserId::new_random();
        assert_ne!(user_id_random, user_id);
    }

    #[test]
    fn test_user_id_prefixed() {
        let user_id = UserId::new_random();
        assert!(user_id.as_str().starts_with("usr_"));
        assert!(user_id.is_valid());

        let invalid_id = UserId::new("invalid");
        assert!(!invalid_id.is_valid());
    }

    #[test]
    fn test_user_builder_defaults() {
        let user = User::builder()
            .email("test@example.com".to_string())
            .username("test".to_string())
            .build()
            .unwrap();

        assert!(user.is_active);
        assert!(!user.is_admin);
        assert_eq!(user.failed_login_attempts, 0);
        assert!(user.locked_until.is_none());
        assert!(!user.is_email_verified());
        assert!(!user.is_locked());
    }

    #[test]
    fn test_user_builder_requires_email_and_username() {
        assert!(User::builder().build().is_err());
        assert!(
            User::builder()
                .email("test@example.com".to_string())
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_is_locked_respects_expiry() {
        let locked = User::builder()
            .email("test@example.com".to_string())
            .username("test".to_string())
            .locked_until(Some(Utc::now() + Duration::minutes(5)))
            .build()
            .unwrap();
        assert!(locked.is_locked());

        let expired = User::builder()
            .email("test@example.com".to_string())
            .username("test".to_string())
            .locked_until(Some(Utc::now() - Duration::minutes(5)))
            .build()
            .unwrap();
        assert!(!expired.is_locked());
    }
}
