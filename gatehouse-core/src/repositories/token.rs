use crate::{Error, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The purpose a secure token was minted for.
///
/// Tokens are only redeemable for their original purpose, so a password
/// reset token can never be replayed as an email verification token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    PasswordReset,
    EmailVerification,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::PasswordReset => "password_reset",
            TokenPurpose::EmailVerification => "email_verification",
        }
    }
}

impl std::str::FromStr for TokenPurpose {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "password_reset" => Ok(TokenPurpose::PasswordReset),
            "email_verification" => Ok(TokenPurpose::EmailVerification),
            other => Err(Error::Validation(
                crate::error::ValidationError::InvalidField(format!(
                    "unknown token purpose: {other}"
                )),
            )),
        }
    }
}

impl std::fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single-use, time-limited token bound to a user and a purpose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecureToken {
    pub user_id: UserId,
    pub token: String,
    pub purpose: TokenPurpose,
    pub used_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SecureToken {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }
}

/// Repository for secure token data access
#[async_trait]
pub trait TokenRepository: Send + Sync + 'static {
    /// Create a new secure token for a specific purpose
    async fn create_token(
        &self,
        user_id: &UserId,
        purpose: TokenPurpose,
        expires_in: Duration,
    ) -> Result<SecureToken, Error>;

    /// Verify and consume a secure token for a specific purpose
    ///
    /// Consuming marks the token used, so a token redeems at most once.
    async fn verify_token(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<Option<SecureToken>, Error>;

    /// Check if a secure token is valid without consuming it
    ///
    /// Unlike verify_token, this does not mark the token as used.
    async fn check_token(&self, token: &str, purpose: TokenPurpose) -> Result<bool, Error>;

    /// Clean up expired tokens for all purposes
    async fn cleanup_expired_tokens(&self) -> Result<(), Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_purpose_round_trip() {
        for purpose in [TokenPurpose::PasswordReset, TokenPurpose::EmailVerification] {
            let parsed: TokenPurpose = purpose.as_str().parse().unwrap();
            assert_eq!(parsed, purpose);
        }
    }

    #[test]
    fn test_token_purpose_rejects_unknown() {
        assert!("session".parse::<TokenPurpose>().is_err());
    }

    #[test]
    fn test_secure_token_expiry_and_use() {
        let now = Utc::now();
        let mut token = SecureToken {
            user_id: UserId::new_random(),
            token: "tok".to_string(),
            purpose: TokenPurpose::PasswordReset,
            used_at: None,
            expires_at: now + Duration::minutes(15),
            created_at: now,
            updated_at: now,
        };
        assert!(!token.is_expired());
        assert!(!token.is_used());

        token.used_at = Some(now);
        assert!(token.is_used());

        token.expires_at = now - Duration::minutes(1);
        assert!(token.is_expired());
    }
}
