//! Email verification service

use crate::{
    Error, User, UserId,
    repositories::{SecureToken, TokenPurpose, TokenRepository, UserRepository},
};
use chrono::Duration;
use std::sync::Arc;

/// Default expiration time for email verification tokens
const DEFAULT_TOKEN_EXPIRATION: Duration = Duration::hours(24);

/// Service for email verification operations
pub struct EmailVerificationService<U: UserRepository, T: TokenRepository> {
    user_repository: Arc<U>,
    token_repository: Arc<T>,
}

impl<U: UserRepository, T: TokenRepository> EmailVerificationService<U, T> {
    /// Create a new EmailVerificationService with the given repositories
    pub fn new(user_repository: Arc<U>, token_repository: Arc<T>) -> Self {
        Self {
            user_repository,
            token_repository,
        }
    }

    /// Generate an email verification token for a user
    pub async fn generate_token(&self, user_id: &UserId) -> Result<SecureToken, Error> {
        self.generate_token_with_expiration(user_id, DEFAULT_TOKEN_EXPIRATION)
            .await
    }

    /// Generate an email verification token with a custom lifetime
    pub async fn generate_token_with_expiration(
        &self,
        user_id: &UserId,
        expires_in: Duration,
    ) -> Result<SecureToken, Error> {
        self.token_repository
            .create_token(user_id, TokenPurpose::EmailVerification, expires_in)
            .await
    }

    /// Check a verification token without consuming it
    pub async fn check_token(&self, token: &str) -> Result<bool, Error> {
        self.token_repository
            .check_token(token, TokenPurpose::EmailVerification)
            .await
    }

    /// Consume the token and mark the user's email as verified
    pub async fn verify_email(&self, token: &str) -> Result<User, Error> {
        let secure_token = self
            .token_repository
            .verify_token(token, TokenPurpose::EmailVerification)
            .await?
            .ok_or_else(|| {
                Error::Session(crate::error::SessionError::InvalidToken(
                    "Invalid or expired email verification token".to_string(),
                ))
            })?;

        self.user_repository
            .mark_email_verified(&secure_token.user_id)
            .await?;

        self.user_repository
            .find_by_id(&secure_token.user_id)
            .await?
            .ok_or(Error::Storage(crate::error::StorageError::NotFound))
    }

    /// Clean up expired verification tokens
    pub async fn cleanup_expired_tokens(&self) -> Result<(), Error> {
        self.token_repository.cleanup_expired_tokens().await
    }
}
