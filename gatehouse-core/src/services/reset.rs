use crate::{
    Error, User,
    error::AuthError,
    repositories::{PasswordRepository, TokenPurpose, TokenRepository, UserRepository},
    services::{PasswordService, UserService},
};
use chrono::Duration;
use std::sync::Arc;

/// Default expiration time for password reset tokens
const DEFAULT_TOKEN_EXPIRATION: Duration = Duration::minutes(15);

/// Service for password reset operations
pub struct PasswordResetService<U: UserRepository, P: PasswordRepository, T: TokenRepository> {
    user_service: Arc<UserService<U>>,
    password_service: Arc<PasswordService<U, P>>,
    token_repository: Arc<T>,
}

impl<U: UserRepository, P: PasswordRepository, T: TokenRepository> PasswordResetService<U, P, T> {
    /// Create a new PasswordResetService with the given repositories
    pub fn new(
        user_repository: Arc<U>,
        password_repository: Arc<P>,
        token_repository: Arc<T>,
    ) -> Self {
        let user_service = Arc::new(UserService::new(user_repository.clone()));
        let password_service = Arc::new(PasswordService::new(user_repository, password_repository));

        Self {
            user_service,
            password_service,
            token_repository,
        }
    }

    /// Request a password reset for the given email address
    ///
    /// Returns the user and the raw token when the email matches an
    /// account, and `None` otherwise. Callers must respond identically in
    /// both cases so the endpoint never reveals whether an email exists.
    pub async fn request_reset(&self, email: &str) -> Result<Option<(User, String)>, Error> {
        self.request_reset_with_expiration(email, DEFAULT_TOKEN_EXPIRATION)
            .await
    }

    /// Request a password reset with a custom token lifetime
    pub async fn request_reset_with_expiration(
        &self,
        email: &str,
        expires_in: Duration,
    ) -> Result<Option<(User, String)>, Error> {
        let user = self.user_service.get_user_by_email(email).await?;

        if let Some(user) = user {
            let reset_token = self
                .token_repository
                .create_token(&user.id, TokenPurpose::PasswordReset, expires_in)
                .await?;

            Ok(Some((user, reset_token.token)))
        } else {
            Ok(None)
        }
    }

    /// Verify a reset token without consuming it
    ///
    /// Lets a frontend validate the link before showing the new-password
    /// form; the token stays redeemable.
    pub async fn verify_reset_token(&self, token: &str) -> Result<bool, Error> {
        self.token_repository
            .check_token(token, TokenPurpose::PasswordReset)
            .await
    }

    /// Consume a reset token and set the new password
    ///
    /// Returns the user whose password was reset so the caller can revoke
    /// their sessions.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<User, Error> {
        let secure_token = self
            .token_repository
            .verify_token(token, TokenPurpose::PasswordReset)
            .await?
            .ok_or(Error::Auth(AuthError::InvalidCredentials))?;

        let user = self
            .user_service
            .get_user(&secure_token.user_id)
            .await?
            .ok_or(Error::Auth(AuthError::InvalidCredentials))?;

        // Possession of the token stands in for the current password
        self.password_service
            .set_password(&user.id, new_password)
            .await?;

        Ok(user)
    }

    /// Clean up expired reset tokens
    pub async fn cleanup_expired_tokens(&self) -> Result<(), Error> {
        self.token_repository.cleanup_expired_tokens().await
    }
}
