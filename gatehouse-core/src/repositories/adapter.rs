use crate::{
    Error, Session, User, UserId,
    audit::SecurityEvent,
    repositories::{
        PasswordRepository, RepositoryProvider, SecureToken, SecurityLogRepository,
        SessionRepository, TokenPurpose, TokenRepository, UserRepository,
    },
    session::SessionToken,
    user::NewUser,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Adapter that wraps a RepositoryProvider and implements individual repository traits
pub struct UserRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> UserRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> UserRepository for UserRepositoryAdapter<R> {
    async fn create(&self, user: NewUser) -> Result<User, Error> {
        self.provider.user().create(user).await
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
        self.provider.user().find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        self.provider.user().find_by_email(email).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        self.provider.user().find_by_username(username).await
    }

    async fn update(&self, user: &User) -> Result<User, Error> {
        self.provider.user().update(user).await
    }

    async fn delete(&self, id: &UserId) -> Result<(), Error> {
        self.provider.user().delete(id).await
    }

    async fn mark_email_verified(&self, user_id: &UserId) -> Result<(), Error> {
        self.provider.user().mark_email_verified(user_id).await
    }

    async fn set_active(&self, user_id: &UserId, is_active: bool) -> Result<(), Error> {
        self.provider.user().set_active(user_id, is_active).await
    }

    async fn record_login_failure(&self, user_id: &UserId) -> Result<u32, Error> {
        self.provider.user().record_login_failure(user_id).await
    }

    async fn lock_until(&self, user_id: &UserId, locked_until: DateTime<Utc>) -> Result<(), Error> {
        self.provider.user().lock_until(user_id, locked_until).await
    }

    async fn reset_lockout(&self, user_id: &UserId) -> Result<(), Error> {
        self.provider.user().reset_lockout(user_id).await
    }

    async fn record_login_success(&self, user_id: &UserId) -> Result<(), Error> {
        self.provider.user().record_login_success(user_id).await
    }
}

pub struct SessionRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> SessionRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> SessionRepository for SessionRepositoryAdapter<R> {
    async fn replace_for_user(&self, session: Session) -> Result<Session, Error> {
        self.provider.session().replace_for_user(session).await
    }

    async fn find_by_token(&self, token: &SessionToken) -> Result<Option<Session>, Error> {
        self.provider.session().find_by_token(token).await
    }

    async fn delete(&self, token: &SessionToken) -> Result<(), Error> {
        self.provider.session().delete(token).await
    }

    async fn delete_by_user_id(&self, user_id: &UserId) -> Result<(), Error> {
        self.provider.session().delete_by_user_id(user_id).await
    }

    async fn cleanup_expired(&self) -> Result<(), Error> {
        self.provider.session().cleanup_expired().await
    }
}

pub struct PasswordRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> PasswordRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> PasswordRepository for PasswordRepositoryAdapter<R> {
    async fn set_password_hash(&self, user_id: &UserId, hash: &str) -> Result<(), Error> {
        self.provider
            .password()
            .set_password_hash(user_id, hash)
            .await
    }

    async fn get_password_hash(&self, user_id: &UserId) -> Result<Option<String>, Error> {
        self.provider.password().get_password_hash(user_id).await
    }

    async fn remove_password_hash(&self, user_id: &UserId) -> Result<(), Error> {
        self.provider.password().remove_password_hash(user_id).await
    }
}

/// Adapter that wraps a RepositoryProvider and implements TokenRepository
pub struct TokenRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> TokenRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> TokenRepository for TokenRepositoryAdapter<R> {
    async fn create_token(
        &self,
        user_id: &UserId,
        purpose: TokenPurpose,
        expires_in: Duration,
    ) -> Result<SecureToken, Error> {
        self.provider
            .token()
            .create_token(user_id, purpose, expires_in)
            .await
    }

    async fn verify_token(
        &self,
        token: &str,
        purpose: TokenPurpose,
    ) -> Result<Option<SecureToken>, Error> {
        self.provider.token().verify_token(token, purpose).await
    }

    async fn check_token(&self, token: &str, purpose: TokenPurpose) -> Result<bool, Error> {
        self.provider.token().check_token(token, purpose).await
    }

    async fn cleanup_expired_tokens(&self) -> Result<(), Error> {
        self.provider.token().cleanup_expired_tokens().await
    }
}

pub struct SecurityLogRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> SecurityLogRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> SecurityLogRepository for SecurityLogRepositoryAdapter<R> {
    async fn append(&self, event: SecurityEvent) -> Result<(), Error> {
        self.provider.security_log().append(event).await
    }
}
