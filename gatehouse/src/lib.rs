//! # Gatehouse
//!
//! Gatehouse is an authentication and session-integrity stack for Rust
//! applications. It owns the full credential lifecycle — registration,
//! login with lockout and rate limiting, single-session enforcement,
//! password reset and email verification — on top of storage you control.
//!
//! A request is authorized only when both the signed bearer token verifies
//! and a matching live session row exists. The session ledger keeps at most
//! one row per user, replaced atomically on every login, so deleting that
//! row revokes access immediately even though the token itself would remain
//! cryptographically valid until its embedded expiry.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gatehouse::{AuthConfig, Gatehouse, SqliteRepositoryProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repositories = Arc::new(SqliteRepositoryProvider::connect("sqlite::memory:").await?);
//!     let config = AuthConfig::new("a_signing_secret_of_at_least_32_bytes!")?;
//!
//!     let gatehouse = Gatehouse::new(repositories, config)?;
//!     gatehouse.migrate().await?;
//!
//!     let (user, session) = gatehouse
//!         .register("alice@example.com", "alice", "correct-horse-battery", None, None)
//!         .await?;
//!     println!("registered {} with session until {}", user.email, session.expires_at);
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use gatehouse_core::{
    RateLimiter, SecurityEvent, SecurityEventKind, TokenCodec,
    audit::SecurityLogger,
    error::AuthError,
    rate_limit::RateKey,
    repositories::{
        PasswordRepositoryAdapter, RepositoryProvider, SecurityLogRepositoryAdapter,
        SessionRepositoryAdapter, TokenRepositoryAdapter, UserRepository, UserRepositoryAdapter,
    },
    services::{
        AuthMailer, EmailVerificationService, LockoutGate, LockoutService, NoopMailer,
        PasswordResetService, PasswordService, SessionService, UserService,
    },
};

/// Re-export core types commonly used alongside the facade.
pub use gatehouse_core::{
    AuthConfig, Error, RateLimitDecision, RateQuota, Session, SessionToken, TokenClaims, User,
    UserId,
};

#[cfg(feature = "sqlite")]
pub use gatehouse_storage_sqlite::SqliteRepositoryProvider;

/// The outcome of authorizing a bearer token.
///
/// Only [`AuthDecision::Authenticated`] grants access. The other variants
/// carry the internal reason so callers can log it, but an HTTP layer must
/// collapse all of them into one generic unauthorized response; the
/// distinctions must never reach the client.
#[derive(Debug, Clone)]
pub enum AuthDecision {
    /// Token verified, session live, account active.
    Authenticated(User),
    /// Missing, malformed, expired, or unsigned token, or no such user.
    Unauthenticated,
    /// The token verifies but its session row is gone or expired.
    SessionRevoked,
    /// Everything checks out except the account is deactivated.
    AccountDeactivated,
}

/// The central authentication coordinator.
///
/// `Gatehouse` wires the repository provider into the individual services
/// and exposes the operations an HTTP layer orchestrates: register, login,
/// logout, authorize, password change/reset, and email verification. All
/// policy (lockout threshold, rate quota, token lifetimes) comes from the
/// [`AuthConfig`] it was built with.
pub struct Gatehouse<R: RepositoryProvider> {
    repositories: Arc<R>,
    config: AuthConfig,
    codec: TokenCodec,
    rate_limiter: Arc<RateLimiter>,
    base_url: String,

    user_repository: Arc<UserRepositoryAdapter<R>>,
    user_service: Arc<UserService<UserRepositoryAdapter<R>>>,
    session_service: Arc<SessionService<SessionRepositoryAdapter<R>>>,
    password_service: Arc<PasswordService<UserRepositoryAdapter<R>, PasswordRepositoryAdapter<R>>>,
    lockout_service: Arc<LockoutService<UserRepositoryAdapter<R>>>,
    reset_service: Arc<
        PasswordResetService<
            UserRepositoryAdapter<R>,
            PasswordRepositoryAdapter<R>,
            TokenRepositoryAdapter<R>,
        >,
    >,
    verification_service:
        Arc<EmailVerificationService<UserRepositoryAdapter<R>, TokenRepositoryAdapter<R>>>,
    security_logger: Arc<SecurityLogger<SecurityLogRepositoryAdapter<R>>>,
    mailer: Arc<dyn AuthMailer>,
}

impl<R: RepositoryProvider> Gatehouse<R> {
    /// Create a new Gatehouse instance from a repository provider and config.
    ///
    /// Fails only on an invalid config (a signing secret shorter than the
    /// minimum); treat that as a fatal startup condition.
    pub fn new(repositories: Arc<R>, config: AuthConfig) -> Result<Self, Error> {
        let mut codec = TokenCodec::new(&config.secret)?
            .with_lifetimes(config.session_lifetime, config.extended_session_lifetime);
        if let Some(issuer) = &config.issuer {
            codec = codec.with_issuer(issuer.clone());
        }

        let user_repo = Arc::new(UserRepositoryAdapter::new(repositories.clone()));
        let session_repo = Arc::new(SessionRepositoryAdapter::new(repositories.clone()));
        let password_repo = Arc::new(PasswordRepositoryAdapter::new(repositories.clone()));
        let token_repo = Arc::new(TokenRepositoryAdapter::new(repositories.clone()));
        let security_log_repo = Arc::new(SecurityLogRepositoryAdapter::new(repositories.clone()));

        let user_service = Arc::new(UserService::new(user_repo.clone()));
        let session_service = Arc::new(SessionService::new(session_repo));
        let password_service = Arc::new(PasswordService::new(
            user_repo.clone(),
            password_repo.clone(),
        ));
        let lockout_service = Arc::new(LockoutService::new(
            user_repo.clone(),
            config.max_failed_attempts,
            config.lockout_duration,
        ));
        let reset_service = Arc::new(PasswordResetService::new(
            user_repo.clone(),
            password_repo,
            token_repo.clone(),
        ));
        let verification_service = Arc::new(EmailVerificationService::new(
            user_repo.clone(),
            token_repo,
        ));
        let security_logger = Arc::new(SecurityLogger::new(security_log_repo));

        Ok(Self {
            repositories,
            config,
            codec,
            rate_limiter: Arc::new(RateLimiter::new()),
            base_url: "http://localhost:3000".to_string(),

            user_repository: user_repo,
            user_service,
            session_service,
            password_service,
            lockout_service,
            reset_service,
            verification_service,
            security_logger,
            mailer: Arc::new(NoopMailer),
        })
    }

    /// Set the mailer used for verification, reset, and alert emails.
    ///
    /// Defaults to [`NoopMailer`], which logs and discards.
    pub fn with_mailer(mut self, mailer: Arc<dyn AuthMailer>) -> Self {
        self.mailer = mailer;
        self
    }

    /// Set the public base URL embedded in emailed links.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// The shared rate limiter, for wiring its cleanup task into shutdown.
    pub fn rate_limiter(&self) -> Arc<RateLimiter> {
        self.rate_limiter.clone()
    }

    /// Run migrations for all repositories.
    pub async fn migrate(&self) -> Result<(), Error> {
        self.repositories.migrate().await
    }

    /// Health check for all repositories.
    pub async fn health_check(&self) -> Result<(), Error> {
        self.repositories.health_check().await
    }

    /// Get a user by their ID.
    pub async fn get_user(&self, user_id: &UserId) -> Result<Option<User>, Error> {
        self.user_service.get_user(user_id).await
    }

    /// Look up a live session by its token.
    pub async fn get_session(&self, token: &SessionToken) -> Result<Option<Session>, Error> {
        self.session_service.get_live(token).await
    }

    /// Delete expired session and token rows.
    ///
    /// Expiry is already enforced on every lookup; this sweep only bounds
    /// table growth and can run on any schedule.
    pub async fn cleanup_expired(&self) -> Result<(), Error> {
        self.session_service.cleanup_expired().await?;
        self.reset_service.cleanup_expired_tokens().await
    }

    /// Register a user with an email, username, and password.
    ///
    /// When the email is already registered, the existing user is returned
    /// unchanged and the supplied password is ignored; the response shape is
    /// identical either way so the endpoint cannot be used to probe for
    /// accounts. A verification email goes out best-effort, and the new
    /// client is logged in immediately.
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
        user_agent: Option<String>,
        ip_address: Option<String>,
    ) -> Result<(User, Session), Error> {
        let user = self
            .password_service
            .register_user(email, username, password)
            .await?;

        if !user.is_email_verified() {
            self.send_verification_email(&user).await;
        }

        let (token, expires_at) = self.codec.sign(&user.id, false)?;
        let session = self
            .session_service
            .rotate(
                &user.id,
                token,
                expires_at,
                user_agent.clone(),
                ip_address.clone(),
            )
            .await?;

        self.security_logger
            .record(
                SecurityEvent::new(SecurityEventKind::SessionCreated, true)
                    .user(&user.id)
                    .ip(ip_address)
                    .agent(user_agent)
                    .metadata(serde_json::json!({"flow": "register"})),
            )
            .await;

        Ok((user, session))
    }

    /// Log a user in with email and password.
    ///
    /// Order matters here: the rate limiter runs before any database work,
    /// the lockout gate runs before any password hashing, and unknown email
    /// and wrong password produce the same error. On success the previous
    /// session (if any) is atomically replaced, so the user holds exactly
    /// one live session.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
        user_agent: Option<String>,
        ip_address: Option<String>,
    ) -> Result<(User, Session), Error> {
        let client = ip_address.as_deref().unwrap_or("unknown");
        let decision = self
            .rate_limiter
            .check(RateKey::new("login", client), self.config.login_quota);
        if !decision.allowed {
            return Err(Error::RateLimited {
                retry_after: decision.retry_after.unwrap_or_default(),
            });
        }

        let Some(user) = self.user_service.get_user_by_email(email).await? else {
            self.record_failed_login(None, &user_agent, &ip_address, "unknown_email")
                .await;
            return Err(Error::Auth(AuthError::InvalidCredentials));
        };

        // Lazily clears an expired lock; no hashing happens while locked
        if let LockoutGate::Locked { until } = self.lockout_service.gate(&user).await? {
            self.record_failed_login(Some(&user.id), &user_agent, &ip_address, "locked")
                .await;
            return Err(Error::Auth(AuthError::AccountLocked { until }));
        }

        if !self
            .password_service
            .verify_for_user(&user.id, password)
            .await?
        {
            let locked_until = self.lockout_service.record_failure(&user.id).await?;
            self.record_failed_login(Some(&user.id), &user_agent, &ip_address, "wrong_password")
                .await;

            if let Some(until) = locked_until {
                self.security_logger
                    .record(
                        SecurityEvent::new(SecurityEventKind::AccountLocked, false)
                            .user(&user.id)
                            .ip(ip_address.clone())
                            .agent(user_agent.clone())
                            .metadata(serde_json::json!({"locked_until": until.to_rfc3339()})),
                    )
                    .await;
                if let Err(e) = self.mailer.send_lockout_email(&user.email, until).await {
                    tracing::warn!(user_id = %user.id, error = %e, "Failed to send lockout email");
                }

                // The attempt that trips the threshold reports the lockout,
                // not a generic credentials failure
                return Err(Error::Auth(AuthError::AccountLocked { until }));
            }

            return Err(Error::Auth(AuthError::InvalidCredentials));
        }

        if !user.is_active {
            self.record_failed_login(Some(&user.id), &user_agent, &ip_address, "deactivated")
                .await;
            return Err(Error::Auth(AuthError::AccountDeactivated));
        }

        self.lockout_service.record_success(&user.id).await?;

        let (token, expires_at) = self.codec.sign(&user.id, remember_me)?;
        let session = self
            .session_service
            .rotate(
                &user.id,
                token,
                expires_at,
                user_agent.clone(),
                ip_address.clone(),
            )
            .await?;

        self.security_logger
            .record(
                SecurityEvent::new(SecurityEventKind::Login, true)
                    .user(&user.id)
                    .ip(ip_address.clone())
                    .agent(user_agent.clone()),
            )
            .await;
        self.security_logger
            .record(
                SecurityEvent::new(SecurityEventKind::SessionCreated, true)
                    .user(&user.id)
                    .ip(ip_address)
                    .agent(user_agent),
            )
            .await;

        Ok((user, session))
    }

    /// Revoke the session behind a token.
    ///
    /// Succeeds whether or not the token maps to a live session; logout is
    /// idempotent.
    pub async fn logout(
        &self,
        token: &SessionToken,
        user_agent: Option<String>,
        ip_address: Option<String>,
    ) -> Result<(), Error> {
        let session = self.session_service.get_live(token).await?;
        self.session_service.revoke(token).await?;

        if let Some(session) = session {
            self.security_logger
                .record(
                    SecurityEvent::new(SecurityEventKind::Logout, true)
                        .user(&session.user_id)
                        .ip(ip_address)
                        .agent(user_agent),
                )
                .await;
        }

        Ok(())
    }

    /// Authorize a bearer token.
    ///
    /// Access requires all of: a cryptographically valid unexpired token, a
    /// live session row for that exact token, an existing user, and an
    /// active account. The session ledger is consulted on every call, never
    /// cached, which is what makes server-side revocation immediate.
    pub async fn authorize(&self, token: &SessionToken) -> Result<AuthDecision, Error> {
        let claims = match self.codec.verify(token) {
            Ok(claims) => claims,
            Err(Error::Session(_)) => return Ok(AuthDecision::Unauthenticated),
            Err(e) => return Err(e),
        };

        if self.session_service.get_live(token).await?.is_none() {
            return Ok(AuthDecision::SessionRevoked);
        }

        // Fresh reload; nothing in the signed claims is trusted for
        // authorization beyond the user id itself
        let Some(user) = self.user_service.get_user(&claims.user_id()).await? else {
            return Ok(AuthDecision::Unauthenticated);
        };

        if !user.is_active {
            return Ok(AuthDecision::AccountDeactivated);
        }

        Ok(AuthDecision::Authenticated(user))
    }

    /// Change a user's password after verifying the current one.
    ///
    /// Every existing session dies and a fresh one is rotated in for the
    /// calling client, so stolen tokens stop working the moment the owner
    /// changes their password. The notification email is best-effort; a
    /// send failure never rolls back the change.
    pub async fn change_password(
        &self,
        user_id: &UserId,
        current_password: &str,
        new_password: &str,
        user_agent: Option<String>,
        ip_address: Option<String>,
    ) -> Result<Session, Error> {
        self.password_service
            .change_password(user_id, current_password, new_password)
            .await?;

        self.session_service.revoke_all(user_id).await?;
        let (token, expires_at) = self.codec.sign(user_id, false)?;
        let session = self
            .session_service
            .rotate(
                user_id,
                token,
                expires_at,
                user_agent.clone(),
                ip_address.clone(),
            )
            .await?;

        self.security_logger
            .record(
                SecurityEvent::new(SecurityEventKind::PasswordChange, true)
                    .user(user_id)
                    .ip(ip_address)
                    .agent(user_agent),
            )
            .await;

        if let Some(user) = self.user_service.get_user(user_id).await? {
            if let Err(e) = self.mailer.send_password_changed_email(&user.email).await {
                tracing::warn!(user_id = %user_id, error = %e, "Failed to send password change notice");
            }
        }

        Ok(session)
    }

    /// Request a password reset for an email address.
    ///
    /// Always returns `Ok(())` for a well-formed request, whether or not
    /// the email matches an account; the token only goes out by email.
    pub async fn request_password_reset(
        &self,
        email: &str,
        ip_address: Option<String>,
    ) -> Result<(), Error> {
        let client = ip_address.as_deref().unwrap_or("unknown");
        let decision = self.rate_limiter.check(
            RateKey::new("password_reset", client),
            self.config.login_quota,
        );
        if !decision.allowed {
            return Err(Error::RateLimited {
                retry_after: decision.retry_after.unwrap_or_default(),
            });
        }

        let outcome = self
            .reset_service
            .request_reset_with_expiration(email, self.config.reset_token_lifetime)
            .await?;

        if let Some((user, raw_token)) = outcome {
            self.security_logger
                .record(
                    SecurityEvent::new(SecurityEventKind::PasswordResetRequest, true)
                        .user(&user.id)
                        .ip(ip_address),
                )
                .await;

            let link = format!("{}/reset-password?token={}", self.base_url, raw_token);
            if let Err(e) = self.mailer.send_password_reset_email(&user.email, &link).await {
                tracing::warn!(user_id = %user.id, error = %e, "Failed to send reset email");
            }
        }

        Ok(())
    }

    /// Check a reset token without consuming it.
    pub async fn verify_reset_token(&self, token: &str) -> Result<bool, Error> {
        self.reset_service.verify_reset_token(token).await
    }

    /// Complete a password reset.
    ///
    /// Consumes the token, sets the new password, clears any lockout, and
    /// revokes every session. Possession of the emailed token proves
    /// account control, so a fresh session is rotated in for the resetting
    /// client rather than bouncing them through the login form.
    pub async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &str,
        user_agent: Option<String>,
        ip_address: Option<String>,
    ) -> Result<(User, Session), Error> {
        let user = self.reset_service.reset_password(token, new_password).await?;

        self.user_repository.reset_lockout(&user.id).await?;
        self.session_service.revoke_all(&user.id).await?;
        let (signed, expires_at) = self.codec.sign(&user.id, false)?;
        let session = self
            .session_service
            .rotate(
                &user.id,
                signed,
                expires_at,
                user_agent.clone(),
                ip_address.clone(),
            )
            .await?;

        self.security_logger
            .record(
                SecurityEvent::new(SecurityEventKind::PasswordResetSuccess, true)
                    .user(&user.id)
                    .ip(ip_address)
                    .agent(user_agent),
            )
            .await;

        if let Err(e) = self.mailer.send_password_changed_email(&user.email).await {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to send password change notice");
        }

        Ok((user, session))
    }

    /// Issue a fresh email verification token and send it.
    pub async fn request_email_verification(&self, user_id: &UserId) -> Result<(), Error> {
        let user = self
            .user_service
            .get_user(user_id)
            .await?
            .ok_or(Error::Auth(AuthError::UserNotFound))?;

        if user.is_email_verified() {
            return Ok(());
        }

        self.send_verification_email(&user).await;
        Ok(())
    }

    /// Complete email verification.
    ///
    /// Consumes the token, marks the email verified, and rotates the
    /// user's session so older tokens stop working.
    pub async fn confirm_email_verification(
        &self,
        token: &str,
        user_agent: Option<String>,
        ip_address: Option<String>,
    ) -> Result<(User, Session), Error> {
        let user = self.verification_service.verify_email(token).await?;

        self.session_service.revoke_all(&user.id).await?;
        let (signed, expires_at) = self.codec.sign(&user.id, false)?;
        let session = self
            .session_service
            .rotate(
                &user.id,
                signed,
                expires_at,
                user_agent.clone(),
                ip_address.clone(),
            )
            .await?;

        self.security_logger
            .record(
                SecurityEvent::new(SecurityEventKind::EmailVerification, true)
                    .user(&user.id)
                    .ip(ip_address)
                    .agent(user_agent),
            )
            .await;

        Ok((user, session))
    }

    /// Delete a user. Sessions and tokens cascade with the row.
    pub async fn delete_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.user_service.delete_user(user_id).await?;

        self.security_logger
            .record(
                SecurityEvent::new(SecurityEventKind::SessionRevoked, true)
                    .user(user_id)
                    .metadata(serde_json::json!({"reason": "account_deleted"})),
            )
            .await;

        Ok(())
    }

    async fn send_verification_email(&self, user: &User) {
        match self.verification_service
            .generate_token_with_expiration(&user.id, self.config.verification_token_lifetime)
            .await
        {
            Ok(token) => {
                let link = format!("{}/verify-email?token={}", self.base_url, token.token);
                if let Err(e) = self.mailer.send_verification_email(&user.email, &link).await {
                    tracing::warn!(user_id = %user.id, error = %e, "Failed to send verification email");
                }
            }
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "Failed to issue verification token");
            }
        }
    }

    async fn record_failed_login(
        &self,
        user_id: Option<&UserId>,
        user_agent: &Option<String>,
        ip_address: &Option<String>,
        reason: &str,
    ) {
        let mut event = SecurityEvent::new(SecurityEventKind::FailedLogin, false)
            .ip(ip_address.clone())
            .agent(user_agent.clone())
            .metadata(serde_json::json!({"reason": reason}));
        if let Some(user_id) = user_id {
            event = event.user(user_id);
        }
        self.security_logger.record(event).await
    }
}
