//! Runtime configuration
//!
//! The signing secret and the production flag must be supplied at process
//! start; their absence is a fatal startup condition, never a per-request
//! error.

use chrono::Duration;

use crate::{Error, rate_limit::RateQuota, token};

/// Configuration for the authentication stack.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Server-held secret for signing bearer tokens. At least
    /// [`token::MIN_SECRET_LEN`] bytes.
    pub secret: Vec<u8>,

    /// Controls the `Secure` attribute on the auth cookie.
    pub production: bool,

    /// Issuer claim stamped into signed tokens.
    pub issuer: Option<String>,

    /// Bearer token and session lifetime.
    pub session_lifetime: Duration,

    /// Lifetime when the client asked to be remembered.
    pub extended_session_lifetime: Duration,

    /// Consecutive failed password checks before the account locks.
    pub max_failed_attempts: u32,

    /// How long a lockout lasts.
    pub lockout_duration: Duration,

    /// Per-IP quota applied to credential endpoints before any DB work.
    pub login_quota: RateQuota,

    /// Password reset token lifetime.
    pub reset_token_lifetime: Duration,

    /// Email verification token lifetime.
    pub verification_token_lifetime: Duration,
}

impl AuthConfig {
    /// Build a config from an explicit secret, with defaults for the rest.
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, Error> {
        let secret = secret.into();
        if secret.len() < token::MIN_SECRET_LEN {
            return Err(Error::Config(format!(
                "Signing secret must be at least {} bytes",
                token::MIN_SECRET_LEN
            )));
        }

        Ok(Self {
            secret,
            production: false,
            issuer: None,
            session_lifetime: token::STANDARD_LIFETIME,
            extended_session_lifetime: token::EXTENDED_LIFETIME,
            max_failed_attempts: 5,
            lockout_duration: Duration::minutes(30),
            login_quota: RateQuota::new(5, std::time::Duration::from_secs(900)),
            reset_token_lifetime: Duration::minutes(15),
            verification_token_lifetime: Duration::hours(24),
        })
    }

    /// Build a config from the environment.
    ///
    /// `GATEHOUSE_SECRET` is required. `GATEHOUSE_PRODUCTION` (any value of
    /// "1"/"true") enables the production cookie policy.
    pub fn from_env() -> Result<Self, Error> {
        let secret = std::env::var("GATEHOUSE_SECRET")
            .map_err(|_| Error::Config("GATEHOUSE_SECRET is not set".to_string()))?;

        let production = std::env::var("GATEHOUSE_PRODUCTION")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true"))
            .unwrap_or(false);

        let mut config = Self::new(secret.into_bytes())?;
        config.production = production;

        if let Ok(issuer) = std::env::var("GATEHOUSE_ISSUER") {
            config.issuer = Some(issuer);
        }

        Ok(config)
    }

    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_session_lifetimes(mut self, standard: Duration, extended: Duration) -> Self {
        self.session_lifetime = standard;
        self.extended_session_lifetime = extended;
        self
    }

    pub fn with_lockout(mut self, max_failed_attempts: u32, duration: Duration) -> Self {
        self.max_failed_attempts = max_failed_attempts;
        self.lockout_duration = duration;
        self
    }

    pub fn with_login_quota(mut self, quota: RateQuota) -> Self {
        self.login_quota = quota;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "this_is_a_test_secret_key_for_hs256_tokens_not_for_prod";

    #[test]
    fn test_rejects_short_secret() {
        assert!(matches!(AuthConfig::new("short"), Err(Error::Config(_))));
    }

    #[test]
    fn test_defaults() {
        let config = AuthConfig::new(TEST_SECRET).unwrap();

        assert!(!config.production);
        assert_eq!(config.max_failed_attempts, 5);
        assert_eq!(config.lockout_duration, Duration::minutes(30));
        assert_eq!(config.session_lifetime, Duration::days(7));
        assert_eq!(config.extended_session_lifetime, Duration::days(30));
        assert_eq!(config.login_quota.limit, 5);
    }

    #[test]
    fn test_builder_overrides() {
        let config = AuthConfig::new(TEST_SECRET)
            .unwrap()
            .with_production(true)
            .with_issuer("gatehouse-test")
            .with_lockout(3, Duration::minutes(10));

        assert!(config.production);
        assert_eq!(config.issuer.as_deref(), Some("gatehouse-test"));
        assert_eq!(config.max_failed_attempts, 3);
        assert_eq!(config.lockout_duration, Duration::minutes(10));
    }
}
