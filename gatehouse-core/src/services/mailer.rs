use crate::Error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Outbound notifications the authentication flows produce.
///
/// Implementations must not leak failures into the calling flow's response
/// timing in a way that reveals whether an email exists; callers already
/// respond before or regardless of delivery.
#[async_trait]
pub trait AuthMailer: Send + Sync + 'static {
    async fn send_password_reset_email(&self, to: &str, reset_link: &str) -> Result<(), Error>;

    async fn send_verification_email(&self, to: &str, verify_link: &str) -> Result<(), Error>;

    async fn send_password_changed_email(&self, to: &str) -> Result<(), Error>;

    async fn send_lockout_email(&self, to: &str, until: DateTime<Utc>) -> Result<(), Error>;
}

/// Mailer that drops every message, for tests and mail-less deployments.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMailer;

#[async_trait]
impl AuthMailer for NoopMailer {
    async fn send_password_reset_email(&self, to: &str, _reset_link: &str) -> Result<(), Error> {
        tracing::debug!(to, "Dropping password reset email (noop mailer)");
        Ok(())
    }

    async fn send_verification_email(&self, to: &str, _verify_link: &str) -> Result<(), Error> {
        tracing::debug!(to, "Dropping verification email (noop mailer)");
        Ok(())
    }

    async fn send_password_changed_email(&self, to: &str) -> Result<(), Error> {
        tracing::debug!(to, "Dropping password changed email (noop mailer)");
        Ok(())
    }

    async fn send_lockout_email(&self, to: &str, _until: DateTime<Utc>) -> Result<(), Error> {
        tracing::debug!(to, "Dropping lockout email (noop mailer)");
        Ok(())
    }
}

#[cfg(feature = "mailer")]
pub use self::mailer_impl::GatehouseMailerService;

#[cfg(feature = "mailer")]
mod mailer_impl {
    use super::AuthMailer;
    use crate::{Error, error::StorageError};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use gatehouse_mailer::{Email, Mailer, MailerConfig};

    /// Mailer backed by the configured transport (SMTP or file).
    pub struct GatehouseMailerService {
        transport: Box<dyn Mailer>,
        config: MailerConfig,
    }

    impl GatehouseMailerService {
        pub fn new(config: MailerConfig) -> Result<Self, Error> {
            let transport = config
                .build_transport()
                .map_err(|e| Error::Storage(StorageError::Connection(e.to_string())))?;

            Ok(Self { transport, config })
        }

        pub fn from_env() -> Result<Self, Error> {
            let config = MailerConfig::from_env()
                .map_err(|e| Error::Storage(StorageError::Connection(e.to_string())))?;
            Self::new(config)
        }

        async fn send(&self, to: &str, subject: &str, body: String) -> Result<(), Error> {
            let email = Email::builder()
                .from(self.config.from_address())
                .to(to)
                .subject(subject)
                .text_body(body)
                .build()
                .map_err(|e| Error::Storage(StorageError::Connection(e.to_string())))?;

            self.transport
                .send_email(email)
                .await
                .map_err(|e| Error::Storage(StorageError::Connection(e.to_string())))
        }
    }

    #[async_trait]
    impl AuthMailer for GatehouseMailerService {
        async fn send_password_reset_email(
            &self,
            to: &str,
            reset_link: &str,
        ) -> Result<(), Error> {
            let body = format!(
                "A password reset was requested for your {app} account.\n\n\
                 Reset your password: {reset_link}\n\n\
                 The link expires shortly. If you did not request this, you can ignore this email.",
                app = self.config.app_name,
            );
            self.send(to, &format!("Reset your {} password", self.config.app_name), body)
                .await
        }

        async fn send_verification_email(&self, to: &str, verify_link: &str) -> Result<(), Error> {
            let body = format!(
                "Welcome to {app}!\n\nVerify your email address: {verify_link}",
                app = self.config.app_name,
            );
            self.send(to, &format!("Verify your {} email", self.config.app_name), body)
                .await
        }

        async fn send_password_changed_email(&self, to: &str) -> Result<(), Error> {
            let body = format!(
                "Your {app} password was just changed. If this was not you, reset your \
                 password immediately at {url}.",
                app = self.config.app_name,
                url = self.config.app_url,
            );
            self.send(to, &format!("Your {} password was changed", self.config.app_name), body)
                .await
        }

        async fn send_lockout_email(&self, to: &str, until: DateTime<Utc>) -> Result<(), Error> {
            let body = format!(
                "Your {app} account was temporarily locked after repeated failed login \
                 attempts. It will unlock at {until}. If this was not you, consider \
                 resetting your password.",
                app = self.config.app_name,
            );
            self.send(to, &format!("Your {} account is locked", self.config.app_name), body)
                .await
        }
    }
}
