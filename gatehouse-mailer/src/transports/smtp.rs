use crate::{Email, Mailer, MailerError, transports::build_message};
use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

#[derive(Debug, Clone)]
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    pub fn new(transport: AsyncSmtpTransport<Tokio1Executor>) -> Self {
        Self { transport }
    }

    pub fn builder(hostname: &str) -> SmtpTransportBuilder {
        SmtpTransportBuilder::new(hostname)
    }
}

#[async_trait]
impl Mailer for SmtpTransport {
    async fn send_email(&self, email: Email) -> Result<(), MailerError> {
        let message = build_message(email)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum TlsConfig {
    None,
    StartTls,
    Tls,
}

pub struct SmtpTransportBuilder {
    hostname: String,
    port: Option<u16>,
    credentials: Option<Credentials>,
    tls: TlsConfig,
}

impl SmtpTransportBuilder {
    pub fn new(hostname: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
            port: None,
            credentials: None,
            tls: TlsConfig::StartTls,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn credentials(mut self, username: &str, password: &str) -> Self {
        self.credentials = Some(Credentials::new(username.to_string(), password.to_string()));
        self
    }

    pub fn tls(mut self, tls: TlsConfig) -> Self {
        self.tls = tls;
        self
    }

    pub fn build(self) -> Result<SmtpTransport, MailerError> {
        let mut builder = match self.tls {
            TlsConfig::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.hostname)
            }
            TlsConfig::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.hostname)?
            }
            TlsConfig::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&self.hostname)?,
        };

        if let Some(port) = self.port {
            builder = builder.port(port);
        }

        if let Some(credentials) = self.credentials {
            builder = builder.credentials(credentials);
        }

        Ok(SmtpTransport::new(builder.build()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smtp_builder() {
        let transport = SmtpTransport::builder("smtp.example.com")
            .port(587)
            .credentials("user", "password")
            .build();

        assert!(transport.is_ok());
    }
}
