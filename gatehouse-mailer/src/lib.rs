//! Email delivery for the gatehouse authentication stack.
//!
//! Provides a transport-agnostic [`Mailer`] trait with SMTP and
//! file-based implementations, plus [`MailerConfig`] for environment
//! driven setup. The file transport writes `.eml` files and is the
//! default in development.

pub mod config;
pub mod email;
pub mod error;
pub mod transports;

pub use config::{MailerConfig, TransportConfig};
pub use email::{Email, EmailBuilder};
pub use error::MailerError;
pub use transports::{FileTransport, SmtpTransport, TlsConfig};

use async_trait::async_trait;

/// A transport capable of delivering one email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_email(&self, email: Email) -> Result<(), MailerError>;
}
