use crate::{Email, Mailer, MailerError, transports::build_message};
use async_trait::async_trait;
use lettre::transport::file::FileTransport as LettreFileTransport;
use lettre::Transport;
use std::path::{Path, PathBuf};

/// Transport that writes each email to an `.eml` file instead of sending
/// it. Default in development.
#[derive(Debug, Clone)]
pub struct FileTransport {
    transport: LettreFileTransport,
    output_dir: PathBuf,
}

impl FileTransport {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Result<Self, MailerError> {
        let output_dir = output_dir.as_ref().to_path_buf();

        if !output_dir.exists() {
            std::fs::create_dir_all(&output_dir)?;
        }

        let transport = LettreFileTransport::new(&output_dir);

        Ok(Self {
            transport,
            output_dir,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[async_trait]
impl Mailer for FileTransport {
    async fn send_email(&self, email: Email) -> Result<(), MailerError> {
        let message = build_message(email)?;

        // lettre's FileTransport is sync
        let transport = self.transport.clone();
        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| MailerError::Builder(format!("Failed to send email: {e}")))??;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_transport_writes_eml() {
        let temp_dir = tempdir().unwrap();
        let transport = FileTransport::new(temp_dir.path()).unwrap();

        let email = Email::builder()
            .from("noreply@example.com")
            .to("user@example.com")
            .subject("Hello")
            .text_body("Hi")
            .build()
            .unwrap();

        transport.send_email(email).await.unwrap();

        let entries = std::fs::read_dir(temp_dir.path()).unwrap();
        assert!(entries.count() > 0);
    }
}
