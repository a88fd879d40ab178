use crate::MailerError;
use serde::{Deserialize, Serialize};

/// One outbound email.
///
/// Auth notifications are single-recipient, so there is no cc or bcc.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub text_body: Option<String>,
    pub html_body: Option<String>,
}

impl Email {
    pub fn builder() -> EmailBuilder {
        EmailBuilder::default()
    }

    pub fn validate(&self) -> Result<(), MailerError> {
        if self.from.is_empty() {
            return Err(MailerError::Builder("From address is required".to_string()));
        }

        if self.to.is_empty() {
            return Err(MailerError::Builder("Recipient is required".to_string()));
        }

        if self.subject.is_empty() {
            return Err(MailerError::Builder("Subject is required".to_string()));
        }

        if self.text_body.is_none() && self.html_body.is_none() {
            return Err(MailerError::Builder(
                "Either text or HTML body is required".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct EmailBuilder {
    from: Option<String>,
    to: Option<String>,
    reply_to: Option<String>,
    subject: Option<String>,
    text_body: Option<String>,
    html_body: Option<String>,
}

impl EmailBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from<S: Into<String>>(mut self, email: S) -> Self {
        self.from = Some(email.into());
        self
    }

    pub fn to<S: Into<String>>(mut self, email: S) -> Self {
        self.to = Some(email.into());
        self
    }

    pub fn reply_to<S: Into<String>>(mut self, email: S) -> Self {
        self.reply_to = Some(email.into());
        self
    }

    pub fn subject<S: Into<String>>(mut self, subject: S) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn text_body<S: Into<String>>(mut self, text: S) -> Self {
        self.text_body = Some(text.into());
        self
    }

    pub fn html_body<S: Into<String>>(mut self, html: S) -> Self {
        self.html_body = Some(html.into());
        self
    }

    pub fn build(self) -> Result<Email, MailerError> {
        let email = Email {
            from: self
                .from
                .ok_or_else(|| MailerError::Builder("From address is required".to_string()))?,
            to: self
                .to
                .ok_or_else(|| MailerError::Builder("Recipient is required".to_string()))?,
            reply_to: self.reply_to,
            subject: self
                .subject
                .ok_or_else(|| MailerError::Builder("Subject is required".to_string()))?,
            text_body: self.text_body,
            html_body: self.html_body,
        };

        email.validate()?;
        Ok(email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_builder() {
        let email = Email::builder()
            .from("noreply@example.com")
            .to("user@example.com")
            .subject("Hello")
            .text_body("Hi there")
            .build()
            .unwrap();

        assert_eq!(email.from, "noreply@example.com");
        assert_eq!(email.to, "user@example.com");
        assert_eq!(email.text_body.as_deref(), Some("Hi there"));
    }

    #[test]
    fn test_email_requires_body() {
        let result = Email::builder()
            .from("noreply@example.com")
            .to("user@example.com")
            .subject("Hello")
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_email_requires_recipient() {
        let result = Email::builder()
            .from("noreply@example.com")
            .subject("Hello")
            .text_body("Hi")
            .build();

        assert!(result.is_err());
    }
}
