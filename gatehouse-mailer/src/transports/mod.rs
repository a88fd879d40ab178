mod file;
pub mod smtp;

pub use file::FileTransport;
pub use smtp::{SmtpTransport, TlsConfig};

use crate::{Email, MailerError};
use lettre::Message;
use lettre::message::{MultiPart, SinglePart};

/// Convert an [`Email`] into a lettre [`Message`].
pub(crate) fn build_message(email: Email) -> Result<Message, MailerError> {
    let mut builder = Message::builder()
        .from(email.from.parse()?)
        .to(email.to.parse()?)
        .subject(email.subject);

    if let Some(reply_to) = email.reply_to {
        builder = builder.reply_to(reply_to.parse()?);
    }

    let message = match (email.text_body, email.html_body) {
        (Some(text), Some(html)) => builder.multipart(
            MultiPart::alternative()
                .singlepart(SinglePart::plain(text))
                .singlepart(SinglePart::html(html)),
        )?,
        (Some(text), None) => builder.body(text)?,
        (None, Some(html)) => builder.singlepart(SinglePart::html(html))?,
        (None, None) => return Err(MailerError::Builder("No email body provided".to_string())),
    };

    Ok(message)
}
