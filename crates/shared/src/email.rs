//! Email service for sending transactional mail.
//!
//! Uses `lettre` for SMTP transport. The service is optional at the
//! application level: when no mail configuration is present, outbound email
//! is disabled and in-app notification paths proceed unaffected.

use lettre::{
    message::{header::ContentType, Attachment, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

use crate::config::EmailConfig;

/// Email service errors.
#[derive(Debug, Error)]
pub enum EmailError {
    /// Failed to build email message.
    #[error("Failed to build email: {0}")]
    BuildError(String),
    /// Failed to send email.
    #[error("Failed to send email: {0}")]
    SendError(String),
    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
    /// Attachment could not be read.
    #[error("Failed to read attachment: {0}")]
    AttachmentError(String),
}

/// Email service for sending transactional mail.
#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    /// Creates a new email service.
    #[must_use]
    pub const fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Base URL for links embedded in email bodies.
    #[must_use]
    pub fn frontend_url(&self) -> &str {
        &self.config.frontend_url
    }

    /// Creates an SMTP transport.
    fn create_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let creds = Credentials::new(
            self.config.smtp_username.clone(),
            self.config.smtp_password.clone(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| EmailError::SendError(e.to_string()))?
            .port(self.config.smtp_port)
            .credentials(creds)
            .build();
        Ok(transport)
    }

    fn from_mailbox(&self) -> Result<lettre::message::Mailbox, EmailError> {
        format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| EmailError::InvalidAddress(format!("{e}")))
    }

    /// Sends an HTML email.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be built or sent.
    pub async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(self.from_mailbox()?)
            .to(to_email
                .parse()
                .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| EmailError::BuildError(e.to_string()))?;

        let transport = self.create_transport()?;
        transport
            .send(email)
            .await
            .map_err(|e| EmailError::SendError(e.to_string()))?;

        Ok(())
    }

    /// Sends an HTML email with a PDF attachment.
    ///
    /// # Errors
    ///
    /// Returns an error if the attachment cannot be read or the message
    /// cannot be built or sent.
    pub async fn send_email_with_attachment(
        &self,
        to_email: &str,
        subject: &str,
        html_body: &str,
        attachment_path: &std::path::Path,
        attachment_name: &str,
    ) -> Result<(), EmailError> {
        let bytes = tokio::fs::read(attachment_path)
            .await
            .map_err(|e| EmailError::AttachmentError(e.to_string()))?;

        let pdf_type = ContentType::parse("application/pdf")
            .map_err(|e| EmailError::BuildError(e.to_string()))?;

        let email = Message::builder()
            .from(self.from_mailbox()?)
            .to(to_email
                .parse()
                .map_err(|e| EmailError::InvalidAddress(format!("{e}")))?)
            .subject(subject)
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::html(html_body.to_string()))
                    .singlepart(
                        Attachment::new(attachment_name.to_string()).body(bytes, pdf_type),
                    ),
            )
            .map_err(|e| EmailError::BuildError(e.to_string()))?;

        let transport = self.create_transport()?;
        transport
            .send(email)
            .await
            .map_err(|e| EmailError::SendError(e.to_string()))?;

        Ok(())
    }
}

/// Pipe trait for fluent API.
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_mailbox_uses_display_name() {
        let service = EmailService::new(EmailConfig {
            from_email: "noreply@deciframe.app".to_string(),
            from_name: "DeciFrame".to_string(),
            ..EmailConfig::default()
        });
        let mailbox = service.from_mailbox().unwrap();
        assert_eq!(mailbox.email.to_string(), "noreply@deciframe.app");
    }

    #[test]
    fn test_invalid_from_address_is_rejected() {
        let service = EmailService::new(EmailConfig {
            from_email: "not an address".to_string(),
            ..EmailConfig::default()
        });
        assert!(matches!(
            service.from_mailbox(),
            Err(EmailError::InvalidAddress(_))
        ));
    }
}
