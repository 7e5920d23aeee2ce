//! Outbound email
//!
//! [`Mailer`] is the seam the auth use cases send through. Production uses
//! [`ResendMailer`]; development builds without an API key fall back to
//! [`LogMailer`], which only writes the message to the log.

use resend_rs::{Resend, types::CreateEmailBaseOptions};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl MailMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            html: html.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail delivery failed: {0}")]
    Delivery(String),
}

#[trait_variant::make(Mailer: Send)]
pub trait LocalMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}

/// Delivers through the Resend HTTP API
#[derive(Clone)]
pub struct ResendMailer {
    client: Resend,
    from: String,
}

impl ResendMailer {
    /// `from_domain` is the verified sending domain, e.g. `mail.example.com`.
    pub fn new(api_key: &str, sender_name: &str, from_domain: &str) -> Self {
        Self {
            client: Resend::new(api_key),
            from: format!("{} <noreply@{}>", sender_name, from_domain),
        }
    }
}

impl Mailer for ResendMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        let email = CreateEmailBaseOptions::new(self.from.as_str(), [message.to.as_str()], message.subject.as_str())
            .with_html(&message.html);

        self.client
            .emails
            .send(email)
            .await
            .map(|_| ())
            .map_err(|e| MailError::Delivery(e.to_string()))
    }
}

/// Writes messages to the log instead of sending them
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.html,
            "Mail not sent (log mailer)"
        );
        Ok(())
    }
}

/// Runtime choice between the two mailers
#[derive(Clone)]
pub enum AppMailer {
    Resend(ResendMailer),
    Log(LogMailer),
}

impl AppMailer {
    /// Resend when an API key is configured, the log mailer otherwise.
    pub fn from_settings(api_key: Option<&str>, sender_name: &str, from_domain: &str) -> Self {
        match api_key.filter(|k| !k.trim().is_empty()) {
            Some(key) => AppMailer::Resend(ResendMailer::new(key, sender_name, from_domain)),
            None => AppMailer::Log(LogMailer),
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, AppMailer::Resend(_))
    }
}

impl Mailer for AppMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        match self {
            AppMailer::Resend(mailer) => Mailer::send(mailer, message).await,
            AppMailer::Log(mailer) => Mailer::send(mailer, message).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_accepts_message() {
        let mailer = LogMailer;
        let message = MailMessage::new("ada@example.com", "Verify", "<a href=\"#\">link</a>");
        assert!(Mailer::send(&mailer, message).await.is_ok());
    }

    #[test]
    fn test_resend_sender_address() {
        let mailer = ResendMailer::new("re_test", "Learning Hub", "mail.example.com");
        assert_eq!(mailer.from, "Learning Hub <noreply@mail.example.com>");
    }

    #[test]
    fn test_app_mailer_selection() {
        assert!(!AppMailer::from_settings(None, "Learning Hub", "example.com").is_live());
        assert!(!AppMailer::from_settings(Some("  "), "Learning Hub", "example.com").is_live());
        assert!(AppMailer::from_settings(Some("re_key"), "Learning Hub", "example.com").is_live());
    }
}
