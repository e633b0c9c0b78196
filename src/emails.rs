use std::time::Duration;

use askama::Template;
use async_trait::async_trait;
use thiserror::Error;

use crate::credential::TemporaryCredential;

#[derive(Error, Debug)]
pub enum EmailError {
    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(#[from] lettre::address::AddressError),
    #[error("Failed to build email: {0}")]
    BuilderError(#[from] lettre::error::Error),
    #[error("Failed to send email: {0}")]
    TransportError(#[from] lettre::transport::smtp::Error),
    #[error("Email API request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Email API responded with {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Invalid email API endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("Email delivery timed out after {0:?}")]
    Timeout(Duration),
    #[error("Failed to render email: {0}")]
    TemplateError(#[from] askama::Error),
    #[error("Mailer error: {0}")]
    MailerError(String),
}

/// A single outgoing message.
///
/// `body` is HTML. Built per reset and dropped right after the dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Out-of-band delivery of notification payloads.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, payload: NotificationPayload) -> Result<(), EmailError>;
}

#[derive(Template)]
#[template(path = "password_reset_email.html")]
struct PasswordResetTemplate<'a> {
    product: &'a str,
    secret: &'a str,
}

/// Builds the email carrying a freshly issued temporary password.
pub fn password_reset_email(
    product_name: &str,
    recipient: &str,
    credential: &TemporaryCredential,
) -> Result<NotificationPayload, EmailError> {
    let body = PasswordResetTemplate {
        product: product_name,
        secret: credential.expose(),
    }
    .render()?;

    Ok(NotificationPayload {
        recipient: recipient.to_string(),
        subject: format!("Your {product_name} Password Reset"),
        body,
    })
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn test_password_reset_email_renders_template() {
        let credential = TemporaryCredential::generate_with(&mut StdRng::seed_from_u64(1));
        let payload =
            password_reset_email("CyberSec Academy", "alice@example.com", &credential).unwrap();

        let expected = PasswordResetTemplate {
            product: "CyberSec Academy",
            secret: credential.expose(),
        }
        .render()
        .unwrap();

        assert_eq!(payload.recipient, "alice@example.com");
        assert_eq!(payload.subject, "Your CyberSec Academy Password Reset");
        assert_eq!(payload.body, expected);
        assert!(payload.body.contains("CyberSec Academy Team"));
    }

    #[test]
    fn test_ampersand_in_credential_is_escaped() {
        let body = PasswordResetTemplate {
            product: "Lab",
            secret: "Ab3&cd$%^*!@",
        }
        .render()
        .unwrap();

        assert!(body.contains("Ab3&amp;cd$%^*!@"));
        assert!(!body.contains("Ab3&cd"));
    }

    #[test]
    fn test_product_name_is_escaped_in_body() {
        let credential = TemporaryCredential::generate();
        let payload = password_reset_email("<Lab>", "bob@example.com", &credential).unwrap();

        assert!(payload.body.contains("&lt;Lab&gt;"));
        assert!(!payload.body.contains("<Lab>"));
        assert_eq!(payload.subject, "Your <Lab> Password Reset");
    }
}
