use std::{
    fmt::{self, Debug},
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use crate::{
    config::EmailConfig,
    emails::{EmailError, NotificationPayload, Notifier},
};

/// Mock transport that captures sent emails for testing.
///
/// Can be switched into a failing mode to exercise best-effort delivery.
#[derive(Clone, Default)]
pub struct MockTransport {
    messages: Arc<Mutex<Vec<NotificationPayload>>>,
    failing: bool,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock transport that rejects every message after recording it
    pub fn failing() -> Self {
        Self {
            messages: Arc::default(),
            failing: true,
        }
    }

    fn store_message(&self, message: NotificationPayload) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }

    /// Get all attempted messages
    pub fn messages(&self) -> Vec<NotificationPayload> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

}

/// Resend transactional email API.
pub struct ResendTransport {
    client: Client,
    endpoint: Url,
    api_key: SecretString,
    sender: Mailbox,
}

#[derive(Serialize)]
struct ResendEmail<'a> {
    from: String,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

impl ResendTransport {
    pub fn new(
        client: Client,
        endpoint: &str,
        api_key: SecretString,
        sender: Mailbox,
    ) -> Result<Self, EmailError> {
        Ok(Self {
            client,
            endpoint: Url::parse(endpoint)?,
            api_key,
            sender,
        })
    }

    async fn send(&self, payload: &NotificationPayload) -> Result<(), EmailError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.expose_secret())
            .json(&ResendEmail {
                from: self.sender.to_string(),
                to: &payload.recipient,
                subject: &payload.subject,
                html: &payload.body,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Rejected { status, body });
        }

        Ok(())
    }
}

/// Mailer dispatching notifications through the configured transport.
///
/// The mock variant captures sent emails in memory, allowing tests to verify
/// that emails were sent without actually sending them.
pub enum Mailer {
    /// Resend HTTP API
    Resend(ResendTransport),
    /// Real SMTP transport
    Smtp {
        transport: AsyncSmtpTransport<Tokio1Executor>,
        sender: Mailbox,
    },
    /// Mock transport that captures emails for testing
    Mock(MockTransport),
    /// No transport configured; sending is a successful no-op
    Disabled,
}

impl Debug for Mailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resend(_) => f.debug_tuple("Mailer::Resend").finish(),
            Self::Smtp { .. } => f.debug_tuple("Mailer::Smtp").finish(),
            Self::Mock(_) => f.debug_tuple("Mailer::Mock").finish(),
            Self::Disabled => f.debug_tuple("Mailer::Disabled").finish(),
        }
    }
}

impl Mailer {
    /// Create a new mock mailer for testing
    pub fn mock() -> Self {
        Self::Mock(MockTransport::new())
    }

    /// Build the mailer described by `config`, sharing `client` for HTTP transports.
    pub fn from_config(config: &EmailConfig, client: Client) -> Result<Self, EmailError> {
        match config {
            EmailConfig::Disabled => Ok(Self::Disabled),
            EmailConfig::Mock => Ok(Self::mock()),
            EmailConfig::Resend {
                api_key,
                sender,
                endpoint,
            } => match api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
                Some(key) => Ok(Self::Resend(ResendTransport::new(
                    client,
                    endpoint,
                    SecretString::from(key.to_string()),
                    sender.clone(),
                )?)),
                None => {
                    info!("Resend API key not configured, email delivery disabled");
                    Ok(Self::Disabled)
                }
            },
            EmailConfig::Smtp {
                host,
                port,
                sender,
                username,
                password,
                use_tls,
            } => {
                let mut builder = if *use_tls {
                    AsyncSmtpTransport::<Tokio1Executor>::relay(host)?.port(*port)
                } else {
                    AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(*port)
                };

                if let (Some(username), Some(password)) = (username, password) {
                    builder =
                        builder.credentials(Credentials::new(username.clone(), password.clone()));
                }

                Ok(Self::Smtp {
                    transport: builder.build(),
                    sender: sender.clone(),
                })
            }
        }
    }

    /// Short transport name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Resend(_) => "resend",
            Self::Smtp { .. } => "smtp",
            Self::Mock(_) => "mock",
            Self::Disabled => "disabled",
        }
    }

    /// Get attempted emails (only available for mock mailer)
    ///
    /// Returns None for every other transport.
    pub fn messages(&self) -> Option<Vec<NotificationPayload>> {
        match self {
            Self::Mock(transport) => Some(transport.messages()),
            _ => None,
        }
    }
}

#[async_trait]
impl Notifier for Mailer {
    async fn send(&self, payload: NotificationPayload) -> Result<(), EmailError> {
        match self {
            Self::Resend(transport) => transport.send(&payload).await,
            Self::Smtp { transport, sender } => {
                let email = Message::builder()
                    .from(sender.clone())
                    .to(payload.recipient.parse()?)
                    .subject(payload.subject)
                    .header(ContentType::TEXT_HTML)
                    .body(payload.body)?;

                transport.send(email).await?;
                Ok(())
            }
            Self::Mock(mock) => {
                let failing = mock.failing;
                mock.store_message(payload);
                if failing {
                    return Err(EmailError::MailerError(
                        "mock transport rejected message".to_string(),
                    ));
                }
                Ok(())
            }
            Self::Disabled => {
                debug!("Email delivery disabled, skipping notification");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};
    use serde_json::json;

    use super::*;

    fn payload() -> NotificationPayload {
        NotificationPayload {
            recipient: "alice@example.com".to_string(),
            subject: "Your Academy Password Reset".to_string(),
            body: "<p>secret</p>".to_string(),
        }
    }

    fn resend_mailer(server: &Server) -> Mailer {
        let config = EmailConfig::Resend {
            api_key: Some("re_test".to_string()),
            sender: "Academy <noreply@example.com>".parse().unwrap(),
            endpoint: format!("{}/emails", server.url()),
        };
        Mailer::from_config(&config, Client::new()).unwrap()
    }

    #[tokio::test]
    async fn test_resend_posts_message() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/emails")
            .match_header("authorization", "Bearer re_test")
            .match_body(Matcher::Json(json!({
                "from": "Academy <noreply@example.com>",
                "to": "alice@example.com",
                "subject": "Your Academy Password Reset",
                "html": "<p>secret</p>"
            })))
            .with_status(200)
            .with_body(json!({ "id": "email-1" }).to_string())
            .expect(1)
            .create_async()
            .await;

        resend_mailer(&server).send(payload()).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_resend_rejection_is_an_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/emails")
            .with_status(403)
            .with_body("domain not verified")
            .create_async()
            .await;

        let error = resend_mailer(&server).send(payload()).await.unwrap_err();

        assert!(matches!(error, EmailError::Rejected { status, .. } if status.as_u16() == 403));
    }

    #[test]
    fn test_resend_without_api_key_is_disabled() {
        let config = EmailConfig::Resend {
            api_key: None,
            sender: "noreply@example.com".parse().unwrap(),
            endpoint: "https://api.resend.com/emails".to_string(),
        };

        let mailer = Mailer::from_config(&config, Client::new()).unwrap();
        assert_eq!(mailer.kind(), "disabled");
    }

    #[tokio::test]
    async fn test_disabled_mailer_is_a_noop() {
        assert!(Mailer::Disabled.send(payload()).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_mailer_captures_messages() {
        let mailer = Mailer::mock();
        mailer.send(payload()).await.unwrap();

        assert_eq!(mailer.messages(), Some(vec![payload()]));
    }

    #[tokio::test]
    async fn test_failing_mock_records_and_fails() {
        let mailer = Mailer::Mock(MockTransport::failing());

        assert!(mailer.send(payload()).await.is_err());
        assert_eq!(mailer.messages().map(|m| m.len()), Some(1));
    }
}
