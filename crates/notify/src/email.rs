//! Email notification delivery via SMTP.
//!
//! [`SmtpNotifier`] wraps the `lettre` async SMTP transport to send the
//! plain-text assignment emails. The transport is built once from an
//! explicit [`EmailConfig`] and reused for every message. If `SMTP_HOST` is
//! not set, [`EmailConfig::from_env`] returns `None` and no mailer should be
//! constructed.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::notifier::{DeliveryError, DeliveryReceipt, Notifier, OutboundMessage};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@kringle.local";

/// Default sender display name when `SMTP_FROM_NAME` is not set.
const DEFAULT_FROM_NAME: &str = "Secret Santa";

/// Default per-connection SMTP timeout in seconds.
const DEFAULT_SMTP_TIMEOUT_SECS: u64 = 30;

/// Configuration for the SMTP email delivery service.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Display name shown next to the "From" address.
    pub from_name: String,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
    /// Timeout applied to SMTP network operations.
    pub timeout: Duration,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that email
    /// delivery is not configured.
    ///
    /// | Variable            | Required | Default                  |
    /// |---------------------|----------|--------------------------|
    /// | `SMTP_HOST`         | yes      | -                        |
    /// | `SMTP_PORT`         | no       | `587`                    |
    /// | `SMTP_FROM`         | no       | `noreply@kringle.local`  |
    /// | `SMTP_FROM_NAME`    | no       | `Secret Santa`           |
    /// | `SMTP_USER`         | no       | -                        |
    /// | `SMTP_PASSWORD`     | no       | -                        |
    /// | `SMTP_TIMEOUT_SECS` | no       | `30`                     |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            from_name: std::env::var("SMTP_FROM_NAME")
                .unwrap_or_else(|_| DEFAULT_FROM_NAME.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            timeout: Duration::from_secs(
                std::env::var("SMTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SMTP_TIMEOUT_SECS),
            ),
        })
    }
}

// ---------------------------------------------------------------------------
// SmtpNotifier
// ---------------------------------------------------------------------------

/// Sends assignment notifications via SMTP.
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    /// Build the SMTP transport from `config`.
    ///
    /// No connection is opened until the first message is sent.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let from_address: Address = config.from_address.parse()?;
        let from = Mailbox::new(Some(config.from_name.clone()), from_address);

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
                .port(config.smtp_port)
                .timeout(Some(config.timeout));

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            mailer: transport_builder.build(),
            from,
        })
    }

    /// Assemble the MIME message and the `Message-ID` it carries.
    fn build_message(&self, message: &OutboundMessage) -> Result<(Message, String), EmailError> {
        let message_id = format!("<{}@{}>", uuid::Uuid::new_v4(), self.from.email.domain());

        let email = Message::builder()
            .message_id(Some(message_id.clone()))
            .from(self.from.clone())
            .to(message.to.parse()?)
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| EmailError::Build(e.to_string()))?;

        Ok((email, message_id))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, DeliveryError> {
        let (email, message_id) = self.build_message(message)?;

        self.mailer.send(email).await.map_err(EmailError::from)?;

        tracing::info!(to = %message.to, message_id = %message_id, "Notification email sent");
        Ok(DeliveryReceipt {
            external_id: Some(message_id),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
