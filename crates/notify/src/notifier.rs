//! The notification collaborator contract.

use async_trait::async_trait;

use crate::email::EmailError;

/// One message to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Recipient address.
    pub to: String,
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Proof of a successful send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Provider-side message identifier, kept for audit.
    pub external_id: Option<String>,
}

/// Error type for a failed send.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Email(#[from] EmailError),

    /// No transport is configured for this deployment.
    #[error("Email delivery is not configured")]
    NotConfigured,

    /// The provider refused the message.
    #[error("Delivery rejected: {0}")]
    Rejected(String),
}

/// Sends a single message and reports the outcome.
///
/// Implementations must not retry internally for longer than the caller's
/// timeout; the draw orchestrator bounds every call and records the result.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, DeliveryError>;
}

/// Notifier used when no transport is configured.
///
/// Every send fails with [`DeliveryError::NotConfigured`], so each pair
/// records why it was not notified instead of being skipped silently.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredNotifier;

#[async_trait]
impl Notifier for UnconfiguredNotifier {
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, DeliveryError> {
        tracing::warn!(to = %message.to, "Email delivery not configured, notification not sent");
        Err(DeliveryError::NotConfigured)
    }
}
