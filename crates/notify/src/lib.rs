//! Outbound notification delivery for draw results.
//!
//! - [`Notifier`]: the collaborator the draw orchestrator sends through.
//! - [`SmtpNotifier`]: SMTP delivery via `lettre`, configured by [`EmailConfig`].
//! - [`UnconfiguredNotifier`]: stand-in that fails every send when no mail
//!   transport is configured.

pub mod email;
pub mod notifier;

pub use email::{EmailConfig, EmailError, SmtpNotifier};
pub use notifier::{DeliveryError, DeliveryReceipt, Notifier, OutboundMessage, UnconfiguredNotifier};
