//! Draw assignment entity model and notification bookkeeping.

use kringle_core::draw_audit::AuditAssignment;
use kringle_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `assignments` table: `giver_id` gives to `receiver_id`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Assignment {
    pub id: DbId,
    pub event_id: DbId,
    pub giver_id: DbId,
    pub receiver_id: DbId,
    /// Set when a notification to the giver succeeded.
    pub sent_at: Option<Timestamp>,
    /// Error of the most recent failed notification attempt.
    pub last_error: Option<String>,
    /// Provider message id of the last successful notification.
    pub external_message_id: Option<String>,
    pub created_at: Timestamp,
}

impl Assignment {
    pub fn as_audit(&self) -> AuditAssignment<'_> {
        AuditAssignment {
            id: self.id,
            giver_id: self.giver_id,
            receiver_id: self.receiver_id,
            sent_at: self.sent_at,
            last_error: self.last_error.as_deref(),
            external_message_id: self.external_message_id.as_deref(),
        }
    }
}

/// Organizer view of an assignment joined with both participants.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AssignmentDetail {
    pub id: DbId,
    pub giver_id: DbId,
    pub giver_name: String,
    pub giver_email: String,
    pub receiver_id: DbId,
    pub receiver_name: String,
    pub receiver_email: String,
    pub receiver_gift_idea: Option<String>,
    pub receiver_gift_image: Option<String>,
    pub sent_at: Option<Timestamp>,
    pub last_error: Option<String>,
    pub external_message_id: Option<String>,
}

/// Outcome of one notification attempt, written back to its assignment row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationStatus {
    /// Sets `sent_at` and the external id, clears `last_error`.
    Sent {
        sent_at: Timestamp,
        external_message_id: Option<String>,
    },
    /// Sets `last_error`; `sent_at` is left as it was.
    Failed { error: String },
}
