use std::time::Duration;

use kringle_core::assignment::AssignmentError;
use kringle_core::types::DbId;
use kringle_notify::DeliveryError;

use crate::store::StoreError;

/// Errors that abort a draw operation.
#[derive(Debug, thiserror::Error)]
pub enum DrawError {
    #[error("At least 2 participants are required for a draw, found {found}")]
    InsufficientParticipants { found: usize },

    #[error("Event {0} has already been drawn")]
    AlreadyDrawn(DbId),

    #[error("Event {0} not found")]
    EventNotFound(DbId),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl From<AssignmentError> for DrawError {
    fn from(err: AssignmentError) -> Self {
        match err {
            AssignmentError::InsufficientParticipants { found } => {
                Self::InsufficientParticipants { found }
            }
        }
    }
}

/// Why one assignment's notification did not go out.
///
/// Never aborts a batch: the message is stored as the row's `last_error`.
#[derive(Debug, thiserror::Error)]
pub enum NotificationFailure {
    #[error("Notification failed: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Notification timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Missing participant reference: {role} {id}")]
    MissingParticipant { role: &'static str, id: DbId },
}
