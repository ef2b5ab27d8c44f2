//! The persistence collaborator of the draw workflow.

use std::collections::HashMap;

use async_trait::async_trait;
use kringle_core::assignment::Pair;
use kringle_core::types::DbId;
use kringle_db::models::assignment::{Assignment, AssignmentDetail, NotificationStatus};
use kringle_db::models::event::Event;
use kringle_db::models::participant::Participant;

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The event already has assignments; nothing was written.
    #[error("Assignments already exist for this event")]
    AlreadyDrawn,

    #[error("Assignment {0} not found")]
    AssignmentNotFound(DbId),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Backend(String),
}

/// Storage for events, participants and assignments.
#[async_trait]
pub trait DrawStore: Send + Sync {
    async fn get_event(&self, event_id: DbId) -> Result<Option<Event>, StoreError>;

    async fn list_participants(&self, event_id: DbId) -> Result<Vec<Participant>, StoreError>;

    async fn list_assignments(&self, event_id: DbId) -> Result<Vec<Assignment>, StoreError>;

    /// Write a whole draw atomically.
    ///
    /// Must re-check for existing assignments under a per-event lock and
    /// return [`StoreError::AlreadyDrawn`] without writing if any exist.
    async fn insert_assignments(
        &self,
        event_id: DbId,
        pairs: &[Pair<DbId>],
    ) -> Result<Vec<Assignment>, StoreError>;

    /// Delete every assignment of an event, returning how many were removed.
    async fn delete_assignments(&self, event_id: DbId) -> Result<u64, StoreError>;

    async fn update_notification_status(
        &self,
        assignment_id: DbId,
        status: &NotificationStatus,
    ) -> Result<(), StoreError>;

    async fn find_receiver_for(
        &self,
        event_id: DbId,
        giver_id: DbId,
    ) -> Result<Option<Participant>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;

    /// Assignments joined with their giver and receiver, ordered by giver name.
    ///
    /// Rows whose giver or receiver no longer exists are left out.
    async fn list_assignment_details(
        &self,
        event_id: DbId,
    ) -> Result<Vec<AssignmentDetail>, StoreError> {
        let participants = self.list_participants(event_id).await?;
        let assignments = self.list_assignments(event_id).await?;
        Ok(join_details(&participants, assignments))
    }
}

pub(crate) fn join_details(
    participants: &[Participant],
    assignments: Vec<Assignment>,
) -> Vec<AssignmentDetail> {
    let by_id: HashMap<DbId, &Participant> = participants.iter().map(|p| (p.id, p)).collect();

    let mut details: Vec<AssignmentDetail> = assignments
        .into_iter()
        .filter_map(|a| {
            let giver = by_id.get(&a.giver_id)?;
            let receiver = by_id.get(&a.receiver_id)?;
            Some(AssignmentDetail {
                id: a.id,
                giver_id: giver.id,
                giver_name: giver.name.clone(),
                giver_email: giver.email.clone(),
                receiver_id: receiver.id,
                receiver_name: receiver.name.clone(),
                receiver_email: receiver.email.clone(),
                receiver_gift_idea: receiver.gift_idea.clone(),
                receiver_gift_image: receiver.gift_image.clone(),
                sent_at: a.sent_at,
                last_error: a.last_error,
                external_message_id: a.external_message_id,
            })
        })
        .collect();

    details.sort_by(|a, b| a.giver_name.cmp(&b.giver_name).then(a.id.cmp(&b.id)));
    details
}
