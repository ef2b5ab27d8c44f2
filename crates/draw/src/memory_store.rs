//! In-process [`DrawStore`] for tests and database-less local runs.
//!
//! All state sits behind one mutex, which also serves as the per-event draw
//! lock: the existence check and the insert of a draw happen under the same
//! guard.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use kringle_core::assignment::Pair;
use kringle_core::types::DbId;
use kringle_db::models::assignment::{Assignment, NotificationStatus};
use kringle_db::models::event::{CreateEvent, Event};
use kringle_db::models::participant::{CreateParticipant, Participant};

use crate::store::{DrawStore, StoreError};

#[derive(Default)]
struct Inner {
    events: HashMap<DbId, Event>,
    /// Registration order.
    participants: Vec<Participant>,
    /// Insertion order.
    assignments: Vec<Assignment>,
}

#[derive(Default)]
pub struct MemoryDrawStore {
    inner: Mutex<Inner>,
}

impl MemoryDrawStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create an event.
    pub fn insert_event(&self, input: CreateEvent) -> Event {
        let now = Utc::now();
        let event = Event {
            id: DbId::new_v4(),
            name: input.name,
            description: input.description,
            event_date: input.event_date,
            created_at: now,
            updated_at: now,
        };
        self.lock().events.insert(event.id, event.clone());
        event
    }

    /// Register a participant. Emails are unique per event.
    pub fn add_participant(
        &self,
        event_id: DbId,
        input: CreateParticipant,
    ) -> Result<Participant, StoreError> {
        let mut inner = self.lock();
        if !inner.events.contains_key(&event_id) {
            return Err(StoreError::Backend(format!("event {event_id} does not exist")));
        }
        if inner
            .participants
            .iter()
            .any(|p| p.event_id == event_id && p.email == input.email)
        {
            return Err(StoreError::Backend(format!(
                "email {} is already registered for event {event_id}",
                input.email
            )));
        }

        let now = Utc::now();
        let participant = Participant {
            id: DbId::new_v4(),
            event_id,
            name: input.name,
            email: input.email,
            gift_idea: input.gift_idea,
            gift_image: input.gift_image,
            created_at: now,
            updated_at: now,
        };
        inner.participants.push(participant.clone());
        Ok(participant)
    }

    /// Remove a participant without touching assignments that reference it.
    ///
    /// Leaves dangling references behind, which the database forbids; used
    /// to exercise the missing-participant paths.
    pub fn remove_participant(&self, participant_id: DbId) -> bool {
        let mut inner = self.lock();
        let before = inner.participants.len();
        inner.participants.retain(|p| p.id != participant_id);
        inner.participants.len() != before
    }
}

#[async_trait]
impl DrawStore for MemoryDrawStore {
    async fn get_event(&self, event_id: DbId) -> Result<Option<Event>, StoreError> {
        Ok(self.lock().events.get(&event_id).cloned())
    }

    async fn list_participants(&self, event_id: DbId) -> Result<Vec<Participant>, StoreError> {
        Ok(self
            .lock()
            .participants
            .iter()
            .filter(|p| p.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn list_assignments(&self, event_id: DbId) -> Result<Vec<Assignment>, StoreError> {
        Ok(self
            .lock()
            .assignments
            .iter()
            .filter(|a| a.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn insert_assignments(
        &self,
        event_id: DbId,
        pairs: &[Pair<DbId>],
    ) -> Result<Vec<Assignment>, StoreError> {
        let mut inner = self.lock();

        if inner.assignments.iter().any(|a| a.event_id == event_id) {
            return Err(StoreError::AlreadyDrawn);
        }

        let mut givers = HashSet::new();
        let mut receivers = HashSet::new();
        for pair in pairs {
            if pair.giver == pair.receiver {
                return Err(StoreError::Backend(format!(
                    "participant {} cannot give to themselves",
                    pair.giver
                )));
            }
            if !givers.insert(pair.giver) || !receivers.insert(pair.receiver) {
                return Err(StoreError::Backend(
                    "a participant appears twice on the same side of the draw".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let rows: Vec<Assignment> = pairs
            .iter()
            .map(|pair| Assignment {
                id: DbId::new_v4(),
                event_id,
                giver_id: pair.giver,
                receiver_id: pair.receiver,
                sent_at: None,
                last_error: None,
                external_message_id: None,
                created_at: now,
            })
            .collect();

        inner.assignments.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn delete_assignments(&self, event_id: DbId) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        let before = inner.assignments.len();
        inner.assignments.retain(|a| a.event_id != event_id);
        Ok((before - inner.assignments.len()) as u64)
    }

    async fn update_notification_status(
        &self,
        assignment_id: DbId,
        status: &NotificationStatus,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let row = inner
            .assignments
            .iter_mut()
            .find(|a| a.id == assignment_id)
            .ok_or(StoreError::AssignmentNotFound(assignment_id))?;

        match status {
            NotificationStatus::Sent {
                sent_at,
                external_message_id,
            } => {
                row.sent_at = Some(*sent_at);
                row.external_message_id = external_message_id.clone();
                row.last_error = None;
            }
            NotificationStatus::Failed { error } => {
                row.last_error = Some(error.clone());
            }
        }
        Ok(())
    }

    async fn find_receiver_for(
        &self,
        event_id: DbId,
        giver_id: DbId,
    ) -> Result<Option<Participant>, StoreError> {
        let inner = self.lock();
        let receiver_id = inner
            .assignments
            .iter()
            .find(|a| a.event_id == event_id && a.giver_id == giver_id)
            .map(|a| a.receiver_id);

        Ok(receiver_id.and_then(|id| inner.participants.iter().find(|p| p.id == id).cloned()))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
