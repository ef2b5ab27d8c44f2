#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use kringle_core::assignment::Pair;
use kringle_core::types::DbId;
use kringle_db::models::assignment::{Assignment, NotificationStatus};
use kringle_db::models::event::{CreateEvent, Event};
use kringle_db::models::participant::{CreateParticipant, Participant};
use kringle_draw::{DrawConfig, DrawOrchestrator, DrawStore, MemoryDrawStore, StoreError};
use kringle_notify::{DeliveryError, DeliveryReceipt, Notifier, OutboundMessage};
use tokio::sync::Semaphore;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Config with a short send timeout so timeout tests stay fast.
pub fn test_config() -> DrawConfig {
    DrawConfig {
        notify_timeout: Duration::from_millis(200),
        notify_concurrency: 4,
        public_base_url: "https://santa.example.com".to_string(),
    }
}

/// Create an event with `n` participants named `person-0..n`.
pub fn seed_event(store: &MemoryDrawStore, n: usize) -> (Event, Vec<Participant>) {
    let event = store.insert_event(CreateEvent {
        name: "Office party".to_string(),
        description: None,
        event_date: Utc::now(),
    });

    let people = (0..n)
        .map(|i| {
            store
                .add_participant(
                    event.id,
                    CreateParticipant {
                        name: format!("person-{i}"),
                        email: email(i),
                        gift_idea: Some(format!("idea {i}")),
                        gift_image: None,
                    },
                )
                .unwrap()
        })
        .collect();

    (event, people)
}

pub fn email(i: usize) -> String {
    format!("person-{i}@example.com")
}

pub fn orchestrator(
    store: Arc<dyn DrawStore>,
    notifier: Arc<dyn Notifier>,
) -> DrawOrchestrator {
    DrawOrchestrator::new(store, notifier, test_config())
}

// ---------------------------------------------------------------------------
// Notifiers
// ---------------------------------------------------------------------------

/// Records every message and fails for a chosen set of recipients.
#[derive(Default)]
pub struct ScriptedNotifier {
    failing: HashSet<String>,
    sent: Mutex<Vec<OutboundMessage>>,
}

impl ScriptedNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(addresses: &[String]) -> Self {
        Self {
            failing: addresses.iter().cloned().collect(),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for ScriptedNotifier {
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, DeliveryError> {
        self.sent.lock().unwrap().push(message.clone());
        if self.failing.contains(&message.to) {
            return Err(DeliveryError::Rejected("mailbox unavailable".to_string()));
        }
        Ok(DeliveryReceipt {
            external_id: Some(format!("<{}@test>", message.to)),
        })
    }
}

/// Succeeds for everyone, but takes `delay` for the chosen recipients.
pub struct SlowNotifier {
    pub slow: HashSet<String>,
    pub delay: Duration,
}

#[async_trait]
impl Notifier for SlowNotifier {
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, DeliveryError> {
        if self.slow.contains(&message.to) {
            tokio::time::sleep(self.delay).await;
        }
        Ok(DeliveryReceipt { external_id: None })
    }
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Delegates to a [`MemoryDrawStore`] but fails every draw insert.
pub struct FailingInsertStore {
    pub inner: Arc<MemoryDrawStore>,
}

#[async_trait]
impl DrawStore for FailingInsertStore {
    async fn get_event(&self, event_id: DbId) -> Result<Option<Event>, StoreError> {
        self.inner.get_event(event_id).await
    }

    async fn list_participants(&self, event_id: DbId) -> Result<Vec<Participant>, StoreError> {
        self.inner.list_participants(event_id).await
    }

    async fn list_assignments(&self, event_id: DbId) -> Result<Vec<Assignment>, StoreError> {
        self.inner.list_assignments(event_id).await
    }

    async fn insert_assignments(
        &self,
        _event_id: DbId,
        _pairs: &[Pair<DbId>],
    ) -> Result<Vec<Assignment>, StoreError> {
        Err(StoreError::Backend("connection reset".to_string()))
    }

    async fn delete_assignments(&self, event_id: DbId) -> Result<u64, StoreError> {
        self.inner.delete_assignments(event_id).await
    }

    async fn update_notification_status(
        &self,
        assignment_id: DbId,
        status: &NotificationStatus,
    ) -> Result<(), StoreError> {
        self.inner
            .update_notification_status(assignment_id, status)
            .await
    }

    async fn find_receiver_for(
        &self,
        event_id: DbId,
        giver_id: DbId,
    ) -> Result<Option<Participant>, StoreError> {
        self.inner.find_receiver_for(event_id, giver_id).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection reset".to_string()))
    }
}

/// Delegates to a [`MemoryDrawStore`], holding each draw insert until a
/// permit is released with [`GatedInsertStore::release`].
pub struct GatedInsertStore {
    pub inner: Arc<MemoryDrawStore>,
    gate: Semaphore,
    waiting: AtomicUsize,
}

impl GatedInsertStore {
    pub fn new(inner: Arc<MemoryDrawStore>) -> Self {
        Self {
            inner,
            gate: Semaphore::new(0),
            waiting: AtomicUsize::new(0),
        }
    }

    /// Inserts that have reached the gate so far.
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    pub fn release(&self, inserts: usize) {
        self.gate.add_permits(inserts);
    }
}

#[async_trait]
impl DrawStore for GatedInsertStore {
    async fn get_event(&self, event_id: DbId) -> Result<Option<Event>, StoreError> {
        self.inner.get_event(event_id).await
    }

    async fn list_participants(&self, event_id: DbId) -> Result<Vec<Participant>, StoreError> {
        self.inner.list_participants(event_id).await
    }

    async fn list_assignments(&self, event_id: DbId) -> Result<Vec<Assignment>, StoreError> {
        self.inner.list_assignments(event_id).await
    }

    async fn insert_assignments(
        &self,
        event_id: DbId,
        pairs: &[Pair<DbId>],
    ) -> Result<Vec<Assignment>, StoreError> {
        self.waiting.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        permit.forget();
        self.inner.insert_assignments(event_id, pairs).await
    }

    async fn delete_assignments(&self, event_id: DbId) -> Result<u64, StoreError> {
        self.inner.delete_assignments(event_id).await
    }

    async fn update_notification_status(
        &self,
        assignment_id: DbId,
        status: &NotificationStatus,
    ) -> Result<(), StoreError> {
        self.inner
            .update_notification_status(assignment_id, status)
            .await
    }

    async fn find_receiver_for(
        &self,
        event_id: DbId,
        giver_id: DbId,
    ) -> Result<Option<Participant>, StoreError> {
        self.inner.find_receiver_for(event_id, giver_id).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.inner.health_check().await
    }
}
