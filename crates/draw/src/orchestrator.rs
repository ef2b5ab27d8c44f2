//! The draw workflow: draw, notify, reset and read back.
//!
//! The engine's pairs are persisted in one atomic store call; notifications
//! then fan out with bounded parallelism and each outcome is written back to
//! its own assignment row. A failed send never undoes the draw or stops the
//! other sends.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use futures::stream::{self, StreamExt};
use kringle_core::assignment::{assign, MIN_PARTICIPANTS};
use kringle_core::compose::{compose_assignment_message, ReceiverDetails};
use kringle_core::draw_audit::{audit_draw, DrawReport};
use kringle_core::types::DbId;
use kringle_db::models::assignment::{Assignment, AssignmentDetail, NotificationStatus};
use kringle_db::models::event::Event;
use kringle_db::models::participant::{Participant, ParticipantProfile};
use kringle_notify::{Notifier, OutboundMessage};
use serde::Serialize;

use crate::config::DrawConfig;
use crate::error::{DrawError, NotificationFailure};
use crate::store::{DrawStore, StoreError};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Result of a successful draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawSummary {
    pub event_id: DbId,
    pub assignments: usize,
}

/// Aggregated outcome of one notification batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotifyReport {
    /// Pairs attempted in this batch.
    pub total: usize,
    pub succeeded: usize,
    /// Includes `missing_participants`.
    pub failed: usize,
    pub missing_participants: usize,
    /// Outcomes that could not be written back to the store.
    pub unrecorded: usize,
    /// Rows left alone because they were already sent (retry only).
    pub skipped: usize,
}

/// Result of a reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetSummary {
    pub event_id: DbId,
    pub removed: u64,
}

/// Draw lifecycle of one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DrawState {
    NotDrawn,
    /// A draw for the event is in progress in this process.
    Drawing,
    Drawn { assignments: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NotifyScope {
    All,
    Unsent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Sent,
    Failed,
    MissingParticipant,
}

struct PairOutcome {
    delivery: Delivery,
    recorded: bool,
}

// ---------------------------------------------------------------------------
// In-flight registry
// ---------------------------------------------------------------------------

/// Marks an event as being drawn until dropped.
///
/// Counts overlapping draws so the mark outlives all but the last of them.
struct InFlightGuard<'a> {
    registry: &'a Mutex<HashMap<DbId, usize>>,
    event_id: DbId,
}

impl<'a> InFlightGuard<'a> {
    fn enter(registry: &'a Mutex<HashMap<DbId, usize>>, event_id: DbId) -> Self {
        *registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event_id)
            .or_insert(0) += 1;
        Self { registry, event_id }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(count) = registry.get_mut(&self.event_id) {
            *count -= 1;
            if *count == 0 {
                registry.remove(&self.event_id);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// DrawOrchestrator
// ---------------------------------------------------------------------------

/// Runs draws for events against an injected store and notifier.
pub struct DrawOrchestrator {
    store: Arc<dyn DrawStore>,
    notifier: Arc<dyn Notifier>,
    config: DrawConfig,
    in_flight: Mutex<HashMap<DbId, usize>>,
}

impl DrawOrchestrator {
    pub fn new(store: Arc<dyn DrawStore>, notifier: Arc<dyn Notifier>, config: DrawConfig) -> Self {
        Self {
            store,
            notifier,
            config,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &DrawConfig {
        &self.config
    }

    /// Draw the assignments of an event and persist them atomically.
    ///
    /// Fails with [`DrawError::AlreadyDrawn`] if the event already has
    /// assignments, including when a concurrent draw wins the race.
    pub async fn perform_draw(&self, event_id: DbId) -> Result<DrawSummary, DrawError> {
        self.require_event(event_id).await?;
        let _guard = InFlightGuard::enter(&self.in_flight, event_id);

        let participants = self.store.list_participants(event_id).await?;
        if participants.len() < MIN_PARTICIPANTS {
            tracing::debug!(%event_id, found = participants.len(), "Draw refused, too few participants");
            return Err(DrawError::InsufficientParticipants {
                found: participants.len(),
            });
        }

        if !self.store.list_assignments(event_id).await?.is_empty() {
            return Err(DrawError::AlreadyDrawn(event_id));
        }

        let ids: Vec<DbId> = participants.iter().map(|p| p.id).collect();
        let pairs = assign(&ids)?;

        let rows = self
            .store
            .insert_assignments(event_id, &pairs)
            .await
            .map_err(|e| match e {
                StoreError::AlreadyDrawn => DrawError::AlreadyDrawn(event_id),
                other => {
                    tracing::error!(%event_id, error = %other, "Failed to persist draw");
                    DrawError::Persistence(other)
                }
            })?;

        tracing::info!(%event_id, assignments = rows.len(), "Draw completed");
        Ok(DrawSummary {
            event_id,
            assignments: rows.len(),
        })
    }

    /// Notify every giver of an event of their receiver.
    pub async fn notify_assignments(&self, event_id: DbId) -> Result<NotifyReport, DrawError> {
        self.notify(event_id, NotifyScope::All).await
    }

    /// Notify only the givers whose notification has not succeeded yet.
    pub async fn retry_unsent_notifications(
        &self,
        event_id: DbId,
    ) -> Result<NotifyReport, DrawError> {
        self.notify(event_id, NotifyScope::Unsent).await
    }

    /// Delete every assignment of an event. Safe to call when nothing is drawn.
    pub async fn reset_draw(&self, event_id: DbId) -> Result<ResetSummary, DrawError> {
        let removed = self.store.delete_assignments(event_id).await?;
        tracing::info!(%event_id, removed, "Draw reset");
        Ok(ResetSummary { event_id, removed })
    }

    /// The receiver drawn for `participant_id`, or `None` if there is none yet.
    pub async fn get_assignment_for(
        &self,
        participant_id: DbId,
        event_id: DbId,
    ) -> Result<Option<ParticipantProfile>, DrawError> {
        let receiver = self.store.find_receiver_for(event_id, participant_id).await?;
        Ok(receiver.map(ParticipantProfile::from))
    }

    /// Organizer view of every pair with its notification bookkeeping.
    pub async fn list_assignments(
        &self,
        event_id: DbId,
    ) -> Result<Vec<AssignmentDetail>, DrawError> {
        self.require_event(event_id).await?;
        Ok(self.store.list_assignment_details(event_id).await?)
    }

    /// Audit the persisted draw of an event.
    pub async fn validate_draw(&self, event_id: DbId) -> Result<DrawReport, DrawError> {
        self.require_event(event_id).await?;
        let participants = self.store.list_participants(event_id).await?;
        let assignments = self.store.list_assignments(event_id).await?;

        let report = audit_draw(
            &participants.iter().map(Participant::as_audit).collect::<Vec<_>>(),
            &assignments.iter().map(Assignment::as_audit).collect::<Vec<_>>(),
        );

        if !report.ok {
            tracing::warn!(%event_id, issues = report.issues.len(), "Draw audit found issues");
        }
        Ok(report)
    }

    pub async fn draw_state(&self, event_id: DbId) -> Result<DrawState, DrawError> {
        self.require_event(event_id).await?;

        let drawing = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&event_id);
        if drawing {
            return Ok(DrawState::Drawing);
        }

        let assignments = self.store.list_assignments(event_id).await?.len();
        Ok(if assignments == 0 {
            DrawState::NotDrawn
        } else {
            DrawState::Drawn { assignments }
        })
    }

    pub async fn health_check(&self) -> Result<(), DrawError> {
        Ok(self.store.health_check().await?)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn require_event(&self, event_id: DbId) -> Result<Event, DrawError> {
        self.store
            .get_event(event_id)
            .await?
            .ok_or(DrawError::EventNotFound(event_id))
    }

    async fn notify(&self, event_id: DbId, scope: NotifyScope) -> Result<NotifyReport, DrawError> {
        let event = self.require_event(event_id).await?;
        let participants = self.store.list_participants(event_id).await?;
        let assignments = self.store.list_assignments(event_id).await?;

        let people: HashMap<DbId, &Participant> =
            participants.iter().map(|p| (p.id, p)).collect();

        let (targets, already_sent): (Vec<&Assignment>, Vec<&Assignment>) = assignments
            .iter()
            .partition(|a| scope == NotifyScope::All || a.sent_at.is_none());

        let mut report = NotifyReport {
            total: targets.len(),
            skipped: already_sent.len(),
            ..NotifyReport::default()
        };

        // Built eagerly so the batch future stays `Send` for spawned tasks.
        let pending: Vec<_> = targets
            .into_iter()
            .map(|assignment| self.notify_pair(&event, assignment, &people))
            .collect();
        let outcomes: Vec<PairOutcome> = stream::iter(pending)
            .buffer_unordered(self.config.notify_concurrency.max(1))
            .collect()
            .await;

        for outcome in outcomes {
            match outcome.delivery {
                Delivery::Sent => report.succeeded += 1,
                Delivery::Failed => report.failed += 1,
                Delivery::MissingParticipant => {
                    report.failed += 1;
                    report.missing_participants += 1;
                }
            }
            if !outcome.recorded {
                report.unrecorded += 1;
            }
        }

        tracing::info!(
            %event_id,
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            "Notification batch finished"
        );
        Ok(report)
    }

    async fn notify_pair(
        &self,
        event: &Event,
        assignment: &Assignment,
        people: &HashMap<DbId, &Participant>,
    ) -> PairOutcome {
        let (delivery, status) = match self.deliver(event, assignment, people).await {
            Ok(external_message_id) => (
                Delivery::Sent,
                NotificationStatus::Sent {
                    sent_at: Utc::now(),
                    external_message_id,
                },
            ),
            Err(failure) => {
                tracing::warn!(
                    event_id = %event.id,
                    assignment_id = %assignment.id,
                    error = %failure,
                    "Assignment notification failed"
                );
                let delivery = match failure {
                    NotificationFailure::MissingParticipant { .. } => Delivery::MissingParticipant,
                    _ => Delivery::Failed,
                };
                (
                    delivery,
                    NotificationStatus::Failed {
                        error: failure.to_string(),
                    },
                )
            }
        };

        let recorded = match self
            .store
            .update_notification_status(assignment.id, &status)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    event_id = %event.id,
                    assignment_id = %assignment.id,
                    error = %e,
                    "Failed to record notification outcome"
                );
                false
            }
        };

        PairOutcome { delivery, recorded }
    }

    /// Compose and send one giver's message under the configured timeout.
    async fn deliver(
        &self,
        event: &Event,
        assignment: &Assignment,
        people: &HashMap<DbId, &Participant>,
    ) -> Result<Option<String>, NotificationFailure> {
        let giver = people.get(&assignment.giver_id).ok_or(
            NotificationFailure::MissingParticipant {
                role: "giver",
                id: assignment.giver_id,
            },
        )?;
        let receiver = people.get(&assignment.receiver_id).ok_or(
            NotificationFailure::MissingParticipant {
                role: "receiver",
                id: assignment.receiver_id,
            },
        )?;

        let composed = compose_assignment_message(
            &event.name,
            &giver.name,
            &ReceiverDetails {
                name: &receiver.name,
                gift_idea: receiver.gift_idea.as_deref(),
                gift_image: receiver.gift_image.as_deref(),
            },
            &self.config.public_base_url,
        );
        let message = OutboundMessage {
            to: giver.email.clone(),
            subject: composed.subject,
            body: composed.body,
        };

        let receipt = tokio::time::timeout(self.config.notify_timeout, self.notifier.send(&message))
            .await
            .map_err(|_| NotificationFailure::TimedOut(self.config.notify_timeout))??;

        tracing::debug!(assignment_id = %assignment.id, to = %message.to, "Assignment notification sent");
        Ok(receipt.external_id)
    }
}
