//! [`DrawStore`] backed by PostgreSQL through the `kringle-db` repositories.

use async_trait::async_trait;
use kringle_core::assignment::Pair;
use kringle_core::types::DbId;
use kringle_db::models::assignment::{Assignment, AssignmentDetail, NotificationStatus};
use kringle_db::models::event::Event;
use kringle_db::models::participant::Participant;
use kringle_db::repositories::{AssignmentRepo, DrawInsert, EventRepo, ParticipantRepo};
use kringle_db::DbPool;

use crate::store::{DrawStore, StoreError};

/// Prefix shared by the unique constraints on the `assignments` table.
const ASSIGNMENT_UNIQUE_PREFIX: &str = "uq_assignments_";

pub struct PgDrawStore {
    pool: DbPool,
}

impl PgDrawStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// A concurrent draw that slipped past the lock shows up as a unique
/// violation (23505) on one of the assignment constraints.
fn is_assignment_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23505")
                && db_err
                    .constraint()
                    .is_some_and(|c| c.starts_with(ASSIGNMENT_UNIQUE_PREFIX))
        }
        _ => false,
    }
}

#[async_trait]
impl DrawStore for PgDrawStore {
    async fn get_event(&self, event_id: DbId) -> Result<Option<Event>, StoreError> {
        Ok(EventRepo::find_by_id(&self.pool, event_id).await?)
    }

    async fn list_participants(&self, event_id: DbId) -> Result<Vec<Participant>, StoreError> {
        Ok(ParticipantRepo::list_for_event(&self.pool, event_id).await?)
    }

    async fn list_assignments(&self, event_id: DbId) -> Result<Vec<Assignment>, StoreError> {
        Ok(AssignmentRepo::list_for_event(&self.pool, event_id).await?)
    }

    async fn insert_assignments(
        &self,
        event_id: DbId,
        pairs: &[Pair<DbId>],
    ) -> Result<Vec<Assignment>, StoreError> {
        match AssignmentRepo::insert_draw(&self.pool, event_id, pairs).await {
            Ok(DrawInsert::Inserted(rows)) => Ok(rows),
            Ok(DrawInsert::AlreadyDrawn) => Err(StoreError::AlreadyDrawn),
            Err(e) if is_assignment_conflict(&e) => {
                tracing::warn!(%event_id, error = %e, "Draw insert hit a unique constraint");
                Err(StoreError::AlreadyDrawn)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_assignments(&self, event_id: DbId) -> Result<u64, StoreError> {
        Ok(AssignmentRepo::delete_for_event(&self.pool, event_id).await?)
    }

    async fn update_notification_status(
        &self,
        assignment_id: DbId,
        status: &NotificationStatus,
    ) -> Result<(), StoreError> {
        let updated =
            AssignmentRepo::update_notification_status(&self.pool, assignment_id, status).await?;
        if updated {
            Ok(())
        } else {
            Err(StoreError::AssignmentNotFound(assignment_id))
        }
    }

    async fn find_receiver_for(
        &self,
        event_id: DbId,
        giver_id: DbId,
    ) -> Result<Option<Participant>, StoreError> {
        Ok(ParticipantRepo::find_receiver_for(&self.pool, event_id, giver_id).await?)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(kringle_db::health_check(&self.pool).await?)
    }

    async fn list_assignment_details(
        &self,
        event_id: DbId,
    ) -> Result<Vec<AssignmentDetail>, StoreError> {
        Ok(AssignmentRepo::list_details(&self.pool, event_id).await?)
    }
}
