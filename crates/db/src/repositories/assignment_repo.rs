//! Repository for the `assignments` table.
//!
//! A draw is written by [`AssignmentRepo::insert_draw`], which holds a
//! transaction-scoped advisory lock keyed by the event id while it checks
//! for existing rows and inserts the new ones. Two concurrent draws for the
//! same event are therefore serialized; the second sees the first's rows
//! and returns [`DrawInsert::AlreadyDrawn`].

use kringle_core::assignment::Pair;
use kringle_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::assignment::{Assignment, AssignmentDetail, NotificationStatus};

/// Column list for `assignments` queries.
const COLUMNS: &str = "id, event_id, giver_id, receiver_id, sent_at, last_error, \
                       external_message_id, created_at";

/// Result of [`AssignmentRepo::insert_draw`].
#[derive(Debug)]
pub enum DrawInsert {
    /// All pairs were written; rows in insertion order.
    Inserted(Vec<Assignment>),
    /// The event already had assignments; nothing was written.
    AlreadyDrawn,
}

/// Provides read/write operations for draw assignments.
pub struct AssignmentRepo;

impl AssignmentRepo {
    /// List all assignments of an event.
    pub async fn list_for_event(
        pool: &PgPool,
        event_id: DbId,
    ) -> Result<Vec<Assignment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM assignments \
             WHERE event_id = $1 \
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, Assignment>(&query)
            .bind(event_id)
            .fetch_all(pool)
            .await
    }

    /// List all assignments of an event joined with giver and receiver.
    pub async fn list_details(
        pool: &PgPool,
        event_id: DbId,
    ) -> Result<Vec<AssignmentDetail>, sqlx::Error> {
        sqlx::query_as::<_, AssignmentDetail>(
            "SELECT a.id, \
                    a.giver_id, g.name AS giver_name, g.email AS giver_email, \
                    a.receiver_id, r.name AS receiver_name, r.email AS receiver_email, \
                    r.gift_idea AS receiver_gift_idea, r.gift_image AS receiver_gift_image, \
                    a.sent_at, a.last_error, a.external_message_id \
             FROM assignments a \
             JOIN participants g ON g.id = a.giver_id \
             JOIN participants r ON r.id = a.receiver_id \
             WHERE a.event_id = $1 \
             ORDER BY g.name, a.id",
        )
        .bind(event_id)
        .fetch_all(pool)
        .await
    }

    /// Count the assignments of an event.
    pub async fn count_for_event(pool: &PgPool, event_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM assignments WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(pool)
            .await
    }

    /// Write a complete draw for an event in one transaction.
    ///
    /// Either every pair is inserted or none is. Returns
    /// [`DrawInsert::AlreadyDrawn`] without writing if the event already has
    /// assignments when the lock is acquired.
    pub async fn insert_draw(
        pool: &PgPool,
        event_id: DbId,
        pairs: &[Pair<DbId>],
    ) -> Result<DrawInsert, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::uuid::text, 0))")
            .bind(event_id)
            .execute(&mut *tx)
            .await?;

        let existing: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM assignments WHERE event_id = $1")
                .bind(event_id)
                .fetch_one(&mut *tx)
                .await?;

        if existing > 0 {
            tracing::debug!(%event_id, existing, "Draw insert rejected, assignments exist");
            return Ok(DrawInsert::AlreadyDrawn);
        }

        let query = format!(
            "INSERT INTO assignments (event_id, giver_id, receiver_id) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );

        let mut rows = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let row = sqlx::query_as::<_, Assignment>(&query)
                .bind(event_id)
                .bind(pair.giver)
                .bind(pair.receiver)
                .fetch_one(&mut *tx)
                .await?;
            rows.push(row);
        }

        tx.commit().await?;
        Ok(DrawInsert::Inserted(rows))
    }

    /// Delete every assignment of an event. Returns the number of rows removed.
    pub async fn delete_for_event(pool: &PgPool, event_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM assignments WHERE event_id = $1")
            .bind(event_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Record a successful notification.
    ///
    /// Returns `true` if the row exists.
    pub async fn mark_sent(
        pool: &PgPool,
        id: DbId,
        sent_at: Timestamp,
        external_message_id: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE assignments \
             SET sent_at = $2, external_message_id = $3, last_error = NULL \
             WHERE id = $1",
        )
        .bind(id)
        .bind(sent_at)
        .bind(external_message_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a failed notification. `sent_at` is not touched.
    ///
    /// Returns `true` if the row exists.
    pub async fn mark_failed(pool: &PgPool, id: DbId, error: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE assignments SET last_error = $2 WHERE id = $1")
            .bind(id)
            .bind(error)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apply a [`NotificationStatus`] to one assignment row.
    pub async fn update_notification_status(
        pool: &PgPool,
        id: DbId,
        status: &NotificationStatus,
    ) -> Result<bool, sqlx::Error> {
        match status {
            NotificationStatus::Sent {
                sent_at,
                external_message_id,
            } => Self::mark_sent(pool, id, *sent_at, external_message_id.as_deref()).await,
            NotificationStatus::Failed { error } => Self::mark_failed(pool, id, error).await,
        }
    }
}
