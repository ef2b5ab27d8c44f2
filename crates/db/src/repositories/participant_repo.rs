//! Repository for the `participants` table.

use kringle_core::types::DbId;
use sqlx::PgPool;

use crate::models::participant::{CreateParticipant, Participant};

/// Column list for `participants` queries.
const COLUMNS: &str =
    "id, event_id, name, email, gift_idea, gift_image, created_at, updated_at";

/// Provides read/write operations for event participants.
pub struct ParticipantRepo;

impl ParticipantRepo {
    /// Register a participant in an event, returning the created row.
    pub async fn create(
        pool: &PgPool,
        event_id: DbId,
        input: &CreateParticipant,
    ) -> Result<Participant, sqlx::Error> {
        let query = format!(
            "INSERT INTO participants (event_id, name, email, gift_idea, gift_image) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Participant>(&query)
            .bind(event_id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.gift_idea)
            .bind(&input.gift_image)
            .fetch_one(pool)
            .await
    }

    /// List all participants of an event in registration order.
    pub async fn list_for_event(
        pool: &PgPool,
        event_id: DbId,
    ) -> Result<Vec<Participant>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM participants \
             WHERE event_id = $1 \
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, Participant>(&query)
            .bind(event_id)
            .fetch_all(pool)
            .await
    }

    /// Find the participant that `giver_id` was drawn to give to.
    ///
    /// Returns `None` when the event has not been drawn or the giver has no
    /// assignment.
    pub async fn find_receiver_for(
        pool: &PgPool,
        event_id: DbId,
        giver_id: DbId,
    ) -> Result<Option<Participant>, sqlx::Error> {
        sqlx::query_as::<_, Participant>(
            "SELECT p.id, p.event_id, p.name, p.email, p.gift_idea, p.gift_image, \
                    p.created_at, p.updated_at \
             FROM assignments a \
             JOIN participants p ON p.id = a.receiver_id \
             WHERE a.event_id = $1 AND a.giver_id = $2 \
             LIMIT 1",
        )
        .bind(event_id)
        .bind(giver_id)
        .fetch_optional(pool)
        .await
    }
}
