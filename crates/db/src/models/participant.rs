//! Participant entity model, DTO and public profile.

use kringle_core::draw_audit::AuditParticipant;
use kringle_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `participants` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Participant {
    pub id: DbId,
    pub event_id: DbId,
    pub name: String,
    pub email: String,
    pub gift_idea: Option<String>,
    pub gift_image: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Participant {
    pub fn as_audit(&self) -> AuditParticipant<'_> {
        AuditParticipant {
            id: self.id,
            name: &self.name,
            email: &self.email,
        }
    }
}

/// DTO for registering a participant in an event.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateParticipant {
    pub name: String,
    pub email: String,
    pub gift_idea: Option<String>,
    pub gift_image: Option<String>,
}

/// What a giver is allowed to see about their receiver. Never carries the
/// contact address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantProfile {
    pub id: DbId,
    pub name: String,
    pub gift_idea: Option<String>,
    pub gift_image: Option<String>,
}

impl From<&Participant> for ParticipantProfile {
    fn from(p: &Participant) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            gift_idea: p.gift_idea.clone(),
            gift_image: p.gift_image.clone(),
        }
    }
}

impl From<Participant> for ParticipantProfile {
    fn from(p: Participant) -> Self {
        Self {
            id: p.id,
            name: p.name,
            gift_idea: p.gift_idea,
            gift_image: p.gift_image,
        }
    }
}
