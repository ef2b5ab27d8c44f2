//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod assignment_repo;
pub mod event_repo;
pub mod participant_repo;

pub use assignment_repo::{AssignmentRepo, DrawInsert};
pub use event_repo::EventRepo;
pub use participant_repo::ParticipantRepo;
