//! Domain logic for the Kringle gift-exchange draw.
//!
//! Everything here is pure: no database, no network. The `draw` crate wires
//! these pieces to the persistence and notification collaborators.

pub mod assignment;
pub mod compose;
pub mod draw_audit;
pub mod error;
pub mod types;
