//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row, plus the DTOs and views built around it.

pub mod assignment;
pub mod event;
pub mod participant;
