//! Draw workflow for Kringle events.
//!
//! [`DrawOrchestrator`] runs the assignment engine against a [`DrawStore`]
//! and fans the results out through a [`kringle_notify::Notifier`],
//! recording the outcome of every notification on its assignment row.

pub mod config;
pub mod error;
pub mod memory_store;
pub mod orchestrator;
pub mod pg_store;
pub mod store;

pub use config::DrawConfig;
pub use error::{DrawError, NotificationFailure};
pub use memory_store::MemoryDrawStore;
pub use orchestrator::{DrawOrchestrator, DrawState, DrawSummary, NotifyReport, ResetSummary};
pub use pg_store::PgDrawStore;
pub use store::{DrawStore, StoreError};
