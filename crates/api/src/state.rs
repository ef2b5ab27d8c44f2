use std::sync::Arc;

use kringle_draw::DrawOrchestrator;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// Draw workflow over the configured store and notifier.
    pub orchestrator: Arc<DrawOrchestrator>,
    pub config: Arc<ServerConfig>,
}
