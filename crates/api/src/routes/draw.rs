//! Route definitions for the draw resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::draw;
use crate::state::AppState;

/// Routes mounted at `/events/{event_id}/draw`.
///
/// ```text
/// POST   /               -> perform_draw
/// GET    /               -> list_assignments
/// DELETE /               -> reset_draw
/// GET    /status         -> draw_status
/// POST   /notify         -> notify_assignments
/// POST   /notify/retry   -> retry_unsent
/// GET    /validate       -> validate_draw
/// ```
pub fn event_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(draw::perform_draw)
                .get(draw::list_assignments)
                .delete(draw::reset_draw),
        )
        .route("/status", get(draw::draw_status))
        .route("/notify", post(draw::notify_assignments))
        .route("/notify/retry", post(draw::retry_unsent))
        .route("/validate", get(draw::validate_draw))
}

/// Routes mounted at `/participants`.
///
/// ```text
/// GET    /{participant_id}/assignment   -> get_assignment (?event_id=)
/// ```
pub fn participant_router() -> Router<AppState> {
    Router::new().route("/{participant_id}/assignment", get(draw::get_assignment))
}
