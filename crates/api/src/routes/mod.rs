pub mod draw;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /events/{event_id}/draw                          draw (POST), list (GET), reset (DELETE)
/// /events/{event_id}/draw/status                   draw state (GET)
/// /events/{event_id}/draw/notify                   notify every giver (POST)
/// /events/{event_id}/draw/notify/retry             notify unsent givers (POST)
/// /events/{event_id}/draw/validate                 consistency report (GET)
///
/// /participants/{participant_id}/assignment        receiver profile (GET, ?event_id=)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/events/{event_id}/draw", draw::event_router())
        .nest("/participants", draw::participant_router())
}
