//! Handlers for the draw of an event.
//!
//! Every handler delegates to [`kringle_draw::DrawOrchestrator`]; errors are
//! mapped to HTTP by [`AppError`].

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use kringle_core::draw_audit::DrawReport;
use kringle_core::error::CoreError;
use kringle_core::types::DbId;
use kringle_db::models::assignment::AssignmentDetail;
use kringle_db::models::participant::ParticipantProfile;
use kringle_draw::{DrawState, DrawSummary, NotifyReport, ResetSummary};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Response body of a draw.
#[derive(Debug, Serialize)]
pub struct PerformDrawResponse {
    pub draw: DrawSummary,
    /// Whether a notification batch was started for the new draw.
    pub notifications_queued: bool,
}

/// Query parameters for the assignment lookup.
#[derive(Debug, Deserialize)]
pub struct AssignmentQuery {
    pub event_id: DbId,
}

/// POST /api/v1/events/{event_id}/draw
///
/// Draw the event and, when `NOTIFY_ON_DRAW` is set, start notifying every
/// giver on a background task. The response does not wait for delivery;
/// outcomes land on the assignment rows and in the log.
pub async fn perform_draw(
    State(state): State<AppState>,
    Path(event_id): Path<DbId>,
) -> AppResult<(StatusCode, Json<DataResponse<PerformDrawResponse>>)> {
    let draw = state.orchestrator.perform_draw(event_id).await?;

    let notifications_queued = state.config.notify_on_draw;
    if notifications_queued {
        let orchestrator = Arc::clone(&state.orchestrator);
        tokio::spawn(async move {
            match orchestrator.notify_assignments(event_id).await {
                Ok(report) => tracing::info!(
                    %event_id,
                    succeeded = report.succeeded,
                    failed = report.failed,
                    "Post-draw notification batch finished"
                ),
                Err(e) => {
                    tracing::error!(%event_id, error = %e, "Draw stored but notification batch failed")
                }
            }
        });
    }

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: PerformDrawResponse {
                draw,
                notifications_queued,
            },
        }),
    ))
}

/// GET /api/v1/events/{event_id}/draw
pub async fn list_assignments(
    State(state): State<AppState>,
    Path(event_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<AssignmentDetail>>>> {
    let data = state.orchestrator.list_assignments(event_id).await?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/events/{event_id}/draw
pub async fn reset_draw(
    State(state): State<AppState>,
    Path(event_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ResetSummary>>> {
    let data = state.orchestrator.reset_draw(event_id).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/events/{event_id}/draw/status
pub async fn draw_status(
    State(state): State<AppState>,
    Path(event_id): Path<DbId>,
) -> AppResult<Json<DataResponse<DrawState>>> {
    let data = state.orchestrator.draw_state(event_id).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/events/{event_id}/draw/notify
pub async fn notify_assignments(
    State(state): State<AppState>,
    Path(event_id): Path<DbId>,
) -> AppResult<Json<DataResponse<NotifyReport>>> {
    let data = state.orchestrator.notify_assignments(event_id).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/events/{event_id}/draw/notify/retry
///
/// Re-send only to givers without a successful notification.
pub async fn retry_unsent(
    State(state): State<AppState>,
    Path(event_id): Path<DbId>,
) -> AppResult<Json<DataResponse<NotifyReport>>> {
    let data = state.orchestrator.retry_unsent_notifications(event_id).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/events/{event_id}/draw/validate
pub async fn validate_draw(
    State(state): State<AppState>,
    Path(event_id): Path<DbId>,
) -> AppResult<Json<DataResponse<DrawReport>>> {
    let data = state.orchestrator.validate_draw(event_id).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/participants/{participant_id}/assignment?event_id=
///
/// Returns 404 until the event is drawn.
pub async fn get_assignment(
    State(state): State<AppState>,
    Path(participant_id): Path<DbId>,
    Query(params): Query<AssignmentQuery>,
) -> AppResult<Json<DataResponse<ParticipantProfile>>> {
    let data = state
        .orchestrator
        .get_assignment_for(participant_id, params.event_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Assignment",
            id: participant_id,
        }))?;
    Ok(Json(DataResponse { data }))
}
