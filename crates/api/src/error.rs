use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kringle_core::error::CoreError;
use kringle_draw::DrawError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`DrawError`] and renders both as
/// `{ "error": <message>, "code": <CODE> }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Draw(#[from] DrawError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
            },

            // --- Draw workflow errors ---
            AppError::Draw(draw) => match draw {
                DrawError::InsufficientParticipants { .. } => (
                    StatusCode::BAD_REQUEST,
                    "INSUFFICIENT_PARTICIPANTS",
                    draw.to_string(),
                ),
                DrawError::AlreadyDrawn(_) => {
                    (StatusCode::CONFLICT, "ALREADY_DRAWN", draw.to_string())
                }
                DrawError::EventNotFound(_) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", draw.to_string())
                }
                DrawError::Persistence(err) => {
                    tracing::error!(error = %err, "Draw store failure");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "PERSISTENCE_ERROR",
                        "The draw store is unavailable, try again later".to_string(),
                    )
                }
            },
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
