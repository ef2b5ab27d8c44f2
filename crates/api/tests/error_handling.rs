//! Tests for `AppError` -> HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no server needed.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use kringle_api::error::AppError;
use kringle_core::error::CoreError;
use kringle_core::types::DbId;
use kringle_draw::{DrawError, StoreError};

async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_error_returns_404() {
    let id = DbId::nil();
    let err = AppError::Core(CoreError::NotFound {
        entity: "Assignment",
        id,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], format!("Assignment with id {id} not found"));
}

#[tokio::test]
async fn already_drawn_returns_409() {
    let id = DbId::new_v4();
    let (status, json) = error_to_response(DrawError::AlreadyDrawn(id).into()).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "ALREADY_DRAWN");
    assert_eq!(json["error"], format!("Event {id} has already been drawn"));
}

#[tokio::test]
async fn insufficient_participants_returns_400() {
    let err = DrawError::InsufficientParticipants { found: 0 };
    let (status, json) = error_to_response(err.into()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INSUFFICIENT_PARTICIPANTS");
}

#[tokio::test]
async fn event_not_found_returns_404() {
    let (status, json) = error_to_response(DrawError::EventNotFound(DbId::new_v4()).into()).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn persistence_failure_returns_503_without_detail() {
    let err = DrawError::Persistence(StoreError::Backend("password=hunter2 refused".into()));
    let (status, json) = error_to_response(err.into()).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "PERSISTENCE_ERROR");
    assert!(!json["error"].as_str().unwrap().contains("hunter2"));
}
