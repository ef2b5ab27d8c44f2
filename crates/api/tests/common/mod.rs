#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use kringle_db::models::event::{CreateEvent, Event};
use kringle_db::models::participant::{CreateParticipant, Participant};
use kringle_core::types::DbId;
use kringle_db::models::assignment::Assignment;
use kringle_draw::{DrawConfig, DrawOrchestrator, DrawStore, MemoryDrawStore};
use kringle_notify::{DeliveryError, DeliveryReceipt, Notifier, OutboundMessage};
use tower::ServiceExt;

use kringle_api::config::ServerConfig;
use kringle_api::router::build_app_router;
use kringle_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        notify_on_draw: false,
    }
}

/// Notifier that accepts every message.
pub struct AcceptingNotifier;

#[async_trait]
impl Notifier for AcceptingNotifier {
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, DeliveryError> {
        Ok(DeliveryReceipt {
            external_id: Some(format!("<{}@test>", message.to)),
        })
    }
}

/// Accepts every message after sleeping for `delay`.
pub struct SlowNotifier {
    pub delay: Duration,
}

#[async_trait]
impl Notifier for SlowNotifier {
    async fn send(&self, _message: &OutboundMessage) -> Result<DeliveryReceipt, DeliveryError> {
        tokio::time::sleep(self.delay).await;
        Ok(DeliveryReceipt { external_id: None })
    }
}

/// Build the full application router over `store` with all middleware layers.
pub fn build_test_app(store: Arc<MemoryDrawStore>, config: ServerConfig) -> Router {
    build_test_app_with(store, Arc::new(AcceptingNotifier), config)
}

/// Like [`build_test_app`] with a chosen notifier.
pub fn build_test_app_with(
    store: Arc<MemoryDrawStore>,
    notifier: Arc<dyn Notifier>,
    config: ServerConfig,
) -> Router {
    let orchestrator = Arc::new(DrawOrchestrator::new(
        store,
        notifier,
        DrawConfig::default(),
    ));
    let state = AppState {
        orchestrator,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// Poll the store until every assignment of `event_id` has a notification
/// outcome, or panic after `limit`.
pub async fn wait_for_outcomes(
    store: &MemoryDrawStore,
    event_id: DbId,
    limit: Duration,
) -> Vec<Assignment> {
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        let rows = store.list_assignments(event_id).await.unwrap();
        if !rows.is_empty()
            && rows
                .iter()
                .all(|r| r.sent_at.is_some() || r.last_error.is_some())
        {
            return rows;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "notification outcomes were not recorded in time"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Create an event with `n` participants.
pub fn seed_event(store: &MemoryDrawStore, n: usize) -> (Event, Vec<Participant>) {
    let event = store.insert_event(CreateEvent {
        name: "Office party".to_string(),
        description: Some("Annual exchange".to_string()),
        event_date: Utc::now(),
    });
    let people = (0..n)
        .map(|i| {
            store
                .add_participant(
                    event.id,
                    CreateParticipant {
                        name: format!("person-{i}"),
                        email: format!("person-{i}@example.com"),
                        gift_idea: Some(format!("idea {i}")),
                        gift_image: None,
                    },
                )
                .unwrap()
        })
        .collect();
    (event, people)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, method: Method, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri).await
}

pub async fn post(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
