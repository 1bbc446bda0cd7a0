//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use hearth_core::clock::Clock;
use hearth_event_store::pg_event_repository::PgEventRepository;
use hearth_test_support::FixedClock;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use hearth_api::actor::{ACTOR_CAPABILITIES_HEADER, ACTOR_ID_HEADER};
use hearth_api::state::AppState;

/// Capability list granted to reviewers in these tests.
pub const REVIEWER_CAPABILITIES: &str = "review-character-applications";

/// Build the full app router with a real `PgEventRepository` and a fixed
/// clock. Uses the same router as `main.rs`.
pub fn build_test_app(pool: PgPool) -> Router {
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(FixedClock::default_instant());
    let event_repository = Arc::new(PgEventRepository::new(pool.clone()));
    hearth_api::app(AppState::new(pool, clock, event_repository))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a POST request with a JSON body as `actor` and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    actor: Uuid,
    capabilities: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header(ACTOR_ID_HEADER, actor.to_string())
        .header(ACTOR_CAPABILITIES_HEADER, capabilities)
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a GET request as `actor` and return the response.
pub async fn get_json(
    app: Router,
    uri: &str,
    actor: Uuid,
    capabilities: &str,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .header(ACTOR_ID_HEADER, actor.to_string())
        .header(ACTOR_CAPABILITIES_HEADER, capabilities)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Send an anonymous GET request and return the response.
pub async fn get_public_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}
