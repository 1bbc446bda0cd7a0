//! Hearth — HTTP surface for the request review workflow.
//!
//! The binary in `main.rs` wires configuration, telemetry, and the database
//! pool around [`app`]; integration tests build the same router over a test
//! pool.

use axum::Router;

pub mod actor;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

/// Builds the application router with every route mounted.
pub fn app(state: state::AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/requests", routes::requests::router())
        .with_state(state)
}
