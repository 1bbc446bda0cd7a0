//! Shared application state.

use std::sync::Arc;

use hearth_core::clock::Clock;
use hearth_core::repository::EventRepository;
use sqlx::PgPool;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub db_pool: PgPool,
    /// Source of event timestamps.
    pub clock: Arc<dyn Clock + Send + Sync>,
    /// Event stream storage.
    pub event_repository: Arc<dyn EventRepository>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        db_pool: PgPool,
        clock: Arc<dyn Clock + Send + Sync>,
        event_repository: Arc<dyn EventRepository>,
    ) -> Self {
        Self {
            db_pool,
            clock,
            event_repository,
        }
    }
}
