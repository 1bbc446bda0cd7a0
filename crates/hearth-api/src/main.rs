//! Hearth API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use hearth_core::clock::SystemClock;
use hearth_event_store::pg_event_repository::PgEventRepository;
use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;

use hearth_api::config::ServerConfig;
use hearth_api::error::AppError;
use hearth_api::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = ServerConfig::from_env()?;
    let _telemetry = hearth_api::telemetry::init(&config)?;

    tracing::info!("Starting Hearth API server");

    // Create database connection pool.
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    if config.run_migrations {
        hearth_event_store::MIGRATOR.run(&pool).await?;
        tracing::info!("database migrations applied");
    }

    let app_state = AppState::new(
        pool.clone(),
        Arc::new(SystemClock),
        Arc::new(PgEventRepository::new(pool)),
    );

    let app = hearth_api::app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(config.cors_layer()?);

    // Start server.
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
