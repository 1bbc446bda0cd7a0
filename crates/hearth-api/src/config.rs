//! Server configuration.

use axum::http::HeaderValue;
use tower_http::cors::CorsLayer;

use crate::error::AppError;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Maximum pooled database connections.
    pub database_max_connections: u32,
    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,
    /// OTLP collector endpoint. Span export is off when unset.
    pub otlp_endpoint: Option<String>,
    /// Apply pending migrations at startup.
    pub run_migrations: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                       | Default    |
    /// |-------------------------------|------------|
    /// | `DATABASE_URL`                | (required) |
    /// | `HOST`                        | `0.0.0.0`  |
    /// | `PORT`                        | `3000`     |
    /// | `DATABASE_MAX_CONNECTIONS`    | `10`       |
    /// | `CORS_ORIGINS`                | (any)      |
    /// | `OTEL_EXPORTER_OTLP_ENDPOINT` | (off)      |
    /// | `RUN_MIGRATIONS`              | `false`    |
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `DATABASE_URL` is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AppError::Config("DATABASE_URL environment variable must be set".to_owned())
            })?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_owned());
        let port: u16 = lookup("PORT")
            .unwrap_or_else(|| "3000".to_owned())
            .parse()
            .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?;
        let database_max_connections: u32 = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_owned())
            .parse()
            .map_err(|e| {
                AppError::Config(format!("DATABASE_MAX_CONNECTIONS must be a valid u32: {e}"))
            })?;
        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
        let otlp_endpoint = lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.is_empty());
        let run_migrations = match lookup("RUN_MIGRATIONS").as_deref() {
            None | Some("" | "0" | "false") => false,
            Some("1" | "true") => true,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "RUN_MIGRATIONS must be true or false, got {other:?}"
                )));
            }
        };

        Ok(Self {
            database_url,
            host,
            port,
            database_max_connections,
            cors_origins,
            otlp_endpoint,
            run_migrations,
        })
    }

    /// Builds the CORS layer for the configured origins.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if an origin is not a valid header value.
    pub fn cors_layer(&self) -> Result<CorsLayer, AppError> {
        if self.cors_origins.is_empty() {
            return Ok(CorsLayer::permissive());
        }
        let origins = self
            .cors_origins
            .iter()
            .map(|origin| {
                origin
                    .parse::<HeaderValue>()
                    .map_err(|e| AppError::Config(format!("invalid CORS origin {origin:?}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CorsLayer::new().allow_origin(origins))
    }
}
