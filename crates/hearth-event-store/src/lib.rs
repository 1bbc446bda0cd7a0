//! Hearth Event Store — PostgreSQL persistence for domain event streams.

pub mod pg_event_repository;

/// Embedded migrations for the `domain_events` table.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
