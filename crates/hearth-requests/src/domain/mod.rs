//! Domain layer for the request review context.

pub mod aggregates;
pub mod comments;
pub mod commands;
pub mod content;
pub mod events;
pub mod field_review;
pub mod fields;
pub mod history;
pub mod status;
pub mod transitions;
