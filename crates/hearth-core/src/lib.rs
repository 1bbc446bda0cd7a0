//! Hearth Core — shared domain abstractions.
//!
//! This crate defines the fundamental traits and types that the request
//! workflow and its infrastructure depend on. It contains no infrastructure
//! code.

pub mod aggregate;
pub mod capability;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod repository;
