//! Hearth — moderated request review bounded context.
//!
//! Players author structured requests (character applications) field by
//! field, submit them for staff review, and reviewers approve, reject, or
//! return them with per-field comments. Every state change is recorded as
//! an event on the request's stream.

pub mod application;
pub mod domain;
