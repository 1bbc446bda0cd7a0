//! Per-field review status.
//!
//! The assigned reviewer marks fields one at a time while a request is in
//! review. Editing a field puts it back to `NotReviewed`.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Review status of one field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldReviewStatus {
    /// Not yet looked at, or edited since the last review.
    #[default]
    NotReviewed,
    /// Reviewed with no outstanding comments.
    Approved,
    /// Reviewed and carrying comments the owner must address.
    Reviewed,
    /// Declined outright. No command assigns this status yet.
    Rejected,
}

impl FieldReviewStatus {
    /// Returns the wire name of this status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotReviewed => "not_reviewed",
            Self::Approved => "approved",
            Self::Reviewed => "reviewed",
            Self::Rejected => "rejected",
        }
    }

    /// The status a reviewer's pass assigns to a field.
    #[must_use]
    pub fn verdict(has_unresolved_comments: bool) -> Self {
        if has_unresolved_comments {
            Self::Reviewed
        } else {
            Self::Approved
        }
    }
}

impl fmt::Display for FieldReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review status of every field on a request.
#[derive(Debug, Clone, Default)]
pub struct FieldReviews(HashMap<String, FieldReviewStatus>);

impl FieldReviews {
    /// Creates a map where every field is `NotReviewed`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the status of `field`.
    #[must_use]
    pub fn status(&self, field: &str) -> FieldReviewStatus {
        self.0.get(field).copied().unwrap_or_default()
    }

    /// Sets the status of `field`.
    pub fn set(&mut self, field: &str, status: FieldReviewStatus) {
        self.0.insert(field.to_owned(), status);
    }

    /// Puts `field` back to `NotReviewed`.
    pub fn reset(&mut self, field: &str) {
        self.0.remove(field);
    }
}
