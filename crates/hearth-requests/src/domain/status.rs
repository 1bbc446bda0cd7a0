//! Request lifecycle status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// At least one field is missing or invalid.
    Incomplete,
    /// Every field is valid; the owner may submit.
    Ready,
    /// Waiting for a reviewer to claim it.
    Submitted,
    /// Claimed by a reviewer.
    InReview,
    /// Returned to the owner with comments.
    Reviewed,
    /// Accepted. Terminal.
    Approved,
    /// Declined by a reviewer before review began.
    Rejected,
    /// Rejection acknowledged by the owner. Terminal.
    Archived,
    /// Withdrawn by the owner. Terminal.
    Canceled,
}

impl RequestStatus {
    /// Returns the wire name of this status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Incomplete => "incomplete",
            Self::Ready => "ready",
            Self::Submitted => "submitted",
            Self::InReview => "in_review",
            Self::Reviewed => "reviewed",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Archived => "archived",
            Self::Canceled => "canceled",
        }
    }

    /// Returns `true` if no further transitions are possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Archived | Self::Canceled)
    }

    /// Returns `true` if the owner may edit content in this status.
    #[must_use]
    pub fn is_editable(self) -> bool {
        matches!(self, Self::Incomplete | Self::Ready | Self::Reviewed)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
