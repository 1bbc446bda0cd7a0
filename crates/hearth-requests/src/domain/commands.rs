//! Commands for the request review context.
//!
//! Every command carries the acting identity and, except for creation, the
//! actor's capability set and an optional expected stream version.

use hearth_core::capability::CapabilitySet;
use hearth_core::command::Command;
use uuid::Uuid;

use super::fields::RequestKind;

/// Command to open a new request.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The new request's identifier.
    pub request_id: Uuid,
    /// The actor who will own the request.
    pub requester_id: Uuid,
    /// The request kind.
    pub kind: RequestKind,
}

impl Command for CreateRequest {
    fn command_type(&self) -> &'static str {
        "requests.create_request"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Uuid {
        self.requester_id
    }
}

/// Command to set one field of a request's content.
#[derive(Debug, Clone)]
pub struct EditField {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The request identifier.
    pub request_id: Uuid,
    /// The acting actor.
    pub actor_id: Uuid,
    /// The actor's capabilities.
    pub capabilities: CapabilitySet,
    /// The field key.
    pub field: String,
    /// The unsanitized value.
    pub value: String,
    /// Stream version the caller last observed.
    pub expected_stream_version: Option<i64>,
}

impl Command for EditField {
    fn command_type(&self) -> &'static str {
        "requests.edit_field"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Uuid {
        self.actor_id
    }
}

/// Command to move a request along its forward edge.
#[derive(Debug, Clone)]
pub struct AdvanceStatus {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The request identifier.
    pub request_id: Uuid,
    /// The acting actor.
    pub actor_id: Uuid,
    /// The actor's capabilities.
    pub capabilities: CapabilitySet,
    /// Stream version the caller last observed.
    pub expected_stream_version: Option<i64>,
}

impl Command for AdvanceStatus {
    fn command_type(&self) -> &'static str {
        "requests.advance_status"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Uuid {
        self.actor_id
    }
}

/// Command to withdraw a request, or for a reviewer to decline a
/// submission.
#[derive(Debug, Clone)]
pub struct CancelRequest {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The request identifier.
    pub request_id: Uuid,
    /// The acting actor.
    pub actor_id: Uuid,
    /// The actor's capabilities.
    pub capabilities: CapabilitySet,
    /// Stream version the caller last observed.
    pub expected_stream_version: Option<i64>,
}

impl Command for CancelRequest {
    fn command_type(&self) -> &'static str {
        "requests.cancel_request"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Uuid {
        self.actor_id
    }
}

/// Command to add a review comment on a field.
#[derive(Debug, Clone)]
pub struct AddComment {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The request identifier.
    pub request_id: Uuid,
    /// The acting actor.
    pub actor_id: Uuid,
    /// The actor's capabilities.
    pub capabilities: CapabilitySet,
    /// Caller-assigned comment identifier.
    pub comment_id: Uuid,
    /// The commented field.
    pub field: String,
    /// The unsanitized comment text.
    pub text: String,
    /// The comment being replied to.
    pub parent_id: Option<Uuid>,
    /// Stream version the caller last observed.
    pub expected_stream_version: Option<i64>,
}

impl Command for AddComment {
    fn command_type(&self) -> &'static str {
        "requests.add_comment"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Uuid {
        self.actor_id
    }
}

/// Command for a comment's author to rewrite its text.
#[derive(Debug, Clone)]
pub struct EditComment {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The request identifier.
    pub request_id: Uuid,
    /// The acting actor.
    pub actor_id: Uuid,
    /// The actor's capabilities.
    pub capabilities: CapabilitySet,
    /// The comment to rewrite.
    pub comment_id: Uuid,
    /// The unsanitized replacement text.
    pub text: String,
    /// Stream version the caller last observed.
    pub expected_stream_version: Option<i64>,
}

impl Command for EditComment {
    fn command_type(&self) -> &'static str {
        "requests.edit_comment"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Uuid {
        self.actor_id
    }
}

/// Command for a comment's author to withdraw it.
#[derive(Debug, Clone)]
pub struct DeleteComment {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The request identifier.
    pub request_id: Uuid,
    /// The acting actor.
    pub actor_id: Uuid,
    /// The actor's capabilities.
    pub capabilities: CapabilitySet,
    /// The comment to withdraw.
    pub comment_id: Uuid,
    /// Stream version the caller last observed.
    pub expected_stream_version: Option<i64>,
}

impl Command for DeleteComment {
    fn command_type(&self) -> &'static str {
        "requests.delete_comment"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Uuid {
        self.actor_id
    }
}

/// Command for the assigned reviewer to mark one field as reviewed.
#[derive(Debug, Clone)]
pub struct ReviewField {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The request identifier.
    pub request_id: Uuid,
    /// The acting actor.
    pub actor_id: Uuid,
    /// The actor's capabilities.
    pub capabilities: CapabilitySet,
    /// The field key.
    pub field: String,
    /// Stream version the caller last observed.
    pub expected_stream_version: Option<i64>,
}

impl Command for ReviewField {
    fn command_type(&self) -> &'static str {
        "requests.review_field"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Uuid {
        self.actor_id
    }
}
