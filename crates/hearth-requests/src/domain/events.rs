//! Domain events for the request review context.

use hearth_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::content::RequestContent;
use super::field_review::FieldReviewStatus;
use super::fields::RequestKind;
use super::status::RequestStatus;

/// Event type identifier for [`RequestCreated`].
pub const REQUEST_CREATED_EVENT_TYPE: &str = "requests.request_created";
/// Event type identifier for [`ContentSnapshotted`].
pub const CONTENT_SNAPSHOTTED_EVENT_TYPE: &str = "requests.content_snapshotted";
/// Event type identifier for [`FieldEdited`].
pub const FIELD_EDITED_EVENT_TYPE: &str = "requests.field_edited";
/// Event type identifier for [`ReviewerAssigned`].
pub const REVIEWER_ASSIGNED_EVENT_TYPE: &str = "requests.reviewer_assigned";
/// Event type identifier for [`StatusChanged`].
pub const STATUS_CHANGED_EVENT_TYPE: &str = "requests.status_changed";
/// Event type identifier for [`CommentAdded`].
pub const COMMENT_ADDED_EVENT_TYPE: &str = "requests.comment_added";
/// Event type identifier for [`CommentEdited`].
pub const COMMENT_EDITED_EVENT_TYPE: &str = "requests.comment_edited";
/// Event type identifier for [`CommentDeleted`].
pub const COMMENT_DELETED_EVENT_TYPE: &str = "requests.comment_deleted";
/// Event type identifier for [`FieldReviewed`].
pub const FIELD_REVIEWED_EVENT_TYPE: &str = "requests.field_reviewed";

/// Emitted when a request is opened with empty content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestCreated {
    /// The request identifier.
    pub request_id: Uuid,
    /// The actor who owns the request.
    pub requester_id: Uuid,
    /// The request kind.
    pub kind: RequestKind,
}

/// Emitted before every content mutation with the content as it was.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSnapshotted {
    /// The request identifier.
    pub request_id: Uuid,
    /// Submission version at snapshot time.
    pub version: i64,
    /// The pre-mutation content.
    pub content: RequestContent,
    /// SHA-256 of the content's JSON encoding.
    pub content_hash: String,
}

/// Emitted when the owner changes a field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldEdited {
    /// The request identifier.
    pub request_id: Uuid,
    /// The edited field key.
    pub field: String,
    /// The sanitized new value.
    pub value: String,
    /// The actor who made the edit.
    pub editor_id: Uuid,
}

/// Emitted when a reviewer claims a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewerAssigned {
    /// The request identifier.
    pub request_id: Uuid,
    /// The claiming reviewer.
    pub reviewer_id: Uuid,
}

/// Emitted on every status change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChanged {
    /// The request identifier.
    pub request_id: Uuid,
    /// Status before the change.
    pub from: RequestStatus,
    /// Status after the change.
    pub to: RequestStatus,
    /// Submission version after the change.
    pub version: i64,
    /// The actor whose command caused the change.
    pub actor_id: Uuid,
}

/// Emitted when the assigned reviewer comments on a field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentAdded {
    /// The request identifier.
    pub request_id: Uuid,
    /// Caller-assigned comment identifier.
    pub comment_id: Uuid,
    /// The commented field.
    pub field: String,
    /// The reviewer who wrote it.
    pub author_id: Uuid,
    /// Sanitized comment text.
    pub text: String,
    /// The comment this one replies to.
    pub parent_id: Option<Uuid>,
}

/// Emitted when a comment's author rewrites its text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentEdited {
    /// The request identifier.
    pub request_id: Uuid,
    /// The edited comment.
    pub comment_id: Uuid,
    /// Sanitized replacement text.
    pub text: String,
    /// The reviewer who edited it.
    pub editor_id: Uuid,
}

/// Emitted when a comment's author withdraws it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentDeleted {
    /// The request identifier.
    pub request_id: Uuid,
    /// The deleted comment.
    pub comment_id: Uuid,
    /// The reviewer who deleted it.
    pub deleted_by: Uuid,
}

/// Emitted when a field's review status is set by the reviewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldReviewed {
    /// The request identifier.
    pub request_id: Uuid,
    /// The reviewed field key.
    pub field: String,
    /// The field's new review status.
    pub status: FieldReviewStatus,
    /// The assigned reviewer.
    pub reviewer_id: Uuid,
}

/// Event payload variants for the request review context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RequestEventKind {
    /// A request was opened.
    RequestCreated(RequestCreated),
    /// Content was snapshotted into history.
    ContentSnapshotted(ContentSnapshotted),
    /// A field was edited.
    FieldEdited(FieldEdited),
    /// A reviewer claimed the request.
    ReviewerAssigned(ReviewerAssigned),
    /// The request changed status.
    StatusChanged(StatusChanged),
    /// A review comment was added.
    CommentAdded(CommentAdded),
    /// A review comment was rewritten.
    CommentEdited(CommentEdited),
    /// A review comment was withdrawn.
    CommentDeleted(CommentDeleted),
    /// A field's review status changed.
    FieldReviewed(FieldReviewed),
}

/// Domain event envelope for the request review context.
#[derive(Debug, Clone)]
pub struct RequestEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: RequestEventKind,
}

impl RequestEventKind {
    /// Returns the stored event type for this payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RequestCreated(_) => REQUEST_CREATED_EVENT_TYPE,
            Self::ContentSnapshotted(_) => CONTENT_SNAPSHOTTED_EVENT_TYPE,
            Self::FieldEdited(_) => FIELD_EDITED_EVENT_TYPE,
            Self::ReviewerAssigned(_) => REVIEWER_ASSIGNED_EVENT_TYPE,
            Self::StatusChanged(_) => STATUS_CHANGED_EVENT_TYPE,
            Self::CommentAdded(_) => COMMENT_ADDED_EVENT_TYPE,
            Self::CommentEdited(_) => COMMENT_EDITED_EVENT_TYPE,
            Self::CommentDeleted(_) => COMMENT_DELETED_EVENT_TYPE,
            Self::FieldReviewed(_) => FIELD_REVIEWED_EVENT_TYPE,
        }
    }
}

impl DomainEvent for RequestEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("RequestEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
