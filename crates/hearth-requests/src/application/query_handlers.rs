//! Query handlers for the request review context.
//!
//! This module contains query handlers that reconstitute aggregates
//! from stored events and return read-only view DTOs. Reads are limited to
//! the requester and holders of the kind's reviewer capability. Listings
//! fold `RequestCreated` and `StatusChanged` events across every stream
//! instead of replaying whole aggregates.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use hearth_core::capability::CapabilitySet;
use hearth_core::error::DomainError;
use hearth_core::repository::EventRepository;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::application::command_handlers;
use crate::domain::aggregates::Request;
use crate::domain::content::RequestContent;
use crate::domain::events::{
    REQUEST_CREATED_EVENT_TYPE, RequestEventKind, STATUS_CHANGED_EVENT_TYPE,
};
use crate::domain::field_review::FieldReviewStatus;
use crate::domain::fields::RequestKind;
use crate::domain::status::RequestStatus;

/// Read-only view of one field of a request.
#[derive(Debug, Serialize)]
pub struct FieldView {
    /// Field key.
    pub key: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    /// Guidance shown to the author.
    pub description: &'static str,
    /// Current value.
    pub value: String,
    /// Whether the value passes the field's validity predicate.
    pub valid: bool,
    /// The reviewer's verdict on the field.
    pub review_status: FieldReviewStatus,
}

/// Read-only view of a request aggregate.
#[derive(Debug, Serialize)]
pub struct RequestView {
    /// The request identifier.
    pub request_id: Uuid,
    /// The owner.
    pub requester_id: Uuid,
    /// The request kind.
    pub kind: RequestKind,
    /// Title derived from content.
    pub title: String,
    /// Current status.
    pub status: RequestStatus,
    /// The recorded reviewer.
    pub reviewer_id: Option<Uuid>,
    /// Submission version.
    pub version: i64,
    /// Stream version (event count), the token for `expected_stream_version`.
    pub stream_version: i64,
    /// Whether every field is valid.
    pub ready: bool,
    /// First field, in declared order, that is not yet valid.
    pub next_incomplete_field: Option<&'static str>,
    /// Comments whose field has not been edited since.
    pub unresolved_comments: usize,
    /// Fields in declared order.
    pub fields: Vec<FieldView>,
    /// When the request was created.
    pub created_at: DateTime<Utc>,
    /// When the request last changed.
    pub updated_at: DateTime<Utc>,
}

/// Read-only view of a content snapshot.
#[derive(Debug, Serialize)]
pub struct HistoryEntryView {
    /// Stream position of the snapshot.
    pub sequence_number: i64,
    /// Submission version at snapshot time.
    pub version: i64,
    /// The snapshotted content.
    pub content: RequestContent,
    /// SHA-256 of the content's JSON encoding.
    pub content_hash: String,
    /// When the snapshot was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Read-only view of a review comment.
#[derive(Debug, Serialize)]
pub struct CommentView {
    /// Comment identifier.
    pub comment_id: Uuid,
    /// The commented field.
    pub field: String,
    /// The reviewer who wrote it.
    pub author_id: Uuid,
    /// Comment text.
    pub text: String,
    /// The comment this one replies to.
    pub parent_id: Option<Uuid>,
    /// Whether the field was edited after the comment.
    pub resolved: bool,
    /// When the comment was made.
    pub created_at: DateTime<Utc>,
    /// When the text was last changed.
    pub edited_at: Option<DateTime<Utc>>,
}

/// One row of a request listing.
#[derive(Debug, Clone, Serialize)]
pub struct RequestSummaryView {
    /// The request identifier.
    pub request_id: Uuid,
    /// The owner.
    pub requester_id: Uuid,
    /// The request kind.
    pub kind: RequestKind,
    /// Current status.
    pub status: RequestStatus,
    /// Submission version.
    pub version: i64,
    /// When the request was created.
    pub created_at: DateTime<Utc>,
    /// When the request last changed status.
    pub updated_at: DateTime<Utc>,
}

/// Statuses listed for reviewers when no filter is given.
pub const OPEN_STATUSES: [RequestStatus; 3] = [
    RequestStatus::Submitted,
    RequestStatus::InReview,
    RequestStatus::Reviewed,
];

async fn load_visible(
    request_id: Uuid,
    actor_id: Uuid,
    capabilities: &CapabilitySet,
    repo: &dyn EventRepository,
) -> Result<Request, DomainError> {
    let stored_events = repo.load_events(request_id).await?;
    if stored_events.is_empty() {
        return Err(DomainError::AggregateNotFound(request_id));
    }
    let request = command_handlers::reconstitute(request_id, &stored_events)?;
    if !request.is_visible_to(actor_id, capabilities) {
        return Err(DomainError::Forbidden(format!(
            "actor {actor_id} may not view request {request_id}"
        )));
    }
    Ok(request)
}

/// Retrieves a request by its aggregate ID.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID.
/// Returns `DomainError::Forbidden` if the actor may not view the request.
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub async fn get_request_by_id(
    request_id: Uuid,
    actor_id: Uuid,
    capabilities: &CapabilitySet,
    repo: &dyn EventRepository,
) -> Result<RequestView, DomainError> {
    let request = load_visible(request_id, actor_id, capabilities, repo).await?;
    let created_at = request
        .created_at()
        .ok_or(DomainError::AggregateNotFound(request_id))?;
    let content = request.content();
    let fields = request
        .kind()
        .fields()
        .iter()
        .map(|field| {
            let value = content.value(field.key).unwrap_or_default().to_owned();
            FieldView {
                key: field.key,
                label: field.label,
                description: field.description,
                valid: field.is_valid(&value),
                review_status: request.field_review_status(field.key),
                value,
            }
        })
        .collect();

    Ok(RequestView {
        request_id,
        requester_id: request.requester_id(),
        kind: request.kind(),
        title: content.title(),
        status: request.status(),
        reviewer_id: request.reviewer_id(),
        version: request.submission_version(),
        stream_version: request.version,
        ready: content.is_ready(),
        next_incomplete_field: content.next_incomplete_field().map(|f| f.key),
        unresolved_comments: request.unresolved_comment_count(),
        fields,
        created_at,
        updated_at: request.updated_at().unwrap_or(created_at),
    })
}

/// Retrieves the content snapshots of a request, oldest first.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID.
/// Returns `DomainError::Forbidden` if the actor may not view the request.
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub async fn get_request_history(
    request_id: Uuid,
    actor_id: Uuid,
    capabilities: &CapabilitySet,
    repo: &dyn EventRepository,
) -> Result<Vec<HistoryEntryView>, DomainError> {
    let request = load_visible(request_id, actor_id, capabilities, repo).await?;
    Ok(request
        .history()
        .iter()
        .map(|entry| HistoryEntryView {
            sequence_number: entry.sequence_number,
            version: entry.version,
            content: entry.content.clone(),
            content_hash: entry.content_hash.clone(),
            recorded_at: entry.recorded_at,
        })
        .collect())
}

/// Retrieves the review comments of a request in the order they were made.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID.
/// Returns `DomainError::Forbidden` if the actor may not view the request.
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub async fn get_request_comments(
    request_id: Uuid,
    actor_id: Uuid,
    capabilities: &CapabilitySet,
    repo: &dyn EventRepository,
) -> Result<Vec<CommentView>, DomainError> {
    let request = load_visible(request_id, actor_id, capabilities, repo).await?;
    let thread = request.comments();
    Ok(thread
        .comments()
        .iter()
        .map(|comment| CommentView {
            comment_id: comment.comment_id,
            field: comment.field.clone(),
            author_id: comment.author_id,
            text: comment.text.clone(),
            parent_id: comment.parent_id,
            resolved: thread.is_resolved(comment),
            created_at: comment.created_at,
            edited_at: comment.edited_at,
        })
        .collect())
}

/// Folds creation and status events into one summary per request, oldest
/// request first.
async fn load_summaries(
    repo: &dyn EventRepository,
) -> Result<Vec<RequestSummaryView>, DomainError> {
    let stored_events = repo
        .load_events_by_type(&[REQUEST_CREATED_EVENT_TYPE, STATUS_CHANGED_EVENT_TYPE])
        .await?;
    let mut summaries: HashMap<Uuid, RequestSummaryView> = HashMap::new();
    for stored in &stored_events {
        let kind: RequestEventKind =
            serde_json::from_value(stored.payload.clone()).map_err(|e| {
                DomainError::Infrastructure(format!("event deserialization failed: {e}"))
            })?;
        match kind {
            RequestEventKind::RequestCreated(payload) => {
                summaries.insert(
                    stored.aggregate_id,
                    RequestSummaryView {
                        request_id: stored.aggregate_id,
                        requester_id: payload.requester_id,
                        kind: payload.kind,
                        status: RequestStatus::Incomplete,
                        version: 0,
                        created_at: stored.occurred_at,
                        updated_at: stored.occurred_at,
                    },
                );
            }
            RequestEventKind::StatusChanged(payload) => {
                if let Some(summary) = summaries.get_mut(&stored.aggregate_id) {
                    summary.status = payload.to;
                    summary.version = payload.version;
                    summary.updated_at = stored.occurred_at;
                } else {
                    warn!(
                        request_id = %stored.aggregate_id,
                        "status change for a request with no creation event"
                    );
                }
            }
            _ => {}
        }
    }
    let mut summaries: Vec<RequestSummaryView> = summaries.into_values().collect();
    summaries.sort_by_key(|s| (s.created_at, s.request_id));
    Ok(summaries)
}

/// Lists requests awaiting staff attention for a reviewer.
///
/// With `status` set, only requests in that status are listed; otherwise
/// every request in one of [`OPEN_STATUSES`]. Only kinds the actor holds the
/// reviewer capability for are included.
///
/// # Errors
///
/// Returns `DomainError::Forbidden` if the actor reviews no request kind.
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn list_requests_for_review(
    actor_id: Uuid,
    capabilities: &CapabilitySet,
    status: Option<RequestStatus>,
    repo: &dyn EventRepository,
) -> Result<Vec<RequestSummaryView>, DomainError> {
    let reviewable: Vec<RequestKind> = RequestKind::ALL
        .iter()
        .copied()
        .filter(|kind| capabilities.has(kind.reviewer_capability()))
        .collect();
    if reviewable.is_empty() {
        return Err(DomainError::Forbidden(format!(
            "actor {actor_id} does not review any request kind"
        )));
    }
    Ok(load_summaries(repo)
        .await?
        .into_iter()
        .filter(|s| reviewable.contains(&s.kind))
        .filter(|s| match status {
            Some(status) => s.status == status,
            None => OPEN_STATUSES.contains(&s.status),
        })
        .collect())
}

/// Lists the actor's own requests, leaving out archived and canceled ones.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn list_requests_for_requester(
    actor_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<Vec<RequestSummaryView>, DomainError> {
    Ok(load_summaries(repo)
        .await?
        .into_iter()
        .filter(|s| s.requester_id == actor_id)
        .filter(|s| !matches!(s.status, RequestStatus::Archived | RequestStatus::Canceled))
        .collect())
}
