//! Command handlers for the request review context.
//!
//! This module contains application-level command handler functions that
//! orchestrate domain logic: load aggregate, execute command, persist events.
//! All events a command produces are appended in one call, so a history
//! snapshot, the edit it precedes, and any status change commit together or
//! not at all.

use hearth_core::aggregate::AggregateRoot;
use hearth_core::capability::CapabilitySet;
use hearth_core::clock::Clock;
use hearth_core::error::DomainError;
use hearth_core::event::{DomainEvent, EventMetadata};
use hearth_core::repository::{EventRepository, StoredEvent};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::aggregates::Request;
use crate::domain::commands::{
    AddComment, AdvanceStatus, CancelRequest, CreateRequest, DeleteComment, EditComment, EditField,
    ReviewField,
};
use crate::domain::events::{RequestEvent, RequestEventKind};
use crate::domain::status::RequestStatus;

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct RequestCommandResult {
    /// The aggregate ID affected by the command.
    pub aggregate_id: Uuid,
    /// The stored events produced and persisted.
    pub stored_events: Vec<StoredEvent>,
    /// Status after the command.
    pub status: RequestStatus,
    /// Submission version after the command.
    pub version: i64,
    /// Stream version after the command.
    pub stream_version: i64,
}

fn to_stored_event(event: &RequestEvent) -> StoredEvent {
    let meta = event.metadata();
    StoredEvent {
        event_id: meta.event_id,
        aggregate_id: meta.aggregate_id,
        event_type: event.event_type().to_owned(),
        payload: event.to_payload(),
        sequence_number: meta.sequence_number,
        correlation_id: meta.correlation_id,
        causation_id: meta.causation_id,
        occurred_at: meta.occurred_at,
    }
}

/// Reconstitutes a `Request` from stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub(crate) fn reconstitute(
    request_id: Uuid,
    existing_events: &[StoredEvent],
) -> Result<Request, DomainError> {
    let mut request = Request::new(request_id);
    for stored in existing_events {
        let kind: RequestEventKind =
            serde_json::from_value(stored.payload.clone()).map_err(|e| {
                DomainError::Infrastructure(format!("event deserialization failed: {e}"))
            })?;
        let event = RequestEvent {
            metadata: EventMetadata {
                event_id: stored.event_id,
                event_type: stored.event_type.clone(),
                aggregate_id: stored.aggregate_id,
                sequence_number: stored.sequence_number,
                correlation_id: stored.correlation_id,
                causation_id: stored.causation_id,
                occurred_at: stored.occurred_at,
            },
            kind,
        };
        request.apply(&event);
    }
    Ok(request)
}

/// Loads an existing request on behalf of an actor.
///
/// The actor's role is resolved before the expected stream version is
/// compared, so an actor with no role on the request gets `Forbidden` and
/// never learns the stream version.
async fn load_existing(
    request_id: Uuid,
    actor_id: Uuid,
    capabilities: &CapabilitySet,
    expected_stream_version: Option<i64>,
    repo: &dyn EventRepository,
) -> Result<Request, DomainError> {
    let existing_events = repo.load_events(request_id).await?;
    if existing_events.is_empty() {
        return Err(DomainError::AggregateNotFound(request_id));
    }
    let request = reconstitute(request_id, &existing_events)?;
    request.authorize(actor_id, capabilities)?;
    request.ensure_stream_version(expected_stream_version)?;
    Ok(request)
}

/// Appends the request's uncommitted events at its loaded stream version.
async fn persist(
    mut request: Request,
    repo: &dyn EventRepository,
) -> Result<RequestCommandResult, DomainError> {
    let stored_events: Vec<StoredEvent> = request
        .uncommitted_events()
        .iter()
        .map(to_stored_event)
        .collect();

    repo.append_events(request.id, request.version(), &stored_events)
        .await?;

    for event in request.uncommitted_events().to_vec() {
        request.apply(&event);
    }
    request.clear_uncommitted_events();
    debug!(
        request_id = %request.id,
        events = stored_events.len(),
        stream_version = request.version(),
        "request events persisted"
    );

    Ok(RequestCommandResult {
        aggregate_id: request.id,
        stored_events,
        status: request.status(),
        version: request.submission_version(),
        stream_version: request.version(),
    })
}

/// Handles the `CreateRequest` command: opens a new request with empty
/// content and persists the resulting event.
///
/// This is a CREATION command: the caller assigns the `request_id`.
///
/// # Errors
///
/// Returns `DomainError::Conflict` if the stream already exists.
/// Returns `DomainError` if event loading or appending fails.
pub async fn handle_create_request(
    command: &CreateRequest,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<RequestCommandResult, DomainError> {
    let existing_events = repo.load_events(command.request_id).await?;
    let mut request = reconstitute(command.request_id, &existing_events)?;

    request.create(command, clock)?;

    let result = persist(request, repo).await?;
    info!(
        request_id = %command.request_id,
        requester_id = %command.requester_id,
        kind = %command.kind,
        "request created"
    );
    Ok(result)
}

/// Handles the `EditField` command: loads the aggregate, snapshots and edits
/// the field, recomputes readiness, and persists the resulting events.
///
/// # Errors
///
/// Returns `DomainError` if the request is missing, the edit is not allowed
/// or invalid, the stream version is stale, or persistence fails.
pub async fn handle_edit_field(
    command: &EditField,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<RequestCommandResult, DomainError> {
    let mut request = load_existing(
        command.request_id,
        command.actor_id,
        &command.capabilities,
        command.expected_stream_version,
        repo,
    )
    .await?;

    request.edit_field(command, clock)?;

    let result = persist(request, repo).await?;
    info!(
        request_id = %command.request_id,
        field = %command.field,
        status = %result.status,
        "request field edited"
    );
    Ok(result)
}

/// Handles the `AdvanceStatus` command: loads the aggregate, resolves the
/// actor's forward edge, and persists the resulting events.
///
/// # Errors
///
/// Returns `DomainError` if the request is missing, the transition is not
/// allowed, the stream version is stale, or persistence fails.
pub async fn handle_advance_status(
    command: &AdvanceStatus,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<RequestCommandResult, DomainError> {
    let mut request = load_existing(
        command.request_id,
        command.actor_id,
        &command.capabilities,
        command.expected_stream_version,
        repo,
    )
    .await?;
    let from = request.status();

    request.advance(command, clock)?;

    let result = persist(request, repo).await?;
    info!(
        request_id = %command.request_id,
        actor_id = %command.actor_id,
        %from,
        to = %result.status,
        version = result.version,
        "request status advanced"
    );
    Ok(result)
}

/// Handles the `CancelRequest` command: loads the aggregate, resolves the
/// actor's withdraw edge, and persists the resulting events.
///
/// # Errors
///
/// Returns `DomainError` if the request is missing, the transition is not
/// allowed, the stream version is stale, or persistence fails.
pub async fn handle_cancel_request(
    command: &CancelRequest,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<RequestCommandResult, DomainError> {
    let mut request = load_existing(
        command.request_id,
        command.actor_id,
        &command.capabilities,
        command.expected_stream_version,
        repo,
    )
    .await?;
    let from = request.status();

    request.cancel(command, clock)?;

    let result = persist(request, repo).await?;
    info!(
        request_id = %command.request_id,
        actor_id = %command.actor_id,
        %from,
        to = %result.status,
        "request canceled"
    );
    Ok(result)
}

/// Handles the `AddComment` command: loads the aggregate, validates the
/// comment, and persists the resulting event.
///
/// # Errors
///
/// Returns `DomainError` if the request or parent comment is missing, the
/// actor is not the assigned reviewer, the request is not in review, the
/// comment is invalid, the stream version is stale, or persistence fails.
pub async fn handle_add_comment(
    command: &AddComment,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<RequestCommandResult, DomainError> {
    let mut request = load_existing(
        command.request_id,
        command.actor_id,
        &command.capabilities,
        command.expected_stream_version,
        repo,
    )
    .await?;

    request.add_comment(command, clock)?;

    let result = persist(request, repo).await?;
    info!(
        request_id = %command.request_id,
        comment_id = %command.comment_id,
        field = %command.field,
        "review comment added"
    );
    Ok(result)
}

/// Handles the `EditComment` command: loads the aggregate, rewrites the
/// comment's text, and persists the resulting event.
///
/// # Errors
///
/// Returns `DomainError` if the request or comment is missing, the actor is
/// not the comment's author and assigned reviewer, the request is not in
/// review, the text is invalid, the stream version is stale, or persistence
/// fails.
pub async fn handle_edit_comment(
    command: &EditComment,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<RequestCommandResult, DomainError> {
    let mut request = load_existing(
        command.request_id,
        command.actor_id,
        &command.capabilities,
        command.expected_stream_version,
        repo,
    )
    .await?;

    request.edit_comment(command, clock)?;

    let result = persist(request, repo).await?;
    info!(
        request_id = %command.request_id,
        comment_id = %command.comment_id,
        "review comment edited"
    );
    Ok(result)
}

/// Handles the `DeleteComment` command: loads the aggregate, withdraws the
/// comment, and persists the resulting events.
///
/// # Errors
///
/// Returns `DomainError` if the request or comment is missing, the actor is
/// not the comment's author and assigned reviewer, the request is not in
/// review, the stream version is stale, or persistence fails.
pub async fn handle_delete_comment(
    command: &DeleteComment,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<RequestCommandResult, DomainError> {
    let mut request = load_existing(
        command.request_id,
        command.actor_id,
        &command.capabilities,
        command.expected_stream_version,
        repo,
    )
    .await?;

    request.delete_comment(command, clock)?;

    let result = persist(request, repo).await?;
    info!(
        request_id = %command.request_id,
        comment_id = %command.comment_id,
        "review comment deleted"
    );
    Ok(result)
}

/// Handles the `ReviewField` command: loads the aggregate, records the
/// field's review status, and persists the resulting event.
///
/// # Errors
///
/// Returns `DomainError` if the request is missing, the actor is not the
/// assigned reviewer, the request is not in review, the field is unknown,
/// the stream version is stale, or persistence fails.
pub async fn handle_review_field(
    command: &ReviewField,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<RequestCommandResult, DomainError> {
    let mut request = load_existing(
        command.request_id,
        command.actor_id,
        &command.capabilities,
        command.expected_stream_version,
        repo,
    )
    .await?;

    request.review_field(command, clock)?;

    let result = persist(request, repo).await?;
    info!(
        request_id = %command.request_id,
        field = %command.field,
        "request field reviewed"
    );
    Ok(result)
}
