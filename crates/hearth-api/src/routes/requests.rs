//! Routes for the request review workflow.

use axum::extract::{Path, Query, State};
use axum::{
    Json, Router,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use hearth_requests::application::command_handlers::{self, RequestCommandResult};
use hearth_requests::application::query_handlers::{
    self, CommentView, HistoryEntryView, RequestSummaryView, RequestView,
};
use hearth_requests::domain::commands;
use hearth_requests::domain::fields::RequestKind;
use hearth_requests::domain::status::RequestStatus;

use crate::actor::Actor;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateRequestBody {
    /// The kind of request to open.
    pub kind: RequestKind,
}

/// Request body for POST /{request_id}/fields/{field}.
#[derive(Debug, Deserialize)]
pub struct EditFieldBody {
    /// The raw field value.
    pub value: String,
    /// Stream version the caller last saw.
    #[serde(default)]
    pub expected_stream_version: Option<i64>,
}

/// Request body for POST /{request_id}/advance and /{request_id}/cancel.
#[derive(Debug, Default, Deserialize)]
pub struct TransitionBody {
    /// Stream version the caller last saw.
    #[serde(default)]
    pub expected_stream_version: Option<i64>,
}

/// Request body for POST /{request_id}/comments.
#[derive(Debug, Deserialize)]
pub struct AddCommentBody {
    /// Caller-assigned comment id. Generated when absent.
    #[serde(default)]
    pub comment_id: Option<Uuid>,
    /// The field being commented on.
    pub field: String,
    /// The raw comment text.
    pub text: String,
    /// The comment this one replies to.
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    /// Stream version the caller last saw.
    #[serde(default)]
    pub expected_stream_version: Option<i64>,
}

/// Request body for POST /{request_id}/comments/{comment_id}.
#[derive(Debug, Deserialize)]
pub struct EditCommentBody {
    /// The raw replacement text.
    pub text: String,
    /// Stream version the caller last saw.
    #[serde(default)]
    pub expected_stream_version: Option<i64>,
}

/// Query string for GET /.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Only list requests in this status.
    #[serde(default)]
    pub status: Option<RequestStatus>,
}

/// Response body returned after a command is successfully handled.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// The request the command applied to.
    pub request_id: Uuid,
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
    /// Status after the command.
    pub status: RequestStatus,
    /// Submission version after the command.
    pub version: i64,
    /// Stream version after the command.
    pub stream_version: i64,
}

impl From<RequestCommandResult> for CommandResponse {
    fn from(result: RequestCommandResult) -> Self {
        Self {
            request_id: result.aggregate_id,
            event_ids: result.stored_events.iter().map(|e| e.event_id).collect(),
            status: result.status,
            version: result.version,
            stream_version: result.stream_version,
        }
    }
}

/// POST /
#[instrument(skip(state, actor, request), fields(actor_id = %actor.id, kind = %request.kind))]
async fn create_request(
    State(state): State<AppState>,
    actor: Actor,
    Json(request): Json<CreateRequestBody>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::CreateRequest {
        correlation_id: Uuid::new_v4(),
        request_id: Uuid::new_v4(),
        requester_id: actor.id,
        kind: request.kind,
    };

    info!(correlation_id = %command.correlation_id, "handling create_request command");

    let result = command_handlers::handle_create_request(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(result.into()))
}

/// GET /
#[instrument(skip(state, actor), fields(actor_id = %actor.id))]
async fn list_for_review(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<RequestSummaryView>>, ApiError> {
    let requests = query_handlers::list_requests_for_review(
        actor.id,
        &actor.capabilities,
        query.status,
        &*state.event_repository,
    )
    .await?;
    Ok(Json(requests))
}

/// GET /mine
#[instrument(skip(state, actor), fields(actor_id = %actor.id))]
async fn list_mine(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<RequestSummaryView>>, ApiError> {
    let requests =
        query_handlers::list_requests_for_requester(actor.id, &*state.event_repository).await?;
    Ok(Json(requests))
}

/// GET /{request_id}
#[instrument(skip(state, actor), fields(actor_id = %actor.id))]
async fn get_request(
    State(state): State<AppState>,
    actor: Actor,
    Path(request_id): Path<Uuid>,
) -> Result<Json<RequestView>, ApiError> {
    let view = query_handlers::get_request_by_id(
        request_id,
        actor.id,
        &actor.capabilities,
        &*state.event_repository,
    )
    .await?;
    Ok(Json(view))
}

/// GET /{request_id}/history
#[instrument(skip(state, actor), fields(actor_id = %actor.id))]
async fn get_history(
    State(state): State<AppState>,
    actor: Actor,
    Path(request_id): Path<Uuid>,
) -> Result<Json<Vec<HistoryEntryView>>, ApiError> {
    let history = query_handlers::get_request_history(
        request_id,
        actor.id,
        &actor.capabilities,
        &*state.event_repository,
    )
    .await?;
    Ok(Json(history))
}

/// GET /{request_id}/comments
#[instrument(skip(state, actor), fields(actor_id = %actor.id))]
async fn get_comments(
    State(state): State<AppState>,
    actor: Actor,
    Path(request_id): Path<Uuid>,
) -> Result<Json<Vec<CommentView>>, ApiError> {
    let comments = query_handlers::get_request_comments(
        request_id,
        actor.id,
        &actor.capabilities,
        &*state.event_repository,
    )
    .await?;
    Ok(Json(comments))
}

/// POST /{request_id}/fields/{field}
#[instrument(skip(state, actor, request), fields(actor_id = %actor.id))]
async fn edit_field(
    State(state): State<AppState>,
    actor: Actor,
    Path((request_id, field)): Path<(Uuid, String)>,
    Json(request): Json<EditFieldBody>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::EditField {
        correlation_id: Uuid::new_v4(),
        request_id,
        actor_id: actor.id,
        capabilities: actor.capabilities,
        field,
        value: request.value,
        expected_stream_version: request.expected_stream_version,
    };

    info!(correlation_id = %command.correlation_id, "handling edit_field command");

    let result = command_handlers::handle_edit_field(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(result.into()))
}

/// POST /{request_id}/advance
#[instrument(skip(state, actor, request), fields(actor_id = %actor.id))]
async fn advance(
    State(state): State<AppState>,
    actor: Actor,
    Path(request_id): Path<Uuid>,
    Json(request): Json<TransitionBody>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::AdvanceStatus {
        correlation_id: Uuid::new_v4(),
        request_id,
        actor_id: actor.id,
        capabilities: actor.capabilities,
        expected_stream_version: request.expected_stream_version,
    };

    info!(correlation_id = %command.correlation_id, "handling advance_status command");

    let result = command_handlers::handle_advance_status(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(result.into()))
}

/// POST /{request_id}/cancel
#[instrument(skip(state, actor, request), fields(actor_id = %actor.id))]
async fn cancel(
    State(state): State<AppState>,
    actor: Actor,
    Path(request_id): Path<Uuid>,
    Json(request): Json<TransitionBody>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::CancelRequest {
        correlation_id: Uuid::new_v4(),
        request_id,
        actor_id: actor.id,
        capabilities: actor.capabilities,
        expected_stream_version: request.expected_stream_version,
    };

    info!(correlation_id = %command.correlation_id, "handling cancel_request command");

    let result = command_handlers::handle_cancel_request(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(result.into()))
}

/// POST /{request_id}/comments
#[instrument(skip(state, actor, request), fields(actor_id = %actor.id, field = %request.field))]
async fn add_comment(
    State(state): State<AppState>,
    actor: Actor,
    Path(request_id): Path<Uuid>,
    Json(request): Json<AddCommentBody>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::AddComment {
        correlation_id: Uuid::new_v4(),
        request_id,
        actor_id: actor.id,
        capabilities: actor.capabilities,
        comment_id: request.comment_id.unwrap_or_else(Uuid::new_v4),
        field: request.field,
        text: request.text,
        parent_id: request.parent_id,
        expected_stream_version: request.expected_stream_version,
    };

    info!(correlation_id = %command.correlation_id, "handling add_comment command");

    let result = command_handlers::handle_add_comment(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(result.into()))
}

/// POST /{request_id}/comments/{comment_id}
#[instrument(skip(state, actor, request), fields(actor_id = %actor.id))]
async fn edit_comment(
    State(state): State<AppState>,
    actor: Actor,
    Path((request_id, comment_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<EditCommentBody>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::EditComment {
        correlation_id: Uuid::new_v4(),
        request_id,
        actor_id: actor.id,
        capabilities: actor.capabilities,
        comment_id,
        text: request.text,
        expected_stream_version: request.expected_stream_version,
    };

    info!(correlation_id = %command.correlation_id, "handling edit_comment command");

    let result = command_handlers::handle_edit_comment(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(result.into()))
}

/// POST /{request_id}/comments/{comment_id}/delete
#[instrument(skip(state, actor, request), fields(actor_id = %actor.id))]
async fn delete_comment(
    State(state): State<AppState>,
    actor: Actor,
    Path((request_id, comment_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<TransitionBody>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::DeleteComment {
        correlation_id: Uuid::new_v4(),
        request_id,
        actor_id: actor.id,
        capabilities: actor.capabilities,
        comment_id,
        expected_stream_version: request.expected_stream_version,
    };

    info!(correlation_id = %command.correlation_id, "handling delete_comment command");

    let result = command_handlers::handle_delete_comment(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(result.into()))
}

/// POST /{request_id}/fields/{field}/review
#[instrument(skip(state, actor, request), fields(actor_id = %actor.id))]
async fn review_field(
    State(state): State<AppState>,
    actor: Actor,
    Path((request_id, field)): Path<(Uuid, String)>,
    Json(request): Json<TransitionBody>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::ReviewField {
        correlation_id: Uuid::new_v4(),
        request_id,
        actor_id: actor.id,
        capabilities: actor.capabilities,
        field,
        expected_stream_version: request.expected_stream_version,
    };

    info!(correlation_id = %command.correlation_id, "handling review_field command");

    let result = command_handlers::handle_review_field(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(result.into()))
}

/// Returns the router for the request review workflow.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_for_review).post(create_request))
        .route("/mine", get(list_mine))
        .route("/{request_id}", get(get_request))
        .route("/{request_id}/history", get(get_history))
        .route("/{request_id}/comments", get(get_comments).post(add_comment))
        .route("/{request_id}/comments/{comment_id}", post(edit_comment))
        .route("/{request_id}/comments/{comment_id}/delete", post(delete_comment))
        .route("/{request_id}/fields/{field}", post(edit_field))
        .route("/{request_id}/fields/{field}/review", post(review_field))
        .route("/{request_id}/advance", post(advance))
        .route("/{request_id}/cancel", post(cancel))
}
