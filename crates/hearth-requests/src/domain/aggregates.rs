//! Aggregate root for the request review context.

use chrono::{DateTime, Utc};
use hearth_core::aggregate::AggregateRoot;
use hearth_core::capability::CapabilitySet;
use hearth_core::clock::Clock;
use hearth_core::error::DomainError;
use hearth_core::event::EventMetadata;
use tracing::warn;
use uuid::Uuid;

use super::comments::{self, CommentThread, ReviewComment};
use super::commands::{
    AddComment, AdvanceStatus, CancelRequest, CreateRequest, DeleteComment, EditComment, EditField,
    ReviewField,
};
use super::content::RequestContent;
use super::events::{
    CommentAdded, CommentDeleted, CommentEdited, ContentSnapshotted, FieldEdited, FieldReviewed,
    RequestCreated, RequestEvent, RequestEventKind, ReviewerAssigned, StatusChanged,
};
use super::field_review::{FieldReviewStatus, FieldReviews};
use super::fields::RequestKind;
use super::history::HistoryEntry;
use super::status::RequestStatus;
use super::transitions::{self, ActorRole, Intent, TransitionContext};

/// The aggregate root for a request.
#[derive(Debug)]
pub struct Request {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Stream version (event count).
    pub(crate) version: i64,
    requester_id: Uuid,
    kind: RequestKind,
    status: RequestStatus,
    reviewer_id: Option<Uuid>,
    /// Incremented once per accepted submission.
    submission_version: i64,
    content: RequestContent,
    comments: CommentThread,
    field_reviews: FieldReviews,
    history: Vec<HistoryEntry>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<RequestEvent>,
}

impl Request {
    /// Creates an empty aggregate ready to be created or replayed.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        let kind = RequestKind::CharacterApplication;
        Self {
            id,
            version: 0,
            requester_id: Uuid::nil(),
            kind,
            status: RequestStatus::Incomplete,
            reviewer_id: None,
            submission_version: 0,
            content: RequestContent::empty(kind),
            comments: CommentThread::new(),
            field_reviews: FieldReviews::new(),
            history: Vec::new(),
            created_at: None,
            updated_at: None,
            uncommitted_events: Vec::new(),
        }
    }

    /// Returns the requester.
    #[must_use]
    pub fn requester_id(&self) -> Uuid {
        self.requester_id
    }

    /// Returns the request kind.
    #[must_use]
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> RequestStatus {
        self.status
    }

    /// Returns the recorded reviewer, if any.
    #[must_use]
    pub fn reviewer_id(&self) -> Option<Uuid> {
        self.reviewer_id
    }

    /// Returns the submission version.
    #[must_use]
    pub fn submission_version(&self) -> i64 {
        self.submission_version
    }

    /// Returns the current content.
    #[must_use]
    pub fn content(&self) -> &RequestContent {
        &self.content
    }

    /// Returns the comment thread.
    #[must_use]
    pub fn comments(&self) -> &CommentThread {
        &self.comments
    }

    /// Returns the review status of `field`.
    #[must_use]
    pub fn field_review_status(&self, field: &str) -> FieldReviewStatus {
        self.field_reviews.status(field)
    }

    /// Returns content snapshots, oldest first.
    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Returns when the request was created.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Returns when the request last changed.
    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Counts comments whose field has not been edited since.
    #[must_use]
    pub fn unresolved_comment_count(&self) -> usize {
        self.comments.unresolved_count()
    }

    /// Resolves the actor's role on this request.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Forbidden` if the actor is neither the requester
    /// nor a reviewer of the request's kind.
    pub fn authorize(
        &self,
        actor_id: Uuid,
        capabilities: &CapabilitySet,
    ) -> Result<ActorRole, DomainError> {
        ActorRole::resolve(actor_id, capabilities, self.requester_id, self.kind)
    }

    /// Returns `true` if the actor may read this request.
    #[must_use]
    pub fn is_visible_to(&self, actor_id: Uuid, capabilities: &CapabilitySet) -> bool {
        self.authorize(actor_id, capabilities).is_ok()
    }

    /// Fails unless the request has been created.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` for a request with no history.
    pub fn ensure_exists(&self) -> Result<(), DomainError> {
        if self.created_at.is_none() {
            return Err(DomainError::AggregateNotFound(self.id));
        }
        Ok(())
    }

    /// Fails if the caller observed a different stream version.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` on mismatch.
    pub fn ensure_stream_version(&self, expected: Option<i64>) -> Result<(), DomainError> {
        match expected {
            Some(expected) if expected != self.version => Err(DomainError::ConcurrencyConflict {
                aggregate_id: self.id,
                expected,
                actual: self.version,
            }),
            _ => Ok(()),
        }
    }

    /// Returns the next sequence number for a new event.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn record(&mut self, kind: RequestEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        let event = RequestEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: kind.event_type().to_owned(),
                aggregate_id: self.id,
                sequence_number: self.next_sequence_number(),
                correlation_id,
                causation_id: correlation_id,
                occurred_at: clock.now(),
            },
            kind,
        };
        self.uncommitted_events.push(event);
    }

    fn record_status_change(
        &mut self,
        to: RequestStatus,
        version: i64,
        actor_id: Uuid,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) {
        let from = self.status;
        self.record(
            RequestEventKind::StatusChanged(StatusChanged {
                request_id: self.id,
                from,
                to,
                version,
                actor_id,
            }),
            correlation_id,
            clock,
        );
    }

    /// Opens the request with empty content, producing a `RequestCreated`
    /// event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` if the stream already has events.
    pub fn create(&mut self, command: &CreateRequest, clock: &dyn Clock) -> Result<(), DomainError> {
        if self.version > 0 || self.created_at.is_some() {
            return Err(DomainError::Conflict(format!(
                "request {} already exists",
                self.id
            )));
        }
        self.record(
            RequestEventKind::RequestCreated(RequestCreated {
                request_id: self.id,
                requester_id: command.requester_id,
                kind: command.kind,
            }),
            command.correlation_id,
            clock,
        );
        Ok(())
    }

    /// Sets one field, producing a `ContentSnapshotted` event with the prior
    /// content, a `FieldEdited` event, and a `StatusChanged` event when the
    /// edit changes readiness.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the request does not exist.
    /// Returns `DomainError::Forbidden` unless the owner edits in an editable
    /// status.
    /// Returns `DomainError::Validation` for an unknown field or invalid value.
    pub fn edit_field(&mut self, command: &EditField, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_exists()?;
        let role = self.authorize(command.actor_id, &command.capabilities)?;
        if role != ActorRole::Owner {
            return Err(DomainError::Forbidden(
                "only the requester may edit a request".to_owned(),
            ));
        }
        if !self.status.is_editable() {
            return Err(DomainError::Forbidden(format!(
                "request is {} and cannot be edited",
                self.status
            )));
        }

        let field = self.kind.require_field(&command.field)?;
        let value = field.sanitize(&command.value);
        field.validate(&value)?;
        let mut edited = self.content.clone();
        edited.set(field.key, value.clone())?;

        self.record(
            RequestEventKind::ContentSnapshotted(ContentSnapshotted {
                request_id: self.id,
                version: self.submission_version,
                content_hash: self.content.content_hash(),
                content: self.content.clone(),
            }),
            command.correlation_id,
            clock,
        );
        self.record(
            RequestEventKind::FieldEdited(FieldEdited {
                request_id: self.id,
                field: field.key.to_owned(),
                value,
                editor_id: command.actor_id,
            }),
            command.correlation_id,
            clock,
        );
        if let Some(to) = transitions::readiness_transition(self.status, edited.is_ready()) {
            self.record_status_change(
                to,
                self.submission_version,
                command.actor_id,
                command.correlation_id,
                clock,
            );
        }
        Ok(())
    }

    /// Moves the request along its forward edge.
    ///
    /// # Errors
    ///
    /// See [`transitions::resolve`]; also `DomainError::AggregateNotFound`.
    pub fn advance(&mut self, command: &AdvanceStatus, clock: &dyn Clock) -> Result<(), DomainError> {
        self.transition(
            Intent::Advance,
            command.actor_id,
            &command.capabilities,
            command.correlation_id,
            clock,
        )
    }

    /// Withdraws the request (owner) or declines a submission (reviewer).
    ///
    /// # Errors
    ///
    /// See [`transitions::resolve`]; also `DomainError::AggregateNotFound`.
    pub fn cancel(&mut self, command: &CancelRequest, clock: &dyn Clock) -> Result<(), DomainError> {
        self.transition(
            Intent::Cancel,
            command.actor_id,
            &command.capabilities,
            command.correlation_id,
            clock,
        )
    }

    fn transition(
        &mut self,
        intent: Intent,
        actor_id: Uuid,
        capabilities: &CapabilitySet,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_exists()?;
        let role = self.authorize(actor_id, capabilities)?;
        let ctx = TransitionContext {
            actor_id,
            reviewer_id: self.reviewer_id,
            unresolved_comments: self.comments.unresolved_count(),
            content_ready: self.content.is_ready(),
        };
        let to = transitions::resolve(self.status, intent, role, &ctx)?;

        if to == RequestStatus::InReview && self.reviewer_id != Some(actor_id) {
            self.record(
                RequestEventKind::ReviewerAssigned(ReviewerAssigned {
                    request_id: self.id,
                    reviewer_id: actor_id,
                }),
                correlation_id,
                clock,
            );
        }
        let version = if to == RequestStatus::Submitted {
            self.submission_version + 1
        } else {
            self.submission_version
        };
        self.record_status_change(to, version, actor_id, correlation_id, clock);
        Ok(())
    }

    /// Adds a review comment on a field, producing a `CommentAdded` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the request or the parent
    /// comment does not exist.
    /// Returns `DomainError::Forbidden` unless the actor is the assigned
    /// reviewer.
    /// Returns `DomainError::Conflict` unless the request is in review, or if
    /// the comment id is taken.
    /// Returns `DomainError::Validation` for an unknown field, bad text, or a
    /// reply on a different field.
    pub fn add_comment(&mut self, command: &AddComment, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_assigned_reviewer(command.actor_id, &command.capabilities, "comment")?;
        let text = self.comments.prepare(
            self.kind,
            command.comment_id,
            &command.field,
            &command.text,
            command.parent_id,
        )?;

        self.record(
            RequestEventKind::CommentAdded(CommentAdded {
                request_id: self.id,
                comment_id: command.comment_id,
                field: command.field.clone(),
                author_id: command.actor_id,
                text,
                parent_id: command.parent_id,
            }),
            command.correlation_id,
            clock,
        );
        Ok(())
    }

    /// Rewrites a comment's text, producing a `CommentEdited` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the request or comment does
    /// not exist.
    /// Returns `DomainError::Forbidden` unless the actor is the assigned
    /// reviewer and wrote the comment during the current submission.
    /// Returns `DomainError::Conflict` unless the request is in review.
    /// Returns `DomainError::Validation` for text outside the allowed bounds.
    pub fn edit_comment(
        &mut self,
        command: &EditComment,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_assigned_reviewer(command.actor_id, &command.capabilities, "comment")?;
        self.own_current_comment(command.comment_id, command.actor_id)?;
        let text = comments::sanitize_comment_text(&command.text)?;

        self.record(
            RequestEventKind::CommentEdited(CommentEdited {
                request_id: self.id,
                comment_id: command.comment_id,
                text,
                editor_id: command.actor_id,
            }),
            command.correlation_id,
            clock,
        );
        Ok(())
    }

    /// Withdraws a comment, producing a `CommentDeleted` event. A `Reviewed`
    /// field left with no unresolved comments becomes `Approved` in the same
    /// batch.
    ///
    /// # Errors
    ///
    /// Same as [`Request::edit_comment`], minus the text check.
    pub fn delete_comment(
        &mut self,
        command: &DeleteComment,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_assigned_reviewer(command.actor_id, &command.capabilities, "comment")?;
        let field = self
            .own_current_comment(command.comment_id, command.actor_id)?
            .field
            .clone();
        let still_open = self.comments.comments().iter().any(|c| {
            c.comment_id != command.comment_id
                && c.field == field
                && !self.comments.is_resolved(c)
        });

        self.record(
            RequestEventKind::CommentDeleted(CommentDeleted {
                request_id: self.id,
                comment_id: command.comment_id,
                deleted_by: command.actor_id,
            }),
            command.correlation_id,
            clock,
        );
        if self.field_reviews.status(&field) == FieldReviewStatus::Reviewed && !still_open {
            self.record(
                RequestEventKind::FieldReviewed(FieldReviewed {
                    request_id: self.id,
                    field,
                    status: FieldReviewStatus::Approved,
                    reviewer_id: command.actor_id,
                }),
                command.correlation_id,
                clock,
            );
        }
        Ok(())
    }

    /// Marks one field as reviewed, producing a `FieldReviewed` event. The
    /// field becomes `Reviewed` if it carries unresolved comments and
    /// `Approved` otherwise.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the request does not exist.
    /// Returns `DomainError::Forbidden` unless the actor is the assigned
    /// reviewer.
    /// Returns `DomainError::Conflict` unless the request is in review.
    /// Returns `DomainError::Validation` for an unknown field.
    pub fn review_field(
        &mut self,
        command: &ReviewField,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_assigned_reviewer(command.actor_id, &command.capabilities, "review")?;
        let field = self.kind.require_field(&command.field)?;
        let status = FieldReviewStatus::verdict(self.comments.has_unresolved_on(field.key));

        self.record(
            RequestEventKind::FieldReviewed(FieldReviewed {
                request_id: self.id,
                field: field.key.to_owned(),
                status,
                reviewer_id: command.actor_id,
            }),
            command.correlation_id,
            clock,
        );
        Ok(())
    }

    /// Fails unless the actor is the reviewer assigned to a request that is
    /// in review.
    fn ensure_assigned_reviewer(
        &self,
        actor_id: Uuid,
        capabilities: &CapabilitySet,
        action: &str,
    ) -> Result<(), DomainError> {
        self.ensure_exists()?;
        let role = self.authorize(actor_id, capabilities)?;
        if role != ActorRole::Reviewer {
            return Err(DomainError::Forbidden(format!(
                "only the assigned reviewer may {action}"
            )));
        }
        if self.status != RequestStatus::InReview {
            return Err(DomainError::Conflict(format!(
                "request is {} and is not open for review",
                self.status
            )));
        }
        if self.reviewer_id != Some(actor_id) {
            return Err(DomainError::Forbidden(format!(
                "only the assigned reviewer may {action}"
            )));
        }
        Ok(())
    }

    /// Looks up a comment the actor wrote against the current submission.
    fn own_current_comment(
        &self,
        comment_id: Uuid,
        actor_id: Uuid,
    ) -> Result<&ReviewComment, DomainError> {
        let comment = self
            .comments
            .get(comment_id)
            .ok_or(DomainError::AggregateNotFound(comment_id))?;
        if comment.author_id != actor_id {
            return Err(DomainError::Forbidden(format!(
                "only the author may change comment {comment_id}"
            )));
        }
        if comment.version != self.submission_version {
            return Err(DomainError::Forbidden(format!(
                "comment {comment_id} belongs to an earlier submission"
            )));
        }
        Ok(comment)
    }
}

impl AggregateRoot for Request {
    type Event = RequestEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        let meta = &event.metadata;
        match &event.kind {
            RequestEventKind::RequestCreated(payload) => {
                self.requester_id = payload.requester_id;
                self.kind = payload.kind;
                self.status = RequestStatus::Incomplete;
                self.content = RequestContent::empty(payload.kind);
                self.created_at = Some(meta.occurred_at);
            }
            RequestEventKind::ContentSnapshotted(payload) => {
                self.history.push(HistoryEntry {
                    sequence_number: meta.sequence_number,
                    version: payload.version,
                    content: payload.content.clone(),
                    content_hash: payload.content_hash.clone(),
                    recorded_at: meta.occurred_at,
                });
            }
            RequestEventKind::FieldEdited(payload) => {
                if let Err(err) = self.content.set(&payload.field, payload.value.clone()) {
                    warn!(request_id = %self.id, %err, "skipping edit to unknown field");
                }
                self.comments
                    .record_edit(&payload.field, meta.sequence_number);
                self.field_reviews.reset(&payload.field);
            }
            RequestEventKind::ReviewerAssigned(payload) => {
                self.reviewer_id = Some(payload.reviewer_id);
            }
            RequestEventKind::StatusChanged(payload) => {
                self.status = payload.to;
                self.submission_version = payload.version;
            }
            RequestEventKind::CommentAdded(payload) => {
                self.comments.record_comment(ReviewComment {
                    comment_id: payload.comment_id,
                    field: payload.field.clone(),
                    author_id: payload.author_id,
                    text: payload.text.clone(),
                    parent_id: payload.parent_id,
                    version: self.submission_version,
                    sequence_number: meta.sequence_number,
                    created_at: meta.occurred_at,
                    edited_at: None,
                });
            }
            RequestEventKind::CommentEdited(payload) => {
                self.comments
                    .record_text_change(payload.comment_id, &payload.text, meta.occurred_at);
            }
            RequestEventKind::CommentDeleted(payload) => {
                if self.comments.record_deletion(payload.comment_id).is_none() {
                    warn!(
                        request_id = %self.id,
                        comment_id = %payload.comment_id,
                        "deleted comment was not in the thread"
                    );
                }
            }
            RequestEventKind::FieldReviewed(payload) => {
                self.field_reviews.set(&payload.field, payload.status);
            }
        }
        self.updated_at = Some(meta.occurred_at);
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::aggregate::AggregateRoot;
    use hearth_core::event::DomainEvent;
    use hearth_test_support::FixedClock;

    use crate::domain::content::tests::complete_content;
    use crate::domain::events::{
        COMMENT_ADDED_EVENT_TYPE, COMMENT_DELETED_EVENT_TYPE, COMMENT_EDITED_EVENT_TYPE,
        CONTENT_SNAPSHOTTED_EVENT_TYPE, FIELD_EDITED_EVENT_TYPE, FIELD_REVIEWED_EVENT_TYPE,
        REQUEST_CREATED_EVENT_TYPE, REVIEWER_ASSIGNED_EVENT_TYPE, STATUS_CHANGED_EVENT_TYPE,
    };
    use crate::domain::fields::{REVIEW_CHARACTER_APPLICATIONS, RequestKind};

    fn commit(request: &mut Request) {
        for event in request.uncommitted_events().to_vec() {
            request.apply(&event);
        }
        request.clear_uncommitted_events();
    }

    fn reviewer_caps() -> CapabilitySet {
        [REVIEW_CHARACTER_APPLICATIONS].into_iter().collect()
    }

    fn created(owner: Uuid, clock: &FixedClock) -> Request {
        let mut request = Request::new(Uuid::new_v4());
        request
            .create(
                &CreateRequest {
                    correlation_id: Uuid::new_v4(),
                    request_id: request.id,
                    requester_id: owner,
                    kind: RequestKind::CharacterApplication,
                },
                clock,
            )
            .unwrap();
        commit(&mut request);
        request
    }

    fn edit(actor_id: Uuid, caps: CapabilitySet, field: &str, value: &str) -> EditField {
        EditField {
            correlation_id: Uuid::new_v4(),
            request_id: Uuid::nil(),
            actor_id,
            capabilities: caps,
            field: field.to_owned(),
            value: value.to_owned(),
            expected_stream_version: None,
        }
    }

    fn advance(actor_id: Uuid, caps: CapabilitySet) -> AdvanceStatus {
        AdvanceStatus {
            correlation_id: Uuid::new_v4(),
            request_id: Uuid::nil(),
            actor_id,
            capabilities: caps,
            expected_stream_version: None,
        }
    }

    fn cancel(actor_id: Uuid, caps: CapabilitySet) -> CancelRequest {
        CancelRequest {
            correlation_id: Uuid::new_v4(),
            request_id: Uuid::nil(),
            actor_id,
            capabilities: caps,
            expected_stream_version: None,
        }
    }

    fn comment(actor_id: Uuid, field: &str, text: &str) -> AddComment {
        AddComment {
            correlation_id: Uuid::new_v4(),
            request_id: Uuid::nil(),
            actor_id,
            capabilities: reviewer_caps(),
            comment_id: Uuid::new_v4(),
            field: field.to_owned(),
            text: text.to_owned(),
            parent_id: None,
            expected_stream_version: None,
        }
    }

    fn edit_comment(actor_id: Uuid, comment_id: Uuid, text: &str) -> EditComment {
        EditComment {
            correlation_id: Uuid::new_v4(),
            request_id: Uuid::nil(),
            actor_id,
            capabilities: reviewer_caps(),
            comment_id,
            text: text.to_owned(),
            expected_stream_version: None,
        }
    }

    fn delete_comment(actor_id: Uuid, comment_id: Uuid) -> DeleteComment {
        DeleteComment {
            correlation_id: Uuid::new_v4(),
            request_id: Uuid::nil(),
            actor_id,
            capabilities: reviewer_caps(),
            comment_id,
            expected_stream_version: None,
        }
    }

    fn review(actor_id: Uuid, caps: CapabilitySet, field: &str) -> ReviewField {
        ReviewField {
            correlation_id: Uuid::new_v4(),
            request_id: Uuid::nil(),
            actor_id,
            capabilities: caps,
            field: field.to_owned(),
            expected_stream_version: None,
        }
    }

    /// Adds and commits a comment, returning its id.
    fn commented(request: &mut Request, reviewer: Uuid, field: &str, clock: &FixedClock) -> Uuid {
        let command = comment(reviewer, field, "Please revise this.");
        request.add_comment(&command, clock).unwrap();
        commit(request);
        command.comment_id
    }

    fn ready(owner: Uuid, clock: &FixedClock) -> Request {
        let mut request = created(owner, clock);
        let content = complete_content();
        for field in RequestKind::CharacterApplication.fields() {
            let value = content.value(field.key).unwrap();
            request
                .edit_field(&edit(owner, CapabilitySet::new(), field.key, value), clock)
                .unwrap();
            commit(&mut request);
        }
        request
    }

    fn in_review(owner: Uuid, reviewer: Uuid, clock: &FixedClock) -> Request {
        let mut request = ready(owner, clock);
        request
            .advance(&advance(owner, CapabilitySet::new()), clock)
            .unwrap();
        commit(&mut request);
        request
            .advance(&advance(reviewer, reviewer_caps()), clock)
            .unwrap();
        commit(&mut request);
        request
    }

    #[test]
    fn test_create_produces_request_created_event() {
        // Arrange
        let clock = FixedClock::default_instant();
        let request_id = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();
        let mut request = Request::new(request_id);

        // Act
        request
            .create(
                &CreateRequest {
                    correlation_id,
                    request_id,
                    requester_id: owner,
                    kind: RequestKind::CharacterApplication,
                },
                &clock,
            )
            .unwrap();

        // Assert
        let events = request.uncommitted_events();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.event_type(), REQUEST_CREATED_EVENT_TYPE);
        let meta = event.metadata();
        assert_eq!(meta.aggregate_id, request_id);
        assert_eq!(meta.sequence_number, 1);
        assert_eq!(meta.correlation_id, correlation_id);
        assert_eq!(meta.causation_id, correlation_id);
        assert_eq!(meta.occurred_at, clock.0);
        match &event.kind {
            RequestEventKind::RequestCreated(payload) => {
                assert_eq!(payload.request_id, request_id);
                assert_eq!(payload.requester_id, owner);
            }
            other => panic!("expected RequestCreated, got {other:?}"),
        }
    }

    #[test]
    fn test_new_request_starts_incomplete_with_empty_content() {
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();

        let request = created(owner, &clock);

        assert_eq!(request.status(), RequestStatus::Incomplete);
        assert_eq!(request.submission_version(), 0);
        assert_eq!(request.reviewer_id(), None);
        assert_eq!(request.requester_id(), owner);
        assert_eq!(
            request.content(),
            &RequestContent::empty(RequestKind::CharacterApplication)
        );
        assert_eq!(request.version(), 1);
    }

    #[test]
    fn test_create_twice_is_conflict() {
        let clock = FixedClock::default_instant();
        let mut request = created(Uuid::new_v4(), &clock);

        let result = request.create(
            &CreateRequest {
                correlation_id: Uuid::new_v4(),
                request_id: request.id,
                requester_id: Uuid::new_v4(),
                kind: RequestKind::CharacterApplication,
            },
            &clock,
        );

        match result.unwrap_err() {
            DomainError::Conflict(msg) => assert!(msg.contains("already exists")),
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_edit_on_missing_request_is_not_found() {
        let clock = FixedClock::default_instant();
        let mut request = Request::new(Uuid::new_v4());

        let result = request.edit_field(
            &edit(Uuid::new_v4(), CapabilitySet::new(), "name", "Test"),
            &clock,
        );

        match result.unwrap_err() {
            DomainError::AggregateNotFound(id) => assert_eq!(id, request.id),
            other => panic!("expected AggregateNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_edit_field_snapshots_then_edits() {
        // Arrange
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let mut request = created(owner, &clock);

        // Act
        request
            .edit_field(
                &edit(owner, CapabilitySet::new(), "name", "Ta1ren!"),
                &clock,
            )
            .unwrap();

        // Assert
        let events = request.uncommitted_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type(), CONTENT_SNAPSHOTTED_EVENT_TYPE);
        assert_eq!(events[0].metadata().sequence_number, 2);
        assert_eq!(events[1].event_type(), FIELD_EDITED_EVENT_TYPE);
        assert_eq!(events[1].metadata().sequence_number, 3);
        match &events[0].kind {
            RequestEventKind::ContentSnapshotted(payload) => {
                assert_eq!(payload.version, 0);
                assert_eq!(
                    payload.content,
                    RequestContent::empty(RequestKind::CharacterApplication)
                );
                assert_eq!(payload.content_hash, payload.content.content_hash());
            }
            other => panic!("expected ContentSnapshotted, got {other:?}"),
        }
        match &events[1].kind {
            RequestEventKind::FieldEdited(payload) => {
                assert_eq!(payload.field, "name");
                assert_eq!(payload.value, "Taren");
                assert_eq!(payload.editor_id, owner);
            }
            other => panic!("expected FieldEdited, got {other:?}"),
        }

        commit(&mut request);
        assert_eq!(request.content().value("name"), Some("Taren"));
        assert_eq!(request.history().len(), 1);
        assert_eq!(request.status(), RequestStatus::Incomplete);
    }

    #[test]
    fn test_edit_with_invalid_value_is_validation_error_and_records_nothing() {
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let mut request = created(owner, &clock);

        let result = request.edit_field(&edit(owner, CapabilitySet::new(), "name", "Al"), &clock);

        match result.unwrap_err() {
            DomainError::Validation(msg) => assert!(msg.contains("name")),
            other => panic!("expected Validation, got {other:?}"),
        }
        assert!(request.uncommitted_events().is_empty());
    }

    #[test]
    fn test_edit_unknown_field_is_validation_error() {
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let mut request = created(owner, &clock);

        let result = request.edit_field(
            &edit(owner, CapabilitySet::new(), "eye_color", "Green"),
            &clock,
        );

        match result.unwrap_err() {
            DomainError::Validation(msg) => assert!(msg.contains("eye_color")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_reviewer_may_not_edit() {
        let clock = FixedClock::default_instant();
        let mut request = created(Uuid::new_v4(), &clock);

        let result = request.edit_field(
            &edit(Uuid::new_v4(), reviewer_caps(), "name", "Test"),
            &clock,
        );

        match result.unwrap_err() {
            DomainError::Forbidden(_) => {}
            other => panic!("expected Forbidden, got {other:?}"),
        }
        assert!(request.uncommitted_events().is_empty());
    }

    #[test]
    fn test_completing_last_field_transitions_to_ready() {
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();

        let request = ready(owner, &clock);

        assert_eq!(request.status(), RequestStatus::Ready);
        assert!(request.content().is_ready());
        assert_eq!(request.history().len(), 5);
    }

    #[test]
    fn test_invalid_edit_on_ready_request_keeps_it_ready_and_unchanged() {
        // Arrange
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let mut request = ready(owner, &clock);
        let before = request.content().clone();

        // Act
        let gender = request.edit_field(&edit(owner, CapabilitySet::new(), "gender", "Other"), &clock);
        let backstory = request.edit_field(
            &edit(owner, CapabilitySet::new(), "backstory", &"a".repeat(499)),
            &clock,
        );

        // Assert
        assert!(matches!(gender, Err(DomainError::Validation(_))));
        assert!(matches!(backstory, Err(DomainError::Validation(_))));
        assert!(request.uncommitted_events().is_empty());
        assert_eq!(request.status(), RequestStatus::Ready);
        assert_eq!(request.content(), &before);
        assert!(request.content().is_ready());
    }

    #[test]
    fn test_valid_edit_on_ready_request_stays_ready() {
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let mut request = ready(owner, &clock);

        request
            .edit_field(&edit(owner, CapabilitySet::new(), "name", "Abc!!d"), &clock)
            .unwrap();

        let events = request.uncommitted_events();
        assert_eq!(events.len(), 2);
        assert!(
            !events
                .iter()
                .any(|e| e.event_type() == STATUS_CHANGED_EVENT_TYPE)
        );
        commit(&mut request);
        assert_eq!(request.status(), RequestStatus::Ready);
        assert_eq!(request.content().value("name"), Some("Abcd"));
    }

    #[test]
    fn test_submit_increments_version_once() {
        // Arrange
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let mut request = ready(owner, &clock);

        // Act
        request
            .advance(&advance(owner, CapabilitySet::new()), &clock)
            .unwrap();

        // Assert
        let events = request.uncommitted_events();
        assert_eq!(events.len(), 1);
        match &events[0].kind {
            RequestEventKind::StatusChanged(payload) => {
                assert_eq!(payload.from, RequestStatus::Ready);
                assert_eq!(payload.to, RequestStatus::Submitted);
                assert_eq!(payload.version, 1);
                assert_eq!(payload.actor_id, owner);
            }
            other => panic!("expected StatusChanged, got {other:?}"),
        }
        commit(&mut request);
        assert_eq!(request.status(), RequestStatus::Submitted);
        assert_eq!(request.submission_version(), 1);
    }

    #[test]
    fn test_claim_assigns_reviewer() {
        // Arrange
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let reviewer = Uuid::new_v4();
        let mut request = ready(owner, &clock);
        request
            .advance(&advance(owner, CapabilitySet::new()), &clock)
            .unwrap();
        commit(&mut request);

        // Act
        request
            .advance(&advance(reviewer, reviewer_caps()), &clock)
            .unwrap();

        // Assert
        let events = request.uncommitted_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type(), REVIEWER_ASSIGNED_EVENT_TYPE);
        assert_eq!(events[1].event_type(), STATUS_CHANGED_EVENT_TYPE);
        commit(&mut request);
        assert_eq!(request.status(), RequestStatus::InReview);
        assert_eq!(request.reviewer_id(), Some(reviewer));
        assert_eq!(request.submission_version(), 1);
    }

    #[test]
    fn test_comment_requires_assigned_reviewer() {
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let reviewer = Uuid::new_v4();
        let mut request = in_review(owner, reviewer, &clock);

        let result = request.add_comment(&comment(Uuid::new_v4(), "name", "Hmm."), &clock);

        match result.unwrap_err() {
            DomainError::Forbidden(msg) => assert!(msg.contains("assigned reviewer")),
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }

    #[test]
    fn test_comment_outside_review_is_conflict() {
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let mut request = ready(owner, &clock);

        let result = request.add_comment(&comment(Uuid::new_v4(), "name", "Hmm."), &clock);

        match result.unwrap_err() {
            DomainError::Conflict(msg) => assert!(msg.contains("ready")),
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_owner_may_not_comment() {
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let reviewer = Uuid::new_v4();
        let mut request = in_review(owner, reviewer, &clock);

        let result = request.add_comment(&comment(owner, "name", "Hmm."), &clock);

        match result.unwrap_err() {
            DomainError::Forbidden(_) => {}
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }

    #[test]
    fn test_review_with_comment_returns_request_to_owner() {
        // Arrange
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let reviewer = Uuid::new_v4();
        let mut request = in_review(owner, reviewer, &clock);
        request
            .add_comment(&comment(reviewer, "name", "Please pick another name."), &clock)
            .unwrap();
        assert_eq!(
            request.uncommitted_events()[0].event_type(),
            COMMENT_ADDED_EVENT_TYPE
        );
        commit(&mut request);
        assert_eq!(request.unresolved_comment_count(), 1);

        // Act
        request
            .advance(&advance(reviewer, reviewer_caps()), &clock)
            .unwrap();
        commit(&mut request);

        // Assert
        assert_eq!(request.status(), RequestStatus::Reviewed);
        assert_eq!(request.reviewer_id(), Some(reviewer));
    }

    #[test]
    fn test_editing_commented_field_resolves_comment() {
        // Arrange
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let reviewer = Uuid::new_v4();
        let mut request = in_review(owner, reviewer, &clock);
        request
            .add_comment(&comment(reviewer, "name", "Please pick another name."), &clock)
            .unwrap();
        commit(&mut request);
        request
            .advance(&advance(reviewer, reviewer_caps()), &clock)
            .unwrap();
        commit(&mut request);

        // Act
        request
            .edit_field(&edit(owner, CapabilitySet::new(), "name", "Other"), &clock)
            .unwrap();
        commit(&mut request);

        // Assert
        assert_eq!(request.unresolved_comment_count(), 0);
        assert_eq!(request.status(), RequestStatus::Reviewed);
        let comment = &request.comments().comments()[0];
        assert!(request.comments().is_resolved(comment));
    }

    #[test]
    fn test_review_without_comments_approves() {
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let reviewer = Uuid::new_v4();
        let mut request = in_review(owner, reviewer, &clock);

        request
            .advance(&advance(reviewer, reviewer_caps()), &clock)
            .unwrap();
        commit(&mut request);

        assert_eq!(request.status(), RequestStatus::Approved);
        assert!(request.status().is_terminal());
    }

    #[test]
    fn test_reviewer_declines_submission() {
        // Arrange
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let reviewer = Uuid::new_v4();
        let mut request = ready(owner, &clock);
        request
            .advance(&advance(owner, CapabilitySet::new()), &clock)
            .unwrap();
        commit(&mut request);

        // Act
        request
            .cancel(&cancel(reviewer, reviewer_caps()), &clock)
            .unwrap();
        commit(&mut request);
        request
            .advance(&advance(owner, CapabilitySet::new()), &clock)
            .unwrap();
        commit(&mut request);

        // Assert
        assert_eq!(request.status(), RequestStatus::Archived);
    }

    #[test]
    fn test_owner_cancel_then_any_transition_is_forbidden() {
        // Arrange
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let mut request = created(owner, &clock);
        request
            .cancel(&cancel(owner, CapabilitySet::new()), &clock)
            .unwrap();
        commit(&mut request);
        let version = request.version();

        // Act
        let again = request.cancel(&cancel(owner, CapabilitySet::new()), &clock);
        let edit_result =
            request.edit_field(&edit(owner, CapabilitySet::new(), "name", "Test"), &clock);

        // Assert
        assert_eq!(request.status(), RequestStatus::Canceled);
        match again.unwrap_err() {
            DomainError::Forbidden(_) => {}
            other => panic!("expected Forbidden, got {other:?}"),
        }
        match edit_result.unwrap_err() {
            DomainError::Forbidden(msg) => assert!(msg.contains("canceled")),
            other => panic!("expected Forbidden, got {other:?}"),
        }
        assert!(request.uncommitted_events().is_empty());
        assert_eq!(request.version(), version);
    }

    #[test]
    fn test_stranger_is_forbidden_everywhere() {
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let mut request = ready(owner, &clock);

        let edit_result =
            request.edit_field(&edit(stranger, CapabilitySet::new(), "name", "Test"), &clock);
        let advance_result = request.advance(&advance(stranger, CapabilitySet::new()), &clock);

        assert!(matches!(edit_result, Err(DomainError::Forbidden(_))));
        assert!(matches!(advance_result, Err(DomainError::Forbidden(_))));
        assert!(request.uncommitted_events().is_empty());
        assert_eq!(request.history().len(), 5);
    }

    #[test]
    fn test_ensure_stream_version() {
        let clock = FixedClock::default_instant();
        let request = created(Uuid::new_v4(), &clock);

        assert!(request.ensure_stream_version(None).is_ok());
        assert!(request.ensure_stream_version(Some(1)).is_ok());
        match request.ensure_stream_version(Some(7)).unwrap_err() {
            DomainError::ConcurrencyConflict {
                expected, actual, ..
            } => {
                assert_eq!(expected, 7);
                assert_eq!(actual, 1);
            }
            other => panic!("expected ConcurrencyConflict, got {other:?}"),
        }
    }

    #[test]
    fn test_visibility() {
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let request = created(owner, &clock);

        assert!(request.is_visible_to(owner, &CapabilitySet::new()));
        assert!(request.is_visible_to(Uuid::new_v4(), &reviewer_caps()));
        assert!(!request.is_visible_to(Uuid::new_v4(), &CapabilitySet::new()));
    }

    #[test]
    fn test_edit_comment_resanitizes_and_replaces_text() {
        // Arrange
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let reviewer = Uuid::new_v4();
        let mut request = in_review(owner, reviewer, &clock);
        let comment_id = commented(&mut request, reviewer, "name", &clock);

        // Act
        request
            .edit_comment(&edit_comment(reviewer, comment_id, "Pick <b>another</b> name."), &clock)
            .unwrap();

        // Assert
        let events = request.uncommitted_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), COMMENT_EDITED_EVENT_TYPE);
        commit(&mut request);
        let edited = request.comments().get(comment_id).unwrap();
        assert_eq!(edited.text, "Pick banotherb name.");
        assert_eq!(edited.edited_at, Some(clock.0));
        assert_eq!(request.unresolved_comment_count(), 1);
    }

    #[test]
    fn test_edit_comment_with_empty_text_is_validation_error() {
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let reviewer = Uuid::new_v4();
        let mut request = in_review(owner, reviewer, &clock);
        let comment_id = commented(&mut request, reviewer, "name", &clock);

        let result = request.edit_comment(&edit_comment(reviewer, comment_id, "<>"), &clock);

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(request.uncommitted_events().is_empty());
    }

    #[test]
    fn test_edit_unknown_comment_is_not_found() {
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let reviewer = Uuid::new_v4();
        let mut request = in_review(owner, reviewer, &clock);
        let missing = Uuid::new_v4();

        let result = request.edit_comment(&edit_comment(reviewer, missing, "Hmm."), &clock);

        match result.unwrap_err() {
            DomainError::AggregateNotFound(id) => assert_eq!(id, missing),
            other => panic!("expected AggregateNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_only_assigned_reviewer_may_change_comment() {
        // Arrange
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let reviewer = Uuid::new_v4();
        let mut request = in_review(owner, reviewer, &clock);
        let comment_id = commented(&mut request, reviewer, "name", &clock);
        let other_reviewer = Uuid::new_v4();

        // Act
        let edited = request.edit_comment(&edit_comment(other_reviewer, comment_id, "Mine."), &clock);
        let deleted = request.delete_comment(&delete_comment(other_reviewer, comment_id), &clock);
        let by_owner = request.delete_comment(
            &DeleteComment {
                capabilities: CapabilitySet::new(),
                ..delete_comment(owner, comment_id)
            },
            &clock,
        );

        // Assert
        assert!(matches!(edited, Err(DomainError::Forbidden(_))));
        assert!(matches!(deleted, Err(DomainError::Forbidden(_))));
        assert!(matches!(by_owner, Err(DomainError::Forbidden(_))));
        assert!(request.uncommitted_events().is_empty());
    }

    #[test]
    fn test_deleted_comment_no_longer_blocks_approval() {
        // Arrange
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let reviewer = Uuid::new_v4();
        let mut request = in_review(owner, reviewer, &clock);
        let comment_id = commented(&mut request, reviewer, "name", &clock);
        assert_eq!(request.unresolved_comment_count(), 1);

        // Act
        request
            .delete_comment(&delete_comment(reviewer, comment_id), &clock)
            .unwrap();
        assert_eq!(
            request.uncommitted_events()[0].event_type(),
            COMMENT_DELETED_EVENT_TYPE
        );
        commit(&mut request);
        request
            .advance(&advance(reviewer, reviewer_caps()), &clock)
            .unwrap();
        commit(&mut request);

        // Assert
        assert_eq!(request.unresolved_comment_count(), 0);
        assert!(request.comments().comments().is_empty());
        assert_eq!(request.status(), RequestStatus::Approved);
    }

    #[test]
    fn test_comment_outside_review_cannot_be_deleted() {
        // Arrange
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let reviewer = Uuid::new_v4();
        let mut request = in_review(owner, reviewer, &clock);
        let comment_id = commented(&mut request, reviewer, "name", &clock);
        request
            .advance(&advance(reviewer, reviewer_caps()), &clock)
            .unwrap();
        commit(&mut request);

        // Act
        let result = request.delete_comment(&delete_comment(reviewer, comment_id), &clock);

        // Assert
        match result.unwrap_err() {
            DomainError::Conflict(msg) => assert!(msg.contains("reviewed")),
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_comment_from_earlier_submission_cannot_be_changed() {
        // Arrange
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let reviewer = Uuid::new_v4();
        let mut request = in_review(owner, reviewer, &clock);
        let comment_id = commented(&mut request, reviewer, "name", &clock);
        request
            .advance(&advance(reviewer, reviewer_caps()), &clock)
            .unwrap();
        commit(&mut request);
        request
            .edit_field(&edit(owner, CapabilitySet::new(), "gender", "Female"), &clock)
            .unwrap();
        commit(&mut request);
        for actor in [owner, owner] {
            request
                .advance(&advance(actor, CapabilitySet::new()), &clock)
                .unwrap();
            commit(&mut request);
        }
        request
            .advance(&advance(reviewer, reviewer_caps()), &clock)
            .unwrap();
        commit(&mut request);
        assert_eq!(request.status(), RequestStatus::InReview);
        assert_eq!(request.submission_version(), 2);

        // Act
        let result = request.edit_comment(&edit_comment(reviewer, comment_id, "Still."), &clock);

        // Assert
        match result.unwrap_err() {
            DomainError::Forbidden(msg) => assert!(msg.contains("earlier submission")),
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }

    #[test]
    fn test_review_field_without_comments_approves_it() {
        // Arrange
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let reviewer = Uuid::new_v4();
        let mut request = in_review(owner, reviewer, &clock);
        assert_eq!(
            request.field_review_status("name"),
            FieldReviewStatus::NotReviewed
        );

        // Act
        request
            .review_field(&review(reviewer, reviewer_caps(), "name"), &clock)
            .unwrap();

        // Assert
        assert_eq!(
            request.uncommitted_events()[0].event_type(),
            FIELD_REVIEWED_EVENT_TYPE
        );
        commit(&mut request);
        assert_eq!(request.field_review_status("name"), FieldReviewStatus::Approved);
        assert_eq!(
            request.field_review_status("gender"),
            FieldReviewStatus::NotReviewed
        );
    }

    #[test]
    fn test_review_field_with_comment_marks_it_reviewed() {
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let reviewer = Uuid::new_v4();
        let mut request = in_review(owner, reviewer, &clock);
        commented(&mut request, reviewer, "name", &clock);

        request
            .review_field(&review(reviewer, reviewer_caps(), "name"), &clock)
            .unwrap();
        commit(&mut request);

        assert_eq!(request.field_review_status("name"), FieldReviewStatus::Reviewed);
    }

    #[test]
    fn test_review_field_requires_assigned_reviewer_and_known_field() {
        // Arrange
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let reviewer = Uuid::new_v4();
        let mut request = in_review(owner, reviewer, &clock);

        // Act
        let by_owner = request.review_field(&review(owner, CapabilitySet::new(), "name"), &clock);
        let by_other =
            request.review_field(&review(Uuid::new_v4(), reviewer_caps(), "name"), &clock);
        let unknown = request.review_field(&review(reviewer, reviewer_caps(), "eye_color"), &clock);

        // Assert
        assert!(matches!(by_owner, Err(DomainError::Forbidden(_))));
        assert!(matches!(by_other, Err(DomainError::Forbidden(_))));
        assert!(matches!(unknown, Err(DomainError::Validation(_))));
        assert!(request.uncommitted_events().is_empty());
    }

    #[test]
    fn test_review_field_outside_review_is_conflict() {
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let mut request = ready(owner, &clock);

        let result = request.review_field(&review(Uuid::new_v4(), reviewer_caps(), "name"), &clock);

        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[test]
    fn test_deleting_last_comment_on_reviewed_field_approves_it() {
        // Arrange
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let reviewer = Uuid::new_v4();
        let mut request = in_review(owner, reviewer, &clock);
        let first = commented(&mut request, reviewer, "name", &clock);
        let second = commented(&mut request, reviewer, "name", &clock);
        request
            .review_field(&review(reviewer, reviewer_caps(), "name"), &clock)
            .unwrap();
        commit(&mut request);

        // Act
        request
            .delete_comment(&delete_comment(reviewer, first), &clock)
            .unwrap();
        let after_first: Vec<&str> = request
            .uncommitted_events()
            .iter()
            .map(DomainEvent::event_type)
            .collect();
        assert_eq!(after_first, vec![COMMENT_DELETED_EVENT_TYPE]);
        commit(&mut request);
        let still_reviewed = request.field_review_status("name");
        request
            .delete_comment(&delete_comment(reviewer, second), &clock)
            .unwrap();
        let after_second: Vec<&str> = request
            .uncommitted_events()
            .iter()
            .map(DomainEvent::event_type)
            .collect();
        commit(&mut request);

        // Assert
        assert_eq!(still_reviewed, FieldReviewStatus::Reviewed);
        assert_eq!(
            after_second,
            vec![COMMENT_DELETED_EVENT_TYPE, FIELD_REVIEWED_EVENT_TYPE]
        );
        assert_eq!(request.field_review_status("name"), FieldReviewStatus::Approved);
    }

    #[test]
    fn test_editing_field_resets_its_review_status() {
        // Arrange
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let reviewer = Uuid::new_v4();
        let mut request = in_review(owner, reviewer, &clock);
        commented(&mut request, reviewer, "name", &clock);
        for field in ["name", "gender"] {
            request
                .review_field(&review(reviewer, reviewer_caps(), field), &clock)
                .unwrap();
            commit(&mut request);
        }
        request
            .advance(&advance(reviewer, reviewer_caps()), &clock)
            .unwrap();
        commit(&mut request);

        // Act
        request
            .edit_field(&edit(owner, CapabilitySet::new(), "name", "Other"), &clock)
            .unwrap();
        commit(&mut request);

        // Assert
        assert_eq!(
            request.field_review_status("name"),
            FieldReviewStatus::NotReviewed
        );
        assert_eq!(request.field_review_status("gender"), FieldReviewStatus::Approved);
    }

    #[test]
    fn test_authorize_resolves_role_before_anything_else() {
        let clock = FixedClock::default_instant();
        let owner = Uuid::new_v4();
        let request = created(owner, &clock);

        assert_eq!(
            request.authorize(owner, &CapabilitySet::new()).unwrap(),
            ActorRole::Owner
        );
        assert_eq!(
            request.authorize(Uuid::new_v4(), &reviewer_caps()).unwrap(),
            ActorRole::Reviewer
        );
        assert!(matches!(
            request.authorize(Uuid::new_v4(), &CapabilitySet::new()),
            Err(DomainError::Forbidden(_))
        ));
    }
}
