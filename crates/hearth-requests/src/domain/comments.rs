//! Per-field review comments and their resolution.
//!
//! A comment is resolved once its field is edited after the comment was
//! made. "After" is measured by event sequence number, so resolution is
//! derived on read and never stored. Deleted comments leave the thread but
//! their ids stay reserved.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use hearth_core::error::DomainError;
use uuid::Uuid;

use super::fields::{PROSE_DISALLOWED, RequestKind, TextRule};

/// Sanitizer and bounds for comment text.
pub static COMMENT_TEXT: TextRule = TextRule::new(1, 500, &PROSE_DISALLOWED);

/// A reviewer comment on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewComment {
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
    /// Submission version the comment was made against.
    pub version: i64,
    /// Stream position of the comment event.
    pub sequence_number: i64,
    /// When the comment was made.
    pub created_at: DateTime<Utc>,
    /// When the text was last changed.
    pub edited_at: Option<DateTime<Utc>>,
}

/// The comments on a request plus the last edit position of each field.
#[derive(Debug, Clone, Default)]
pub struct CommentThread {
    comments: Vec<ReviewComment>,
    deleted: HashSet<Uuid>,
    last_edits: HashMap<String, i64>,
}

/// Sanitizes comment text and checks its bounds.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the sanitized text is out of bounds.
pub fn sanitize_comment_text(raw_text: &str) -> Result<String, DomainError> {
    let text = COMMENT_TEXT.sanitize(raw_text);
    if !COMMENT_TEXT.is_valid(&text) {
        return Err(DomainError::Validation(format!(
            "comment text must be between {} and {} characters",
            COMMENT_TEXT.min_len(),
            COMMENT_TEXT.max_len()
        )));
    }
    Ok(text)
}

impl CommentThread {
    /// Creates an empty thread.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a comment.
    pub fn record_comment(&mut self, comment: ReviewComment) {
        self.comments.push(comment);
    }

    /// Records that `field` was edited at `sequence_number`.
    pub fn record_edit(&mut self, field: &str, sequence_number: i64) {
        self.last_edits.insert(field.to_owned(), sequence_number);
    }

    /// Replaces a comment's text. Unknown ids are ignored.
    pub fn record_text_change(&mut self, comment_id: Uuid, text: &str, at: DateTime<Utc>) {
        if let Some(comment) = self.comments.iter_mut().find(|c| c.comment_id == comment_id) {
            comment.text = text.to_owned();
            comment.edited_at = Some(at);
        }
    }

    /// Removes a comment and reserves its id.
    pub fn record_deletion(&mut self, comment_id: Uuid) -> Option<ReviewComment> {
        self.deleted.insert(comment_id);
        let index = self.comments.iter().position(|c| c.comment_id == comment_id)?;
        Some(self.comments.remove(index))
    }

    /// Returns all live comments in the order they were made.
    #[must_use]
    pub fn comments(&self) -> &[ReviewComment] {
        &self.comments
    }

    /// Looks up a live comment by id.
    #[must_use]
    pub fn get(&self, comment_id: Uuid) -> Option<&ReviewComment> {
        self.comments.iter().find(|c| c.comment_id == comment_id)
    }

    /// Returns `true` if the comment's field was edited after the comment.
    #[must_use]
    pub fn is_resolved(&self, comment: &ReviewComment) -> bool {
        self.last_edits
            .get(&comment.field)
            .is_some_and(|&edited_at| edited_at > comment.sequence_number)
    }

    /// Counts live comments whose field has not been edited since.
    #[must_use]
    pub fn unresolved_count(&self) -> usize {
        self.comments.iter().filter(|c| !self.is_resolved(c)).count()
    }

    /// Returns `true` if `field` has a live, unresolved comment.
    #[must_use]
    pub fn has_unresolved_on(&self, field: &str) -> bool {
        self.comments
            .iter()
            .any(|c| c.field == field && !self.is_resolved(c))
    }

    /// Validates a new comment against the thread and returns its sanitized
    /// text.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for an unknown field, text outside
    /// the allowed bounds, or a reply on a different field.
    /// Returns `DomainError::Conflict` if the comment id is already used,
    /// including by a deleted comment.
    /// Returns `DomainError::AggregateNotFound` if the parent does not exist.
    pub fn prepare(
        &self,
        kind: RequestKind,
        comment_id: Uuid,
        field: &str,
        raw_text: &str,
        parent_id: Option<Uuid>,
    ) -> Result<String, DomainError> {
        kind.require_field(field)?;
        if self.get(comment_id).is_some() || self.deleted.contains(&comment_id) {
            return Err(DomainError::Conflict(format!(
                "comment {comment_id} already exists"
            )));
        }
        if let Some(parent_id) = parent_id {
            let parent = self
                .get(parent_id)
                .ok_or(DomainError::AggregateNotFound(parent_id))?;
            if parent.field != field {
                return Err(DomainError::Validation(format!(
                    "reply must be on field {:?}, the field of comment {parent_id}",
                    parent.field
                )));
            }
        }
        sanitize_comment_text(raw_text)
    }
}
