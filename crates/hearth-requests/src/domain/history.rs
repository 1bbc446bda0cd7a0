//! Content history snapshots.

use chrono::{DateTime, Utc};

use super::content::RequestContent;

/// Immutable copy of a request's content taken before a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Stream position of the snapshot event.
    pub sequence_number: i64,
    /// Submission version at snapshot time.
    pub version: i64,
    /// The content as it was before the mutation.
    pub content: RequestContent,
    /// SHA-256 of the content's JSON encoding.
    pub content_hash: String,
    /// When the snapshot was recorded.
    pub recorded_at: DateTime<Utc>,
}
