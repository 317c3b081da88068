//! Storage trait abstraction.

use async_trait::async_trait;
use cadence_core::{
    ActionId, ActionRecord, ContentTypeWeight, Day, FollowRecord, MetricsUpdate, PostFilter,
    PostId, PostRecord, WeeklyReport,
};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend unreachable or refused the request
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Query/update service behind the ledger, tracker, weighting and review.
///
/// Every call is an independent round trip. There are no transactions
/// spanning calls, and no cross-request lock.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Action ledger ===

    /// Insert an action unconditionally.
    async fn insert_action(&self, record: &ActionRecord) -> Result<()>;

    /// Delete an action. Deleting a missing row is not an error.
    async fn delete_action(&self, id: ActionId) -> Result<()>;

    /// List every action recorded against `day`.
    async fn list_actions_for_day(&self, day: Day) -> Result<Vec<ActionRecord>>;

    // === Follows ===

    /// Insert a follow.
    async fn insert_follow(&self, record: &FollowRecord) -> Result<()>;

    /// Count follows recorded against `day`.
    async fn count_follows_for_day(&self, day: Day) -> Result<usize>;

    // === Posts ===

    /// Insert a new post.
    async fn insert_post(&self, post: &PostRecord) -> Result<()>;

    /// Load a post by ID.
    async fn load_post(&self, id: PostId) -> Result<Option<PostRecord>>;

    /// Write only the metrics present in `update`.
    async fn update_post_metrics(&self, id: PostId, update: &MetricsUpdate) -> Result<()>;

    /// Set the performance score if, and only if, it is still unset.
    ///
    /// Returns whether the score was written.
    async fn set_performance_score(&self, id: PostId, score: u8) -> Result<bool>;

    /// List posts matching the filter, ordered by `posted_at` ascending.
    async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<PostRecord>>;

    // === Content-type weights ===

    /// Load the full weight set. Empty if never saved.
    async fn load_weights(&self) -> Result<Vec<ContentTypeWeight>>;

    /// Replace the full weight set.
    async fn save_weights(&self, weights: &[ContentTypeWeight]) -> Result<()>;

    // === Weekly reports ===

    /// Append a report to the history.
    async fn append_report(&self, report: &WeeklyReport) -> Result<()>;

    /// List reports, oldest first.
    async fn list_reports(&self) -> Result<Vec<WeeklyReport>>;
}

/// Apply a post filter to a full table, sorting and limiting as the
/// backends promise.
pub(crate) fn select_posts<'a>(
    posts: impl Iterator<Item = &'a PostRecord>,
    filter: &PostFilter,
) -> Vec<PostRecord> {
    let mut selected: Vec<PostRecord> = posts.filter(|p| filter.matches(p)).cloned().collect();
    selected.sort_by(|a, b| a.posted_at.cmp(&b.posted_at).then_with(|| a.id.cmp(&b.id)));
    if let Some(limit) = filter.limit {
        selected.truncate(limit);
    }
    selected
}
