// ============================================
// Upstream collaborators
// ============================================
//
// The data/storage service and the view-tracking service live outside this
// crate. They are consumed through these traits so the engine can be driven
// by any backend (and by fakes in tests).

use crate::models::{Comment, ContentItem};
use async_trait::async_trait;
use feed_cache::FeedFilter;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    #[error("Upstream request timed out")]
    Timeout,

    #[error("Upstream rejected request: {0}")]
    Rejected(String),
}

/// Source of recent content items
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Most recent items matching `filter`, newest first, at most `limit`
    async fn fetch_recent_items(
        &self,
        filter: &FeedFilter,
        limit: usize,
    ) -> Result<Vec<ContentItem>, FetchError>;
}

/// Source of moderated comments
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentSource: Send + Sync {
    /// Approved comments for an item, in any order
    async fn fetch_approved_comments(&self, item_id: Uuid) -> Result<Vec<Comment>, FetchError>;
}

/// View-tracking service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ViewTracker: Send + Sync {
    /// Returns whether the view was newly recorded
    async fn track_view(&self, item_id: Uuid) -> Result<bool, FetchError>;
}
