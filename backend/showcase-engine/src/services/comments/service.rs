use super::{CommentThreads, CommentTreeBuilder, ThreadReply, ThreadSummary};
use crate::sources::{CommentSource, FetchError};
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ThreadError {
    #[error("Failed to load comments: {0}")]
    Fetch(#[from] FetchError),

    #[error("Comment {0} is not part of any loaded thread")]
    UnknownComment(Uuid),
}

pub type Result<T> = std::result::Result<T, ThreadError>;

/// Loads comment threads per item and answers reply lookups
///
/// The last successfully built threads of every item are kept so reply
/// lookups keep working when a later reload fails. Memory grows with the
/// number of distinct items loaded; hosts release items they no longer show
/// with `forget`.
pub struct ThreadService {
    source: Arc<dyn CommentSource>,
    builder: CommentTreeBuilder,
    threads: DashMap<Uuid, Arc<CommentThreads>>,
    /// comment id -> item id
    owners: DashMap<Uuid, Uuid>,
}

impl ThreadService {
    pub fn new(source: Arc<dyn CommentSource>) -> Self {
        Self {
            source,
            builder: CommentTreeBuilder::new(),
            threads: DashMap::new(),
            owners: DashMap::new(),
        }
    }

    /// Fetch approved comments for an item and rebuild its threads
    pub async fn load_threads(&self, item_id: Uuid) -> Result<Arc<CommentThreads>> {
        let comments = match self.source.fetch_approved_comments(item_id).await {
            Ok(comments) => comments,
            Err(e) => {
                warn!(item_id = %item_id, error = %e, "Failed to fetch comments");
                return Err(e.into());
            }
        };

        let threads = Arc::new(self.builder.build_threads(comments));

        if let Some(previous) = self.threads.insert(item_id, Arc::clone(&threads)) {
            for comment_id in previous.comment_ids() {
                self.owners.remove_if(&comment_id, |_, owner| *owner == item_id);
            }
        }
        for comment_id in threads.comment_ids() {
            self.owners.insert(comment_id, item_id);
        }

        debug!(
            item_id = %item_id,
            comments = threads.len(),
            orphans = threads.orphans().len(),
            "Comment threads loaded"
        );

        Ok(threads)
    }

    /// Top-level comments of an item, freshly loaded
    pub async fn thread_summaries(&self, item_id: Uuid) -> Result<Vec<ThreadSummary>> {
        let threads = self.load_threads(item_id).await?;
        Ok(threads.top_level().to_vec())
    }

    /// All replies under a comment from its item's loaded threads
    pub fn replies(&self, comment_id: Uuid) -> Result<Vec<ThreadReply>> {
        let item_id = self
            .owners
            .get(&comment_id)
            .map(|entry| *entry.value())
            .ok_or(ThreadError::UnknownComment(comment_id))?;

        let threads = self
            .threads
            .get(&item_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(ThreadError::UnknownComment(comment_id))?;

        Ok(threads.replies_of(comment_id))
    }

    /// Last successfully loaded threads of an item
    pub fn cached_threads(&self, item_id: Uuid) -> Option<Arc<CommentThreads>> {
        self.threads
            .get(&item_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Drop an item's threads
    pub fn forget(&self, item_id: Uuid) -> bool {
        match self.threads.remove(&item_id) {
            Some((_, threads)) => {
                for comment_id in threads.comment_ids() {
                    self.owners.remove_if(&comment_id, |_, owner| *owner == item_id);
                }
                true
            }
            None => false,
        }
    }
}
