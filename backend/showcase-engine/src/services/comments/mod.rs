// ============================================
// Comment Threads
// ============================================
//
// Rebuilds reply threads from a flat list of approved comments that only
// carry a parent pointer.
//
// - Top-level comments are ordered by likes + replies (newest first on ties)
// - Replies of any comment are all of its transitive descendants, oldest first
// - Each reply is tagged with its direct parent's display name
// - Replies whose parent is missing (e.g. removed by moderation) stay
//   addressable by id but never show up under another comment

pub mod service;

pub use service::{ThreadError, ThreadService};

use crate::models::Comment;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, warn};
use uuid::Uuid;

/// A top-level comment with its thread metrics
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadSummary {
    pub comment: Comment,
    /// likes_count + reply_count
    pub engagement: u64,
    /// Transitive replies found in the loaded comments
    pub descendant_count: usize,
}

/// A reply inside a thread
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadReply {
    pub comment: Comment,
    /// Display name of the direct parent, for "replying to @X"
    pub replying_to: Option<String>,
}

/// Builds `CommentThreads` from flat comment lists
#[derive(Debug, Clone, Copy, Default)]
pub struct CommentTreeBuilder;

impl CommentTreeBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build_threads(&self, comments: Vec<Comment>) -> CommentThreads {
        CommentThreads::build(comments)
    }
}

/// Indexed thread view over one item's comments
#[derive(Debug, Clone, Default)]
pub struct CommentThreads {
    comments: HashMap<Uuid, Comment>,
    children: HashMap<Uuid, Vec<Uuid>>,
    replying_to: HashMap<Uuid, String>,
    top_level: Vec<ThreadSummary>,
    orphans: Vec<Uuid>,
}

impl CommentThreads {
    fn build(comments: Vec<Comment>) -> Self {
        let mut threads = CommentThreads::default();

        for comment in comments {
            if threads.comments.contains_key(&comment.id) {
                warn!(comment_id = %comment.id, "Duplicate comment id, keeping first");
                continue;
            }
            threads.comments.insert(comment.id, comment);
        }

        let mut top_level_ids = Vec::new();
        for comment in threads.comments.values() {
            let Some(parent_id) = comment.parent_id else {
                top_level_ids.push(comment.id);
                continue;
            };

            match threads.comments.get(&parent_id) {
                Some(parent) => {
                    threads
                        .children
                        .entry(parent_id)
                        .or_default()
                        .push(comment.id);
                    threads
                        .replying_to
                        .insert(comment.id, parent.author.display_name.clone());
                }
                None => threads.orphans.push(comment.id),
            }
        }

        let mut top_level: Vec<ThreadSummary> = top_level_ids
            .into_iter()
            .filter_map(|id| threads.comments.get(&id))
            .map(|comment| ThreadSummary {
                comment: comment.clone(),
                engagement: comment.engagement(),
                descendant_count: threads.descendants(comment.id).len(),
            })
            .collect();

        top_level.sort_by(|a, b| {
            b.engagement
                .cmp(&a.engagement)
                .then_with(|| b.comment.created_at.cmp(&a.comment.created_at))
                .then_with(|| a.comment.id.cmp(&b.comment.id))
        });
        threads.top_level = top_level;
        threads.orphans.sort();

        debug!(
            comments = threads.comments.len(),
            threads = threads.top_level.len(),
            orphans = threads.orphans.len(),
            "Comment threads built"
        );

        threads
    }

    /// Top-level comments, most engaging first
    pub fn top_level(&self) -> &[ThreadSummary] {
        &self.top_level
    }

    /// All transitive replies of `comment_id`, oldest first
    pub fn replies_of(&self, comment_id: Uuid) -> Vec<ThreadReply> {
        let mut replies: Vec<&Comment> = self
            .descendants(comment_id)
            .into_iter()
            .filter_map(|id| self.comments.get(&id))
            .collect();

        replies.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        replies
            .into_iter()
            .map(|comment| ThreadReply {
                comment: comment.clone(),
                replying_to: self.replying_to.get(&comment.id).cloned(),
            })
            .collect()
    }

    pub fn comment(&self, comment_id: Uuid) -> Option<&Comment> {
        self.comments.get(&comment_id)
    }

    pub fn contains(&self, comment_id: Uuid) -> bool {
        self.comments.contains_key(&comment_id)
    }

    /// Replies whose parent is not among the loaded comments
    pub fn orphans(&self) -> &[Uuid] {
        &self.orphans
    }

    pub fn comment_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.comments.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// Breadth-first walk over child links; visited set guards malformed cyclic input
    fn descendants(&self, root: Uuid) -> Vec<Uuid> {
        let mut visited: HashSet<Uuid> = HashSet::from([root]);
        let mut queue: VecDeque<Uuid> = VecDeque::from([root]);
        let mut found = Vec::new();

        while let Some(current) = queue.pop_front() {
            let Some(children) = self.children.get(&current) else {
                continue;
            };
            for child in children {
                if visited.insert(*child) {
                    found.push(*child);
                    queue.push_back(*child);
                }
            }
        }

        found
    }
}
