//! Showcase feed composition and comment threading engine
//!
//! Turns recency-ordered content items into ranked, category-diverse,
//! cacheable feeds, and flat moderated comments into reply threads.

pub mod config;
pub mod models;
pub mod services;
pub mod sources;
pub mod utils;

pub use config::Config;
pub use feed_cache::{FeedCache, FeedFilter, FilterSignature};
pub use models::{AuthorSnapshot, Comment, ContentItem, CreatorMeta};
pub use services::{
    CommentThreads, CommentTreeBuilder, ComposedFeed, DiversityBucketer, FeedComposer, FeedError,
    Freshness, ItemWeigher, OptimisticCounter, ThreadReply, ThreadService, ThreadSummary,
    WeightedShuffler,
};
pub use sources::{CommentSource, ContentSource, FetchError, ViewTracker};
