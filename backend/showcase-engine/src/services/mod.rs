pub mod comments;
pub mod counters;
pub mod diversity;
pub mod feed;
pub mod ranking;

pub use comments::{CommentThreads, CommentTreeBuilder, ThreadReply, ThreadService, ThreadSummary};
pub use counters::OptimisticCounter;
pub use diversity::DiversityBucketer;
pub use feed::{ComposedFeed, FeedComposer, FeedError, Freshness};
pub use ranking::{ItemWeigher, WeightedShuffler};
