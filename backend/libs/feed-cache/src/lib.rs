//! Showcase feed caching layer
//!
//! Holds composed feeds keyed by their filter signature:
//! - Order-independent key schema with versioning
//! - Whole-entry replacement (one serialized document per key)
//! - Unreadable or outdated entries degrade to a miss
//! - Optional TTL, no expiry by default
//! - Metrics integration

mod error;
mod keys;
mod metrics;

pub mod feed;

pub use error::{CacheError, CacheResult};
pub use feed::{CacheEntry, FeedCache};
pub use keys::{FeedFilter, FilterSignature, CACHE_VERSION, CREATOR_TYPE, LOCATION, MEDIA_TYPE};
pub use metrics::CacheMetrics;

use dashmap::DashMap;
use std::sync::Arc;

/// Raw key/value storage behind a cache
///
/// Values are opaque serialized documents. A `put_raw` replaces any previous
/// value for the key in a single step; readers never observe a partial write.
pub trait CacheStore: Send + Sync {
    /// Get the raw stored document for a key
    fn get_raw(&self, key: &str) -> Option<String>;

    /// Store a raw document, replacing any previous one
    fn put_raw(&self, key: &str, value: String);

    /// Remove a key, returning whether it existed
    fn remove(&self, key: &str) -> bool;

    /// Remove a key only while it still holds `expected`
    ///
    /// A value written after `expected` was read survives.
    fn remove_if_eq(&self, key: &str, expected: &str) -> bool;

    /// Remove every key, returning how many were dropped
    fn clear(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local store
///
/// Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<DashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for InMemoryStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn put_raw(&self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    fn remove_if_eq(&self, key: &str, expected: &str) -> bool {
        self.entries
            .remove_if(key, |_, current| current == expected)
            .is_some()
    }

    fn clear(&self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
