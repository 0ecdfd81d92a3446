//! Feed caching module
//!
//! Stores one composed feed per filter signature together with the seed that
//! produced it. Entries are only ever replaced wholesale or removed; there is
//! no merge path.

use crate::{CacheError, CacheMetrics, CacheResult, CacheStore, FilterSignature, InMemoryStore};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::marker::PhantomData;
use std::time::Duration;
use tracing::{debug, warn};

/// Cached feed entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub key: String,
    /// Items in feed order
    pub payload: Vec<T>,
    /// Seed the feed was shuffled with
    pub seed: u64,
    pub created_at: DateTime<Utc>,
    /// Schema version for invalidation on structure changes
    pub schema_version: u32,
}

impl<T> CacheEntry<T> {
    pub const CURRENT_SCHEMA_VERSION: u32 = 1;

    pub fn new(key: &FilterSignature, payload: Vec<T>, seed: u64) -> Self {
        Self {
            key: key.as_str().to_string(),
            payload,
            seed,
            created_at: Utc::now(),
            schema_version: Self::CURRENT_SCHEMA_VERSION,
        }
    }

    /// Check if cache is stale based on schema version
    pub fn is_stale(&self) -> bool {
        self.schema_version < Self::CURRENT_SCHEMA_VERSION
    }

    /// Check whether the entry is older than `ttl`
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        // Entries stamped in the future count as fresh
        (now - self.created_at)
            .to_std()
            .map(|age| age > ttl)
            .unwrap_or(false)
    }
}

/// Feed cache operations
///
/// An explicit object rather than global state: every composer gets the cache
/// it is handed, and tests build isolated instances.
pub struct FeedCache<T, S = InMemoryStore> {
    store: S,
    ttl: Option<Duration>,
    metrics: CacheMetrics,
    _payload: PhantomData<fn() -> T>,
}

impl<T> FeedCache<T, InMemoryStore> {
    /// Create an empty process-local cache with no expiry
    pub fn new() -> Self {
        Self::with_store(InMemoryStore::new())
    }
}

impl<T> Default for FeedCache<T, InMemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S: CacheStore> FeedCache<T, S> {
    pub fn with_store(store: S) -> Self {
        Self {
            store,
            ttl: None,
            metrics: CacheMetrics::new(),
            _payload: PhantomData,
        }
    }

    /// Treat entries older than `ttl` as misses
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Remove the entry for a key
    pub fn clear(&self, key: &FilterSignature) -> bool {
        let removed = self.store.remove(key.as_str());
        if removed {
            debug!(key = %key, "Feed cache clear");
            self.metrics.record_invalidation(key.as_str());
        }
        removed
    }

    /// Remove every entry
    pub fn clear_all(&self) -> usize {
        let removed = self.store.clear();
        debug!(removed, "Feed cache cleared");
        removed
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Drop `raw` from the store unless a newer document has replaced it
    fn evict(&self, key: &str, raw: &str) {
        if !self.store.remove_if_eq(key, raw) {
            debug!(key = %key, "Cache entry replaced concurrently, keeping it");
        }
    }
}

impl<T, S> FeedCache<T, S>
where
    T: Serialize + DeserializeOwned,
    S: CacheStore,
{
    /// Get the cached feed for a key
    ///
    /// Unreadable or outdated entries are evicted and reported as a miss.
    /// Entries past the TTL are reported as a miss but stay stored, so
    /// `get_stale` can still serve them.
    pub fn get(&self, key: &FilterSignature) -> Option<CacheEntry<T>> {
        let entry = self.read(key)?;

        if let Some(ttl) = self.ttl {
            if entry.is_expired(ttl, Utc::now()) {
                debug!(key = %key, ttl_secs = ttl.as_secs(), "Cache entry expired");
                self.metrics.record_expiration(key.as_str());
                return None;
            }
        }

        debug!(key = %key, items = entry.payload.len(), seed = entry.seed, "Cache hit");
        self.metrics.record_hit(key.as_str());
        Some(entry)
    }

    /// Get the cached feed for a key regardless of the TTL
    ///
    /// Fallback read for when a fresh feed cannot be produced.
    pub fn get_stale(&self, key: &FilterSignature) -> Option<CacheEntry<T>> {
        let entry = self.read(key)?;
        debug!(key = %key, items = entry.payload.len(), seed = entry.seed, "Stale cache read");
        Some(entry)
    }

    /// Store a feed, replacing whatever was cached under the key
    pub fn set(&self, key: &FilterSignature, payload: Vec<T>, seed: u64) -> CacheResult<()> {
        let entry = CacheEntry::new(key, payload, seed);
        let data = serde_json::to_string(&entry)?;

        self.store.put_raw(key.as_str(), data);

        debug!(key = %key, items = entry.payload.len(), seed, "Cache set");
        self.metrics.record_write(key.as_str());
        Ok(())
    }

    /// Decode the stored entry, evicting it when unreadable or outdated
    fn read(&self, key: &FilterSignature) -> Option<CacheEntry<T>> {
        let key_str = key.as_str();

        let Some(raw) = self.store.get_raw(key_str) else {
            debug!(key = %key, "Cache miss");
            self.metrics.record_miss(key_str);
            return None;
        };

        let entry = match decode::<T>(key_str, &raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache entry unreadable, treating as miss");
                self.metrics.record_error(key_str, "deserialize");
                self.evict(key_str, &raw);
                return None;
            }
        };

        if entry.is_stale() {
            debug!(
                key = %key,
                schema_version = entry.schema_version,
                "Cache entry has outdated schema"
            );
            self.metrics.record_expiration(key_str);
            self.evict(key_str, &raw);
            return None;
        }

        Some(entry)
    }
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> CacheResult<CacheEntry<T>> {
    let entry: CacheEntry<T> = serde_json::from_str(raw).map_err(CacheError::Serialization)?;
    if entry.key != key {
        return Err(CacheError::InvalidData(format!(
            "entry stored under {} claims key {}",
            key, entry.key
        )));
    }
    Ok(entry)
}
