//! Feed Composition
//!
//! Orchestrates fetch → weighted shuffle → diversity bucketing → cache.
//!
//! # Refresh ordering
//! Every fetch-and-compose for a filter takes a generation ticket before the
//! fetch. The result is written to the cache only while that ticket is still
//! the newest for the filter, so a slow refresh that started earlier can never
//! overwrite a feed committed by a later one. A filter's generation record is
//! dropped once no composition for it is in flight, so the table only holds
//! filters that are currently being composed.
//!
//! # Degraded mode
//! When the content source fails, the last good cached feed is returned as
//! `Freshness::Stale` and left in place, even if it is past the cache TTL.
//! Only a failure with nothing cached surfaces as `FeedError::Unavailable`.
use crate::config::Config;
use crate::models::ContentItem;
use crate::services::diversity::DiversityBucketer;
use crate::services::ranking::{ItemWeigher, WeightedShuffler};
use crate::sources::{ContentSource, FetchError};
use chrono::{DateTime, Utc};
use feed_cache::{CacheEntry, FeedCache, FeedFilter, FilterSignature};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Feed unavailable: {0}")]
    Unavailable(#[from] FetchError),
}

pub type Result<T> = std::result::Result<T, FeedError>;

/// Where a composed feed came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Served from cache without contacting the source
    Cached,
    /// Freshly fetched and composed
    Fresh,
    /// Source failed; last good cached feed served instead
    Stale,
}

#[derive(Debug, Clone)]
pub struct ComposedFeed {
    pub items: Vec<ContentItem>,
    pub seed: u64,
    pub composed_at: DateTime<Utc>,
    pub freshness: Freshness,
}

impl ComposedFeed {
    fn from_entry(entry: CacheEntry<ContentItem>, freshness: Freshness) -> Self {
        Self {
            items: entry.payload,
            seed: entry.seed,
            composed_at: entry.created_at,
            freshness,
        }
    }
}

/// Ticket bookkeeping for one filter
#[derive(Debug, Default)]
struct Generation {
    latest: u64,
    in_flight: usize,
}

type Generations = Mutex<HashMap<FilterSignature, Generation>>;

/// A composition's claim on its filter's generation
///
/// Dropping it (on commit, failure or cancellation) releases the claim; the
/// filter's record goes away with the last one.
struct Ticket<'a> {
    generations: &'a Generations,
    key: FilterSignature,
    number: u64,
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        let mut generations = self.generations.lock();
        let idle = match generations.get_mut(&self.key) {
            Some(generation) => {
                generation.in_flight = generation.in_flight.saturating_sub(1);
                generation.in_flight == 0
            }
            None => false,
        };
        if idle {
            generations.remove(&self.key);
        }
    }
}

pub struct FeedComposer {
    source: Arc<dyn ContentSource>,
    cache: Arc<FeedCache<ContentItem>>,
    shuffler: WeightedShuffler,
    bucketer: DiversityBucketer,
    fetch_limit: usize,
    generations: Generations,
}

impl FeedComposer {
    pub fn new(source: Arc<dyn ContentSource>, cache: Arc<FeedCache<ContentItem>>) -> Self {
        Self::with_config(source, cache, &Config::default())
    }

    pub fn with_config(
        source: Arc<dyn ContentSource>,
        cache: Arc<FeedCache<ContentItem>>,
        config: &Config,
    ) -> Self {
        Self {
            source,
            cache,
            shuffler: WeightedShuffler::new(ItemWeigher::new(&config.ranking.video_affinity_tag)),
            bucketer: DiversityBucketer::with_min_items(
                config.feed.max_items,
                config.feed.min_diversify,
            ),
            fetch_limit: config.feed.fetch_limit,
            generations: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache(&self) -> &Arc<FeedCache<ContentItem>> {
        &self.cache
    }

    /// Compose (or serve from cache) the feed for `filter`
    pub async fn compose_feed(
        &self,
        filter: &FeedFilter,
        force_refresh: bool,
    ) -> Result<ComposedFeed> {
        let key = filter.signature();

        if !force_refresh {
            if let Some(entry) = self.cache.get(&key) {
                return Ok(ComposedFeed::from_entry(entry, Freshness::Cached));
            }
        }

        let ticket = self.begin_generation(&key);
        let seed: u64 = rand::random();

        debug!(key = %key, ticket = ticket.number, force_refresh, "Composing feed");

        match self.source.fetch_recent_items(filter, self.fetch_limit).await {
            Ok(items) => {
                let now = Utc::now();
                let ranked = self.rank(&items, seed, now);
                self.commit(&ticket, &ranked, seed);

                Ok(ComposedFeed {
                    items: ranked,
                    seed,
                    composed_at: now,
                    freshness: Freshness::Fresh,
                })
            }
            Err(e) => match self.cache.get_stale(&key) {
                Some(entry) => {
                    warn!(key = %key, error = %e, "Feed fetch failed, serving cached feed");
                    Ok(ComposedFeed::from_entry(entry, Freshness::Stale))
                }
                None => {
                    warn!(key = %key, error = %e, "Feed fetch failed with nothing cached");
                    Err(FeedError::Unavailable(e))
                }
            },
        }
    }

    /// Shuffle then diversify; pure given its inputs
    pub fn rank(&self, items: &[ContentItem], seed: u64, now: DateTime<Utc>) -> Vec<ContentItem> {
        let shuffled = self.shuffler.shuffle(items, seed, now);
        self.bucketer.diversify(shuffled)
    }

    /// Drop the cached feed for `filter`
    ///
    /// Also retires any in-flight composition for the filter so it cannot
    /// repopulate the entry afterwards.
    pub fn invalidate(&self, filter: &FeedFilter) -> bool {
        let key = filter.signature();
        if let Some(generation) = self.generations.lock().get_mut(&key) {
            generation.latest += 1;
        }
        self.cache.clear(&key)
    }

    fn begin_generation(&self, key: &FilterSignature) -> Ticket<'_> {
        let mut generations = self.generations.lock();
        let generation = generations.entry(key.clone()).or_default();
        generation.latest += 1;
        generation.in_flight += 1;

        Ticket {
            generations: &self.generations,
            key: key.clone(),
            number: generation.latest,
        }
    }

    fn commit(&self, ticket: &Ticket<'_>, ranked: &[ContentItem], seed: u64) {
        let key = &ticket.key;
        // Hold the lock across the write so a newer ticket cannot slip in between
        let generations = self.generations.lock();
        let current = generations.get(key).map(|g| g.latest).unwrap_or(0);

        if current != ticket.number {
            warn!(
                key = %key,
                ticket = ticket.number,
                current,
                "Discarding superseded feed composition"
            );
            return;
        }

        match self.cache.set(key, ranked.to_vec(), seed) {
            Ok(()) => info!(key = %key, items = ranked.len(), seed, "Feed cached"),
            Err(e) => warn!(key = %key, error = %e, "Failed to cache feed"),
        }
    }
}
