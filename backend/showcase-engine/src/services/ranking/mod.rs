//! Ranking Module
//!
//! Seeded, weight-biased shuffling of a recency-ordered item list.
//!
//! # Workflow
//! 1. Derive a strictly positive weight per item (boost, engagement, recency, affinity)
//! 2. Run a weight-biased Fisher–Yates pass driven by a seeded PRNG
//! 3. Hand the permutation to the diversity layer
pub mod weights;

pub use weights::{engagement_score, recency_multiplier, ItemWeigher};

use crate::models::ContentItem;
use chrono::{DateTime, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::debug;

/// Weighted Shuffler
///
/// `shuffle` is pure: the same items, seed and reference time always yield the
/// same order, and the input slice is never touched.
#[derive(Debug, Clone, Default)]
pub struct WeightedShuffler {
    weigher: ItemWeigher,
}

impl WeightedShuffler {
    pub fn new(weigher: ItemWeigher) -> Self {
        Self { weigher }
    }

    pub fn weigher(&self) -> &ItemWeigher {
        &self.weigher
    }

    /// Reorder `items` using `seed`, weighting each item as of `now`
    pub fn shuffle(
        &self,
        items: &[ContentItem],
        seed: u64,
        now: DateTime<Utc>,
    ) -> Vec<ContentItem> {
        if items.len() <= 1 {
            return items.to_vec();
        }

        let mut slots: Vec<(f64, &ContentItem)> = items
            .iter()
            .map(|item| (self.weigher.weight(item, now), item))
            .collect();

        let mut rng = StdRng::seed_from_u64(seed);

        for i in (1..slots.len()).rev() {
            let draw: f64 = rng.gen();
            // Scale by the weight of whichever item currently sits at i
            let scaled = (draw * slots[i].0 * (i + 1) as f64).floor();
            let j = (scaled.max(0.0) as usize).min(i);
            slots.swap(i, j);
        }

        debug!(items = slots.len(), seed, "Weighted shuffle applied");

        slots.into_iter().map(|(_, item)| item.clone()).collect()
    }
}
