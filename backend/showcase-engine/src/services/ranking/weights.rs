//! Item weighting for the weighted shuffle.
//!
//! weight = 1.0 × boost × (1 + min(engagement, 2)) × recency × affinity
//!
//! Every factor is strictly positive, so no item can end up with a zero or
//! negative weight.
use crate::models::ContentItem;
use crate::utils::age_in_days;
use chrono::{DateTime, Utc};

pub const BASE_WEIGHT: f64 = 1.0;
pub const BOOST_MULTIPLIER: f64 = 1.8;
pub const MAX_ENGAGEMENT_BONUS: f64 = 2.0;
pub const AFFINITY_MULTIPLIER: f64 = 1.1;

/// Engagement score: (0.3·views + 0.5·likes + 0.2·saves) / 100
pub fn engagement_score(item: &ContentItem) -> f64 {
    (0.3 * item.view_count as f64 + 0.5 * item.like_count as f64 + 0.2 * item.save_count as f64)
        / 100.0
}

/// Recency multiplier for an item `age_days` old
pub fn recency_multiplier(age_days: f64) -> f64 {
    if age_days < 1.0 {
        1.5
    } else if age_days < 3.0 {
        1.3
    } else if age_days < 7.0 {
        1.2
    } else if age_days > 30.0 {
        0.8
    } else {
        1.0
    }
}

/// Computes shuffle weights
#[derive(Debug, Clone)]
pub struct ItemWeigher {
    affinity_tag: String,
}

impl Default for ItemWeigher {
    fn default() -> Self {
        Self::new("video")
    }
}

impl ItemWeigher {
    /// `affinity_tag` is matched case-insensitively against the creator's specialty
    pub fn new(affinity_tag: impl AsRef<str>) -> Self {
        Self {
            affinity_tag: affinity_tag.as_ref().trim().to_lowercase(),
        }
    }

    pub fn affinity_tag(&self) -> &str {
        &self.affinity_tag
    }

    pub fn weight(&self, item: &ContentItem, now: DateTime<Utc>) -> f64 {
        let mut weight = BASE_WEIGHT;

        if item.is_boosted {
            weight *= BOOST_MULTIPLIER;
        }

        weight *= 1.0 + engagement_score(item).min(MAX_ENGAGEMENT_BONUS);
        weight *= recency_multiplier(age_in_days(item.created_at, now));

        if self.has_affinity(item) {
            weight *= AFFINITY_MULTIPLIER;
        }

        weight
    }

    fn has_affinity(&self, item: &ContentItem) -> bool {
        if self.affinity_tag.is_empty() {
            return false;
        }
        item.creator
            .specialty
            .as_deref()
            .map(|specialty| specialty.to_lowercase().contains(&self.affinity_tag))
            .unwrap_or(false)
    }
}
