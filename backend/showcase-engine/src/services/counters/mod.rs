use crate::models::ContentItem;
use crate::sources::{FetchError, ViewTracker};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Local view-count deltas shown ahead of server confirmation
///
/// Keys: item id → views applied locally but not yet reflected in the item
/// the data layer returned. Independent of the feed cache; cached feeds are
/// never patched with these deltas.
///
/// Reconciliation: a view the tracker rejects (error, or not newly recorded)
/// is rolled back, never below zero.
#[derive(Clone, Default)]
pub struct OptimisticCounter {
    deltas: Arc<DashMap<Uuid, u64>>,
}

impl OptimisticCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one view locally
    pub fn apply_local_increment(&self, item_id: Uuid) {
        let mut delta = self.deltas.entry(item_id).or_insert(0);
        *delta = delta.saturating_add(1);
    }

    /// Undo one local view, bounded at zero
    pub fn rollback(&self, item_id: Uuid) {
        if let Some(mut delta) = self.deltas.get_mut(&item_id) {
            *delta = delta.saturating_sub(1);
        }
        self.deltas.remove_if(&item_id, |_, delta| *delta == 0);
    }

    pub fn delta(&self, item_id: Uuid) -> u64 {
        self.deltas
            .get(&item_id)
            .map(|entry| *entry.value())
            .unwrap_or(0)
    }

    /// Server count plus local delta
    pub fn display_count(&self, item: &ContentItem) -> u64 {
        item.view_count.saturating_add(self.delta(item.id))
    }

    /// Count a view optimistically, then confirm it with the tracker
    ///
    /// Returns the tracker's answer; the local delta is rolled back unless the
    /// view was newly recorded.
    pub async fn record_view(
        &self,
        tracker: &dyn ViewTracker,
        item_id: Uuid,
    ) -> Result<bool, FetchError> {
        self.apply_local_increment(item_id);

        match tracker.track_view(item_id).await {
            Ok(true) => {
                debug!(item_id = %item_id, "View recorded");
                Ok(true)
            }
            Ok(false) => {
                debug!(item_id = %item_id, "View already counted, rolling back local increment");
                self.rollback(item_id);
                Ok(false)
            }
            Err(e) => {
                warn!(
                    item_id = %item_id,
                    error = %e,
                    "View tracking failed, rolling back local increment"
                );
                self.rollback(item_id);
                Err(e)
            }
        }
    }

    /// Forget all local deltas, e.g. after the feed is re-fetched
    pub fn reset(&self) {
        self.deltas.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreatorMeta;
    use crate::sources::MockViewTracker;
    use chrono::Utc;

    fn item(views: u64) -> ContentItem {
        ContentItem {
            id: Uuid::new_v4(),
            category: "photo".to_string(),
            view_count: views,
            like_count: 0,
            save_count: 0,
            created_at: Utc::now(),
            is_boosted: false,
            creator: CreatorMeta::default(),
        }
    }

    #[test]
    fn test_two_increments() {
        let counter = OptimisticCounter::new();
        let x = item(40);

        counter.apply_local_increment(x.id);
        counter.apply_local_increment(x.id);

        assert_eq!(counter.display_count(&x), 42);
        assert_eq!(counter.display_count(&item(7)), 7);
    }

    #[test]
    fn test_rollback_bounded_at_zero() {
        let counter = OptimisticCounter::new();
        let x = item(5);

        counter.apply_local_increment(x.id);
        counter.rollback(x.id);
        counter.rollback(x.id);

        assert_eq!(counter.delta(x.id), 0);
        assert_eq!(counter.display_count(&x), 5);
    }

    #[test]
    fn test_clones_share_deltas() {
        let counter = OptimisticCounter::new();
        let other = counter.clone();
        let x = item(0);

        other.apply_local_increment(x.id);
        assert_eq!(counter.display_count(&x), 1);

        counter.reset();
        assert_eq!(other.delta(x.id), 0);
    }

    #[tokio::test]
    async fn test_record_view_confirmed() {
        let x = item(10);
        let mut tracker = MockViewTracker::new();
        tracker.expect_track_view().times(1).returning(|_| Ok(true));

        let counter = OptimisticCounter::new();
        assert!(counter.record_view(&tracker, x.id).await.unwrap());
        assert_eq!(counter.display_count(&x), 11);
    }

    #[tokio::test]
    async fn test_record_view_duplicate_rolls_back() {
        let x = item(10);
        let mut tracker = MockViewTracker::new();
        tracker.expect_track_view().returning(|_| Ok(false));

        let counter = OptimisticCounter::new();
        assert!(!counter.record_view(&tracker, x.id).await.unwrap());
        assert_eq!(counter.display_count(&x), 10);
    }

    #[tokio::test]
    async fn test_record_view_failure_rolls_back() {
        let x = item(10);
        let mut calls = 0;
        let mut tracker = MockViewTracker::new();
        tracker.expect_track_view().returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(true)
            } else {
                Err(FetchError::Timeout)
            }
        });

        let counter = OptimisticCounter::new();
        counter.record_view(&tracker, x.id).await.unwrap();
        let result = counter.record_view(&tracker, x.id).await;

        assert_eq!(result, Err(FetchError::Timeout));
        assert_eq!(counter.display_count(&x), 11);
    }
}
