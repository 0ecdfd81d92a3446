use crate::models::ContentItem;
use std::collections::HashMap;
use tracing::debug;

/// Default cap on a composed feed
pub const DEFAULT_MAX_ITEMS: usize = 30;
/// Feeds at or below this size are left as shuffled
pub const DEFAULT_MIN_ITEMS: usize = 10;

/// Diversity Bucketer - category re-sequencing
///
/// Leads with the first item of every category, then cycles through the
/// per-category leftovers one round at a time, so no category repeats before
/// every category has appeared once.
#[derive(Debug, Clone)]
pub struct DiversityBucketer {
    max_items: usize,
    min_items: usize,
}

impl Default for DiversityBucketer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITEMS)
    }
}

impl DiversityBucketer {
    pub fn new(max_items: usize) -> Self {
        Self {
            max_items,
            min_items: DEFAULT_MIN_ITEMS,
        }
    }

    /// Create with a custom small-feed threshold
    pub fn with_min_items(max_items: usize, min_items: usize) -> Self {
        Self {
            max_items,
            min_items,
        }
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Re-sequence an already shuffled list
    pub fn diversify(&self, items: Vec<ContentItem>) -> Vec<ContentItem> {
        if items.len() <= self.min_items {
            let mut items = items;
            items.truncate(self.max_items);
            return items;
        }

        let order = self.diversified_order(&items);
        let total = items.len();

        let mut slots: Vec<Option<ContentItem>> = items.into_iter().map(Some).collect();
        let result: Vec<ContentItem> = order
            .into_iter()
            .filter_map(|idx| slots[idx].take())
            .take(self.max_items)
            .collect();

        debug!(input = total, output = result.len(), "Diversity bucketing applied");
        result
    }

    /// Indices of `items` in diversified order
    fn diversified_order(&self, items: &[ContentItem]) -> Vec<usize> {
        // Pass 1: first item per category, in shuffle order
        let mut lead: Vec<usize> = Vec::new();
        let mut bucket_of: HashMap<&str, usize> = HashMap::new();
        for (idx, item) in items.iter().enumerate() {
            if !bucket_of.contains_key(item.category.as_str()) {
                bucket_of.insert(item.category.as_str(), lead.len());
                lead.push(idx);
            }
        }

        // Pass 2: leftovers into per-category buckets, bucket order follows first appearance
        let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); lead.len()];
        for (idx, item) in items.iter().enumerate() {
            let bucket = bucket_of[item.category.as_str()];
            if lead[bucket] != idx {
                buckets[bucket].push(idx);
            }
        }

        // Round-robin by bucket depth
        let depth = buckets.iter().map(Vec::len).max().unwrap_or(0);
        let mut order = lead;
        order.reserve(items.len() - order.len());
        for level in 0..depth {
            for bucket in &buckets {
                if let Some(&idx) = bucket.get(level) {
                    order.push(idx);
                }
            }
        }

        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreatorMeta;
    use chrono::Utc;
    use std::collections::HashSet;
    use uuid::Uuid;

    fn items(categories: &[&str]) -> Vec<ContentItem> {
        categories
            .iter()
            .map(|category| ContentItem {
                id: Uuid::new_v4(),
                category: category.to_string(),
                view_count: 0,
                like_count: 0,
                save_count: 0,
                created_at: Utc::now(),
                is_boosted: false,
                creator: CreatorMeta::default(),
            })
            .collect()
    }

    fn categories(items: &[ContentItem]) -> Vec<&str> {
        items.iter().map(|i| i.category.as_str()).collect()
    }

    #[test]
    fn test_small_feed_unchanged() {
        let input = items(&["a", "a", "a", "b", "c", "c", "a", "b", "a", "a"]);
        let output = DiversityBucketer::default().diversify(input.clone());
        assert_eq!(output, input);
    }

    #[test]
    fn test_round_robin_order() {
        let input = items(&["a", "a", "a", "a", "b", "b", "c", "a", "b", "c", "a", "d"]);
        let output = DiversityBucketer::default().diversify(input);

        assert_eq!(
            categories(&output),
            vec!["a", "b", "c", "d", "a", "b", "c", "a", "b", "a", "a", "a"]
        );
    }

    #[test]
    fn test_first_k_positions_distinct() {
        let input = items(&[
            "photo", "photo", "photo", "photo", "video", "photo", "design", "video", "photo",
            "photo", "art", "photo", "photo",
        ]);
        let distinct: HashSet<&str> = input.iter().map(|i| i.category.as_str()).collect();
        let k = distinct.len();

        let output = DiversityBucketer::default().diversify(input.clone());
        let lead: HashSet<&str> = output[..k].iter().map(|i| i.category.as_str()).collect();
        assert_eq!(lead.len(), k);
    }

    #[test]
    fn test_output_capped() {
        let cats: Vec<&str> = (0..45).map(|i| ["a", "b", "c", "d"][i % 4]).collect();
        let input = items(&cats);
        let output = DiversityBucketer::default().diversify(input.clone());

        assert_eq!(output.len(), 30);
        let input_ids: HashSet<Uuid> = input.iter().map(|i| i.id).collect();
        let output_ids: HashSet<Uuid> = output.iter().map(|i| i.id).collect();
        assert_eq!(output_ids.len(), 30);
        assert!(output_ids.is_subset(&input_ids));
    }

    #[test]
    fn test_keeps_every_item_under_cap() {
        let input = items(&["a", "b", "a", "b", "a", "c", "c", "a", "b", "a", "a", "b", "c"]);
        let output = DiversityBucketer::default().diversify(input.clone());

        assert_eq!(output.len(), input.len());
        let input_ids: HashSet<Uuid> = input.iter().map(|i| i.id).collect();
        let output_ids: HashSet<Uuid> = output.iter().map(|i| i.id).collect();
        assert_eq!(input_ids, output_ids);
    }

    #[test]
    fn test_small_feed_diversified_when_threshold_lowered() {
        let bucketer = DiversityBucketer::with_min_items(DEFAULT_MAX_ITEMS, 0);
        let input = items(&["a", "a", "a", "b", "c"]);
        let output = bucketer.diversify(input);

        let lead: HashSet<&str> = output[..3].iter().map(|i| i.category.as_str()).collect();
        assert_eq!(lead, HashSet::from(["a", "b", "c"]));
        assert_eq!(output.len(), 5);
    }

    #[test]
    fn test_single_category() {
        let input = items(&["a"; 14]);
        let output = DiversityBucketer::default().diversify(input.clone());
        assert_eq!(output, input);
    }
}
