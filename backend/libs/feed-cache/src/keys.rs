//! Feed cache key schema
//!
//! Feed entries are keyed by the active filter criteria. Two filters that
//! carry the same criteria map to the same key no matter in which order the
//! criteria were added or how they were cased.
//! Key format: v{VERSION}:feed:{name=value&...} or v{VERSION}:feed:all

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Cache schema version - increment when changing key formats
pub const CACHE_VERSION: u32 = 1;

pub const LOCATION: &str = "location";
pub const CREATOR_TYPE: &str = "creator_type";
pub const MEDIA_TYPE: &str = "media_type";

/// Active feed filter criteria
///
/// Names and values are trimmed and lower-cased on insert. Setting an empty
/// value removes the criterion, so "no location" and "location = ''" are the
/// same filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedFilter {
    criteria: BTreeMap<String, String>,
}

impl FeedFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn location(self, value: impl AsRef<str>) -> Self {
        self.with_criterion(LOCATION, value)
    }

    pub fn creator_type(self, value: impl AsRef<str>) -> Self {
        self.with_criterion(CREATOR_TYPE, value)
    }

    pub fn media_type(self, value: impl AsRef<str>) -> Self {
        self.with_criterion(MEDIA_TYPE, value)
    }

    /// Add (or replace) a free-form criterion
    pub fn with_criterion(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = normalize(name.as_ref());
        let value = normalize(value.as_ref());

        if name.is_empty() {
            return self;
        }

        if value.is_empty() {
            self.criteria.remove(&name);
        } else {
            self.criteria.insert(name, value);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.criteria.get(&normalize(name)).map(String::as_str)
    }

    /// Criteria in name order
    pub fn criteria(&self) -> impl Iterator<Item = (&str, &str)> {
        self.criteria.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Stable cache key for this filter
    pub fn signature(&self) -> FilterSignature {
        if self.criteria.is_empty() {
            return FilterSignature(format!("v{}:feed:all", CACHE_VERSION));
        }

        let body = self
            .criteria
            .iter()
            .map(|(name, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(name),
                    urlencoding::encode(value)
                )
            })
            .collect::<Vec<_>>()
            .join("&");

        FilterSignature(format!("v{}:feed:{}", CACHE_VERSION, body))
    }
}

fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Serialized filter criteria used as the feed cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FilterSignature(String);

impl FilterSignature {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract entity type from key
    pub fn entity_type(&self) -> Option<&str> {
        // Format: v{N}:{entity}:...
        self.0.split(':').nth(1)
    }
}

impl fmt::Display for FilterSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FilterSignature {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&FeedFilter> for FilterSignature {
    fn from(filter: &FeedFilter) -> Self {
        filter.signature()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_key() {
        assert_eq!(FeedFilter::new().signature().as_str(), "v1:feed:all");
    }

    #[test]
    fn test_signature_is_order_independent() {
        let a = FeedFilter::new().location("Berlin").media_type("video");
        let b = FeedFilter::new().media_type("video").location("Berlin");
        assert_eq!(a.signature(), b.signature());
        assert_eq!(
            a.signature().as_str(),
            "v1:feed:location=berlin&media_type=video"
        );
    }

    #[test]
    fn test_signature_normalizes_case_and_whitespace() {
        let a = FeedFilter::new().creator_type("  Photographer ");
        let b = FeedFilter::new().with_criterion("CREATOR_TYPE", "photographer");
        assert_eq!(a.signature(), b.signature());
    }

    #[test]
    fn test_empty_value_unsets_criterion() {
        let filter = FeedFilter::new().location("Lisbon").location("  ");
        assert!(filter.is_empty());
        assert_eq!(filter.signature(), FeedFilter::new().signature());
    }

    #[test]
    fn test_reserved_characters_are_escaped() {
        let ambiguous = FeedFilter::new().with_criterion("tag", "a&b=c");
        let split = FeedFilter::new()
            .with_criterion("tag", "a")
            .with_criterion("b", "c");
        assert_ne!(ambiguous.signature(), split.signature());
    }

    #[test]
    fn test_entity_type() {
        let key = FeedFilter::new().location("Oslo").signature();
        assert_eq!(key.entity_type(), Some("feed"));
    }
}
