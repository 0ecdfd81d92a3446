use feed_cache::FeedCache;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub feed: FeedConfig,
    pub ranking: RankingConfig,
}

/// Feed composition settings (`SHOWCASE_FEED_*`)
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Hard cap on a composed feed
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    /// Feeds at or below this size skip diversification
    #[serde(default = "default_min_diversify")]
    pub min_diversify: usize,
    /// How many recent items to pull per composition
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
    /// Unset means cached feeds live until refreshed or cleared
    #[serde(default)]
    pub cache_ttl_secs: Option<u64>,
}

/// Weighting settings (`SHOWCASE_RANKING_*`)
#[derive(Debug, Clone, Deserialize)]
pub struct RankingConfig {
    /// Creator specialty that earns the affinity bonus
    #[serde(default = "default_affinity_tag")]
    pub video_affinity_tag: String,
}

fn default_max_items() -> usize {
    30
}

fn default_min_diversify() -> usize {
    10
}

fn default_fetch_limit() -> usize {
    100
}

fn default_affinity_tag() -> String {
    "video".to_string()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            min_diversify: default_min_diversify(),
            fetch_limit: default_fetch_limit(),
            cache_ttl_secs: None,
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            video_affinity_tag: default_affinity_tag(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed: FeedConfig::default(),
            ranking: RankingConfig::default(),
        }
    }
}

impl FeedConfig {
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }

    /// Process-local feed cache honouring `cache_ttl_secs`
    pub fn build_cache<T>(&self) -> FeedCache<T> {
        match self.cache_ttl() {
            Some(ttl) => FeedCache::new().with_ttl(ttl),
            None => FeedCache::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        Ok(Config {
            feed: envy::prefixed("SHOWCASE_FEED_").from_env()?,
            ranking: envy::prefixed("SHOWCASE_RANKING_").from_env()?,
        })
    }

    /// Build from explicit key/value pairs using the same variable names as `from_env`
    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)> + Clone,
    {
        Ok(Config {
            feed: envy::prefixed("SHOWCASE_FEED_").from_iter(vars.clone())?,
            ranking: envy::prefixed("SHOWCASE_RANKING_").from_iter(vars)?,
        })
    }
}
