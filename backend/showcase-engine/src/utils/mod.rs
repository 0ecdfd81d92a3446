// Utility functions for showcase-engine

use chrono::{DateTime, Utc};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Age in fractional days; items dated in the future count as brand new
pub fn age_in_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let seconds = (now - created_at).num_seconds().max(0) as f64;
    seconds / SECONDS_PER_DAY
}
