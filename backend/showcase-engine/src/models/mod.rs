use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A showcased piece of work as delivered by the data layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: Uuid,
    pub category: String,
    pub view_count: u64,
    pub like_count: u64,
    pub save_count: u64,
    pub created_at: DateTime<Utc>,
    /// Editorially featured
    pub is_boosted: bool,
    pub creator: CreatorMeta,
}

/// Creator details attached to an item; passed through untouched
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CreatorMeta {
    pub id: Option<Uuid>,
    pub display_name: String,
    /// Declared specialty, e.g. "Videographer"
    pub specialty: Option<String>,
    #[serde(default)]
    pub attributes: serde_json::Value,
}

/// A moderated (approved) comment on a content item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    /// None for top-level comments
    pub parent_id: Option<Uuid>,
    pub content: String,
    /// Author details as they were when the comment was posted
    pub author: AuthorSnapshot,
    pub likes_count: u64,
    /// Maintained by the data layer, not recomputed here
    pub reply_count: u64,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Likes plus replies, used to order threads
    pub fn engagement(&self) -> u64 {
        self.likes_count.saturating_add(self.reply_count)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuthorSnapshot {
    pub display_name: String,
    pub avatar_url: Option<String>,
    /// e.g. "creator", "client"
    pub account_type: String,
}
