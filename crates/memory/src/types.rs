//! Core memory record types. Grounded on `core/memory/schemas.py`.

use serde::{Deserialize, Serialize};

/// Common memory scope prefixes and their constructors.
pub struct MemoryScope;

impl MemoryScope {
    pub const PERSONA: &'static str = "persona";
    pub const TASK: &'static str = "task";
    pub const OPS: &'static str = "ops";
    pub const CALENDAR: &'static str = "calendar";
    pub const NOTES: &'static str = "notes";

    pub fn persona(name: &str) -> String {
        format!("persona:{name}")
    }

    pub fn task(name: &str) -> String {
        format!("task:{name}")
    }

    pub fn ops(category: &str) -> String {
        format!("ops:{category}")
    }
}

/// A single memory record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryItem {
    pub id: String,
    pub text: String,
    pub scope: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub last_accessed_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub ttl_seconds: Option<i64>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

impl MemoryItem {
    pub fn new(text: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            scope: scope.into(),
            tags: Vec::new(),
            created_at: chrono::Utc::now(),
            last_accessed_at: None,
            ttl_seconds: None,
            embedding: None,
        }
    }

    pub fn is_expired(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        match self.ttl_seconds {
            Some(ttl) => {
                let expires_at = self.created_at + chrono::Duration::seconds(ttl);
                now > expires_at
            }
            None => false,
        }
    }

    /// Ordering key for LRU eviction: `coalesce(last_accessed_at, created_at)`.
    pub fn recency_key(&self) -> chrono::DateTime<chrono::Utc> {
        self.last_accessed_at.unwrap_or(self.created_at)
    }
}

/// How a search result was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Vector,
    Fts,
    Hybrid,
}

/// A memory item with its search relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySearchResult {
    pub item: MemoryItem,
    pub score: f64,
    pub match_type: MatchType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_helpers_match_python_prefixes() {
        assert_eq!(MemoryScope::persona("zeke"), "persona:zeke");
        assert_eq!(MemoryScope::task("scheduling"), "task:scheduling");
        assert_eq!(MemoryScope::ops("general"), "ops:general");
    }

    #[test]
    fn item_with_no_ttl_never_expires() {
        let item = MemoryItem::new("hi", "notes");
        assert!(!item.is_expired(chrono::Utc::now() + chrono::Duration::days(3650)));
    }

    #[test]
    fn item_past_ttl_is_expired() {
        let mut item = MemoryItem::new("hi", "thread:abc");
        item.ttl_seconds = Some(60);
        assert!(item.is_expired(item.created_at + chrono::Duration::seconds(61)));
        assert!(!item.is_expired(item.created_at + chrono::Duration::seconds(59)));
    }

    #[test]
    fn recency_key_prefers_last_accessed() {
        let mut item = MemoryItem::new("hi", "notes");
        let accessed = item.created_at + chrono::Duration::seconds(100);
        item.last_accessed_at = Some(accessed);
        assert_eq!(item.recency_key(), accessed);
    }
}
