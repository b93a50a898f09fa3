//! Memory eviction daemon. Grounded on `core/memory/evictor.py`.

use std::collections::BTreeMap;

use orc_domain::Config;

use crate::store::InMemoryMemoryStore;

/// Scope prefixes subject to a per-scope row cap (order matters only for
/// reporting; caps themselves don't overlap in practice).
const SCOPE_LIMIT_PREFIXES: &[&str] = &["persona:", "task:", "ops:", "calendar:", "notes"];

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct EvictionSummary {
    pub ttl_expired: usize,
    pub lru_evicted: usize,
    pub scopes_cleaned: Vec<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MemoryStats {
    pub total_memories: usize,
    pub by_scope: BTreeMap<String, usize>,
    pub with_ttl: usize,
    pub with_embedding: usize,
    pub max_rows: usize,
}

fn scope_cap(config: &Config, prefix: &str) -> usize {
    if prefix == "persona:" {
        config.memory.persona_max_rows
    } else {
        config.memory.ops_max_rows
    }
}

/// Runs the full TTL sweep + per-scope LRU trim + global LRU trim.
pub fn evict_stale_and_lru(store: &InMemoryMemoryStore, config: &Config) -> EvictionSummary {
    let mut summary = EvictionSummary::default();
    let now = chrono::Utc::now();

    let expired: Vec<String> =
        store.snapshot().into_iter().filter(|item| item.is_expired(now)).map(|item| item.id).collect();
    for id in &expired {
        store.delete(id);
    }
    summary.ttl_expired = expired.len();

    for prefix in SCOPE_LIMIT_PREFIXES {
        let cap = scope_cap(config, prefix);
        let mut items = store.items_by_scope_prefix(prefix);
        if items.len() <= cap {
            continue;
        }
        items.sort_by_key(|item| (item.recency_key(), item.created_at));
        let excess = items.len() - cap;
        for item in items.into_iter().take(excess) {
            store.delete(&item.id);
        }
        summary.lru_evicted += excess;
        summary.scopes_cleaned.push(prefix.to_string());
    }

    let total = store.count(None);
    if total > config.memory.max_rows {
        let mut items = store.snapshot();
        items.sort_by_key(|item| (item.recency_key(), item.created_at));
        let excess = total - config.memory.max_rows;
        for item in items.into_iter().take(excess) {
            store.delete(&item.id);
        }
        summary.lru_evicted += excess;
    }

    summary
}

pub fn memory_stats(store: &InMemoryMemoryStore, config: &Config) -> MemoryStats {
    let items = store.snapshot();
    let mut by_scope = BTreeMap::new();
    for prefix in SCOPE_LIMIT_PREFIXES {
        by_scope.insert(prefix.to_string(), store.count(Some(prefix)));
    }
    MemoryStats {
        total_memories: items.len(),
        by_scope,
        with_ttl: items.iter().filter(|i| i.ttl_seconds.is_some()).count(),
        with_embedding: items.iter().filter(|i| i.embedding.is_some()).count(),
        max_rows: config.memory.max_rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MemoryItem;

    fn config_with_caps(persona_cap: usize, ops_cap: usize, global_cap: usize) -> Config {
        let mut config = Config::default();
        config.memory.persona_max_rows = persona_cap;
        config.memory.ops_max_rows = ops_cap;
        config.memory.max_rows = global_cap;
        config
    }

    #[tokio::test]
    async fn ttl_expired_items_are_removed() {
        let config = Config::default();
        let store = InMemoryMemoryStore::new(&config);
        let mut item = MemoryItem::new("stale", "thread:abc");
        item.created_at = chrono::Utc::now() - chrono::Duration::hours(40);
        item.ttl_seconds = Some(36 * 60 * 60);
        store.upsert(item, false).await.unwrap();

        let summary = evict_stale_and_lru(&store, &config);
        assert_eq!(summary.ttl_expired, 1);
        assert_eq!(store.count(None), 0);
    }

    #[tokio::test]
    async fn per_scope_cap_evicts_oldest_accessed_first() {
        let config = config_with_caps(100, 2, 100);
        let store = InMemoryMemoryStore::new(&config);
        for i in 0..3 {
            let mut item = MemoryItem::new(format!("task {i}"), "task:x");
            item.created_at = chrono::Utc::now() - chrono::Duration::hours(3 - i);
            store.upsert(item, false).await.unwrap();
        }
        let summary = evict_stale_and_lru(&store, &config);
        assert_eq!(summary.lru_evicted, 1);
        assert_eq!(store.count(Some("task:")), 2);
    }

    #[tokio::test]
    async fn global_cap_trims_across_scopes() {
        let config = config_with_caps(100, 100, 2);
        let store = InMemoryMemoryStore::new(&config);
        for i in 0..4 {
            let mut item = MemoryItem::new(format!("note {i}"), "notes");
            item.created_at = chrono::Utc::now() - chrono::Duration::hours(4 - i);
            store.upsert(item, false).await.unwrap();
        }
        let summary = evict_stale_and_lru(&store, &config);
        assert_eq!(summary.lru_evicted, 2);
        assert_eq!(store.count(None), 2);
    }

    #[tokio::test]
    async fn stats_count_ttl_and_embedding_flags() {
        let config = Config::default();
        let store = InMemoryMemoryStore::new(&config);
        let mut with_ttl = MemoryItem::new("a", "task:x");
        with_ttl.ttl_seconds = Some(60);
        store.upsert(with_ttl, false).await.unwrap();
        store.upsert(MemoryItem::new("b", "notes"), false).await.unwrap();

        let stats = memory_stats(&store, &config);
        assert_eq!(stats.total_memories, 2);
        assert_eq!(stats.with_ttl, 1);
        assert_eq!(stats.with_embedding, 0);
    }
}
