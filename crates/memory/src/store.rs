//! Hybrid FTS + vector memory store. Grounded on `core/memory/memory_store.py`,
//! with the SQLite/FTS5 backend re-expressed as an in-process `RwLock`
//! map plus hand-rolled inverted index, per the teacher's
//! `sessions::store::SessionStore` / `sessions::search::TranscriptIndex`
//! idiom (the database engine proper is out of scope; this crate owns
//! the `MemoryBackend` trait seam instead).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use orc_domain::{Config, Error};

use crate::embeddings::{cosine_similarity, EmbeddingProvider};
use crate::index::InvertedIndex;
use crate::ttl::{resolve_ttl_seconds, TtlBucket};
use crate::types::{MatchType, MemoryItem, MemorySearchResult};

#[async_trait]
pub trait MemoryBackend: Send + Sync {
    async fn upsert(&self, item: MemoryItem, generate_embedding: bool) -> Result<String, Error>;

    async fn search(
        &self,
        query: &str,
        scope: Option<&str>,
        k: usize,
        use_vector: bool,
        use_fts: bool,
    ) -> Result<Vec<MemorySearchResult>, Error>;

    fn get_by_id(&self, id: &str) -> Option<MemoryItem>;

    fn delete(&self, id: &str) -> bool;

    fn count(&self, scope: Option<&str>) -> usize;
}

pub struct InMemoryMemoryStore {
    items: RwLock<HashMap<String, MemoryItem>>,
    index: InvertedIndex,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    fts_weight: f64,
    vector_weight: f64,
}

impl InMemoryMemoryStore {
    pub fn new(config: &Config) -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            index: InvertedIndex::new(),
            embedding_provider: None,
            fts_weight: config.memory.fts_weight,
            vector_weight: config.memory.vector_weight,
        }
    }

    pub fn with_embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Sets the TTL (explicit value, explicit bucket, or scope-derived)
    /// on an item before storage, per the resolution order in `ttl`.
    pub fn apply_ttl(item: &mut MemoryItem, explicit_bucket: Option<TtlBucket>) {
        item.ttl_seconds = resolve_ttl_seconds(&item.scope, explicit_bucket, item.ttl_seconds);
    }

    fn touch_last_accessed(&self, id: &str) {
        if let Some(item) = self.items.write().get_mut(id) {
            item.last_accessed_at = Some(chrono::Utc::now());
        }
    }

    /// `FTS tokenization hardening`: strip anything outside alphanumeric
    /// plus space/hyphen/underscore before indexing/searching.
    fn harden_query(query: &str) -> String {
        query
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-' || *c == '_')
            .collect()
    }

    pub fn snapshot(&self) -> Vec<MemoryItem> {
        self.items.read().values().cloned().collect()
    }

    pub fn items_by_scope_prefix(&self, prefix: &str) -> Vec<MemoryItem> {
        self.items.read().values().filter(|i| i.scope.starts_with(prefix)).cloned().collect()
    }
}

#[async_trait]
impl MemoryBackend for InMemoryMemoryStore {
    async fn upsert(&self, mut item: MemoryItem, generate_embedding: bool) -> Result<String, Error> {
        // created_at is preserved on replace.
        if let Some(existing) = self.items.read().get(&item.id) {
            item.created_at = existing.created_at;
        }

        if generate_embedding && item.embedding.is_none() {
            if let Some(provider) = &self.embedding_provider {
                match provider.embed(&item.text).await {
                    Ok(embedding) => item.embedding = Some(embedding),
                    Err(err) => {
                        tracing::warn!(error = %err, "failed to generate embedding");
                    }
                }
            }
        }

        let id = item.id.clone();
        self.index.index(&id, &item.text);
        self.items.write().insert(id.clone(), item);
        tracing::debug!(memory_id = %id, "upserted memory");
        Ok(id)
    }

    async fn search(
        &self,
        query: &str,
        scope: Option<&str>,
        k: usize,
        use_vector: bool,
        use_fts: bool,
    ) -> Result<Vec<MemorySearchResult>, Error> {
        let mut scored: HashMap<String, (f64, MatchType)> = HashMap::new();

        if use_fts {
            let hardened = Self::harden_query(query);
            for (id, score) in self.index.search(&hardened).into_iter().take(k * 2) {
                let item = self.items.read().get(&id).cloned();
                let Some(item) = item else { continue };
                if let Some(scope) = scope {
                    if !item.scope.starts_with(scope) {
                        continue;
                    }
                }
                let entry = scored.entry(id).or_insert((0.0, MatchType::Fts));
                entry.0 += score * self.fts_weight;
            }
        }

        if use_vector {
            if let Some(provider) = &self.embedding_provider {
                match provider.embed(query).await {
                    Ok(query_embedding) => {
                        let candidates: Vec<MemoryItem> = {
                            let items = self.items.read();
                            items
                                .values()
                                .filter(|i| i.embedding.is_some())
                                .filter(|i| scope.map(|s| i.scope.starts_with(s)).unwrap_or(true))
                                .cloned()
                                .collect()
                        };
                        let mut ranked: Vec<(String, f64)> = candidates
                            .iter()
                            .map(|item| {
                                let sim = cosine_similarity(&query_embedding, item.embedding.as_ref().unwrap());
                                (item.id.clone(), sim)
                            })
                            .collect();
                        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
                        for (id, sim) in ranked.into_iter().take(k * 2) {
                            let entry = scored.entry(id).or_insert((0.0, MatchType::Vector));
                            if entry.1 == MatchType::Fts {
                                entry.1 = MatchType::Hybrid;
                            }
                            entry.0 += sim * self.vector_weight;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "vector search embedding failed");
                    }
                }
            }
        }

        let mut results: Vec<MemorySearchResult> = scored
            .into_iter()
            .filter_map(|(id, (score, match_type))| {
                self.items.read().get(&id).cloned().map(|item| MemorySearchResult { item, score, match_type })
            })
            .collect();
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(k);

        for result in &results {
            self.touch_last_accessed(&result.item.id);
        }

        Ok(results)
    }

    fn get_by_id(&self, id: &str) -> Option<MemoryItem> {
        self.items.read().get(id).cloned()
    }

    fn delete(&self, id: &str) -> bool {
        self.index.remove(id);
        self.items.write().remove(id).is_some()
    }

    fn count(&self, scope: Option<&str>) -> usize {
        let items = self.items.read();
        match scope {
            Some(prefix) => items.values().filter(|i| i.scope.starts_with(prefix)).count(),
            None => items.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orc_domain::Config;

    fn store() -> InMemoryMemoryStore {
        InMemoryMemoryStore::new(&Config::default())
    }

    #[tokio::test]
    async fn upsert_then_get_by_id_round_trips() {
        let store = store();
        let item = MemoryItem::new("buy milk", "task:grocery");
        let id = store.upsert(item.clone(), false).await.unwrap();
        let fetched = store.get_by_id(&id).unwrap();
        assert_eq!(fetched.text, "buy milk");
    }

    #[tokio::test]
    async fn replace_preserves_created_at() {
        let store = store();
        let mut item = MemoryItem::new("v1", "notes");
        item.created_at = chrono::Utc::now() - chrono::Duration::days(1);
        let original_created = item.created_at;
        let id = store.upsert(item.clone(), false).await.unwrap();
        item.text = "v2".to_string();
        store.upsert(item, false).await.unwrap();
        let fetched = store.get_by_id(&id).unwrap();
        assert_eq!(fetched.text, "v2");
        assert_eq!(fetched.created_at, original_created);
    }

    #[tokio::test]
    async fn fts_search_touches_last_accessed() {
        let store = store();
        let item = MemoryItem::new("remember to call mom", "notes");
        let id = store.upsert(item, false).await.unwrap();
        assert!(store.get_by_id(&id).unwrap().last_accessed_at.is_none());
        let results = store.search("call mom", None, 5, false, true).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(store.get_by_id(&id).unwrap().last_accessed_at.is_some());
    }

    #[tokio::test]
    async fn scope_prefix_filters_results() {
        let store = store();
        store.upsert(MemoryItem::new("grocery list item", "task:grocery"), false).await.unwrap();
        store.upsert(MemoryItem::new("grocery thoughts", "notes"), false).await.unwrap();
        let results = store.search("grocery", Some("task:"), 5, false, true).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].item.scope, "task:grocery");
    }

    #[tokio::test]
    async fn delete_removes_from_both_store_and_index() {
        let store = store();
        let id = store.upsert(MemoryItem::new("ephemeral", "thread:abc"), false).await.unwrap();
        assert!(store.delete(&id));
        assert!(store.get_by_id(&id).is_none());
        assert!(store.search("ephemeral", None, 5, false, true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn count_respects_scope_prefix() {
        let store = store();
        store.upsert(MemoryItem::new("a", "task:x"), false).await.unwrap();
        store.upsert(MemoryItem::new("b", "task:y"), false).await.unwrap();
        store.upsert(MemoryItem::new("c", "notes"), false).await.unwrap();
        assert_eq!(store.count(Some("task:")), 2);
        assert_eq!(store.count(None), 3);
    }

    #[tokio::test]
    async fn empty_fts_query_returns_no_hits_without_error() {
        let store = store();
        store.upsert(MemoryItem::new("something", "notes"), false).await.unwrap();
        let results = store.search("!!!???", None, 5, false, true).await.unwrap();
        assert!(results.is_empty());
    }
}
