pub mod embeddings;
pub mod evictor;
pub mod index;
pub mod store;
pub mod thread_recap;
pub mod ttl;
pub mod types;

pub use embeddings::{cosine_similarity, EmbeddingProvider};
pub use evictor::{evict_stale_and_lru, memory_stats, EvictionSummary, MemoryStats};
pub use store::{InMemoryMemoryStore, MemoryBackend};
pub use thread_recap::{
    calculate_thread_stats, create_recap_memory_item, generate_summary, recap_thread,
    truncate_summary, RecapConfig, RecapPurge, RecapResult, RecapStore, Summarizer,
    ThreadMessage, ThreadStats, RECAP_SYSTEM_PROMPT,
};
pub use ttl::{bucket_for_scope, resolve_ttl_seconds, TtlBucket};
pub use types::{MatchType, MemoryItem, MemoryScope, MemorySearchResult};
