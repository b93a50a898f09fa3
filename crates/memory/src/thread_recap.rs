//! Thread recap: compress long conversation threads into compact,
//! long-term memory notes. Grounded on `core/memory/thread_recap.py`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use orc_domain::Error;

use crate::types::MemoryItem;

pub const RECAP_SYSTEM_PROMPT: &str = "You are a conversation summarizer. Compress the following conversation into a concise bullet-point summary.

Requirements:
- Maximum 900 bytes (leave room for metadata)
- Use bullet points for key information
- Capture: main topics discussed, decisions made, action items, important facts learned
- Preserve names, dates, and specific details
- Skip pleasantries and filler
- Write in past tense

Format:
- Topic 1: Key point
- Topic 2: Key point
- Action: Any follow-ups needed
- Context: Any important context for future reference";

const MAX_INPUT_CHARS: usize = 12000;

#[derive(Debug, Clone)]
pub struct RecapConfig {
    pub max_messages: usize,
    pub max_content_bytes: usize,
    pub max_summary_bytes: usize,
    pub min_age_hours: i64,
    pub purge_after_recap: bool,
}

impl Default for RecapConfig {
    fn default() -> Self {
        Self {
            max_messages: 20,
            max_content_bytes: 8 * 1024,
            max_summary_bytes: 1024,
            min_age_hours: 6,
            purge_after_recap: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ThreadMessage {
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ThreadStats {
    pub conversation_id: String,
    pub message_count: usize,
    pub total_bytes: usize,
    pub oldest_message: Option<DateTime<Utc>>,
    pub newest_message: Option<DateTime<Utc>>,
    pub needs_recap: bool,
}

impl ThreadStats {
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        match self.newest_message {
            Some(newest) => (now - newest).num_seconds() as f64 / 3600.0,
            None => 0.0,
        }
    }
}

pub fn calculate_thread_stats(
    messages: &[ThreadMessage],
    conversation_id: &str,
    config: &RecapConfig,
) -> ThreadStats {
    let total_bytes: usize = messages.iter().map(|m| m.content.len()).sum();
    let oldest = messages.iter().map(|m| m.created_at).min();
    let newest = messages.iter().map(|m| m.created_at).max();
    let needs_recap = messages.len() > config.max_messages || total_bytes > config.max_content_bytes;
    ThreadStats {
        conversation_id: conversation_id.to_string(),
        message_count: messages.len(),
        total_bytes,
        oldest_message: oldest,
        newest_message: newest,
        needs_recap,
    }
}

pub fn format_messages_for_summary(messages: &[ThreadMessage]) -> String {
    messages
        .iter()
        .filter(|m| !m.content.trim().is_empty())
        .map(|m| format!("[{}]: {}", m.role.to_uppercase(), m.content.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, system_prompt: &str, conversation: &str) -> Result<String, Error>;
}

/// Stores a generated recap memory item; returns whether the write
/// succeeded.
#[async_trait]
pub trait RecapStore: Send + Sync {
    async fn store_recap(&self, item: MemoryItem) -> Result<bool, Error>;
}

/// Discards raw messages for a conversation after a successful recap;
/// returns the number of messages purged.
#[async_trait]
pub trait RecapPurge: Send + Sync {
    async fn purge(&self, conversation_id: &str) -> Result<usize, Error>;
}

/// Truncates `summary` to fit within `max_bytes`, first by dropping
/// trailing lines, then by character, appending a truncation marker.
/// Must succeed even when the summary contains no newlines.
pub fn truncate_summary(summary: &str, max_bytes: usize) -> String {
    if summary.len() <= max_bytes {
        return summary.to_string();
    }
    let marker = "\n[...truncated]";
    let target_bytes = max_bytes.saturating_sub(20);
    let mut text = summary.to_string();

    while text.len() > target_bytes && text.contains('\n') {
        if let Some(pos) = text.rfind('\n') {
            text.truncate(pos);
        } else {
            break;
        }
    }

    while text.len() > target_bytes && !text.is_empty() {
        let drop = 10.min(text.len());
        let mut new_len = text.len() - drop;
        while new_len > 0 && !text.is_char_boundary(new_len) {
            new_len -= 1;
        }
        text.truncate(new_len);
    }

    format!("{}{}", text.trim_end(), marker)
}

pub async fn generate_summary(
    messages: &[ThreadMessage],
    config: &RecapConfig,
    summarizer: &dyn Summarizer,
) -> Result<String, Error> {
    let mut conversation_text = format_messages_for_summary(messages);
    if conversation_text.len() > MAX_INPUT_CHARS {
        let mut boundary = MAX_INPUT_CHARS;
        while boundary > 0 && !conversation_text.is_char_boundary(boundary) {
            boundary -= 1;
        }
        conversation_text.truncate(boundary);
        conversation_text.push_str("\n[...truncated...]");
    }

    let summary = summarizer.summarize(RECAP_SYSTEM_PROMPT, &conversation_text).await?;
    let summary = summary.trim().to_string();

    if summary.len() > config.max_summary_bytes {
        Ok(truncate_summary(&summary, config.max_summary_bytes))
    } else {
        Ok(summary)
    }
}

pub fn create_recap_memory_item(conversation_id: &str, summary: &str, stats: &ThreadStats, title: Option<&str>) -> MemoryItem {
    let header = format!(
        "Conversation Recap: {}\nMessages: {} | Size: {} bytes\nPeriod: {} to {}\n\n",
        title.unwrap_or(conversation_id),
        stats.message_count,
        stats.total_bytes,
        stats.oldest_message.map(|t| t.to_rfc3339()).unwrap_or_else(|| "unknown".to_string()),
        stats.newest_message.map(|t| t.to_rfc3339()).unwrap_or_else(|| "unknown".to_string()),
    );
    let mut item = MemoryItem::new(format!("{header}{summary}"), format!("recap:thread:{conversation_id}"));
    item.tags = vec!["recap".to_string(), "conversation".to_string(), "summary".to_string()];
    item.ttl_seconds = None; // long_term
    item
}

#[derive(Debug, Clone)]
pub struct RecapResult {
    pub conversation_id: String,
    pub success: bool,
    pub summary: Option<String>,
    pub messages_purged: usize,
    pub error: Option<String>,
}

/// Recaps one thread: summarizes, stores the recap memory item via
/// `store`, and — if configured — purges the raw messages via `purge`.
pub async fn recap_thread(
    conversation_id: &str,
    messages: &[ThreadMessage],
    title: Option<&str>,
    config: &RecapConfig,
    summarizer: &dyn Summarizer,
    store: &dyn RecapStore,
    purge: &dyn RecapPurge,
    now: DateTime<Utc>,
) -> RecapResult {
    let stats = calculate_thread_stats(messages, conversation_id, config);

    if stats.age_hours(now) < config.min_age_hours as f64 {
        return RecapResult {
            conversation_id: conversation_id.to_string(),
            success: false,
            summary: None,
            messages_purged: 0,
            error: Some(format!(
                "Thread too recent ({:.1}h < {}h min)",
                stats.age_hours(now),
                config.min_age_hours
            )),
        };
    }

    if !stats.needs_recap {
        return RecapResult {
            conversation_id: conversation_id.to_string(),
            success: false,
            summary: None,
            messages_purged: 0,
            error: Some(format!(
                "Thread does not need recap (msgs={}, bytes={})",
                stats.message_count, stats.total_bytes
            )),
        };
    }

    let summary = match generate_summary(messages, config, summarizer).await {
        Ok(s) => s,
        Err(err) => {
            return RecapResult {
                conversation_id: conversation_id.to_string(),
                success: false,
                summary: None,
                messages_purged: 0,
                error: Some(err.to_string()),
            }
        }
    };

    let memory_item = create_recap_memory_item(conversation_id, &summary, &stats, title);
    match store.store_recap(memory_item).await {
        Ok(true) => {}
        Ok(false) => {
            return RecapResult {
                conversation_id: conversation_id.to_string(),
                success: false,
                summary: Some(summary),
                messages_purged: 0,
                error: Some("Failed to store recap memory".to_string()),
            }
        }
        Err(err) => {
            return RecapResult {
                conversation_id: conversation_id.to_string(),
                success: false,
                summary: Some(summary),
                messages_purged: 0,
                error: Some(err.to_string()),
            }
        }
    }

    let messages_purged = if config.purge_after_recap {
        purge.purge(conversation_id).await.unwrap_or(0)
    } else {
        0
    };

    RecapResult {
        conversation_id: conversation_id.to_string(),
        success: true,
        summary: Some(summary),
        messages_purged,
        error: None,
    }
}
