use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::budget::RunBudget;
use crate::ids::{AgentId, CapabilityCategory, HandoffReason, IntentType};
use crate::trace::TraceContext;

/// One classified utterance, produced by the intent router or the LLM
/// classifier fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedIntent {
    pub category: CapabilityCategory,
    pub intent_type: IntentType,
    pub confidence: f64,
    #[serde(default)]
    pub entities: serde_json::Map<String, serde_json::Value>,
    pub requires_coordination: bool,
    pub target_agents: Vec<AgentId>,
    pub needs_llm_fallback: bool,
}

/// A specialist's request to hand the turn to another agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffRequest {
    pub source_agent: AgentId,
    pub target_agent: AgentId,
    pub reason: HandoffReason,
    #[serde(default)]
    pub context: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub message: String,
}

/// Outcome of invoking one specialist during dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub agent_id: AgentId,
    pub success: bool,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub processing_time_ms: u64,
}

/// Append-only enrichment frame, keyed by the producer that wrote it.
/// Re-casts the source's free-form mutable `memory_context` dict into a
/// log that can only grow, never be blindly overwritten, while preserving
/// "later agents see earlier enrichment" semantics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichmentLog {
    frames: Vec<(String, serde_json::Value)>,
}

impl EnrichmentLog {
    pub fn push(&mut self, producer: impl Into<String>, value: serde_json::Value) {
        self.frames.push((producer.into(), value));
    }

    pub fn get(&self, producer: &str) -> Option<&serde_json::Value> {
        self.frames.iter().rev().find(|(p, _)| p == producer).map(|(_, v)| v)
    }

    pub fn all(&self) -> &[(String, serde_json::Value)] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Shared request-scoped context handed by reference to every specialist
/// invoked during one orchestration run.
pub struct AgentContext {
    pub user_message: String,
    pub conversation_id: Option<String>,
    pub memory_context: parking_lot::Mutex<EnrichmentLog>,
    pub user_profile: serde_json::Map<String, serde_json::Value>,
    pub phone_number: Option<String>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub trace_context: Arc<TraceContext>,
    pub run_budget: Arc<RunBudget>,
    pub prior_responses: parking_lot::Mutex<Vec<AgentResponse>>,
}

impl AgentContext {
    pub fn new(
        user_message: impl Into<String>,
        conversation_id: Option<String>,
        metadata: serde_json::Map<String, serde_json::Value>,
        trace_context: Arc<TraceContext>,
        run_budget: Arc<RunBudget>,
    ) -> Self {
        Self {
            user_message: user_message.into(),
            conversation_id,
            memory_context: parking_lot::Mutex::new(EnrichmentLog::default()),
            user_profile: serde_json::Map::new(),
            phone_number: None,
            metadata,
            trace_context,
            run_budget,
            prior_responses: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.metadata.get("is_admin").and_then(|v| v.as_bool()).unwrap_or(false)
    }

    pub fn source(&self) -> &str {
        self.metadata.get("source").and_then(|v| v.as_str()).unwrap_or("unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enrichment_log_get_returns_latest_for_producer() {
        let mut log = EnrichmentLog::default();
        log.push("memory_curator", serde_json::json!({"v": 1}));
        log.push("memory_curator", serde_json::json!({"v": 2}));
        log.push("ops_planner", serde_json::json!({"v": "x"}));
        assert_eq!(log.get("memory_curator"), Some(&serde_json::json!({"v": 2})));
        assert_eq!(log.get("ops_planner"), Some(&serde_json::json!({"v": "x"})));
        assert_eq!(log.get("research_scout"), None);
    }
}
