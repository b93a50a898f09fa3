//! Inbound/outbound wire shapes for the chat entry point. Grounded on
//! SPEC_FULL.md §6's envelope description and `conductor.py`'s response
//! dict, re-cast as typed structs.

use serde::{Deserialize, Serialize};

use orc_domain::{BudgetSummary, CompletionStatus, TraceSummary};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Honors an inbound `X-Trace-ID` header when the outer transport
    /// supplies one; absent here, a fresh id is minted.
    #[serde(default)]
    pub trace_id: Option<String>,
}

impl InboundRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HandoffChainEntry {
    pub source: String,
    pub target: String,
    pub reason: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseMetadata {
    pub completion_status: CompletionStatus,
    pub completion_message: String,
    pub handoff_chain: Vec<HandoffChainEntry>,
    pub trace_summary: TraceSummary,
    pub budget_summary: BudgetSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutboundEnvelope {
    pub response: String,
    pub agent_id: &'static str,
    pub conversation_id: Option<String>,
    pub trace_id: String,
    pub metadata: ResponseMetadata,
}
