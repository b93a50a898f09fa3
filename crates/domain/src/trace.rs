//! Hierarchical request tracing: a `TraceContext` owns a tree of
//! `TraceSpan`s and a flat, time-ordered `TraceEvent` log. Grounded on the
//! richer Python tracer this runtime's Rust predecessor never had — the
//! flat `sa-domain` `TraceEvent::emit()` pattern is kept for how events
//! reach `tracing`, but the span/context bookkeeping is new.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::AgentId;

/// Closed set of trace event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceEventType {
    RequestStart,
    RequestComplete,
    AgentStart,
    AgentComplete,
    AgentError,
    ToolStart,
    ToolComplete,
    ToolError,
    HandoffStart,
    HandoffComplete,
    ValidationStart,
    ValidationComplete,
    MemoryAccess,
    SecurityCheck,
    RunBudgetExceeded,
    InputPolicyViolation,
}

impl TraceEventType {
    fn is_error(&self) -> bool {
        matches!(
            self,
            TraceEventType::AgentError
                | TraceEventType::ToolError
                | TraceEventType::RunBudgetExceeded
                | TraceEventType::InputPolicyViolation
        )
    }
}

/// A single recorded event within a trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    pub event_type: TraceEventType,
    pub timestamp: DateTime<Utc>,
    pub trace_id: Uuid,
    pub span_id: u64,
    pub parent_span_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<AgentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl TraceEvent {
    /// Feed the event into the ambient structured-logging stream. The
    /// domain event is payload inside the log line, not a replacement for
    /// one — mirrors `sa_domain::trace::TraceEvent::emit()`.
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        if self.event_type.is_error() {
            tracing::error!(trace_event = %json, "orc_event");
        } else {
            tracing::info!(trace_event = %json, "orc_event");
        }
    }
}

/// A unit of work within a trace: has a start time and, once sealed, an
/// end time. Nests strictly within its parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceSpan {
    pub span_id: u64,
    pub parent_span_id: Option<u64>,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub events: Vec<TraceEvent>,
}

impl TraceSpan {
    pub fn duration_ms(&self) -> Option<i64> {
        self.end_time
            .map(|end| (end - self.start_time).num_milliseconds())
    }

    /// Sealing is idempotent: completing an already-sealed span never
    /// rewrites `end_time`. The upstream Python tracer does rewrite it
    /// unconditionally; this runtime deliberately does not.
    pub fn complete(&mut self) {
        if self.end_time.is_none() {
            self.end_time = Some(Utc::now());
        }
    }
}

/// Projected summary of a finished (or in-flight) trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceSummary {
    pub trace_id: Uuid,
    pub total_duration_ms: i64,
    pub span_count: usize,
    pub event_count: usize,
    pub agents_involved: Vec<AgentId>,
    pub tools_called: Vec<String>,
    pub error_count: usize,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

struct TraceContextInner {
    trace_id: Uuid,
    root_span_id: u64,
    current_span_id: u64,
    spans: HashMap<u64, TraceSpan>,
    events: Vec<TraceEvent>,
    start_time: DateTime<Utc>,
    metadata: serde_json::Map<String, serde_json::Value>,
}

/// Hierarchical trace for one request. Cheaply cloneable (`Arc`-backed
/// internally would also work; this runtime shares `TraceContext` behind
/// an `Arc` at the call site instead, keeping the type itself plain).
pub struct TraceContext {
    inner: Mutex<TraceContextInner>,
}

fn random_span_id() -> u64 {
    use rand::RngCore;
    rand::thread_rng().next_u64()
}

impl TraceContext {
    /// Mint a fresh trace with a root span, per `TraceContext.create`.
    pub fn create(metadata: serde_json::Map<String, serde_json::Value>) -> Self {
        Self::with_trace_id(None, metadata)
    }

    /// Like `create`, but honors a caller-supplied trace id (e.g. an
    /// inbound `X-Trace-ID` header) instead of always minting a fresh one.
    pub fn with_trace_id(trace_id: Option<Uuid>, metadata: serde_json::Map<String, serde_json::Value>) -> Self {
        let trace_id = trace_id.unwrap_or_else(Uuid::new_v4);
        let root_span_id = random_span_id();
        let now = Utc::now();
        let root_span = TraceSpan {
            span_id: root_span_id,
            parent_span_id: None,
            name: "root".to_string(),
            start_time: now,
            end_time: None,
            events: Vec::new(),
        };
        let mut spans = HashMap::new();
        spans.insert(root_span_id, root_span);
        Self {
            inner: Mutex::new(TraceContextInner {
                trace_id,
                root_span_id,
                current_span_id: root_span_id,
                spans,
                events: Vec::new(),
                start_time: now,
                metadata,
            }),
        }
    }

    pub fn trace_id(&self) -> Uuid {
        self.inner.lock().trace_id
    }

    pub fn root_span_id(&self) -> u64 {
        self.inner.lock().root_span_id
    }

    pub fn current_span_id(&self) -> u64 {
        self.inner.lock().current_span_id
    }

    /// Create a child span under the current span, making it current.
    pub fn create_span(&self, name: impl Into<String>) -> u64 {
        let mut inner = self.inner.lock();
        let parent = inner.current_span_id;
        let span_id = random_span_id();
        let span = TraceSpan {
            span_id,
            parent_span_id: Some(parent),
            name: name.into(),
            start_time: Utc::now(),
            end_time: None,
            events: Vec::new(),
        };
        inner.spans.insert(span_id, span);
        inner.current_span_id = span_id;
        span_id
    }

    /// Seal a span. If it was the current pointer, pop current back to its
    /// parent (or the root if it had none).
    pub fn complete_span(&self, span_id: u64) {
        let mut inner = self.inner.lock();
        let parent = inner.spans.get(&span_id).and_then(|s| s.parent_span_id);
        if let Some(span) = inner.spans.get_mut(&span_id) {
            span.complete();
        }
        if inner.current_span_id == span_id {
            inner.current_span_id = parent.unwrap_or(inner.root_span_id);
        }
    }

    /// Record an event against the span that is active *at the time of
    /// emission* — not necessarily the caller's current span, when an
    /// explicit `at_span` is supplied (mirrors `log_agent_start`'s
    /// temporary current-span override).
    #[allow(clippy::too_many_arguments)]
    pub fn add_event(
        &self,
        event_type: TraceEventType,
        at_span: Option<u64>,
        agent_id: Option<AgentId>,
        tool_name: Option<String>,
        duration_ms: Option<u64>,
        data: serde_json::Map<String, serde_json::Value>,
    ) -> TraceEvent {
        let mut inner = self.inner.lock();
        let span_id = at_span.unwrap_or(inner.current_span_id);
        let parent_span_id = inner.spans.get(&span_id).and_then(|s| s.parent_span_id);
        let event = TraceEvent {
            event_type,
            timestamp: Utc::now(),
            trace_id: inner.trace_id,
            span_id,
            parent_span_id,
            agent_id,
            tool_name,
            duration_ms,
            data,
        };
        inner.events.push(event.clone());
        if let Some(span) = inner.spans.get_mut(&span_id) {
            span.events.push(event.clone());
        }
        event
    }

    /// Agent spans are always created by the caller (`BaseAgent::run`
    /// equivalent) before logging agent_start — never implicitly by this
    /// helper. This resolves the open question about span-creation
    /// responsibility in favor of "caller always creates agent spans".
    pub fn log_agent_start(&self, span_id: u64, agent_id: AgentId, intent: &str) -> TraceEvent {
        let mut data = serde_json::Map::new();
        data.insert("intent".into(), serde_json::Value::String(intent.to_string()));
        let event = self.add_event(
            TraceEventType::AgentStart,
            Some(span_id),
            Some(agent_id),
            None,
            None,
            data,
        );
        event.emit();
        event
    }

    /// Completes `span_id` *before* recording the event, so — matching
    /// `tracing.py`, which pops `current_span_id` to the parent before
    /// calling `add_event` with no override — AGENT_COMPLETE lands on the
    /// parent span's event list, not the just-sealed child's.
    pub fn log_agent_complete(&self, span_id: u64, agent_id: AgentId, duration_ms: u64, preview: &str) -> TraceEvent {
        let mut data = serde_json::Map::new();
        data.insert(
            "result_preview".into(),
            serde_json::Value::String(preview.chars().take(100).collect()),
        );
        self.complete_span(span_id);
        let event = self.add_event(
            TraceEventType::AgentComplete,
            None,
            Some(agent_id),
            None,
            Some(duration_ms),
            data,
        );
        event.emit();
        event
    }

    /// See `log_agent_complete`: completes the span first so AGENT_ERROR
    /// lands on the parent span, matching the original.
    pub fn log_agent_error(&self, span_id: u64, agent_id: AgentId, error: &str) -> TraceEvent {
        let mut data = serde_json::Map::new();
        data.insert("error".into(), serde_json::Value::String(error.to_string()));
        self.complete_span(span_id);
        let event = self.add_event(
            TraceEventType::AgentError,
            None,
            Some(agent_id),
            None,
            None,
            data,
        );
        event.emit();
        event
    }

    /// Tool spans, unlike agent spans, are always created by the logger
    /// itself — the asymmetry is intentional and mirrors the original.
    pub fn log_tool_start(&self, agent_id: Option<AgentId>, tool_name: &str) -> u64 {
        let span_id = self.create_span(format!("tool:{tool_name}"));
        let event = self.add_event(
            TraceEventType::ToolStart,
            Some(span_id),
            agent_id,
            Some(tool_name.to_string()),
            None,
            serde_json::Map::new(),
        );
        event.emit();
        span_id
    }

    /// Completes `span_id` before recording the event, same rationale as
    /// `log_agent_complete`: TOOL_COMPLETE lands on the parent span.
    pub fn log_tool_complete(&self, span_id: u64, agent_id: Option<AgentId>, tool_name: &str, duration_ms: u64) {
        self.complete_span(span_id);
        let event = self.add_event(
            TraceEventType::ToolComplete,
            None,
            agent_id,
            Some(tool_name.to_string()),
            Some(duration_ms),
            serde_json::Map::new(),
        );
        event.emit();
    }

    /// See `log_tool_complete`: completes the span first so TOOL_ERROR
    /// lands on the parent span.
    pub fn log_tool_error(&self, span_id: u64, agent_id: Option<AgentId>, tool_name: &str, error: &str) {
        self.complete_span(span_id);
        let mut data = serde_json::Map::new();
        data.insert("error".into(), serde_json::Value::String(error.to_string()));
        let event = self.add_event(
            TraceEventType::ToolError,
            None,
            agent_id,
            Some(tool_name.to_string()),
            None,
            data,
        );
        event.emit();
    }

    pub fn log_handoff_start(&self, source: AgentId, target: AgentId, reason: &str, message: &str) -> TraceEvent {
        let mut data = serde_json::Map::new();
        data.insert("source".into(), serde_json::Value::String(source.to_string()));
        data.insert("target".into(), serde_json::Value::String(target.to_string()));
        data.insert("reason".into(), serde_json::Value::String(reason.to_string()));
        data.insert("message".into(), serde_json::Value::String(message.to_string()));
        let event = self.add_event(TraceEventType::HandoffStart, None, Some(source), None, None, data);
        event.emit();
        event
    }

    pub fn log_handoff_complete(&self, source: AgentId, target: AgentId, success: bool) -> TraceEvent {
        let mut data = serde_json::Map::new();
        data.insert("target".into(), serde_json::Value::String(target.to_string()));
        data.insert("success".into(), serde_json::Value::Bool(success));
        let event = self.add_event(TraceEventType::HandoffComplete, None, Some(source), None, None, data);
        event.emit();
        event
    }

    pub fn log_input_policy_violation(&self, tool_name: &str, violation_type: &str, field: Option<&str>) -> TraceEvent {
        let mut data = serde_json::Map::new();
        data.insert("violation_type".into(), serde_json::Value::String(violation_type.to_string()));
        if let Some(field) = field {
            data.insert("field".into(), serde_json::Value::String(field.to_string()));
        }
        let event = self.add_event(
            TraceEventType::InputPolicyViolation,
            None,
            None,
            Some(tool_name.to_string()),
            None,
            data,
        );
        event.emit();
        event
    }

    pub fn log_run_budget_exceeded(
        &self,
        reason: &str,
        tool_calls_used: u32,
        tool_calls_limit: u32,
        elapsed_seconds: f64,
        timeout_seconds: f64,
        tools_called: &[String],
        agent_id: Option<AgentId>,
    ) -> TraceEvent {
        let mut data = serde_json::Map::new();
        data.insert("reason".into(), serde_json::Value::String(reason.to_string()));
        data.insert("tool_calls_used".into(), tool_calls_used.into());
        data.insert("tool_calls_limit".into(), tool_calls_limit.into());
        data.insert("elapsed_seconds".into(), serde_json::json!(elapsed_seconds));
        data.insert("timeout_seconds".into(), serde_json::json!(timeout_seconds));
        data.insert(
            "tools_called".into(),
            serde_json::Value::Array(tools_called.iter().map(|t| serde_json::Value::String(t.clone())).collect()),
        );
        let event = self.add_event(
            TraceEventType::RunBudgetExceeded,
            None,
            agent_id,
            None,
            None,
            data,
        );
        event.emit();
        event
    }

    pub fn to_summary(&self) -> TraceSummary {
        let inner = self.inner.lock();
        let total_duration_ms = (Utc::now() - inner.start_time).num_milliseconds();
        let mut agents = Vec::new();
        let mut tools = Vec::new();
        let mut error_count = 0;
        for event in &inner.events {
            if let Some(a) = event.agent_id {
                if !agents.contains(&a) {
                    agents.push(a);
                }
            }
            if let Some(t) = &event.tool_name {
                if !tools.contains(t) {
                    tools.push(t.clone());
                }
            }
            if event.event_type.is_error() {
                error_count += 1;
            }
        }
        TraceSummary {
            trace_id: inner.trace_id,
            total_duration_ms,
            span_count: inner.spans.len(),
            event_count: inner.events.len(),
            agents_involved: agents,
            tools_called: tools,
            error_count,
            metadata: inner.metadata.clone(),
        }
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.inner.lock().events.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_span_nests_under_current() {
        let ctx = TraceContext::create(Default::default());
        let root = ctx.root_span_id();
        let child = ctx.create_span("agent:conductor");
        assert_eq!(ctx.current_span_id(), child);
        let grandchild = ctx.create_span("tool:weather");
        assert_eq!(ctx.current_span_id(), grandchild);
        ctx.complete_span(grandchild);
        assert_eq!(ctx.current_span_id(), child);
        ctx.complete_span(child);
        assert_eq!(ctx.current_span_id(), root);
    }

    #[test]
    fn completing_a_sealed_span_is_idempotent() {
        let ctx = TraceContext::create(Default::default());
        let span = ctx.create_span("x");
        ctx.complete_span(span);
        let first_end = {
            let inner = ctx.inner.lock();
            inner.spans.get(&span).unwrap().end_time.unwrap()
        };
        std::thread::sleep(std::time::Duration::from_millis(5));
        ctx.complete_span(span);
        let second_end = {
            let inner = ctx.inner.lock();
            inner.spans.get(&span).unwrap().end_time.unwrap()
        };
        assert_eq!(first_end, second_end);
    }

    #[test]
    fn events_capture_active_span_at_emission() {
        let ctx = TraceContext::create(Default::default());
        let root = ctx.root_span_id();
        let event = ctx.add_event(
            TraceEventType::RequestStart,
            None,
            None,
            None,
            None,
            Default::default(),
        );
        assert_eq!(event.span_id, root);
    }

    #[test]
    fn summary_counts_distinct_agents_and_tools() {
        let ctx = TraceContext::create(Default::default());
        let span = ctx.create_span("agent:comms_pilot");
        ctx.log_agent_start(span, AgentId::CommsPilot, "send_message");
        let tool_span = ctx.log_tool_start(Some(AgentId::CommsPilot), "send_sms");
        ctx.log_tool_complete(tool_span, Some(AgentId::CommsPilot), "send_sms", 12);
        ctx.log_agent_complete(span, AgentId::CommsPilot, 20, "done");
        let summary = ctx.to_summary();
        assert_eq!(summary.agents_involved, vec![AgentId::CommsPilot]);
        assert_eq!(summary.tools_called, vec!["send_sms".to_string()]);
        assert_eq!(summary.error_count, 0);
    }

    #[test]
    fn agent_complete_event_lands_on_parent_span_not_the_sealed_child() {
        let ctx = TraceContext::create(Default::default());
        let root = ctx.root_span_id();
        let span = ctx.create_span("agent:research_scout");
        ctx.log_agent_start(span, AgentId::ResearchScout, "search_web");
        let event = ctx.log_agent_complete(span, AgentId::ResearchScout, 5, "done");
        assert_eq!(event.span_id, root);
        let root_span = { ctx.inner.lock().spans.get(&root).unwrap().events.clone() };
        assert!(root_span.iter().any(|e| e.event_type == TraceEventType::AgentComplete));
        let child_span = { ctx.inner.lock().spans.get(&span).unwrap().events.clone() };
        assert!(!child_span.iter().any(|e| e.event_type == TraceEventType::AgentComplete));
    }

    #[test]
    fn log_agent_start_targets_explicit_span_not_current() {
        let ctx = TraceContext::create(Default::default());
        let agent_span = ctx.create_span("agent:ops_planner");
        // Simulate something else becoming current in between.
        let other = ctx.create_span("tool:unrelated");
        ctx.log_agent_start(agent_span, AgentId::OpsPlanner, "add_task");
        let events = ctx.events();
        let agent_start = events.iter().find(|e| e.event_type == TraceEventType::AgentStart).unwrap();
        assert_eq!(agent_start.span_id, agent_span);
        assert_eq!(ctx.current_span_id(), other);
    }
}
