//! The request entry point: the one place that turns an inbound chat
//! message into a dispatched orchestration run and a composed envelope.
//! Grounded on `conductor.py::process_message` (trace/budget setup,
//! REQUEST_START/REQUEST_COMPLETE bracketing, graceful budget-exceeded
//! handling) and on the teacher's `run_server()` for the active-run
//! counter / graceful-shutdown shape.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use orc_domain::{
    AgentContext, AgentId, CapabilityCategory, ClassifiedIntent, CompletionStatus, Config, IntentType,
    RunBudget, TraceContext, TraceEventType,
};
use orc_kernel::{BridgeFallback, OrchestrationKernel, OrchestrationResult, SpecialistRegistry};
use orc_memory::{InMemoryMemoryStore, MemoryBackend};
use orc_resilience::CircuitBreaker;
use orc_router::{ClassifierHints, IntentClassificationPipeline, LlmIntentClassifier};

use crate::envelope::{HandoffChainEntry, InboundRequest, OutboundEnvelope, ResponseMetadata};

/// RAII guard for the active-run counter: incremented on entry,
/// decremented unconditionally on drop (success, error, or panic-unwind).
struct RunGuard<'a> {
    counter: &'a AtomicU64,
}

impl<'a> RunGuard<'a> {
    fn new(counter: &'a AtomicU64) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct RequestEntryPoint {
    config: Config,
    kernel: OrchestrationKernel,
    classifier: IntentClassificationPipeline,
    memory: Arc<dyn MemoryBackend>,
    active_runs: Arc<AtomicU64>,
}

impl RequestEntryPoint {
    pub fn new(config: Config, registry: SpecialistRegistry) -> Self {
        let classifier = IntentClassificationPipeline::new(config.router.llm_fallback_threshold);
        let memory: Arc<dyn MemoryBackend> = Arc::new(InMemoryMemoryStore::new(&config));
        Self {
            kernel: OrchestrationKernel::new(registry),
            classifier,
            memory,
            config,
            active_runs: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_bridge_fallback(mut self, bridge: Arc<dyn BridgeFallback>) -> Self {
        self.kernel = self.kernel.with_bridge_fallback(bridge);
        self
    }

    pub fn with_llm_classifier(mut self, classifier: Arc<dyn LlmIntentClassifier>, circuit: Arc<CircuitBreaker>) -> Self {
        self.classifier = self.classifier.with_llm_classifier(classifier, circuit);
        self
    }

    pub fn with_memory_backend(mut self, memory: Arc<dyn MemoryBackend>) -> Self {
        self.memory = memory;
        self
    }

    pub fn active_run_count(&self) -> u64 {
        self.active_runs.load(Ordering::SeqCst)
    }

    /// Waits up to `timeout` for in-flight runs to drain. Per §5's
    /// graceful-shutdown rule, this never force-cancels a run; it only
    /// bounds how long the caller waits before giving up and exiting
    /// anyway.
    pub async fn shutdown(&self, timeout: Duration) {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.active_run_count() > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        if self.active_run_count() > 0 {
            tracing::warn!(active = self.active_run_count(), "shutdown timed out with runs still in flight");
        }
    }

    /// The eight-step algorithm: mint/honor a trace id, build the
    /// per-request trace and budget, emit REQUEST_START, optionally
    /// enrich metadata and context from memory, invoke the kernel,
    /// reconcile a budget-exceeded outcome, emit REQUEST_COMPLETE, and
    /// compose the outbound envelope.
    pub async fn handle(&self, inbound: InboundRequest) -> OutboundEnvelope {
        let _guard = RunGuard::new(&self.active_runs);

        let trace_id = inbound.trace_id.as_deref().and_then(|s| Uuid::parse_str(s).ok());
        let trace_context = Arc::new(TraceContext::with_trace_id(trace_id, inbound.metadata.clone()));
        let run_budget = Arc::new(RunBudget::new(
            self.config.run_budget.max_tool_calls,
            self.config.run_budget.timeout_seconds,
        ));

        trace_context.add_event(TraceEventType::RequestStart, None, None, None, None, Default::default());

        let mut metadata = inbound.metadata.clone();
        if !metadata.contains_key("learned_preferences_prompt") {
            if let Some(snippet) = self.learned_preferences_snippet().await {
                metadata.insert("learned_preferences_prompt".into(), serde_json::Value::String(snippet));
            }
        }

        let ctx = AgentContext::new(
            inbound.message.clone(),
            inbound.conversation_id.clone(),
            metadata,
            trace_context.clone(),
            run_budget.clone(),
        );

        let hints = ClassifierHints {
            sender_id: inbound.phone_number.clone(),
            recent_summary: ctx
                .metadata
                .get("conversation_history")
                .and_then(|v| v.as_str())
                .map(str::to_string),
        };
        let intent = self.classifier.classify(&inbound.message, &hints).await;

        self.enrich_with_memory(&intent, &ctx).await;

        let result = self.kernel.dispatch(&intent, &inbound.message, &ctx).await;

        let budget_summary = run_budget.get_summary();
        let (status, completion_message) = if budget_summary.exceeded && result.status != CompletionStatus::Complete
        {
            (
                CompletionStatus::BudgetExceeded,
                format!(
                    "stopped after {} of {} tool calls ({}): attempted {}",
                    budget_summary.tool_calls_used,
                    budget_summary.tool_calls_limit,
                    budget_summary.reason.map(|r| r.to_string()).unwrap_or_default(),
                    budget_summary.tools_called.join(", "),
                ),
            )
        } else {
            (result.status, default_completion_message(&result))
        };

        trace_context.add_event(TraceEventType::RequestComplete, None, None, None, None, Default::default());

        let handoff_chain = trace_context
            .events()
            .into_iter()
            .filter(|e| e.event_type == TraceEventType::HandoffStart)
            .map(|e| HandoffChainEntry {
                source: field(&e.data, "source"),
                target: field(&e.data, "target"),
                reason: field(&e.data, "reason"),
                message: field(&e.data, "message"),
            })
            .collect();

        OutboundEnvelope {
            response: if result.content.is_empty() { completion_message.clone() } else { result.content.clone() },
            agent_id: AgentId::Conductor.as_str(),
            conversation_id: inbound.conversation_id,
            trace_id: trace_context.trace_id().to_string(),
            metadata: ResponseMetadata {
                completion_status: status,
                completion_message,
                handoff_chain,
                trace_summary: trace_context.to_summary(),
                budget_summary,
            },
        }
    }

    /// Pulls the most salient remembered preference for this deployment
    /// into `learned_preferences_prompt` when the caller didn't already
    /// supply one. Best-effort: a memory miss or search error leaves the
    /// field unset rather than failing the request.
    async fn learned_preferences_snippet(&self) -> Option<String> {
        let results = self.memory.search("preferences", Some("persona:"), 1, false, true).await.ok()?;
        results.into_iter().next().map(|r| r.item.text)
    }

    /// Only searches memory when the classified intent makes it likely
    /// to matter, per §4.13 step 5 — every request touching memory on
    /// every turn would make the hybrid store the bottleneck for free.
    async fn enrich_with_memory(&self, intent: &ClassifiedIntent, ctx: &AgentContext) {
        let likely_needed = intent.requires_coordination
            || intent.category == CapabilityCategory::Memory
            || matches!(intent.intent_type, IntentType::RecallFact | IntentType::SearchHistory | IntentType::LifelogQuery);
        if !likely_needed {
            return;
        }
        match self.memory.search(&ctx.user_message, None, 3, true, true).await {
            Ok(results) if !results.is_empty() => {
                let snippets: Vec<String> = results.into_iter().map(|r| r.item.text).collect();
                ctx.memory_context.lock().push("entry_point", serde_json::json!({ "snippets": snippets }));
            }
            Ok(_) => {}
            Err(err) => tracing::warn!(error = %err, "memory enrichment search failed"),
        }
    }
}

fn field(data: &serde_json::Map<String, serde_json::Value>, key: &str) -> String {
    data.get(key).and_then(|v| v.as_str()).unwrap_or_default().to_string()
}

fn default_completion_message(result: &OrchestrationResult) -> String {
    match result.status {
        CompletionStatus::Complete => "request completed successfully".to_string(),
        CompletionStatus::Partial => "request completed partially; some specialists did not respond".to_string(),
        CompletionStatus::Failed => result.content.clone(),
        CompletionStatus::AwaitingInput => "awaiting further input".to_string(),
        CompletionStatus::HandedOff => "handed off to another agent".to_string(),
        CompletionStatus::BudgetExceeded => "run budget exceeded".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use orc_domain::{AgentStatus, Error};
    use orc_kernel::Specialist;

    struct Echo(AgentId, &'static str);

    #[async_trait]
    impl Specialist for Echo {
        fn agent_id(&self) -> AgentId {
            self.0
        }
        fn name(&self) -> &str {
            "echo"
        }
        fn status(&self) -> AgentStatus {
            AgentStatus::Idle
        }
        async fn run(&self, _message: &str, _ctx: &AgentContext) -> Result<String, Error> {
            Ok(self.1.to_string())
        }
    }

    fn entry_point() -> RequestEntryPoint {
        let mut registry = SpecialistRegistry::new();
        registry.register(Arc::new(Echo(AgentId::OpsPlanner, "it's on your calendar")));
        RequestEntryPoint::new(Config::default(), registry)
    }

    #[tokio::test]
    async fn handle_returns_conductor_envelope_with_handoff_chain() {
        let ep = entry_point();
        let envelope = ep.handle(InboundRequest::new("what's on my calendar today?")).await;
        assert_eq!(envelope.agent_id, "conductor");
        assert_eq!(envelope.metadata.completion_status, CompletionStatus::Complete);
        assert_eq!(envelope.response, "it's on your calendar");
        assert_eq!(envelope.metadata.handoff_chain.len(), 1);
        assert_eq!(envelope.metadata.handoff_chain[0].source, "conductor");
        assert_eq!(envelope.metadata.handoff_chain[0].target, "ops_planner");
        assert_eq!(envelope.metadata.handoff_chain[0].reason, "capability_required");
        assert!(Uuid::parse_str(&envelope.trace_id).is_ok());
    }

    #[tokio::test]
    async fn active_run_count_returns_to_zero_after_handle() {
        let ep = entry_point();
        assert_eq!(ep.active_run_count(), 0);
        let _ = ep.handle(InboundRequest::new("what's the weather?")).await;
        assert_eq!(ep.active_run_count(), 0);
    }

    #[tokio::test]
    async fn shutdown_returns_immediately_with_no_active_runs() {
        let ep = entry_point();
        let started = std::time::Instant::now();
        ep.shutdown(Duration::from_secs(5)).await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn exhausted_budget_downgrades_status_to_budget_exceeded() {
        let mut config = Config::default();
        config.run_budget.max_tool_calls = 0;
        let mut registry = SpecialistRegistry::new();
        registry.register(Arc::new(Echo(AgentId::OpsPlanner, "done")));
        let ep = RequestEntryPoint::new(config, registry);
        let envelope = ep.handle(InboundRequest::new("add buy milk to my tasks")).await;
        assert_eq!(envelope.metadata.completion_status, CompletionStatus::BudgetExceeded);
    }

    #[tokio::test]
    async fn inbound_trace_id_is_honored() {
        let ep = entry_point();
        let fixed = Uuid::new_v4().to_string();
        let mut inbound = InboundRequest::new("hello");
        inbound.trace_id = Some(fixed.clone());
        let envelope = ep.handle(inbound).await;
        assert_eq!(envelope.trace_id, fixed);
    }
}
