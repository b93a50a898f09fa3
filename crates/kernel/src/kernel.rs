//! The orchestration kernel: resolves targets, dispatches to specialists
//! in order, and composes their responses into one envelope. Grounded on
//! `conductor.py::_execute`/`route_to_agent`/`execute_with_agent`/
//! `compose_response`.

use std::sync::Arc;
use std::time::Instant;

use orc_domain::{
    AgentContext, AgentId, AgentResponse, ClassifiedIntent, CompletionStatus, Error, HandoffReason,
};

use crate::registry::SpecialistRegistry;
use crate::specialist::BridgeFallback;
use crate::targets::resolve_targets;

/// The final, user-facing outcome of one orchestration run.
#[derive(Debug, Clone)]
pub struct OrchestrationResult {
    pub status: CompletionStatus,
    pub content: String,
    pub responses: Vec<AgentResponse>,
}

pub struct OrchestrationKernel {
    registry: SpecialistRegistry,
    bridge: Option<Arc<dyn BridgeFallback>>,
}

impl OrchestrationKernel {
    pub fn new(registry: SpecialistRegistry) -> Self {
        Self { registry, bridge: None }
    }

    pub fn with_bridge_fallback(mut self, bridge: Arc<dyn BridgeFallback>) -> Self {
        self.bridge = Some(bridge);
        self
    }

    /// Dispatches `message` to the agents resolved from `intent`, honoring
    /// the run budget carried in `ctx`, and composes their outputs into a
    /// single response.
    pub async fn dispatch(
        &self,
        intent: &ClassifiedIntent,
        message: &str,
        ctx: &AgentContext,
    ) -> OrchestrationResult {
        let targets = resolve_targets(intent);
        let mut responses: Vec<AgentResponse> = Vec::new();
        let mut agents_called: Vec<AgentId> = Vec::new();

        for target in &targets {
            if let Some(reason) = ctx.run_budget.check_budget() {
                let summary = ctx.run_budget.get_summary();
                ctx.trace_context.log_run_budget_exceeded(
                    &reason.to_string(),
                    summary.tool_calls_used,
                    summary.tool_calls_limit,
                    summary.elapsed_seconds,
                    summary.timeout_seconds,
                    &summary.tools_called,
                    Some(*target),
                );
                break;
            }

            let response = self.invoke_one(*target, message, ctx).await;
            if response.success && *target == AgentId::MemoryCurator {
                ctx.memory_context
                    .lock()
                    .push("memory_curator", serde_json::Value::String(response.content.clone()));
            }
            agents_called.push(*target);
            responses.push(response.clone());
            ctx.prior_responses.lock().push(response);
        }

        let downgrade_incomplete = intent.requires_coordination && agents_called != targets;
        compose_response(&responses, downgrade_incomplete)
    }

    async fn invoke_one(&self, target: AgentId, message: &str, ctx: &AgentContext) -> AgentResponse {
        let span = ctx.trace_context.create_span(format!("agent:{target}"));
        ctx.trace_context.log_handoff_start(
            AgentId::Conductor,
            target,
            HandoffReason::CapabilityRequired.as_str(),
            message,
        );
        let started = Instant::now();

        let outcome = if let Some(specialist) = self.registry.get(target) {
            ctx.trace_context.log_agent_start(span, target, message);
            specialist.run(message, ctx).await
        } else if let Some(bridge) = &self.bridge {
            bridge.route_to_agent(target, message, ctx).await
        } else {
            Err(Error::AgentExecutionError {
                agent_id: target.to_string(),
                message: "agent not registered and no bridge fallback configured".to_string(),
            })
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let response = match outcome {
            Ok(content) => {
                ctx.trace_context.log_agent_complete(span, target, elapsed_ms, &content);
                AgentResponse {
                    agent_id: target,
                    success: true,
                    content,
                    error: None,
                    processing_time_ms: elapsed_ms,
                }
            }
            Err(err) => {
                ctx.trace_context.log_agent_error(span, target, &err.to_string());
                AgentResponse {
                    agent_id: target,
                    success: false,
                    content: String::new(),
                    error: Some(err.to_string()),
                    processing_time_ms: elapsed_ms,
                }
            }
        };
        ctx.trace_context.log_handoff_complete(AgentId::Conductor, target, response.success);
        response
    }
}

/// Composes the dispatch loop's per-agent responses into one envelope.
/// Grounded on `conductor.py::compose_response`.
fn compose_response(responses: &[AgentResponse], downgrade_incomplete: bool) -> OrchestrationResult {
    if responses.is_empty() {
        return OrchestrationResult {
            status: CompletionStatus::Failed,
            content: "I wasn't able to process your request".to_string(),
            responses: Vec::new(),
        };
    }

    let successes: Vec<&AgentResponse> =
        responses.iter().filter(|r| r.success && !r.content.is_empty()).collect();
    let all_failed = responses.iter().all(|r| !r.success);

    if all_failed {
        let first_error = responses
            .iter()
            .find_map(|r| r.error.clone())
            .unwrap_or_else(|| "unknown error".to_string());
        return OrchestrationResult {
            status: CompletionStatus::Failed,
            content: first_error,
            responses: responses.to_vec(),
        };
    }

    let status = if successes.len() == responses.len() && !downgrade_incomplete {
        CompletionStatus::Complete
    } else {
        CompletionStatus::Partial
    };

    let content = match successes.len() {
        0 => String::new(),
        1 => successes[0].content.clone(),
        _ => successes
            .iter()
            .map(|r| r.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n"),
    };

    OrchestrationResult { status, content, responses: responses.to_vec() }
}
