//! End-to-end test across the router, kernel, and memory crates through
//! the public `RequestEntryPoint` surface — no internals reached into.

use std::sync::Arc;

use async_trait::async_trait;

use orc_domain::{AgentContext, AgentId, AgentStatus, CompletionStatus, Config, Error};
use orc_gateway::{InboundRequest, RequestEntryPoint};
use orc_kernel::{Specialist, SpecialistRegistry};

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

fn registry() -> SpecialistRegistry {
    let mut registry = SpecialistRegistry::new();
    registry.register(Arc::new(Echo(AgentId::CommsPilot, "message sent")));
    registry.register(Arc::new(Echo(AgentId::SafetyAuditor, "looks fine")));
    registry
}

#[tokio::test]
async fn sensitive_category_runs_comms_pilot_then_safety_auditor() {
    let entry_point = RequestEntryPoint::new(Config::default(), registry());
    let envelope = entry_point.handle(InboundRequest::new("send sarah a message that I'll be late")).await;

    assert_eq!(envelope.metadata.completion_status, CompletionStatus::Complete);
    assert!(envelope.response.contains("message sent"));
    assert!(envelope.response.contains("looks fine"));
    assert_eq!(envelope.metadata.handoff_chain.len(), 2);
    assert_eq!(envelope.metadata.handoff_chain[0].source, "conductor");
    assert_eq!(envelope.metadata.handoff_chain[0].target, "comms_pilot");
    assert_eq!(envelope.metadata.handoff_chain[1].source, "conductor");
    assert_eq!(envelope.metadata.handoff_chain[1].target, "safety_auditor");
    assert_eq!(envelope.metadata.trace_summary.agents_involved.len(), 2);
}

#[tokio::test]
async fn unregistered_specialist_yields_failed_status_without_panicking() {
    let entry_point = RequestEntryPoint::new(Config::default(), SpecialistRegistry::new());
    let envelope = entry_point.handle(InboundRequest::new("what's the weather like?")).await;
    assert_eq!(envelope.metadata.completion_status, CompletionStatus::Failed);
}
