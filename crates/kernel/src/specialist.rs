//! The specialist contract the kernel dispatches against. Grounded on
//! `agents/base.py::BaseAgent` — the kernel treats every specialist as
//! opaque beyond this trait.

use async_trait::async_trait;

use orc_domain::{AgentContext, AgentId, AgentStatus, Error, HandoffReason, HandoffRequest};

/// A specialist worker. The kernel never inspects a specialist's
/// internals — only its declared id, name, handoff targets, status,
/// and its `run` entry point.
#[async_trait]
pub trait Specialist: Send + Sync {
    fn agent_id(&self) -> AgentId;

    fn name(&self) -> &str;

    /// Agents this specialist may itself hand off to. An inter-agent
    /// handoff targeting anything outside this list is rejected.
    fn handoff_targets(&self) -> &[AgentId] {
        &[]
    }

    fn status(&self) -> AgentStatus {
        AgentStatus::Idle
    }

    async fn run(&self, message: &str, ctx: &AgentContext) -> Result<String, Error>;

    /// Builds a handoff request to `target`, validated against
    /// `handoff_targets()`. Grounded on `BaseAgent.handoff_to`, which
    /// raises `ValueError` for any target outside the declared list;
    /// here that becomes `Error::Validation`. When `ctx` is supplied the
    /// handoff is also logged to its trace, matching the optional
    /// `agent_context` parameter the original takes.
    fn handoff_to(
        &self,
        target: AgentId,
        reason: HandoffReason,
        context: serde_json::Map<String, serde_json::Value>,
        message: impl Into<String>,
        ctx: Option<&AgentContext>,
    ) -> Result<HandoffRequest, Error>
    where
        Self: Sized,
    {
        if !self.handoff_targets().contains(&target) {
            return Err(Error::Validation(format!(
                "agent {} cannot hand off to {target}: allowed targets are {:?}",
                self.name(),
                self.handoff_targets(),
            )));
        }
        let message = message.into();
        if let Some(ctx) = ctx {
            ctx.trace_context.log_handoff_start(self.agent_id(), target, reason.as_str(), &message);
        }
        Ok(HandoffRequest {
            source_agent: self.agent_id(),
            target_agent: target,
            reason,
            context,
            message,
        })
    }
}

/// Pluggable fallback used when a target agent isn't present in the
/// specialist registry. Models the "bridge fallback" step the
/// orchestration algorithm calls for, without committing this crate to
/// any concrete downstream wire protocol.
#[async_trait]
pub trait BridgeFallback: Send + Sync {
    async fn route_to_agent(
        &self,
        agent_id: AgentId,
        message: &str,
        ctx: &AgentContext,
    ) -> Result<String, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Comms;

    #[async_trait]
    impl Specialist for Comms {
        fn agent_id(&self) -> AgentId {
            AgentId::CommsPilot
        }
        fn name(&self) -> &str {
            "comms_pilot"
        }
        fn handoff_targets(&self) -> &[AgentId] {
            &[AgentId::SafetyAuditor]
        }
        fn status(&self) -> AgentStatus {
            AgentStatus::Idle
        }
        async fn run(&self, _message: &str, _ctx: &AgentContext) -> Result<String, Error> {
            Ok(String::new())
        }
    }

    #[test]
    fn handoff_to_declared_target_succeeds() {
        let request = Comms
            .handoff_to(AgentId::SafetyAuditor, HandoffReason::SafetyCheck, serde_json::Map::new(), "check this", None)
            .expect("safety_auditor is a declared handoff target");
        assert_eq!(request.source_agent, AgentId::CommsPilot);
        assert_eq!(request.target_agent, AgentId::SafetyAuditor);
    }

    #[test]
    fn handoff_to_undeclared_target_is_rejected() {
        let err = Comms
            .handoff_to(AgentId::OpsPlanner, HandoffReason::TaskContinuation, serde_json::Map::new(), "", None)
            .expect_err("ops_planner is not a declared handoff target");
        assert!(matches!(err, Error::Validation(_)));
    }
}
