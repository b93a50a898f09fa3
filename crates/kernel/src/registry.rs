//! Specialist registry: populated once at startup, read-only after.
//! Grounded on `agents/base.py`'s `specialist_agents` map, re-cast as an
//! explicit dependency object instead of a module-level singleton.

use std::collections::HashMap;
use std::sync::Arc;

use orc_domain::AgentId;

use crate::specialist::Specialist;

#[derive(Default)]
pub struct SpecialistRegistry {
    specialists: HashMap<AgentId, Arc<dyn Specialist>>,
}

impl SpecialistRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, specialist: Arc<dyn Specialist>) {
        self.specialists.insert(specialist.agent_id(), specialist);
    }

    pub fn get(&self, agent_id: AgentId) -> Option<Arc<dyn Specialist>> {
        self.specialists.get(&agent_id).cloned()
    }

    pub fn contains(&self, agent_id: AgentId) -> bool {
        self.specialists.contains_key(&agent_id)
    }

    pub fn registered_agents(&self) -> Vec<AgentId> {
        self.specialists.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use orc_domain::{AgentContext, AgentStatus, Error};

    struct Stub(AgentId);

    #[async_trait]
    impl Specialist for Stub {
        fn agent_id(&self) -> AgentId {
            self.0
        }
        fn name(&self) -> &str {
            "stub"
        }
        fn status(&self) -> AgentStatus {
            AgentStatus::Idle
        }
        async fn run(&self, _message: &str, _ctx: &AgentContext) -> Result<String, Error> {
            Ok("ok".to_string())
        }
    }

    #[test]
    fn registered_agent_is_found() {
        let mut registry = SpecialistRegistry::new();
        registry.register(Arc::new(Stub(AgentId::OpsPlanner)));
        assert!(registry.contains(AgentId::OpsPlanner));
        assert!(!registry.contains(AgentId::ResearchScout));
    }
}
