//! Target-agent resolution. Grounded on
//! `conductor.py::_determine_target_agents`.

use orc_domain::{AgentId, CapabilityCategory, ClassifiedIntent};

/// Builds the ordered, deduplicated target-agent list for a classified
/// intent:
/// 1. If coordination is required, start with the memory curator.
/// 2. If the intent has a specific agent override, append it.
/// 3. Otherwise — or if step 2 left only the memory curator from step 1
///    — append the category's default agent(s).
/// 4. If the category is sensitive, append the safety auditor.
/// 5. Dedup preserving first occurrence; default to `[safety_auditor]`
///    if the list is still empty.
pub fn resolve_targets(intent: &ClassifiedIntent) -> Vec<AgentId> {
    let mut agents: Vec<AgentId> = Vec::new();

    if intent.requires_coordination {
        agents.push(AgentId::MemoryCurator);
    }

    if let Some(primary) = intent.intent_type.agent_override() {
        if !agents.contains(&primary) {
            agents.push(primary);
        }
    }

    let only_memory_curator_from_coordination =
        agents.len() == 1 && agents[0] == AgentId::MemoryCurator;
    if agents.is_empty() || only_memory_curator_from_coordination {
        for agent in intent.category.default_agents() {
            if !agents.contains(&agent) {
                agents.push(agent);
            }
        }
    }

    if intent.category.is_sensitive() && !agents.contains(&AgentId::SafetyAuditor) {
        agents.push(AgentId::SafetyAuditor);
    }

    if agents.is_empty() {
        agents.push(AgentId::SafetyAuditor);
    }

    dedup_preserve_order(agents)
}

fn dedup_preserve_order(agents: Vec<AgentId>) -> Vec<AgentId> {
    let mut seen = std::collections::HashSet::new();
    agents.into_iter().filter(|a| seen.insert(*a)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use orc_domain::IntentType;

    fn intent(
        category: CapabilityCategory,
        intent_type: IntentType,
        requires_coordination: bool,
    ) -> ClassifiedIntent {
        ClassifiedIntent {
            category,
            intent_type,
            confidence: 0.9,
            entities: serde_json::Map::new(),
            requires_coordination,
            target_agents: Vec::new(),
            needs_llm_fallback: false,
        }
    }

    #[test]
    fn category_default_used_when_no_override() {
        let i = intent(CapabilityCategory::Scheduling, IntentType::CalendarQuery, false);
        assert_eq!(resolve_targets(&i), vec![AgentId::OpsPlanner]);
    }

    #[test]
    fn intent_override_takes_precedence() {
        let i = intent(CapabilityCategory::System, IntentType::Help, false);
        assert_eq!(resolve_targets(&i), vec![AgentId::SafetyAuditor]);
    }

    #[test]
    fn sensitive_category_appends_safety_auditor() {
        let i = intent(CapabilityCategory::Communication, IntentType::SendMessage, false);
        assert_eq!(resolve_targets(&i), vec![AgentId::CommsPilot, AgentId::SafetyAuditor]);
    }

    #[test]
    fn coordination_prepends_memory_curator_then_falls_back_to_category() {
        let i = intent(CapabilityCategory::Scheduling, IntentType::CalendarQuery, true);
        assert_eq!(
            resolve_targets(&i),
            vec![AgentId::MemoryCurator, AgentId::OpsPlanner]
        );
    }

    #[test]
    fn coordination_with_override_keeps_both_in_order() {
        let i = intent(CapabilityCategory::Memory, IntentType::SaveMemory, true);
        // MemoryCurator from coordination, SaveMemory's own override is also
        // MemoryCurator, so it collapses to one entry, then the sensitive
        // Memory category appends SafetyAuditor.
        assert_eq!(
            resolve_targets(&i),
            vec![AgentId::MemoryCurator, AgentId::SafetyAuditor]
        );
    }

    #[test]
    fn system_category_falls_back_to_its_three_default_agents() {
        let i = intent(CapabilityCategory::System, IntentType::MorningBriefing, false);
        // MORNING_BRIEFING has its own override (ops_planner), so the
        // category's 3-agent default list never kicks in here.
        assert_eq!(resolve_targets(&i), vec![AgentId::OpsPlanner]);
    }
}
