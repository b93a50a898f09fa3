//! Coarse keyword-mapping fallback used only when the LLM classifier
//! itself cannot be reached. Grounded on
//! `conductor.py::_fallback_classification` — deliberately distinct
//! from, and coarser than, the fast router's regex table.

use orc_domain::{CapabilityCategory, ClassifiedIntent, IntentType};

static KEYWORD_MAPPINGS: &[(&[&str], CapabilityCategory, IntentType)] = &[
    (&["text", "sms", "message", "send"], CapabilityCategory::Communication, IntentType::SendMessage),
    (&["check-in", "checkin"], CapabilityCategory::Communication, IntentType::CheckIn),
    (
        &["calendar", "schedule", "meeting", "appointment"],
        CapabilityCategory::Scheduling,
        IntentType::CalendarQuery,
    ),
    (&["remind", "reminder"], CapabilityCategory::Scheduling, IntentType::SetReminder),
    (&["task", "todo", "to-do"], CapabilityCategory::TaskManagement, IntentType::ViewTasks),
    (&["add task", "new task"], CapabilityCategory::TaskManagement, IntentType::AddTask),
    (&["search", "look up", "find"], CapabilityCategory::Information, IntentType::Search),
    (&["weather"], CapabilityCategory::Information, IntentType::Weather),
    (&["time", "what time"], CapabilityCategory::Information, IntentType::Time),
    (&["remember", "recall", "what did"], CapabilityCategory::Memory, IntentType::RecallFact),
    (&["lifelog", "pendant", "recording"], CapabilityCategory::Memory, IntentType::LifelogQuery),
    (&["grocery", "groceries", "shopping list"], CapabilityCategory::Grocery, IntentType::CheckList),
    (&["add to list", "buy"], CapabilityCategory::Grocery, IntentType::AddItem),
    (&["profile", "preference", "setting"], CapabilityCategory::Profile, IntentType::ProfileQuery),
    (&["morning", "briefing", "brief me"], CapabilityCategory::System, IntentType::MorningBriefing),
    (&["help", "what can you"], CapabilityCategory::System, IntentType::Help),
    (&["status"], CapabilityCategory::System, IntentType::StatusCheck),
];

/// Classify by substring match only; used when the LLM classifier
/// cannot be reached at all. Confidence is fixed at 0.6 for any match,
/// 0.3 for the final unknown default.
pub fn classify_by_keyword(message: &str) -> ClassifiedIntent {
    let message_lower = message.to_lowercase();

    for (keywords, category, intent_type) in KEYWORD_MAPPINGS {
        if keywords.iter().any(|kw| message_lower.contains(kw)) {
            return ClassifiedIntent {
                category: *category,
                intent_type: *intent_type,
                confidence: 0.6,
                entities: serde_json::Map::new(),
                requires_coordination: false,
                target_agents: Vec::new(),
                needs_llm_fallback: false,
            };
        }
    }

    ClassifiedIntent {
        category: CapabilityCategory::System,
        intent_type: IntentType::Unknown,
        confidence: 0.3,
        entities: serde_json::Map::new(),
        requires_coordination: false,
        target_agents: vec![orc_domain::AgentId::SafetyAuditor],
        needs_llm_fallback: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_first_hit_keyword() {
        let intent = classify_by_keyword("can you check the weather");
        assert_eq!(intent.intent_type, IntentType::Weather);
        assert_eq!(intent.confidence, 0.6);
    }

    #[test]
    fn unknown_defaults_to_safety_auditor_target() {
        let intent = classify_by_keyword("zzzzz qqqqq");
        assert_eq!(intent.intent_type, IntentType::Unknown);
        assert_eq!(intent.target_agents, vec![orc_domain::AgentId::SafetyAuditor]);
    }
}
