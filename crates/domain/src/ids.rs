use serde::{Deserialize, Serialize};
use std::fmt;

/// Registered specialist agents. Closed set — the kernel never invents a
/// new agent id at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentId {
    Conductor,
    MemoryCurator,
    CommsPilot,
    OpsPlanner,
    ResearchScout,
    PersonalDataSteward,
    SafetyAuditor,
}

impl AgentId {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentId::Conductor => "conductor",
            AgentId::MemoryCurator => "memory_curator",
            AgentId::CommsPilot => "comms_pilot",
            AgentId::OpsPlanner => "ops_planner",
            AgentId::ResearchScout => "research_scout",
            AgentId::PersonalDataSteward => "personal_data_steward",
            AgentId::SafetyAuditor => "safety_auditor",
        }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Closed capability category set (matches the Memory/Profile/System... set
/// from the data model exactly — no additional categories).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityCategory {
    Communication,
    Scheduling,
    TaskManagement,
    Information,
    Memory,
    Grocery,
    Profile,
    System,
}

impl CapabilityCategory {
    /// Sensitive categories always pick up a safety-auditor handoff.
    pub fn is_sensitive(&self) -> bool {
        matches!(
            self,
            CapabilityCategory::Communication | CapabilityCategory::Profile | CapabilityCategory::Memory
        )
    }
}

/// Closed intent-type set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    SendMessage,
    CheckIn,
    ContactLookup,
    ConfigureCheckin,
    CalendarQuery,
    CreateEvent,
    UpdateEvent,
    DeleteEvent,
    SetReminder,
    CancelReminder,
    AddTask,
    UpdateTask,
    CompleteTask,
    DeleteTask,
    ViewTasks,
    Search,
    Research,
    Weather,
    Time,
    RecallFact,
    SearchHistory,
    LifelogQuery,
    SaveMemory,
    AddItem,
    CheckList,
    MarkPurchased,
    RemoveItem,
    ClearList,
    PreferenceUpdate,
    ProfileQuery,
    ReadFile,
    WriteFile,
    MorningBriefing,
    StatusCheck,
    Help,
    Unknown,
}

impl IntentType {
    /// `INTENT_TO_CATEGORY` — total mapping, every intent has a home category.
    pub fn category(&self) -> CapabilityCategory {
        use CapabilityCategory::*;
        use IntentType::*;
        match self {
            SendMessage | CheckIn | ContactLookup | ConfigureCheckin => Communication,
            CalendarQuery | CreateEvent | UpdateEvent | DeleteEvent | SetReminder
            | CancelReminder => Scheduling,
            AddTask | UpdateTask | CompleteTask | DeleteTask | ViewTasks => TaskManagement,
            Search | Research | Weather | Time => Information,
            RecallFact | SearchHistory | LifelogQuery | SaveMemory => Memory,
            AddItem | CheckList | MarkPurchased | RemoveItem | ClearList => Grocery,
            PreferenceUpdate | ProfileQuery => Profile,
            ReadFile | WriteFile | MorningBriefing | StatusCheck | Help | Unknown => System,
        }
    }

    /// `INTENT_TO_AGENT` override table — takes precedence over the
    /// category's default agent list.
    pub fn agent_override(&self) -> Option<AgentId> {
        use IntentType::*;
        match self {
            Help | StatusCheck | Unknown => Some(AgentId::SafetyAuditor),
            MorningBriefing => Some(AgentId::OpsPlanner),
            SaveMemory => Some(AgentId::MemoryCurator),
            _ => None,
        }
    }
}

impl CapabilityCategory {
    /// `CAPABILITY_TO_AGENT` — primary agent(s) responsible for a category.
    pub fn default_agents(&self) -> Vec<AgentId> {
        use AgentId::*;
        use CapabilityCategory::*;
        match self {
            Communication => vec![CommsPilot],
            Scheduling => vec![OpsPlanner],
            TaskManagement => vec![OpsPlanner],
            Information => vec![ResearchScout],
            Memory => vec![MemoryCurator],
            Grocery => vec![OpsPlanner],
            Profile => vec![PersonalDataSteward],
            System => vec![SafetyAuditor, OpsPlanner, MemoryCurator],
        }
    }
}

/// Reasons a specialist hands control back to the kernel (or to another
/// specialist).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffReason {
    CapabilityRequired,
    TaskContinuation,
    MultiStepWorkflow,
    ErrorEscalation,
    SafetyCheck,
    MemoryNeeded,
}

impl HandoffReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandoffReason::CapabilityRequired => "capability_required",
            HandoffReason::TaskContinuation => "task_continuation",
            HandoffReason::MultiStepWorkflow => "multi_step_workflow",
            HandoffReason::ErrorEscalation => "error_escalation",
            HandoffReason::SafetyCheck => "safety_check",
            HandoffReason::MemoryNeeded => "memory_needed",
        }
    }
}

impl fmt::Display for HandoffReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Specialist lifecycle status, mirrored per-agent for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Idle,
    Processing,
    WaitingForHandoff,
    Error,
}

/// The outcome of one orchestration run, attached to the response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Complete,
    Partial,
    Failed,
    AwaitingInput,
    HandedOff,
    BudgetExceeded,
}

/// Why a run budget was exhausted. Tool-call exhaustion takes precedence
/// over timeout when both conditions are true simultaneously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetExceededReason {
    ToolCalls,
    Timeout,
}

impl fmt::Display for BudgetExceededReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetExceededReason::ToolCalls => write!(f, "tool_calls"),
            BudgetExceededReason::Timeout => write!(f, "timeout"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_intent_has_a_category() {
        // A compile-time-total match already guarantees this; this test
        // documents the handful of boundary mappings explicitly.
        assert_eq!(IntentType::Weather.category(), CapabilityCategory::Information);
        assert_eq!(IntentType::SaveMemory.category(), CapabilityCategory::Memory);
        assert_eq!(IntentType::Unknown.category(), CapabilityCategory::System);
    }

    #[test]
    fn sensitive_categories_match_spec() {
        assert!(CapabilityCategory::Communication.is_sensitive());
        assert!(CapabilityCategory::Profile.is_sensitive());
        assert!(CapabilityCategory::Memory.is_sensitive());
        assert!(!CapabilityCategory::Scheduling.is_sensitive());
        assert!(!CapabilityCategory::System.is_sensitive());
    }

    #[test]
    fn intent_overrides_win_over_category_default() {
        assert_eq!(IntentType::Help.agent_override(), Some(AgentId::SafetyAuditor));
        assert_eq!(IntentType::SendMessage.agent_override(), None);
    }

    #[test]
    fn system_category_has_three_default_agents() {
        assert_eq!(
            CapabilityCategory::System.default_agents(),
            vec![AgentId::SafetyAuditor, AgentId::OpsPlanner, AgentId::MemoryCurator]
        );
    }
}
