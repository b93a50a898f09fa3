pub mod budget;
pub mod config;
pub mod context;
pub mod error;
pub mod ids;
pub mod tool;
pub mod trace;

pub use budget::{BudgetSummary, RunBudget};
pub use config::Config;
pub use context::{AgentContext, AgentResponse, ClassifiedIntent, EnrichmentLog, HandoffRequest};
pub use error::Error;
pub use ids::{
    AgentId, AgentStatus, BudgetExceededReason, CapabilityCategory, CompletionStatus,
    HandoffReason, IntentType,
};
pub use tool::{ToolCall, ToolDefinition};
pub use trace::{TraceContext, TraceEvent, TraceEventType, TraceSpan, TraceSummary};

pub type Result<T> = std::result::Result<T, Error>;
