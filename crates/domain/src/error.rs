/// Shared error type used across all orchestration-runtime crates.
///
/// Each domain-level failure mode named by the error-handling design is a
/// distinct variant here rather than a per-crate enum, matching how the
/// rest of the workspace centralizes its error type in `orc-domain`.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config: {0}")]
    Config(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("run budget exceeded: {reason} ({tool_calls_used}/{tool_calls_limit} calls, {elapsed_seconds:.1}s/{timeout_seconds:.1}s)")]
    BudgetExceeded {
        reason: crate::ids::BudgetExceededReason,
        tool_calls_used: u32,
        tool_calls_limit: u32,
        elapsed_seconds: f64,
        timeout_seconds: f64,
    },

    #[error("circuit open for {service}: retry after {retry_after_secs:.1}s")]
    CircuitOpen {
        service: String,
        retry_after_secs: f64,
    },

    #[error("retryable transport error calling {service}: {message}")]
    RetryableTransport { service: String, message: String },

    #[error("fatal transport error calling {service}: {message}")]
    FatalTransport { service: String, message: String },

    #[error("agent {agent_id} failed: {message}")]
    AgentExecutionError { agent_id: String, message: String },

    #[error("input policy violation on tool {tool_name}: {violation}")]
    InputPolicyViolation { tool_name: String, violation: String },

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
