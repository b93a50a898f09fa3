pub mod tool_policy;

pub use tool_policy::{PolicyViolation, PolicyViolationType, ToolPolicyValidator};
