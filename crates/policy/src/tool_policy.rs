//! Tool policy gate: allow-list checking, a JSON-Schema-subset input
//! validator, and output redaction for logging. Grounded on
//! `guards/tool_policy.py`.
//!
//! The Python original exposes this as a process-wide singleton
//! (`ToolPolicyValidator.get_instance()`); here the kernel owns an
//! `Arc<ToolPolicyValidator>` and hands it to whatever needs it, which
//! is the ordinary way to share one validated policy across a Rust
//! workspace without a global.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use orc_domain::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyViolationType {
    ToolNotAllowed,
    ToolNotFound,
    SchemaValidationFailed,
    AdditionalProperties,
    MissingRequired,
    TypeMismatch,
    ConstraintViolation,
    AdminRequired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyViolation {
    pub violation_type: PolicyViolationType,
    pub tool_name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PolicySettings {
    #[serde(default)]
    default_allow: bool,
    #[serde(default = "default_true")]
    strict_schema_validation: bool,
    #[serde(default = "default_true")]
    log_redaction_enabled: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ToolPolicyEntry {
    #[serde(default = "default_true")]
    allowed: bool,
    #[serde(default)]
    requires_admin: bool,
    #[serde(default)]
    schema: Option<Value>,
    #[serde(default)]
    redact_output: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct BlockedToolEntry {
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PolicyFile {
    #[serde(default)]
    settings: PolicySettings,
    #[serde(default)]
    tools: HashMap<String, ToolPolicyEntry>,
    #[serde(default)]
    blocked_tools: HashMap<String, BlockedToolEntry>,
    #[serde(default)]
    redact_patterns: Vec<String>,
}

/// Validates tool calls against a policy file and redacts sensitive
/// fields from tool output before logging.
pub struct ToolPolicyValidator {
    policy: PolicyFile,
}

impl ToolPolicyValidator {
    /// Loads a policy from the JSON file at `path`. A missing file is
    /// not fatal: it falls back to an open policy (`default_allow =
    /// true`), matching the original's behavior of not blocking startup
    /// on a missing policy file.
    pub fn load(path: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(policy) => {
                    tracing::info!(path, "loaded tool policy");
                    Self { policy }
                }
                Err(err) => {
                    tracing::error!(path, %err, "invalid tool policy JSON, falling back to open policy");
                    Self::open()
                }
            },
            Err(_) => {
                tracing::warn!(path, "policy file not found, falling back to open policy");
                Self::open()
            }
        }
    }

    pub fn from_json(contents: &str) -> Result<Self, Error> {
        let policy: PolicyFile = serde_json::from_str(contents)?;
        Ok(Self { policy })
    }

    fn open() -> Self {
        Self {
            policy: PolicyFile {
                settings: PolicySettings {
                    default_allow: true,
                    strict_schema_validation: true,
                    log_redaction_enabled: true,
                },
                tools: HashMap::new(),
                blocked_tools: HashMap::new(),
                redact_patterns: Vec::new(),
            },
        }
    }

    pub fn is_tool_allowed(&self, tool_name: &str) -> bool {
        if self.policy.blocked_tools.contains_key(tool_name) {
            return false;
        }
        if let Some(entry) = self.policy.tools.get(tool_name) {
            return entry.allowed;
        }
        self.policy.settings.default_allow
    }

    pub fn requires_admin(&self, tool_name: &str) -> bool {
        self.policy
            .tools
            .get(tool_name)
            .map(|t| t.requires_admin)
            .unwrap_or(false)
    }

    pub fn validate_input(
        &self,
        tool_name: &str,
        arguments: &Value,
        is_admin: bool,
    ) -> Option<PolicyViolation> {
        if let Some(blocked) = self.policy.blocked_tools.get(tool_name) {
            return Some(PolicyViolation {
                violation_type: PolicyViolationType::ToolNotAllowed,
                tool_name: tool_name.to_string(),
                message: format!(
                    "tool '{tool_name}' is blocked: {}",
                    blocked.reason.as_deref().unwrap_or("not permitted")
                ),
                field: None,
            });
        }

        if !self.is_tool_allowed(tool_name) {
            return Some(PolicyViolation {
                violation_type: PolicyViolationType::ToolNotFound,
                tool_name: tool_name.to_string(),
                message: format!("tool '{tool_name}' is not in the allow-list"),
                field: None,
            });
        }

        if self.requires_admin(tool_name) && !is_admin {
            return Some(PolicyViolation {
                violation_type: PolicyViolationType::AdminRequired,
                tool_name: tool_name.to_string(),
                message: format!("tool '{tool_name}' requires admin permissions"),
                field: None,
            });
        }

        let Some(tool_config) = self.policy.tools.get(tool_name) else {
            return if self.policy.settings.default_allow {
                None
            } else {
                Some(PolicyViolation {
                    violation_type: PolicyViolationType::ToolNotFound,
                    tool_name: tool_name.to_string(),
                    message: format!("tool '{tool_name}' not found in policy"),
                    field: None,
                })
            };
        };

        let Some(schema) = &tool_config.schema else {
            return None;
        };
        if !self.policy.settings.strict_schema_validation {
            return None;
        }

        validate_schema(tool_name, arguments, schema, "")
    }

    pub fn validate_and_raise(
        &self,
        tool_name: &str,
        arguments: &Value,
        is_admin: bool,
    ) -> Result<(), Error> {
        if let Some(violation) = self.validate_input(tool_name, arguments, is_admin) {
            tracing::warn!(
                tool_name,
                violation_type = ?violation.violation_type,
                "input policy violation"
            );
            return Err(Error::InputPolicyViolation {
                tool_name: tool_name.to_string(),
                violation: violation.message,
            });
        }
        Ok(())
    }

    pub fn redact_output(&self, tool_name: &str, output: &Value) -> Value {
        if !self.policy.settings.log_redaction_enabled {
            return output.clone();
        }
        let tool_fields: HashSet<String> = self
            .policy
            .tools
            .get(tool_name)
            .map(|t| t.redact_output.iter().cloned().collect())
            .unwrap_or_default();
        let patterns: HashSet<String> = self.policy.redact_patterns.iter().cloned().collect();
        redact_recursive(output, &tool_fields, &patterns)
    }
}

fn matches_pattern(field_name: &str, patterns: &HashSet<String>) -> bool {
    let lower = field_name.to_lowercase();
    patterns.iter().any(|p| lower.contains(&p.to_lowercase()))
}

fn redact_recursive(data: &Value, tool_fields: &HashSet<String>, patterns: &HashSet<String>) -> Value {
    match data {
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (key, value) in map {
                if tool_fields.contains(key) || matches_pattern(key, patterns) {
                    result.insert(key.clone(), Value::String("[REDACTED]".to_string()));
                } else {
                    result.insert(key.clone(), redact_recursive(value, tool_fields, patterns));
                }
            }
            Value::Object(result)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| redact_recursive(item, tool_fields, patterns))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn violation(
    violation_type: PolicyViolationType,
    tool_name: &str,
    message: impl Into<String>,
    field: impl Into<String>,
) -> Option<PolicyViolation> {
    Some(PolicyViolation {
        violation_type,
        tool_name: tool_name.to_string(),
        message: message.into(),
        field: Some(field.into()),
    })
}

fn validate_schema(tool_name: &str, data: &Value, schema: &Value, path: &str) -> Option<PolicyViolation> {
    let Value::Object(obj) = data else {
        return violation(
            PolicyViolationType::TypeMismatch,
            tool_name,
            format!("expected object, got {}", json_type_name(data)),
            if path.is_empty() { "root" } else { path },
        );
    };

    if let Some(required) = schema.get("required").and_then(|v| v.as_array()) {
        for field in required {
            let Some(field_name) = field.as_str() else { continue };
            if !obj.contains_key(field_name) {
                let field_path = join_path(path, field_name);
                return violation(
                    PolicyViolationType::MissingRequired,
                    tool_name,
                    format!("missing required field: {field_path}"),
                    field_path,
                );
            }
        }
    }

    let properties = schema.get("properties").and_then(|v| v.as_object());

    if schema.get("additionalProperties") == Some(&Value::Bool(false)) {
        let allowed: HashSet<&str> = properties
            .map(|p| p.keys().map(String::as_str).collect())
            .unwrap_or_default();
        for key in obj.keys() {
            if !allowed.contains(key.as_str()) {
                let field_path = join_path(path, key);
                return violation(
                    PolicyViolationType::AdditionalProperties,
                    tool_name,
                    format!("additional property not allowed: {field_path}"),
                    field_path,
                );
            }
        }
    }

    if let Some(properties) = properties {
        for (field_name, field_value) in obj {
            let Some(field_schema) = properties.get(field_name) else {
                continue;
            };
            let field_path = join_path(path, field_name);
            if let Some(v) = validate_field(tool_name, field_value, field_schema, &field_path) {
                return Some(v);
            }
        }
    }

    None
}

fn validate_field(tool_name: &str, value: &Value, schema: &Value, path: &str) -> Option<PolicyViolation> {
    if let Some(expected) = schema.get("type").and_then(|v| v.as_str()) {
        if !check_type(value, expected) {
            return violation(
                PolicyViolationType::TypeMismatch,
                tool_name,
                format!(
                    "field '{path}' has wrong type: expected {expected}, got {}",
                    json_type_name(value)
                ),
                path,
            );
        }
    }

    if let Some(allowed) = schema.get("enum").and_then(|v| v.as_array()) {
        if !allowed.contains(value) {
            return violation(
                PolicyViolationType::ConstraintViolation,
                tool_name,
                format!("field '{path}' must be one of {allowed:?}, got {value}"),
                path,
            );
        }
    }

    if let Some(s) = value.as_str() {
        if let Some(min_len) = schema.get("minLength").and_then(|v| v.as_u64()) {
            if (s.chars().count() as u64) < min_len {
                return violation(
                    PolicyViolationType::ConstraintViolation,
                    tool_name,
                    format!("field '{path}' too short: minimum {min_len}"),
                    path,
                );
            }
        }
        if let Some(max_len) = schema.get("maxLength").and_then(|v| v.as_u64()) {
            if (s.chars().count() as u64) > max_len {
                return violation(
                    PolicyViolationType::ConstraintViolation,
                    tool_name,
                    format!("field '{path}' too long: maximum {max_len}"),
                    path,
                );
            }
        }
        if let Some(pattern) = schema.get("pattern").and_then(|v| v.as_str()) {
            match regex::Regex::new(pattern) {
                Ok(re) if !re.is_match(s) => {
                    return violation(
                        PolicyViolationType::ConstraintViolation,
                        tool_name,
                        format!("field '{path}' does not match pattern: {pattern}"),
                        path,
                    );
                }
                _ => {}
            }
        }
    }

    if let Some(n) = value.as_f64() {
        if !value.is_boolean() {
            if let Some(min) = schema.get("minimum").and_then(|v| v.as_f64()) {
                if n < min {
                    return violation(
                        PolicyViolationType::ConstraintViolation,
                        tool_name,
                        format!("field '{path}' below minimum: {min}"),
                        path,
                    );
                }
            }
            if let Some(max) = schema.get("maximum").and_then(|v| v.as_f64()) {
                if n > max {
                    return violation(
                        PolicyViolationType::ConstraintViolation,
                        tool_name,
                        format!("field '{path}' above maximum: {max}"),
                        path,
                    );
                }
            }
        }
    }

    None
}

fn check_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn join_path(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{path}.{segment}")
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
