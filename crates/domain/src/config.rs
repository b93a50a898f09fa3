use serde::{Deserialize, Serialize};
use std::fmt;

use crate::budget::{DEFAULT_MAX_TOOL_CALLS, DEFAULT_TIMEOUT_SECONDS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub run_budget: RunBudgetConfig,
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub ttl: TtlConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub tool_policy: ToolPolicyConfig,
    #[serde(default)]
    pub log_dir: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            run_budget: RunBudgetConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            memory: MemoryConfig::default(),
            ttl: TtlConfig::default(),
            router: RouterConfig::default(),
            tool_policy: ToolPolicyConfig::default(),
            log_dir: None,
        }
    }
}

/// `RUN_MAX_TOOL_CALLS` / `RUN_MAX_SECONDS` default to the env-var
/// defaults (50 / 300) rather than the `RunBudget` constructor defaults
/// (25 / 120); the constructor defaults remain available via
/// `RunBudgetConfig::constructor_defaults()` for callers that build a
/// `RunBudget` directly without going through `Config`. See
/// `SPEC_FULL.md` §9 for the precedence rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunBudgetConfig {
    #[serde(default = "d_max_tool_calls")]
    pub max_tool_calls: u32,
    #[serde(default = "d_timeout_seconds")]
    pub timeout_seconds: f64,
}

fn d_max_tool_calls() -> u32 {
    50
}
fn d_timeout_seconds() -> f64 {
    300.0
}

impl Default for RunBudgetConfig {
    fn default() -> Self {
        Self {
            max_tool_calls: d_max_tool_calls(),
            timeout_seconds: d_timeout_seconds(),
        }
    }
}

impl RunBudgetConfig {
    pub fn constructor_defaults() -> (u32, f64) {
        (DEFAULT_MAX_TOOL_CALLS, DEFAULT_TIMEOUT_SECONDS)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    #[serde(default = "d_fail_threshold")]
    pub fail_threshold: u32,
    #[serde(default = "d_cooldown_sec")]
    pub cooldown_sec: f64,
}

fn d_fail_threshold() -> u32 {
    5
}
fn d_cooldown_sec() -> f64 {
    60.0
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            fail_threshold: d_fail_threshold(),
            cooldown_sec: d_cooldown_sec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "d_db_path")]
    pub db_path: String,
    #[serde(default = "d_embed_model")]
    pub embed_model: String,
    #[serde(default = "d_max_rows")]
    pub max_rows: u64,
    #[serde(default = "d_persona_max_rows")]
    pub persona_max_rows: u64,
    #[serde(default = "d_ops_max_rows")]
    pub ops_max_rows: u64,
    #[serde(default = "d_ops_ttl_days")]
    pub ops_ttl_days: u64,
    #[serde(default = "d_vector_dimensions")]
    pub vector_dimensions: usize,
    #[serde(default = "d_fts_weight")]
    pub fts_weight: f64,
    #[serde(default = "d_vector_weight")]
    pub vector_weight: f64,
}

fn d_db_path() -> String {
    "./data/memory.db".into()
}
fn d_embed_model() -> String {
    "text-embedding-3-small".into()
}
fn d_max_rows() -> u64 {
    20_000
}
fn d_persona_max_rows() -> u64 {
    5_000
}
fn d_ops_max_rows() -> u64 {
    10_000
}
fn d_ops_ttl_days() -> u64 {
    90
}
fn d_vector_dimensions() -> usize {
    1536
}
fn d_fts_weight() -> f64 {
    0.4
}
fn d_vector_weight() -> f64 {
    0.6
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_path: d_db_path(),
            embed_model: d_embed_model(),
            max_rows: d_max_rows(),
            persona_max_rows: d_persona_max_rows(),
            ops_max_rows: d_ops_max_rows(),
            ops_ttl_days: d_ops_ttl_days(),
            vector_dimensions: d_vector_dimensions(),
            fts_weight: d_fts_weight(),
            vector_weight: d_vector_weight(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtlConfig {
    #[serde(default = "d_ttl_transient")]
    pub transient_seconds: i64,
    #[serde(default = "d_ttl_session")]
    pub session_seconds: i64,
}

fn d_ttl_transient() -> i64 {
    129_600
}
fn d_ttl_session() -> i64 {
    604_800
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            transient_seconds: d_ttl_transient(),
            session_seconds: d_ttl_session(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default = "d_llm_fallback_threshold")]
    pub llm_fallback_threshold: f64,
    #[serde(default = "d_soft_fallback_threshold")]
    pub soft_fallback_threshold: f64,
}

fn d_llm_fallback_threshold() -> f64 {
    0.6
}
fn d_soft_fallback_threshold() -> f64 {
    0.8
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            llm_fallback_threshold: d_llm_fallback_threshold(),
            soft_fallback_threshold: d_soft_fallback_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolPolicyConfig {
    #[serde(default = "d_policy_path")]
    pub policy_path: String,
}

fn d_policy_path() -> String {
    "./tool_policy.json".into()
}

impl Default for ToolPolicyConfig {
    fn default() -> Self {
        Self {
            policy_path: d_policy_path(),
        }
    }
}

// ── Config validation ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.run_budget.max_tool_calls == 0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "run_budget.max_tool_calls".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.run_budget.timeout_seconds <= 0.0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "run_budget.timeout_seconds".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.circuit_breaker.fail_threshold == 0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "circuit_breaker.fail_threshold".into(),
                message: "must be greater than 0".into(),
            });
        }
        let weight_sum = self.memory.fts_weight + self.memory.vector_weight;
        if (weight_sum - 1.0).abs() > 1e-6 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "memory.fts_weight+vector_weight".into(),
                message: format!("weights sum to {weight_sum}, not 1.0"),
            });
        }
        if self.memory.db_path.is_empty() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "memory.db_path".into(),
                message: "must not be empty".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.router.llm_fallback_threshold) {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "router.llm_fallback_threshold".into(),
                message: "must be within [0, 1]".into(),
            });
        }

        issues
    }

    /// Overlay the environment variables named in the external-interfaces
    /// section on top of whatever TOML/defaults were already resolved.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("MEMORY_DB") {
            self.memory.db_path = v;
        }
        if let Ok(v) = std::env::var("EMBED_MODEL") {
            self.memory.embed_model = v;
        }
        if let Ok(v) = std::env::var("MEMORY_MAX_ROWS") {
            if let Ok(n) = v.parse() {
                self.memory.max_rows = n;
            }
        }
        if let Ok(v) = std::env::var("RUN_MAX_TOOL_CALLS") {
            if let Ok(n) = v.parse() {
                self.run_budget.max_tool_calls = n;
            }
        }
        if let Ok(v) = std::env::var("RUN_MAX_SECONDS") {
            if let Ok(n) = v.parse() {
                self.run_budget.timeout_seconds = n;
            }
        }
        if let Ok(v) = std::env::var("CB_FAIL_THRESHOLD") {
            if let Ok(n) = v.parse() {
                self.circuit_breaker.fail_threshold = n;
            }
        }
        if let Ok(v) = std::env::var("CB_COOLDOWN_SEC") {
            if let Ok(n) = v.parse() {
                self.circuit_breaker.cooldown_sec = n;
            }
        }
        if let Ok(v) = std::env::var("MEM_TTL_TRANSIENT") {
            if let Ok(n) = v.parse() {
                self.ttl.transient_seconds = n;
            }
        }
        if let Ok(v) = std::env::var("MEM_TTL_SESSION") {
            if let Ok(n) = v.parse() {
                self.ttl.session_seconds = n;
            }
        }
        if let Ok(v) = std::env::var("LOG_DIR") {
            self.log_dir = Some(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_env_var_defaults_not_constructor_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.run_budget.max_tool_calls, 50);
        assert_eq!(cfg.run_budget.timeout_seconds, 300.0);
        assert_eq!(RunBudgetConfig::constructor_defaults(), (25, 120.0));
    }

    #[test]
    fn valid_config_has_no_errors() {
        let cfg = Config::default();
        let issues = cfg.validate();
        assert!(issues.iter().all(|i| i.severity != ConfigSeverity::Error));
    }

    #[test]
    fn zero_max_tool_calls_is_error() {
        let mut cfg = Config::default();
        cfg.run_budget.max_tool_calls = 0;
        let issues = cfg.validate();
        assert!(issues
            .iter()
            .any(|i| i.field == "run_budget.max_tool_calls" && i.severity == ConfigSeverity::Error));
    }

    #[test]
    fn env_override_applies_on_top_of_defaults() {
        std::env::set_var("MEMORY_MAX_ROWS", "777");
        let mut cfg = Config::default();
        cfg.apply_env_overrides();
        assert_eq!(cfg.memory.max_rows, 777);
        std::env::remove_var("MEMORY_MAX_ROWS");
    }

    #[test]
    fn toml_round_trip() {
        let toml_str = r#"
[run_budget]
max_tool_calls = 10
timeout_seconds = 30.0
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.run_budget.max_tool_calls, 10);
        assert_eq!(cfg.memory.max_rows, 20_000);
    }
}
