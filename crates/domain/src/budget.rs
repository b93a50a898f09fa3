//! Per-request run budget: caps both the number of tool calls and the
//! wall-clock time a single orchestration run may spend. Grounded on the
//! original `guards/run_budget.py` module.

use std::time::Instant;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::ids::BudgetExceededReason;

pub const DEFAULT_MAX_TOOL_CALLS: u32 = 25;
pub const DEFAULT_TIMEOUT_SECONDS: f64 = 120.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub tool_calls_used: u32,
    pub tool_calls_limit: u32,
    pub elapsed_seconds: f64,
    pub timeout_seconds: f64,
    pub exceeded: bool,
    pub reason: Option<BudgetExceededReason>,
    pub tools_called: Vec<String>,
}

struct Inner {
    counter: u32,
    tools_called: Vec<String>,
    started_at: Instant,
}

/// Hard cap on work performed within one request. Not a rate limiter —
/// counting is post-call, so a failed tool call still consumes one unit.
pub struct RunBudget {
    tool_calls_limit: u32,
    timeout_seconds: f64,
    inner: Mutex<Inner>,
}

impl RunBudget {
    pub fn new(tool_calls_limit: u32, timeout_seconds: f64) -> Self {
        Self {
            tool_calls_limit,
            timeout_seconds,
            inner: Mutex::new(Inner {
                counter: 0,
                tools_called: Vec::new(),
                started_at: Instant::now(),
            }),
        }
    }

    pub fn default_budget() -> Self {
        Self::new(DEFAULT_MAX_TOOL_CALLS, DEFAULT_TIMEOUT_SECONDS)
    }

    fn elapsed_seconds(&self, inner: &Inner) -> f64 {
        inner.started_at.elapsed().as_secs_f64()
    }

    /// `is_exceeded`: tool-call exhaustion takes precedence over timeout
    /// when both are true simultaneously.
    pub fn exceeded_reason(&self) -> Option<BudgetExceededReason> {
        let inner = self.inner.lock();
        if inner.counter >= self.tool_calls_limit {
            return Some(BudgetExceededReason::ToolCalls);
        }
        if self.elapsed_seconds(&inner) >= self.timeout_seconds {
            return Some(BudgetExceededReason::Timeout);
        }
        None
    }

    pub fn is_exceeded(&self) -> bool {
        self.exceeded_reason().is_some()
    }

    pub fn can_execute_tool(&self) -> bool {
        !self.is_exceeded()
    }

    /// Pre-flight check: returns the exhaustion reason if the budget is
    /// already spent, otherwise `None`.
    pub fn check_budget(&self) -> Option<BudgetExceededReason> {
        self.exceeded_reason()
    }

    /// Post-call accounting: a tool call consumes one unit regardless of
    /// whether it ultimately succeeded.
    pub fn record_tool_call(&self, name: impl Into<String>) {
        let mut inner = self.inner.lock();
        inner.counter += 1;
        inner.tools_called.push(name.into());
    }

    pub fn get_summary(&self) -> BudgetSummary {
        let inner = self.inner.lock();
        let elapsed = self.elapsed_seconds(&inner);
        let reason = if inner.counter >= self.tool_calls_limit {
            Some(BudgetExceededReason::ToolCalls)
        } else if elapsed >= self.timeout_seconds {
            Some(BudgetExceededReason::Timeout)
        } else {
            None
        };
        BudgetSummary {
            tool_calls_used: inner.counter,
            tool_calls_limit: self.tool_calls_limit,
            elapsed_seconds: elapsed,
            timeout_seconds: self.timeout_seconds,
            exceeded: reason.is_some(),
            reason,
            tools_called: inner.tools_called.clone(),
        }
    }

    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.counter = 0;
        inner.tools_called.clear();
        inner.started_at = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_call_exhaustion_reports_tool_calls_reason() {
        let budget = RunBudget::new(3, 120.0);
        for i in 0..3 {
            assert!(budget.can_execute_tool());
            budget.record_tool_call(format!("tool_{i}"));
        }
        assert!(!budget.can_execute_tool());
        assert_eq!(budget.exceeded_reason(), Some(BudgetExceededReason::ToolCalls));
    }

    #[test]
    fn tool_call_reason_takes_precedence_when_both_exceeded() {
        let budget = RunBudget::new(1, 0.0);
        budget.record_tool_call("a");
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(budget.exceeded_reason(), Some(BudgetExceededReason::ToolCalls));
    }

    #[test]
    fn timeout_alone_reports_timeout_reason() {
        let budget = RunBudget::new(25, 0.0);
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(budget.exceeded_reason(), Some(BudgetExceededReason::Timeout));
    }

    #[test]
    fn twenty_five_of_thirty_attempts_succeed() {
        let budget = RunBudget::default_budget();
        let mut executed = 0;
        for i in 0..30 {
            if !budget.can_execute_tool() {
                break;
            }
            budget.record_tool_call(format!("tool_{i}"));
            executed += 1;
        }
        assert_eq!(executed, 25);
        let summary = budget.get_summary();
        assert!(summary.exceeded);
        assert_eq!(summary.reason, Some(BudgetExceededReason::ToolCalls));
    }

    #[test]
    fn reset_clears_counters() {
        let budget = RunBudget::new(1, 120.0);
        budget.record_tool_call("a");
        assert!(budget.is_exceeded());
        budget.reset();
        assert!(!budget.is_exceeded());
    }
}
