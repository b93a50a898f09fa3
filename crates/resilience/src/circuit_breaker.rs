//! Per-service circuit breaker. CLOSED -> OPEN -> HALF_OPEN -> CLOSED.
//! Grounded on `resilience/circuit_breaker.py`.

use std::collections::HashMap;
use std::time::Instant;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use orc_domain::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

struct Inner {
    state: CircuitState,
    failure_count: u32,
    last_failure_at: Option<Instant>,
    successes_in_half_open: u32,
}

/// Circuit breaker for a single named service. Opens after
/// `fail_threshold` consecutive failures, tests recovery with one
/// half-open attempt after `cooldown_sec`, and requires two consecutive
/// half-open successes before fully closing again.
pub struct CircuitBreaker {
    service: String,
    fail_threshold: u32,
    cooldown_sec: f64,
    inner: Mutex<Inner>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitStateInfo {
    pub service: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub time_until_retry: f64,
}

impl CircuitBreaker {
    pub fn new(service: impl Into<String>, fail_threshold: u32, cooldown_sec: f64) -> Self {
        Self {
            service: service.into(),
            fail_threshold,
            cooldown_sec,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure_at: None,
                successes_in_half_open: 0,
            }),
        }
    }

    fn cooldown_elapsed(&self, inner: &Inner) -> bool {
        match inner.last_failure_at {
            Some(t) => t.elapsed().as_secs_f64() >= self.cooldown_sec,
            None => true,
        }
    }

    pub fn time_until_retry(&self) -> f64 {
        let inner = self.inner.lock();
        if inner.state != CircuitState::Open {
            return 0.0;
        }
        match inner.last_failure_at {
            Some(t) => (self.cooldown_sec - t.elapsed().as_secs_f64()).max(0.0),
            None => 0.0,
        }
    }

    /// Returns Ok(()) if the call may proceed (closed, or half-open test
    /// slot), or `Error::CircuitOpen` if the cooldown has not elapsed.
    pub fn acquire(&self) -> Result<(), Error> {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => Ok(()),
            CircuitState::HalfOpen => Ok(()),
            CircuitState::Open => {
                if self.cooldown_elapsed(&inner) {
                    tracing::info!(service = %self.service, "circuit transitioning to half_open");
                    inner.state = CircuitState::HalfOpen;
                    inner.successes_in_half_open = 0;
                    Ok(())
                } else {
                    let retry_after_secs = (self.cooldown_sec
                        - inner.last_failure_at.unwrap().elapsed().as_secs_f64())
                    .max(0.0);
                    Err(Error::CircuitOpen {
                        service: self.service.clone(),
                        retry_after_secs,
                    })
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::HalfOpen => {
                inner.successes_in_half_open += 1;
                if inner.successes_in_half_open >= 2 {
                    tracing::info!(service = %self.service, "circuit recovered, closing");
                    inner.state = CircuitState::Closed;
                    inner.failure_count = 0;
                }
            }
            CircuitState::Closed => {
                if inner.failure_count > 0 {
                    inner.failure_count -= 1;
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.failure_count += 1;
        inner.last_failure_at = Some(Instant::now());

        match inner.state {
            CircuitState::HalfOpen => {
                tracing::warn!(service = %self.service, "circuit failed in half_open, reopening");
                inner.state = CircuitState::Open;
                inner.successes_in_half_open = 0;
            }
            CircuitState::Closed => {
                if inner.failure_count >= self.fail_threshold {
                    tracing::warn!(
                        service = %self.service,
                        failures = inner.failure_count,
                        cooldown_sec = self.cooldown_sec,
                        "circuit opening"
                    );
                    inner.state = CircuitState::Open;
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn state_info(&self) -> CircuitStateInfo {
        let inner = self.inner.lock();
        CircuitStateInfo {
            service: self.service.clone(),
            state: inner.state,
            failure_count: inner.failure_count,
            time_until_retry: if inner.state == CircuitState::Open {
                self.time_until_retry()
            } else {
                0.0
            },
        }
    }

    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.last_failure_at = None;
        inner.successes_in_half_open = 0;
    }
}

/// Process-wide registry of circuit breakers, one per distinct service
/// name, created lazily on first use.
pub struct CircuitBreakerRegistry {
    fail_threshold: u32,
    cooldown_sec: f64,
    circuits: Mutex<HashMap<String, std::sync::Arc<CircuitBreaker>>>,
}

impl CircuitBreakerRegistry {
    pub fn new(fail_threshold: u32, cooldown_sec: f64) -> Self {
        Self {
            fail_threshold,
            cooldown_sec,
            circuits: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, service: &str) -> std::sync::Arc<CircuitBreaker> {
        let mut circuits = self.circuits.lock();
        circuits
            .entry(service.to_string())
            .or_insert_with(|| {
                std::sync::Arc::new(CircuitBreaker::new(
                    service,
                    self.fail_threshold,
                    self.cooldown_sec,
                ))
            })
            .clone()
    }

    pub fn all_states(&self) -> Vec<CircuitStateInfo> {
        self.circuits.lock().values().map(|cb| cb.state_info()).collect()
    }

    pub fn reset_all(&self) {
        for cb in self.circuits.lock().values() {
            cb.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold_failures() {
        let cb = CircuitBreaker::new("svc", 3, 60.0);
        for _ in 0..3 {
            cb.acquire().unwrap();
            cb.record_failure();
        }
        assert_eq!(cb.acquire().unwrap_err().to_string().contains("circuit open"), true);
    }

    #[test]
    fn half_open_requires_two_successes_to_close() {
        let cb = CircuitBreaker::new("svc", 1, 0.0);
        cb.acquire().unwrap();
        cb.record_failure();
        std::thread::sleep(std::time::Duration::from_millis(5));
        cb.acquire().unwrap();
        cb.record_success();
        assert_eq!(cb.state_info().state, CircuitState::HalfOpen);
        cb.record_success();
        assert_eq!(cb.state_info().state, CircuitState::Closed);
    }

    #[test]
    fn half_open_failure_reopens() {
        let cb = CircuitBreaker::new("svc", 1, 0.0);
        cb.acquire().unwrap();
        cb.record_failure();
        std::thread::sleep(std::time::Duration::from_millis(5));
        cb.acquire().unwrap();
        cb.record_failure();
        assert_eq!(cb.state_info().state, CircuitState::Open);
    }

    #[test]
    fn registry_reuses_circuit_per_service() {
        let registry = CircuitBreakerRegistry::new(5, 60.0);
        let a = registry.get("svc1");
        let b = registry.get("svc1");
        assert!(std::sync::Arc::ptr_eq(&a, &b));
    }
}
