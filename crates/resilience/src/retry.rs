//! Jittered exponential backoff retry, optionally gated by a circuit
//! breaker. Grounded on `resilience/retry.py`.

use std::future::Future;
use std::sync::Arc;

use rand::Rng;

use orc_domain::Error;

use crate::circuit_breaker::CircuitBreaker;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_sec: f64,
    pub max_delay_sec: f64,
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_sec: 1.0,
            max_delay_sec: 30.0,
            jitter_factor: 0.5,
        }
    }
}

/// Exponential backoff with uniform jitter, capped at `max_delay`.
pub fn jittered_backoff(attempt: u32, base_delay: f64, max_delay: f64, jitter_factor: f64) -> f64 {
    let exp_delay = base_delay * 2f64.powi(attempt as i32);
    let capped_delay = exp_delay.min(max_delay);

    let jitter_range = capped_delay * jitter_factor;
    let jitter = rand::thread_rng().gen_range(-jitter_range..=jitter_range);

    (capped_delay + jitter).max(0.1).min(max_delay)
}

/// HTTP status codes that should trigger a retry.
pub struct RetryableHttpCodes;

impl RetryableHttpCodes {
    pub const RETRYABLE: [u16; 6] = [408, 429, 500, 502, 503, 504];

    pub fn is_retryable(status_code: u16) -> bool {
        Self::RETRYABLE.contains(&status_code)
    }
}

/// Whether a given `Error` should be retried at all — only transport
/// failures explicitly marked retryable are eligible.
fn is_retryable(err: &Error) -> bool {
    matches!(err, Error::RetryableTransport { .. })
}

/// Execute `func`, retrying transient failures with jittered backoff and
/// optionally gating attempts through a circuit breaker keyed by
/// `service`.
pub async fn with_retry<T, F, Fut>(
    func: F,
    service: Option<&str>,
    circuit: Option<&Arc<CircuitBreaker>>,
    config: &RetryConfig,
) -> Result<T, Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    if let Some(cb) = circuit {
        cb.acquire()?;
    }

    let mut last_err: Option<Error> = None;

    for attempt in 0..config.max_attempts {
        match func().await {
            Ok(result) => {
                if let Some(cb) = circuit {
                    cb.record_success();
                }
                return Ok(result);
            }
            Err(err) if is_retryable(&err) => {
                if attempt + 1 < config.max_attempts {
                    let delay = jittered_backoff(
                        attempt,
                        config.base_delay_sec,
                        config.max_delay_sec,
                        config.jitter_factor,
                    );
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts = config.max_attempts,
                        service = service.unwrap_or("<none>"),
                        delay_sec = delay,
                        error = %err,
                        "retrying after transient failure"
                    );
                    tokio::time::sleep(std::time::Duration::from_secs_f64(delay)).await;
                    last_err = Some(err);
                } else {
                    tracing::error!(
                        attempts = config.max_attempts,
                        service = service.unwrap_or("<none>"),
                        error = %err,
                        "all retry attempts exhausted"
                    );
                    if let Some(cb) = circuit {
                        cb.record_failure();
                    }
                    return Err(err);
                }
            }
            Err(err) => {
                if let Some(cb) = circuit {
                    cb.record_failure();
                }
                return Err(err);
            }
        }
    }

    Err(last_err.unwrap_or_else(|| Error::Other("retry loop exited with no result".into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn backoff_is_capped_at_max_delay() {
        for attempt in 0..10 {
            let delay = jittered_backoff(attempt, 1.0, 5.0, 0.5);
            assert!(delay <= 5.0);
            assert!(delay >= 0.1);
        }
    }

    #[test]
    fn retryable_http_codes_match_concrete_set() {
        for code in [408, 429, 500, 502, 503, 504] {
            assert!(RetryableHttpCodes::is_retryable(code));
        }
        assert!(!RetryableHttpCodes::is_retryable(200));
        assert!(!RetryableHttpCodes::is_retryable(404));
    }

    #[tokio::test]
    async fn succeeds_without_retry_on_first_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, Error> = with_retry(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(42)
            },
            None,
            None,
            &RetryConfig::default(),
        )
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig {
            max_attempts: 3,
            base_delay_sec: 0.01,
            max_delay_sec: 0.02,
            jitter_factor: 0.0,
        };
        let result: Result<u32, Error> = with_retry(
            || async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(Error::RetryableTransport {
                        service: "svc".into(),
                        message: "timeout".into(),
                    })
                } else {
                    Ok(7)
                }
            },
            Some("svc"),
            None,
            &config,
        )
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, Error> = with_retry(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::FatalTransport {
                    service: "svc".into(),
                    message: "bad request".into(),
                })
            },
            None,
            None,
            &RetryConfig::default(),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
