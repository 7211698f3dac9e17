// src/ingest/retry.rs
use std::future::Future;
use std::time::Duration;

use crate::config::RequestConfig;

/// Upper bound on any single wait between attempts.
pub const MAX_DELAY: Duration = Duration::from_secs(3600);

fn clamp_secs(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs)
        .unwrap_or(MAX_DELAY)
        .min(MAX_DELAY)
}

/// Bounded exponential backoff.
/// `max_attempts` counts every call, including the first one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(2),
            backoff: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn from_request_config(cfg: &RequestConfig) -> Self {
        Self {
            max_attempts: cfg.max_retries.max(1),
            initial_delay: clamp_secs(cfg.retry_delay_secs),
            backoff: if cfg.backoff.is_finite() && cfg.backoff >= 1.0 {
                cfg.backoff
            } else {
                1.0
            },
        }
    }

    /// No waiting between attempts. Handy for tests and one-shot tools.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: Duration::ZERO,
            backoff: 1.0,
        }
    }

    /// Delay slept after the given failed attempt (1-based), capped at `MAX_DELAY`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        if self.initial_delay.is_zero() {
            return Duration::ZERO;
        }
        let exp = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        clamp_secs(self.initial_delay.as_secs_f64() * self.backoff.powi(exp))
    }
}

/// Run `op` until it succeeds, fails with an error `retryable` rejects, or the
/// attempts run out. The last error is returned unchanged.
pub async fn with_retry<T, E, F, Fut, P>(policy: &RetryPolicy, retryable: P, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let max = policy.max_attempts.max(1);
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if attempt < max && retryable(&e) => {
                let wait = policy.delay_after(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts = max,
                    wait_ms = wait.as_millis() as u64,
                    error = %e,
                    "attempt failed, retrying"
                );
                tokio::time::sleep(wait).await;
            }
            Err(e) => {
                if retryable(&e) {
                    tracing::error!(attempts = attempt, error = %e, "giving up after retries");
                }
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MonitorError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[test]
    fn delays_grow_geometrically() {
        let p = RetryPolicy::default();
        assert_eq!(p.delay_after(1), Duration::from_secs(2));
        assert_eq!(p.delay_after(2), Duration::from_secs(4));
        assert_eq!(p.delay_after(3), Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_third_attempt_after_two_waits() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();
        let t0 = Instant::now();

        let out: Result<&str, MonitorError> = with_retry(&policy, MonitorError::is_retryable, || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(MonitorError::Network(format!("timeout #{n}")))
                } else {
                    Ok("records")
                }
            }
        })
        .await;

        assert_eq!(out.unwrap(), "records");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // delay + delay * backoff = 2s + 4s
        let waited = t0.elapsed();
        assert!(waited >= Duration::from_secs(6), "waited {waited:?}");
        assert!(waited < Duration::from_secs(7), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn exhausting_attempts_returns_last_error() {
        let calls = AtomicU32::new(0);
        let out: Result<(), MonitorError> =
            with_retry(&RetryPolicy::default(), MonitorError::is_retryable, || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Err(MonitorError::Network(format!("refused #{n}"))) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match out {
            Err(MonitorError::Network(msg)) => assert_eq!(msg, "refused #3"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn application_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let out: Result<(), MonitorError> =
            with_retry(&RetryPolicy::default(), MonitorError::is_retryable, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(MonitorError::Application("code 002: bad param".into())) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(out, Err(MonitorError::Application(_))));
    }

    #[test]
    fn policy_from_request_config_clamps_values() {
        let cfg = RequestConfig {
            max_retries: 0,
            retry_delay_secs: -1.0,
            backoff: 0.5,
            ..RequestConfig::default()
        };
        let p = RetryPolicy::from_request_config(&cfg);
        assert_eq!(p.max_attempts, 1);
        assert_eq!(p.initial_delay, Duration::ZERO);
        assert_eq!(p.backoff, 1.0);
    }

    #[test]
    fn non_finite_config_values_do_not_panic() {
        let cfg = RequestConfig {
            retry_delay_secs: f64::INFINITY,
            backoff: f64::NAN,
            ..RequestConfig::default()
        };
        let p = RetryPolicy::from_request_config(&cfg);
        assert_eq!(p.initial_delay, MAX_DELAY);
        assert_eq!(p.backoff, 1.0);
    }

    #[test]
    fn huge_backoff_is_capped_instead_of_overflowing() {
        let p = RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_secs(2),
            backoff: 1e300,
        };
        assert_eq!(p.delay_after(1), Duration::from_secs(2));
        assert_eq!(p.delay_after(2), MAX_DELAY);
        assert_eq!(p.delay_after(4), MAX_DELAY);
    }
}
