//! Generic bounded retry with exponential backoff and jitter.
//!
//! Wraps any fallible async operation: on a retryable failure the engine
//! sleeps `base * 2^attempt + uniform_jitter(0, 1s)` and tries again, up to
//! the configured maximum, then propagates the final error. Non-retryable
//! classifications (see [`YouLearnError::is_retryable`]) propagate
//! immediately so that `NotAvailable` never burns retry budget.

use crate::error::{Result, YouLearnError};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry parameters shared by the transcript chain and request helpers.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Base delay; doubles each attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

/// Pre-jitter delay before retry number `attempt` (zero-based).
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * 2u32.saturating_pow(attempt)
}

/// Execute `op` under `policy`, retrying transient failures.
///
/// `op` receives the zero-based attempt number, mainly for logging.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    op_name: &str,
    mut op: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => {
                attempt += 1;
                if attempt >= policy.max_attempts {
                    warn!(
                        "{}: persistent failure after {} attempts: {}",
                        op_name, policy.max_attempts, err
                    );
                    return Err(err);
                }
                let jitter = {
                    let mut rng = rand::thread_rng();
                    Duration::from_secs_f64(rng.gen_range(0.0..1.0))
                };
                let delay = backoff_delay(policy.base_delay, attempt - 1) + jitter;
                warn!(
                    "{}: {}. Retry {}/{} in {:.1}s",
                    op_name,
                    err,
                    attempt,
                    policy.max_attempts,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_backoff_delays_strictly_increase() {
        let base = Duration::from_secs(2);
        let delays: Vec<_> = (0..5).map(|a| backoff_delay(base, a)).collect();
        for pair in delays.windows(2) {
            assert!(pair[1] > pair[0]);
        }
        assert_eq!(delays[0], Duration::from_secs(2));
        assert_eq!(delays[3], Duration::from_secs(16));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_k_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(quick_policy(), "test op", |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(YouLearnError::Transient("flaky".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_propagates_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_with_backoff(quick_policy(), "test op", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(YouLearnError::Transient("still down".into())) }
        })
        .await;
        assert!(matches!(result, Err(YouLearnError::Transient(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_short_circuits() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_with_backoff(quick_policy(), "test op", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(YouLearnError::NotAvailable("captions disabled".into())) }
        })
        .await;
        assert!(matches!(result, Err(YouLearnError::NotAvailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
