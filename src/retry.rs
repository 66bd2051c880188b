use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Wait before the second attempt; doubles for each one after.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// Retry without waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
        }
    }

    /// How long to wait after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32, err: &Error) -> Duration {
        if let Some(secs) = err.retry_after() {
            return Duration::from_secs(secs);
        }
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// `policy.max_attempts` is reached. The last retryable error is returned
/// wrapped in [`Error::RetriesExhausted`].
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, what: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.is_retryable() {
            return Err(err);
        }
        if attempt >= max_attempts {
            return Err(Error::RetriesExhausted {
                attempts: attempt,
                source: Box::new(err),
            });
        }

        let wait = policy.delay_for(attempt, &err);
        warn!(attempt, max_attempts, "{what} failed: {err}; retrying in {wait:?}");
        if !wait.is_zero() {
            sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn flaky(calls: &Cell<u32>, failures: u32) -> impl Future<Output = Result<u32>> + use<> {
        calls.set(calls.get() + 1);
        let n = calls.get();
        async move {
            if n <= failures {
                Err(Error::Transient(format!("attempt {n} failed")))
            } else {
                Ok(n)
            }
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = Cell::new(0);
        let result = with_retry(&RetryPolicy::immediate(3), "fetch", || flaky(&calls, 2)).await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let result = with_retry(&RetryPolicy::immediate(3), "fetch", || flaky(&calls, 10)).await;
        match result {
            Err(Error::RetriesExhausted { attempts, source }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(*source, Error::Transient(ref msg) if msg == "attempt 3 failed"));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn does_not_retry_auth_errors() {
        let calls = Cell::new(0);
        let result: Result<()> = with_retry(&RetryPolicy::immediate(3), "login", || {
            calls.set(calls.get() + 1);
            async { Err(Error::Auth("Bad credentials".into())) }
        })
        .await;
        assert!(matches!(result, Err(Error::Auth(_))));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn zero_attempts_still_runs_once() {
        let calls = Cell::new(0);
        let result = with_retry(&RetryPolicy::immediate(0), "fetch", || flaky(&calls, 0)).await;
        assert_eq!(result.unwrap(), 1);
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy::default();
        let err = Error::Transient("boom".into());
        assert_eq!(policy.delay_for(1, &err), Duration::from_millis(250));
        assert_eq!(policy.delay_for(2, &err), Duration::from_millis(500));
        assert_eq!(policy.delay_for(3, &err), Duration::from_millis(1000));
    }

    #[test]
    fn server_supplied_wait_wins() {
        let policy = RetryPolicy::default();
        let err = Error::RateLimited { retry_after: Some(4) };
        assert_eq!(policy.delay_for(1, &err), Duration::from_secs(4));
    }
}
