//! Bounded retry with exponential backoff around opening a provider stream.
//!
//! Delays start at `base_delay` and double per attempt, capped at
//! `max_delay`. After `max_attempts` tries the last error is returned.

use std::future::Future;
use std::time::Duration;

use shellmate_core::error::ProviderError;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (default 3).
    pub max_attempts: u32,
    /// Delay after the first failure (default 2s).
    pub base_delay: Duration,
    /// Upper bound for any single delay (default 60s).
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Delay after the failed attempt `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Delay before retrying after `err`. A rate limit's own hint wins when
    /// it is longer, still subject to the cap.
    fn delay_after(&self, attempt: u32, err: &ProviderError) -> Duration {
        let backoff = self.delay_for_attempt(attempt);
        match err {
            ProviderError::RateLimited { retry_after_secs } => backoff
                .max(Duration::from_secs(*retry_after_secs))
                .min(self.max_delay),
            _ => backoff,
        }
    }

    /// Run `operation` until it succeeds or the attempts run out.
    ///
    /// `on_retry(attempt, max_attempts, delay, &err)` is called before each
    /// sleep, with `attempt` counting from 1. A missing provider
    /// configuration is never retried.
    pub async fn run<F, Fut, T>(
        &self,
        mut operation: F,
        mut on_retry: impl FnMut(u32, u32, Duration, &ProviderError),
    ) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    if attempt >= max_attempts || matches!(err, ProviderError::NotConfigured(_)) {
                        warn!(attempts = attempt, error = %err, "Giving up on provider request");
                        return Err(err);
                    }

                    let delay = self.delay_after(attempt - 1, &err);
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Provider request failed, retrying"
                    );
                    on_retry(attempt, max_attempts, delay, &err);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn delays_double_from_two_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(4));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(8));
    }

    #[test]
    fn delays_are_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(5), Duration::from_secs(60));
        assert_eq!(policy.delay_for_attempt(40), Duration::from_secs(60));
    }

    #[test]
    fn rate_limit_hint_extends_delay() {
        let policy = RetryPolicy::default();
        let err = ProviderError::RateLimited {
            retry_after_secs: 10,
        };
        assert_eq!(policy.delay_after(0, &err), Duration::from_secs(10));

        let huge = ProviderError::RateLimited {
            retry_after_secs: 3600,
        };
        assert_eq!(policy.delay_after(0, &huge), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let mut warnings = Vec::new();

        let result = RetryPolicy::default()
            .run(
                || {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n < 2 {
                            Err(ProviderError::Network("connection refused".into()))
                        } else {
                            Ok("stream")
                        }
                    }
                },
                |attempt, max, delay, _| warnings.push((attempt, max, delay)),
            )
            .await;

        assert_eq!(result.unwrap(), "stream");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            warnings,
            vec![
                (1, 3, Duration::from_secs(2)),
                (2, 3, Duration::from_secs(4)),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn returns_last_error_after_three_attempts() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = RetryPolicy::default()
            .run(
                || {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        Err(ProviderError::ApiError {
                            status_code: 500,
                            message: format!("attempt {n}"),
                        })
                    }
                },
                |_, _, _, _| {},
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result.unwrap_err() {
            ProviderError::ApiError { message, .. } => assert_eq!(message, "attempt 2"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_actually_waits() {
        let start = tokio::time::Instant::now();
        let _: Result<(), _> = RetryPolicy::default()
            .run(
                || async { Err(ProviderError::Network("down".into())) },
                |_, _, _, _| {},
            )
            .await;
        // 2s + 4s between three attempts
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(6) && elapsed < Duration::from_secs(7));
    }

    #[tokio::test]
    async fn not_configured_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = RetryPolicy::default()
            .run(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(ProviderError::NotConfigured("no key".into())) }
                },
                |_, _, _, _| {},
            )
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
