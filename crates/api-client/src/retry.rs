//! Retry with exponential backoff and jitter for quote requests.

use crate::error::{Error, Result};
use app_config::RetrySettings;
use std::future::Future;
use std::time::Duration;

/// Statuses worth another attempt: timeouts, rate limiting and gateway trouble.
const RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts = `max_retries + 1`.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base: Duration,
    /// Upper bound for any single delay.
    pub max: Duration,
    /// Apply +/- 50% random jitter to each delay.
    pub jitter: bool,
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            base: Duration::from_millis(settings.base_delay_ms),
            max: Duration::from_millis(settings.max_delay_ms.max(settings.base_delay_ms)),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Calculate the delay for a given retry attempt (0-based).
    ///
    /// The delay doubles with every attempt and is capped at `max`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let scale = 2f64.powi(attempt.min(30) as i32);
        let capped = (self.base.as_secs_f64() * scale).min(self.max.as_secs_f64());
        let delay = Duration::from_secs_f64(capped);

        if !self.jitter {
            return delay;
        }

        let jitter_ms = (delay.as_millis() as f64 * 0.5) as u64;
        let random_offset = fastrand::u64(0..=(jitter_ms * 2));
        let total_ms = delay.as_millis() as i64 + (random_offset as i64 - jitter_ms as i64);
        Duration::from_millis(total_ms.max(0) as u64)
    }

    /// Whether `error` is transient and the request should be attempted again.
    pub fn is_retryable(&self, error: &Error) -> bool {
        match error {
            Error::RequestFailed(e) if e.is_timeout() || e.is_connect() => true,
            Error::RequestFailed(_) | Error::ApiError { .. } | Error::HttpStatus { .. } => error
                .status()
                .is_some_and(|status| RETRYABLE_STATUSES.contains(&status)),
            _ => false,
        }
    }
}

/// Runs `operation` until it succeeds, fails permanently, or runs out of retries.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt < policy.max_retries && policy.is_retryable(&error) => {
                let delay = policy.delay_for_attempt(attempt);
                tracing::warn!(
                    request = %label,
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Request failed. Retrying..."
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base: Duration::from_millis(1),
            max: Duration::from_millis(2),
            jitter: false,
        }
    }

    fn unavailable() -> Error {
        Error::HttpStatus {
            status: 503,
            body: "maintenance".into(),
        }
    }

    #[test]
    fn delay_doubles_and_is_capped() {
        let policy = RetryPolicy {
            max_retries: 5,
            base: Duration::from_millis(100),
            max: Duration::from_secs(1),
            jitter: false,
        };
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(u32::MAX), Duration::from_secs(1));
    }

    #[test]
    fn jitter_stays_within_half_of_the_delay() {
        let policy = RetryPolicy {
            max_retries: 3,
            base: Duration::from_millis(100),
            max: Duration::from_secs(1),
            jitter: true,
        };
        for _ in 0..20 {
            let ms = policy.delay_for_attempt(1).as_millis();
            assert!((100..=300).contains(&ms), "delay {ms}ms out of range");
        }
    }

    #[test]
    fn only_transient_statuses_are_retried() {
        let policy = fast_policy(3);
        assert!(policy.is_retryable(&unavailable()));
        assert!(policy.is_retryable(&Error::ApiError { status: 429, msg: "slow down".into() }));
        assert!(!policy.is_retryable(&Error::ApiError { status: 401, msg: "bad token".into() }));
        assert!(!policy.is_retryable(&Error::HttpStatus { status: 404, body: String::new() }));
        assert!(!policy.is_retryable(&Error::EmptyHistory("PETR4".into())));
    }

    #[test]
    fn settings_convert_into_policy() {
        let policy = RetryPolicy::from(&RetrySettings {
            max_retries: 2,
            base_delay_ms: 250,
            max_delay_ms: 100,
        });
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.base, Duration::from_millis(250));
        assert_eq!(policy.max, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn retries_transient_failures_until_success() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(&fast_policy(3), "PETR4", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(unavailable())
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_with_backoff(&fast_policy(2), "PETR4", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(unavailable())
        })
        .await;

        assert!(matches!(result, Err(Error::HttpStatus { status: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_failures_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry_with_backoff(&fast_policy(5), "PETR4", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::EmptyHistory("PETR4".into()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
