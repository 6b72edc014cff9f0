//! Retry with backoff for speech synthesis and Telegram Bot API calls

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::{Error, Result};

/// Retry policy
///
/// Controls how many times a failed call is retried and how long to wait
/// between attempts using exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Base delay between retries (doubles each attempt)
    pub base_delay: Duration,
    /// Maximum delay cap
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Determine whether an HTTP status and response body indicate a recoverable error.
///
/// Recoverable errors are worth retrying: rate limits (429), server errors (5xx),
/// and transient network-level failures surfaced in the body text.
#[must_use]
pub fn is_recoverable(status: u16, body: &str) -> bool {
    if status == 429 || (500..600).contains(&status) {
        return true;
    }

    let lower = body.to_lowercase();
    lower.contains("connection reset") || lower.contains("timed out") || lower.contains("dns error")
}

/// Extract a `retry_after` duration from a Telegram Bot API error body.
///
/// Telegram encodes the value in seconds at `parameters.retry_after`.
#[must_use]
pub fn parse_retry_after(body: &str) -> Option<Duration> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    let secs = v.get("parameters")?.get("retry_after")?.as_u64()?;

    Some(Duration::from_secs(secs))
}

/// Compute the delay before the next retry attempt.
///
/// A server-provided `retry_after` is used directly but capped at
/// `policy.max_delay`. Otherwise `min(base_delay * 2^attempt + jitter, max_delay)`
/// with jitter of 0-25% of the computed delay.
#[must_use]
pub fn delay_for_attempt(policy: &RetryPolicy, attempt: u32, retry_after: Option<Duration>) -> Duration {
    if let Some(ra) = retry_after {
        return ra.min(policy.max_delay);
    }

    let base = policy
        .base_delay
        .saturating_mul(2u32.saturating_pow(attempt))
        .min(policy.max_delay);

    let jitter = base.mul_f64(rand::thread_rng().gen_range(0.0..0.25));

    (base + jitter).min(policy.max_delay)
}

/// Run `op` until it succeeds, fails with an error `should_retry` rejects, or
/// the policy's retries are exhausted.
///
/// # Errors
///
/// Returns the last error produced by `op`
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    should_retry: impl Fn(&Error) -> bool,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_retries && should_retry(&e) => {
                let delay = delay_for_attempt(policy, attempt, None);
                tracing::warn!(
                    label,
                    attempt = attempt + 1,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn recoverable_statuses() {
        assert!(is_recoverable(429, ""));
        assert!(is_recoverable(502, ""));
        assert!(!is_recoverable(400, ""));
        assert!(!is_recoverable(200, "bad request format"));
        assert!(is_recoverable(200, "request Timed Out"));
    }

    #[test]
    fn parses_retry_after() {
        let body = r#"{"ok":false,"parameters":{"retry_after":30}}"#;
        assert_eq!(parse_retry_after(body), Some(Duration::from_secs(30)));
        assert_eq!(parse_retry_after(r#"{"ok":false}"#), None);
        assert_eq!(parse_retry_after("not json"), None);
    }

    #[test]
    fn caps_retry_after_at_max_delay() {
        let policy = RetryPolicy {
            max_delay: Duration::from_secs(5),
            ..RetryPolicy::default()
        };
        let d = delay_for_attempt(&policy, 0, Some(Duration::from_secs(60)));
        assert_eq!(d, policy.max_delay);
    }

    #[test]
    fn exponential_growth_with_bounded_jitter() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(60),
            ..RetryPolicy::default()
        };

        let d0 = delay_for_attempt(&policy, 0, None);
        let d2 = delay_for_attempt(&policy, 2, None);

        assert!(d0 >= Duration::from_millis(100) && d0 <= Duration::from_millis(125));
        assert!(d2 >= Duration::from_millis(400) && d2 <= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let result = retry_with_backoff(&policy, "test", Error::is_service_unavailable, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(Error::ServiceUnavailable("offline".to_string()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        tokio_test::assert_ok!(result);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_retry_rejected_errors() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let result: Result<()> =
            retry_with_backoff(&policy, "test", Error::is_service_unavailable, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Error::Skill("boom".to_string())) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_retries: 2,
            ..RetryPolicy::default()
        };

        let result: Result<()> =
            retry_with_backoff(&policy, "test", Error::is_service_unavailable, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Error::ServiceUnavailable("offline".to_string())) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
