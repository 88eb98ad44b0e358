use std::future::Future;
use std::time::Duration;

use rand::Rng as _;

/// Verdict from the error classifier: try again or give up immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    Retry,
    Abort,
}

/// Fixed-count retry with exponential backoff and jitter, so concurrent
/// downloads hitting the same transient failure don't retry in lockstep.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_secs: u64,
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay_secs: 2,
            max_delay_secs: 30,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `retry` (0-indexed):
    /// `min(base * 2^retry, max) + jitter(0..base)`.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let exp = self
            .base_delay_secs
            .saturating_mul(1u64.checked_shl(retry).unwrap_or(u64::MAX));
        let jitter = if self.base_delay_secs > 0 {
            rand::thread_rng().gen_range(0..self.base_delay_secs)
        } else {
            0
        };
        Duration::from_secs(exp.min(self.max_delay_secs) + jitter)
    }
}

/// Run `operation` until it succeeds, the classifier says `Abort`, or the
/// attempt budget (1 initial + `max_retries`) is spent. Returns the first
/// `Ok` or the last error.
pub async fn retry_with_backoff<F, Fut, T, E, C>(
    config: &RetryConfig,
    classifier: C,
    operation: F,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> RetryAction,
    E: std::fmt::Display,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if classifier(&e) == RetryAction::Abort || attempt >= config.max_retries {
                    return Err(e);
                }
                let delay = config.delay_for_retry(attempt);
                tracing::warn!(
                    "retryable error (attempt {}/{}), retrying in {}s: {}",
                    attempt + 1,
                    config.max_retries + 1,
                    delay.as_secs(),
                    e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn no_delay(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay_secs: 0,
            max_delay_secs: 0,
        }
    }

    #[test]
    fn test_default_config() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.base_delay_secs, 2);
        assert_eq!(config.max_delay_secs, 30);
    }

    #[test]
    fn test_delay_grows_exponentially() {
        let config = RetryConfig {
            max_retries: 5,
            base_delay_secs: 2,
            max_delay_secs: 60,
        };
        // retry 0: 2 + jitter(0..2) -> [2, 4)
        let d = config.delay_for_retry(0);
        assert!(d.as_secs() >= 2 && d.as_secs() < 4);
        // retry 2: 8 + jitter(0..2) -> [8, 10)
        let d = config.delay_for_retry(2);
        assert!(d.as_secs() >= 8 && d.as_secs() < 10);
    }

    #[test]
    fn test_delay_capped_at_max() {
        let config = RetryConfig {
            max_retries: 10,
            base_delay_secs: 2,
            max_delay_secs: 20,
        };
        let d = config.delay_for_retry(10);
        assert!(d.as_secs() >= 20 && d.as_secs() < 22);
    }

    #[test]
    fn test_delay_zero_base() {
        assert_eq!(no_delay(3).delay_for_retry(0).as_secs(), 0);
    }

    #[tokio::test]
    async fn test_succeeds_first_try() {
        let result: Result<i32, String> =
            retry_with_backoff(&no_delay(3), |_| RetryAction::Retry, || async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_abort_stops_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<i32, String> = retry_with_backoff(
            &no_delay(3),
            |_| RetryAction::Abort,
            || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err("fatal".to_string())
                }
            },
        )
        .await;
        assert_eq!(result.unwrap_err(), "fatal");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<i32, String> = retry_with_backoff(
            &no_delay(3),
            |_| RetryAction::Retry,
            || {
                let c = c.clone();
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err("transient".to_string())
                    } else {
                        Ok(99)
                    }
                }
            },
        )
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<i32, String> = retry_with_backoff(
            &no_delay(2),
            |_| RetryAction::Retry,
            || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err("still failing".to_string())
                }
            },
        )
        .await;
        assert_eq!(result.unwrap_err(), "still failing");
        // 1 initial + 2 retries
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
