//! Backoff for transient page fetch failures.

use std::time::Duration;

use crate::error::FetchError;

/// How often [`HttpFetcher`](super::HttpFetcher) repeats a failed page
/// request, and how long it waits in between.
///
/// Only errors that [`FetchError::is_retryable`] accepts are repeated. The
/// wait doubles per attempt up to `cap`. A page that still fails reaches the
/// table as `last_error` and is retried from there by `refetch_current`.
///
/// ```
/// use std::time::Duration;
/// use tablepager_lib::error::FetchError;
/// use tablepager_lib::fetch::RetryPolicy;
///
/// let policy = RetryPolicy::new(2, Duration::from_millis(100));
/// let busy = FetchError::http(503, "busy");
///
/// assert_eq!(policy.backoff(&busy, 0), Some(Duration::from_millis(100)));
/// assert_eq!(policy.backoff(&busy, 2), None);
/// assert_eq!(RetryPolicy::never().backoff(&busy, 0), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    base: Duration,
    cap: Duration,
}

impl Default for RetryPolicy {
    /// Three retries starting at 250 ms, capped at 2 s.
    fn default() -> Self {
        Self::new(3, Duration::from_millis(250))
    }
}

impl RetryPolicy {
    /// Retries up to `attempts` times, waiting `base`, then twice that, and
    /// so on. The wait is capped at eight times `base`.
    pub fn new(attempts: u32, base: Duration) -> Self {
        Self {
            attempts,
            base,
            cap: base.saturating_mul(8),
        }
    }

    /// Never retries.
    pub fn never() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Caps the wait between attempts.
    pub fn with_cap(mut self, cap: Duration) -> Self {
        self.cap = cap;
        self
    }

    /// Returns the wait before repeating a request that failed with `error`
    /// after `attempt` earlier retries, or `None` to give up.
    pub fn backoff(&self, error: &FetchError, attempt: u32) -> Option<Duration> {
        if attempt >= self.attempts || !error.is_retryable() {
            return None;
        }
        let factor = 2u32.saturating_pow(attempt);
        Some(self.base.saturating_mul(factor).min(self.cap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::new(50, Duration::from_millis(100)).with_cap(Duration::from_millis(500));
        let busy = FetchError::http(503, "busy");

        let waits: Vec<_> = (0..4).filter_map(|n| policy.backoff(&busy, n)).collect();
        assert_eq!(
            waits,
            [100, 200, 400, 500].map(Duration::from_millis)
        );
        assert_eq!(policy.backoff(&busy, 40), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_gives_up_on_permanent_errors() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(&FetchError::http(400, "bad"), 0), None);
        assert_eq!(policy.backoff(&FetchError::parse("eof"), 0), None);
        assert!(policy.backoff(&FetchError::http(429, "slow"), 0).is_some());
        assert_eq!(policy.backoff(&FetchError::http(429, "slow"), 3), None);
    }
}
