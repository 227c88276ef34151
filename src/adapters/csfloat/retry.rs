//! Fixed-delay retry policy for CSFloat API calls.
//!
//! Connection failures and 429/503 answers are retried after a constant
//! delay. Production runs retry forever; tests swap in a bounded policy.

use std::time::Duration;

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Sleep between attempts
    pub delay: Duration,
    /// Maximum number of attempts (including the first); `None` retries forever
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Default sleep after a network error or rate limit (10 seconds)
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(10);

    /// Retry forever with a fixed delay
    pub fn unbounded(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    /// Give up after `max_attempts` attempts
    pub fn bounded(max_attempts: u32, delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: Some(max_attempts.max(1)),
        }
    }

    /// Whether another attempt may follow `attempts_made` failed ones
    pub fn should_retry(&self, attempts_made: u32) -> bool {
        match self.max_attempts {
            Some(max) => attempts_made < max,
            None => true,
        }
    }

    /// Status codes that mean "try again later"
    pub fn is_retryable_status(status: u16) -> bool {
        matches!(status, 429 | 503)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded(Self::DEFAULT_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay, Duration::from_secs(10));
        assert!(policy.max_attempts.is_none());
    }

    #[test]
    fn test_unbounded_always_retries() {
        let policy = RetryPolicy::unbounded(Duration::from_millis(1));
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(u32::MAX));
    }

    #[test]
    fn test_bounded_stops_at_max() {
        let policy = RetryPolicy::bounded(3, Duration::from_millis(1));
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }

    #[test]
    fn test_bounded_allows_at_least_one_attempt() {
        let policy = RetryPolicy::bounded(0, Duration::from_millis(1));
        assert_eq!(policy.max_attempts, Some(1));
        assert!(!policy.should_retry(1));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(RetryPolicy::is_retryable_status(429));
        assert!(RetryPolicy::is_retryable_status(503));

        assert!(!RetryPolicy::is_retryable_status(500));
        assert!(!RetryPolicy::is_retryable_status(502));
        assert!(!RetryPolicy::is_retryable_status(401));
        assert!(!RetryPolicy::is_retryable_status(404));
    }
}
