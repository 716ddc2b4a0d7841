//! Retry policy with exponential backoff
//!
//! Backoff grows exponentially in the attempt index with bounded random
//! jitter so retry storms across the worker pool stay decorrelated.

use crate::config::RetryConfig;
use rand::Rng;
use std::time::Duration;

/// Jitter added to every backoff delay, in milliseconds
const JITTER_MIN_MS: u64 = 1000;
const JITTER_MAX_MS: u64 = 3000;

/// Decides whether and how long to retry failed fetch attempts
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_wait: Duration,
    no_retry_statuses: Vec<u16>,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_wait: Duration, no_retry_statuses: Vec<u16>) -> Self {
        Self {
            max_retries,
            base_wait,
            no_retry_statuses,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_secs(config.base_wait_secs),
            config.no_retry_statuses.clone(),
        )
    }

    /// Upper bound on attempts per URL
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Statuses in the do-not-retry set abort the attempt loop immediately
    pub fn is_permanent(&self, status: u16) -> bool {
        self.no_retry_statuses.contains(&status)
    }

    /// Whether a non-success status is worth another attempt
    pub fn should_retry_status(&self, status: u16) -> bool {
        status >= 400 && !self.is_permanent(status)
    }

    /// Backoff before the attempt after `attempt` (0-based), with jitter
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let jitter =
            Duration::from_millis(rand::thread_rng().gen_range(JITTER_MIN_MS..=JITTER_MAX_MS));
        self.backoff_base(attempt) + jitter
    }

    /// Deterministic component of the backoff: `base * 2^attempt`
    pub fn backoff_base(&self, attempt: u32) -> Duration {
        self.base_wait * 2u32.saturating_pow(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_secs(5), vec![404, 500])
    }

    #[test]
    fn backoff_base_is_monotonically_non_decreasing() {
        let policy = policy();
        let mut previous = Duration::ZERO;
        for attempt in 0..6 {
            let delay = policy.backoff_base(attempt);
            assert!(delay >= previous);
            previous = delay;
        }
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = policy();
        assert_eq!(policy.backoff_base(0), Duration::from_secs(5));
        assert_eq!(policy.backoff_base(1), Duration::from_secs(10));
        assert_eq!(policy.backoff_base(2), Duration::from_secs(20));
    }

    #[test]
    fn jittered_delay_stays_within_bounds() {
        let policy = policy();
        for _ in 0..50 {
            let delay = policy.backoff_delay(1);
            assert!(delay >= Duration::from_secs(10) + Duration::from_millis(JITTER_MIN_MS));
            assert!(delay <= Duration::from_secs(10) + Duration::from_millis(JITTER_MAX_MS));
        }
    }

    #[test]
    fn permanent_statuses_are_never_retried() {
        let policy = policy();
        assert!(policy.is_permanent(404));
        assert!(policy.is_permanent(500));
        assert!(!policy.should_retry_status(404));
        assert!(!policy.should_retry_status(500));
    }

    #[test]
    fn other_error_statuses_are_retryable() {
        let policy = policy();
        assert!(policy.should_retry_status(429));
        assert!(policy.should_retry_status(503));
        assert!(!policy.should_retry_status(200));
    }
}
