//! Bounded exponential backoff with jitter.

use std::time::Duration;

/// How many times to try an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub attempts: u32,

    /// Delay before the second attempt; doubled for each attempt after that
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay,
        }
    }

    /// Retry immediately. Used by tests.
    pub fn immediate(attempts: u32) -> Self {
        Self::new(attempts, Duration::ZERO)
    }

    /// Delay after the failed attempt number `attempt` (0-based):
    /// `base * 2^attempt` plus up to `base / 2` of random jitter.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }

        let exponential = self.base_delay.saturating_mul(1u32 << attempt.min(16));
        let jitter_ms = (self.base_delay.as_millis() / 2) as u64;
        let jitter = Duration::from_millis(rand::random_range(0..=jitter_ms));

        exponential + jitter
    }

    /// Sleep for [`Self::delay_after`], skipping the timer entirely for zero.
    pub async fn wait_after(&self, attempt: u32) {
        let delay = self.delay_after(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_doubles_with_bounded_jitter() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));

        for attempt in 0..3 {
            let delay = policy.delay_after(attempt);
            let floor = Duration::from_millis(100 * (1 << attempt));
            assert!(delay >= floor);
            assert!(delay <= floor + Duration::from_millis(50));
        }
    }

    #[test]
    fn immediate_policy_never_waits() {
        let policy = RetryPolicy::immediate(5);
        assert_eq!(policy.delay_after(4), Duration::ZERO);
    }

    #[test]
    fn at_least_one_attempt() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).attempts, 1);
    }
}
