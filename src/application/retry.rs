//! Bounded retry with fixed backoff
//!
//! One policy covers both the main pass and the deferred second pass: up to
//! `max_attempts` tries per item, a fixed pause between attempts, no pause
//! after the last.

use std::time::Duration;

use crate::infrastructure::config::CrawlerConfig;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            config.retry_max_attempts,
            Duration::from_millis(config.retry_delay_ms),
        )
    }

    /// Pause to take after a failed attempt, or `None` when the attempt was
    /// the last one.
    pub fn backoff_after(&self, attempt: u32) -> Option<Duration> {
        (attempt < self.max_attempts).then_some(self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_backoff_after_final_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_millis(500));
        assert_eq!(policy.backoff_after(1), Some(Duration::from_millis(500)));
        assert_eq!(policy.backoff_after(2), Some(Duration::from_millis(500)));
        assert_eq!(policy.backoff_after(3), None);
    }

    #[test]
    fn at_least_one_attempt() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.max_attempts, 1);
    }
}
