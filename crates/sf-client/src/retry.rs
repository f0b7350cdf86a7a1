//! Retry policy with exponential backoff and jitter.

use rand::Rng;
use std::time::Duration;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    pub max_attempts: u32,
    /// Initial delay before first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Backoff strategy to use.
    pub backoff: BackoffStrategy,
    /// Whether to respect Retry-After headers.
    pub respect_retry_after: bool,
    /// Maximum time to wait from Retry-After header.
    pub max_retry_after: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff: BackoffStrategy::ExponentialWithJitter { factor: 2.0 },
            respect_retry_after: true,
            max_retry_after: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with the given max attempts.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Create a new retry config with the given initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Create a new retry config with the given max delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Create a new retry config with the given backoff strategy.
    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Disable retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 0,
            ..Default::default()
        }
    }
}

/// Backoff strategy for determining retry delays.
#[derive(Debug, Clone, Copy)]
pub enum BackoffStrategy {
    /// Constant delay between retries.
    Constant,
    /// Exponential increase in delay (delay * factor^attempt).
    Exponential { factor: f64 },
    /// Exponential with random jitter in `[base, 2 * base]`.
    ExponentialWithJitter { factor: f64 },
}

impl BackoffStrategy {
    /// Delay for a 0-indexed attempt, capped at `max_delay`.
    pub fn delay(&self, attempt: u32, initial_delay: Duration, max_delay: Duration) -> Duration {
        let base = |factor: f64| initial_delay.as_secs_f64() * factor.powi(attempt as i32);
        let delay = match self {
            BackoffStrategy::Constant => initial_delay,
            BackoffStrategy::Exponential { factor } => Duration::from_secs_f64(base(*factor)),
            BackoffStrategy::ExponentialWithJitter { factor } => {
                let base = base(*factor);
                let jitter = rand::rng().random::<f64>() * base;
                Duration::from_secs_f64(base + jitter)
            }
        };

        delay.min(max_delay)
    }
}

/// Retry policy that determines when and how to retry.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
    attempt: u32,
}

impl RetryPolicy {
    /// Create a new retry policy from config.
    pub fn new(config: RetryConfig) -> Self {
        Self { config, attempt: 0 }
    }

    /// Returns the current attempt number (0-indexed).
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Record a failure and return how long to wait before retrying.
    /// Returns `None` once all retries are used.
    pub fn next_delay(&mut self, retry_after: Option<Duration>) -> Option<Duration> {
        if self.attempt >= self.config.max_attempts {
            return None;
        }

        let delay = match retry_after {
            Some(retry_after) if self.config.respect_retry_after => {
                retry_after.min(self.config.max_retry_after)
            }
            _ => self.config.backoff.delay(
                self.attempt,
                self.config.initial_delay,
                self.config.max_delay,
            ),
        };

        self.attempt += 1;
        Some(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_retry() {
        let mut policy = RetryPolicy::new(RetryConfig::no_retry());
        assert!(policy.next_delay(None).is_none());
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let strategy = BackoffStrategy::Exponential { factor: 2.0 };
        let initial = Duration::from_secs(1);
        let max = Duration::from_secs(10);

        assert_eq!(strategy.delay(0, initial, max), Duration::from_secs(1));
        assert_eq!(strategy.delay(2, initial, max), Duration::from_secs(4));
        assert_eq!(strategy.delay(8, initial, max), Duration::from_secs(10));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let strategy = BackoffStrategy::ExponentialWithJitter { factor: 2.0 };
        let delay = strategy.delay(1, Duration::from_secs(1), Duration::from_secs(60));
        assert!(delay >= Duration::from_secs(2));
        assert!(delay <= Duration::from_secs(4));
    }

    #[test]
    fn test_policy_exhausts() {
        let config = RetryConfig::default()
            .with_max_attempts(2)
            .with_backoff(BackoffStrategy::Constant)
            .with_initial_delay(Duration::from_millis(5));
        let mut policy = RetryPolicy::new(config);

        assert_eq!(policy.next_delay(None), Some(Duration::from_millis(5)));
        assert_eq!(policy.next_delay(None), Some(Duration::from_millis(5)));
        assert_eq!(policy.attempt(), 2);
        assert!(policy.next_delay(None).is_none());
    }

    #[test]
    fn test_retry_after_is_capped() {
        let mut policy = RetryPolicy::new(RetryConfig::default());

        let delay = policy.next_delay(Some(Duration::from_secs(30))).unwrap();
        assert_eq!(delay, Duration::from_secs(30));

        let delay = policy.next_delay(Some(Duration::from_secs(600))).unwrap();
        assert_eq!(delay, Duration::from_secs(60));
    }
}
