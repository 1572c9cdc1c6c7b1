//! Retry schedule with exponential backoff.

use std::time::Duration;

/// How many times to resend and how long to wait in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Resend attempts after the first response (default: 3)
    pub max_attempts: usize,
    /// Base delay for exponential backoff in milliseconds (default: 1000)
    pub base_delay_ms: u64,
    /// Maximum delay cap in milliseconds (default: 30000)
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Create a config with no retries.
    pub fn no_retry() -> Self {
        Self::new(0)
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }
}

/// Calculate backoff delay for a given attempt.
///
/// Uses exponential backoff: `base_delay * 2^(attempt-1)`, capped at
/// `max_delay_ms`. Attempt 0 waits nothing.
pub fn calculate_backoff(attempt: usize, config: &RetryConfig) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let delay_ms = config
        .base_delay_ms
        .saturating_mul(1 << (attempt - 1).min(20));
    Duration::from_millis(delay_ms.min(config.max_delay_ms))
}

/// Check if we should retry based on attempt count.
pub fn should_retry(attempt: usize, config: &RetryConfig) -> bool {
    attempt < config.max_attempts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_exponential() {
        let config = RetryConfig::default();

        assert_eq!(calculate_backoff(0, &config), Duration::ZERO);
        assert_eq!(calculate_backoff(1, &config), Duration::from_secs(1));
        assert_eq!(calculate_backoff(2, &config), Duration::from_secs(2));
        assert_eq!(calculate_backoff(3, &config), Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_capped() {
        let config = RetryConfig::default().with_max_delay(Duration::from_secs(2));

        assert_eq!(calculate_backoff(1, &config), Duration::from_millis(1000));
        assert_eq!(calculate_backoff(2, &config), Duration::from_millis(2000));
        assert_eq!(calculate_backoff(3, &config), Duration::from_millis(2000)); // capped
        assert_eq!(calculate_backoff(64, &config), Duration::from_millis(2000));
    }

    #[test]
    fn test_should_retry() {
        let config = RetryConfig::default(); // max_attempts = 3

        assert!(should_retry(0, &config));
        assert!(should_retry(2, &config));
        assert!(!should_retry(3, &config));
    }

    #[test]
    fn test_no_retry_config() {
        let config = RetryConfig::no_retry();
        assert!(!should_retry(0, &config));
    }
}
