//! Reconnect policy: exponential backoff with a cap.
//!
//! Used by the push channel's reconnect loop. The pull channel needs no
//! retry policy of its own — its fixed polling cadence already is one.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Backoff configuration for reconnect attempts.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryConfig {
    /// Maximum attempts before giving up. `0` means retry forever.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound on any single delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Growth factor between attempts.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay before the given retry attempt (1-based).
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(32);
        let raw = self.base_delay_ms as f64 * self.multiplier.powi(exp as i32);
        Duration::from_millis((raw as u64).min(self.max_delay_ms))
    }

    /// Whether another attempt is allowed after `attempt` failures.
    #[must_use]
    pub fn should_retry(&self, attempt: u32) -> bool {
        self.max_attempts == 0 || attempt < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_exponentially() {
        let cfg = RetryConfig::default();
        assert_eq!(cfg.backoff_delay(1), Duration::from_millis(500));
        assert_eq!(cfg.backoff_delay(2), Duration::from_millis(1_000));
        assert_eq!(cfg.backoff_delay(3), Duration::from_millis(2_000));
        assert_eq!(cfg.backoff_delay(4), Duration::from_millis(4_000));
    }

    #[test]
    fn backoff_caps_at_max() {
        let cfg = RetryConfig::default();
        assert_eq!(cfg.backoff_delay(10), Duration::from_millis(30_000));
        assert_eq!(cfg.backoff_delay(63), Duration::from_millis(30_000));
    }

    #[test]
    fn zero_max_attempts_retries_forever() {
        let cfg = RetryConfig::default();
        assert!(cfg.should_retry(1_000_000));
    }

    #[test]
    fn bounded_attempts_stop() {
        let cfg = RetryConfig {
            max_attempts: 3,
            ..RetryConfig::default()
        };
        assert!(cfg.should_retry(2));
        assert!(!cfg.should_retry(3));
    }
}
