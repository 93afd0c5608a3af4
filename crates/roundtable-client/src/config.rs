//! Client configuration.
//!
//! Defaults-first: every field has a compiled default, callers override what
//! they need, and a config file deserializes over the defaults via
//! `#[serde(default)]`. Durations are plain milliseconds on the wire.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use roundtable_core::constants::{
    DEFAULT_BASE_DELAY_MS, DEFAULT_HIGHLIGHT_WINDOW_MS, DEFAULT_JOIN_TIMEOUT_MS,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_SPEED,
};
use roundtable_core::retry::RetryConfig;

/// Configuration for [`crate::RoundtableClient`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// Push service URL (`ws://` or `wss://`).
    pub push_url: String,
    /// Base URL of the HTTP API (pull + control), no trailing slash.
    pub http_base_url: String,
    /// How long to wait for a join acknowledgement.
    pub join_timeout_ms: u64,
    /// Pull-channel polling period.
    pub poll_interval_ms: u64,
    /// Bounded wait before an unfilled sequence gap is flushed.
    ///
    /// `None` means one poll interval. This is a tuning knob, not a
    /// contract — lower values favor liveness, higher values favor strict
    /// ordering.
    pub gap_wait_ms: Option<u64>,
    /// Simulated typing duration at 1× speed.
    pub base_delay_ms: u64,
    /// How long a revealed speaker stays highlighted.
    pub highlight_window_ms: u64,
    /// Initial playback speed multiplier.
    pub default_speed: f64,
    /// Push-channel reconnect policy.
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            push_url: "ws://127.0.0.1:5000/ws".into(),
            http_base_url: "http://127.0.0.1:5000".into(),
            join_timeout_ms: DEFAULT_JOIN_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            gap_wait_ms: None,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            highlight_window_ms: DEFAULT_HIGHLIGHT_WINDOW_MS,
            default_speed: DEFAULT_SPEED,
            retry: RetryConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Join-acknowledgement deadline.
    #[must_use]
    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }

    /// Pull polling period.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Bounded gap wait; defaults to one poll interval.
    #[must_use]
    pub fn gap_wait(&self) -> Duration {
        Duration::from_millis(self.gap_wait_ms.unwrap_or(self.poll_interval_ms))
    }

    /// Typing duration at 1× speed.
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Speaker highlight window.
    #[must_use]
    pub fn highlight_window(&self) -> Duration {
        Duration::from_millis(self.highlight_window_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.join_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.poll_interval(), Duration::from_secs(3));
        assert_eq!(cfg.base_delay(), Duration::from_millis(1_500));
        assert_eq!(cfg.highlight_window(), Duration::from_secs(2));
        assert!((cfg.default_speed - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn gap_wait_falls_back_to_poll_interval() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.gap_wait(), cfg.poll_interval());

        let tuned = ClientConfig {
            gap_wait_ms: Some(500),
            ..ClientConfig::default()
        };
        assert_eq!(tuned.gap_wait(), Duration::from_millis(500));
    }

    #[test]
    fn partial_json_overrides_defaults() {
        let cfg: ClientConfig =
            serde_json::from_str(r#"{"pollIntervalMs": 1000, "defaultSpeed": 2.0}"#).unwrap();
        assert_eq!(cfg.poll_interval(), Duration::from_secs(1));
        assert!((cfg.default_speed - 2.0).abs() < f64::EPSILON);
        // Untouched fields keep their defaults.
        assert_eq!(cfg.join_timeout(), Duration::from_secs(5));
    }
}
