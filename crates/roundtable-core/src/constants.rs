//! Shared constants: participant bounds and default pacing intervals.

/// Minimum number of automated participants in a session.
pub const MIN_PARTICIPANTS: usize = 2;

/// Maximum number of automated participants in a session.
pub const MAX_PARTICIPANTS: usize = 6;

/// Reserved speaker id for viewer-authored messages.
pub const USER_SPEAKER: &str = "user";

/// How long to wait for a join acknowledgement before giving up.
pub const DEFAULT_JOIN_TIMEOUT_MS: u64 = 5_000;

/// Pull-channel polling period.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;

/// Simulated typing duration at 1× speed.
pub const DEFAULT_BASE_DELAY_MS: u64 = 1_500;

/// How long a revealed speaker stays highlighted.
pub const DEFAULT_HIGHLIGHT_WINDOW_MS: u64 = 2_000;

/// Default playback speed multiplier.
pub const DEFAULT_SPEED: f64 = 1.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_bounds_are_sane() {
        assert!(MIN_PARTICIPANTS >= 2);
        assert!(MAX_PARTICIPANTS >= MIN_PARTICIPANTS);
    }

    #[test]
    fn pacing_defaults() {
        assert_eq!(DEFAULT_JOIN_TIMEOUT_MS, 5_000);
        assert_eq!(DEFAULT_POLL_INTERVAL_MS, 3_000);
        assert_eq!(DEFAULT_BASE_DELAY_MS, 1_500);
        assert_eq!(DEFAULT_HIGHLIGHT_WINDOW_MS, 2_000);
    }
}
