//! Error taxonomy for the Roundtable client.
//!
//! None of these are fatal to the process. The worst outcomes are a session
//! that never becomes active ([`CoreError::JoinTimeout`]) or one that degrades
//! to poll-only delivery ([`CoreError::ChannelError`]).

use thiserror::Error;

/// Errors surfaced by the session, reconciliation, and playback layers.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Participant selection rejected before any network effect.
    #[error("invalid participant selection: {reason}")]
    InvalidSelection {
        /// Why the selection was rejected.
        reason: String,
    },

    /// No join acknowledgement arrived within the deadline.
    #[error("no join acknowledgement within {timeout_ms} ms")]
    JoinTimeout {
        /// The deadline that elapsed, in milliseconds.
        timeout_ms: u64,
    },

    /// Push channel connection or protocol failure.
    ///
    /// The reconciler keeps running on the pull channel alone until the
    /// push channel reconnects.
    #[error("push channel error: {reason}")]
    ChannelError {
        /// Transport-level description.
        reason: String,
    },

    /// A delivered message is missing a required field.
    #[error("malformed message: missing {field}")]
    MalformedMessage {
        /// Name of the first missing field.
        field: &'static str,
    },

    /// A control request (pause/resume/inject/leave) failed.
    ///
    /// Local optimistic state is never rolled back on this error.
    #[error("{context} request failed: {reason}")]
    RequestFailure {
        /// Which operation was attempted.
        context: &'static str,
        /// Transport-level description.
        reason: String,
    },

    /// An operation that needs a live session was called without one.
    #[error("no active session")]
    NoActiveSession,
}

impl CoreError {
    /// Selection rejected because the participant count is out of bounds.
    #[must_use]
    pub fn selection_size(count: usize) -> Self {
        Self::InvalidSelection {
            reason: format!(
                "{count} participants (allowed {}..={})",
                crate::constants::MIN_PARTICIPANTS,
                crate::constants::MAX_PARTICIPANTS
            ),
        }
    }

    /// Selection rejected because an id appears more than once.
    #[must_use]
    pub fn selection_duplicate(id: &str) -> Self {
        Self::InvalidSelection {
            reason: format!("duplicate participant id {id:?}"),
        }
    }

    /// Selection rejected because it includes the reserved viewer id.
    #[must_use]
    pub fn selection_reserved(id: &str) -> Self {
        Self::InvalidSelection {
            reason: format!("{id:?} is reserved for the viewer"),
        }
    }
}
