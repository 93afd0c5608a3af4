//! Session lifecycle vocabulary: status state machine, participant metadata,
//! and point-in-time snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ParticipantId, SessionId};

/// Lifecycle state of a session.
///
/// Transitions are one-directional except the `Active ↔ Paused` toggle;
/// `Ended` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No session activity yet.
    Idle,
    /// Waiting for the push channel's join acknowledgement.
    Joining,
    /// Messages flow and playback advances.
    Active,
    /// Playback holds; delivery continues in the background.
    Paused,
    /// Terminal. No message from this session may be delivered again.
    Ended,
}

impl SessionStatus {
    /// Whether the state machine allows moving from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        use SessionStatus::{Active, Ended, Idle, Joining, Paused};
        matches!(
            (self, next),
            (Idle, Joining)
                | (Joining, Active)
                | (Active, Paused)
                | (Paused, Active)
                | (Idle | Joining | Active | Paused, Ended)
        )
    }

    /// Whether this is the terminal state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Ended)
    }
}

/// Caller-supplied metadata for one automated participant.
///
/// The client treats this as opaque: it is validated for id uniqueness at
/// session start, handed back with reveal events, and used by the text
/// exporter for display names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Stable participant id (the `speaker` field of messages).
    pub id: ParticipantId,
    /// Display name.
    pub name: String,
    /// Short role description.
    pub role: String,
}

impl Participant {
    /// Convenience constructor.
    pub fn new(
        id: impl Into<ParticipantId>,
        name: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: role.into(),
        }
    }
}

/// Point-in-time snapshot of a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    /// Session id.
    pub session_id: SessionId,
    /// Discussion topic.
    pub topic: String,
    /// Participant roster (2..=6, unique ids).
    pub participants: Vec<Participant>,
    /// Lifecycle state at snapshot time.
    pub status: SessionStatus,
    /// When the session was started locally.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions_allowed() {
        use SessionStatus::{Active, Ended, Idle, Joining, Paused};
        assert!(Idle.can_transition_to(Joining));
        assert!(Joining.can_transition_to(Active));
        assert!(Active.can_transition_to(Paused));
        assert!(Paused.can_transition_to(Active));
        assert!(Idle.can_transition_to(Ended));
        assert!(Joining.can_transition_to(Ended));
        assert!(Active.can_transition_to(Ended));
        assert!(Paused.can_transition_to(Ended));
    }

    #[test]
    fn backward_transitions_rejected() {
        use SessionStatus::{Active, Ended, Idle, Joining, Paused};
        assert!(!Active.can_transition_to(Joining));
        assert!(!Joining.can_transition_to(Idle));
        assert!(!Paused.can_transition_to(Joining));
        assert!(!Idle.can_transition_to(Active));
        assert!(!Idle.can_transition_to(Paused));
        assert!(!Joining.can_transition_to(Paused));
        assert!(!Ended.can_transition_to(Active));
    }

    #[test]
    fn ended_is_terminal() {
        use SessionStatus::{Active, Ended, Idle, Joining, Paused};
        assert!(Ended.is_terminal());
        for next in [Idle, Joining, Active, Paused, Ended] {
            assert!(!Ended.can_transition_to(next));
        }
    }

    #[test]
    fn self_transitions_rejected() {
        use SessionStatus::{Active, Paused};
        assert!(!Active.can_transition_to(Active));
        assert!(!Paused.can_transition_to(Paused));
    }

    #[test]
    fn status_serde_snake_case() {
        assert_eq!(
            serde_json::to_value(SessionStatus::Joining).unwrap(),
            "joining"
        );
        let back: SessionStatus = serde_json::from_str("\"paused\"").unwrap();
        assert_eq!(back, SessionStatus::Paused);
    }

    #[test]
    fn participant_serde_camel_case() {
        let p = Participant::new("sarah", "Dr. Sarah Chen", "CBT Expert");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["id"], "sarah");
        assert_eq!(json["name"], "Dr. Sarah Chen");
        assert_eq!(json["role"], "CBT Expert");
    }
}
