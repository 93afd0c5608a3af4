//! Events delivered to the presentation boundary.
//!
//! These are the only things a renderer needs to consume: lifecycle changes,
//! typing indication, paced message reveals, and the speaker highlight
//! window. They are broadcast in the order the playback scheduler releases
//! them and may be serialized as-is for a remote presentation layer.

use serde::{Deserialize, Serialize};

use crate::ids::{ParticipantId, SessionId};
use crate::message::Message;
use crate::session::{Participant, SessionStatus};

/// An event at the presentation boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PresentationEvent {
    /// The session's lifecycle state changed.
    #[serde(rename = "session_status")]
    SessionStatusChanged {
        /// Session the change belongs to.
        #[serde(rename = "sessionId")]
        session_id: SessionId,
        /// The new status.
        status: SessionStatus,
    },

    /// A participant started composing (typing indicator).
    #[serde(rename = "typing_started")]
    TypingStarted {
        /// Session the event belongs to.
        #[serde(rename = "sessionId")]
        session_id: SessionId,
        /// Who is composing.
        speaker: ParticipantId,
    },

    /// A message was revealed to the viewer.
    #[serde(rename = "message_revealed")]
    MessageRevealed {
        /// Session the message belongs to.
        #[serde(rename = "sessionId")]
        session_id: SessionId,
        /// The revealed message.
        message: Message,
        /// Speaker metadata, absent for viewer-authored messages.
        #[serde(skip_serializing_if = "Option::is_none")]
        speaker: Option<Participant>,
    },

    /// A participant entered its post-reveal highlight window.
    #[serde(rename = "speaker_active")]
    SpeakerActive {
        /// Session the event belongs to.
        #[serde(rename = "sessionId")]
        session_id: SessionId,
        /// The highlighted participant.
        speaker: ParticipantId,
    },

    /// The highlight window elapsed.
    #[serde(rename = "speaker_idle")]
    SpeakerIdle {
        /// Session the event belongs to.
        #[serde(rename = "sessionId")]
        session_id: SessionId,
        /// The participant whose highlight cleared.
        speaker: ParticipantId,
    },
}

impl PresentationEvent {
    /// The session this event belongs to.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::SessionStatusChanged { session_id, .. }
            | Self::TypingStarted { session_id, .. }
            | Self::MessageRevealed { session_id, .. }
            | Self::SpeakerActive { session_id, .. }
            | Self::SpeakerIdle { session_id, .. } => session_id,
        }
    }

    /// The event type string (for type discrimination).
    #[must_use]
    pub fn event_type(&self) -> &str {
        match self {
            Self::SessionStatusChanged { .. } => "session_status",
            Self::TypingStarted { .. } => "typing_started",
            Self::MessageRevealed { .. } => "message_revealed",
            Self::SpeakerActive { .. } => "speaker_active",
            Self::SpeakerIdle { .. } => "speaker_idle",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(seq: u64) -> Message {
        Message {
            id: None,
            speaker: ParticipantId::new("sarah"),
            text: "hello".into(),
            timestamp: Utc::now(),
            sequence: seq,
            speaker_name: None,
        }
    }

    #[test]
    fn status_changed_serde() {
        let e = PresentationEvent::SessionStatusChanged {
            session_id: SessionId::new("s1"),
            status: SessionStatus::Active,
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["type"], "session_status");
        assert_eq!(json["sessionId"], "s1");
        assert_eq!(json["status"], "active");
        let back: PresentationEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn message_revealed_serde_without_speaker() {
        let e = PresentationEvent::MessageRevealed {
            session_id: SessionId::new("s1"),
            message: message(1),
            speaker: None,
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["type"], "message_revealed");
        assert!(json.get("speaker").is_none());
        assert_eq!(json["message"]["sequence"], 1);
    }

    #[test]
    fn message_revealed_carries_metadata() {
        let e = PresentationEvent::MessageRevealed {
            session_id: SessionId::new("s1"),
            message: message(2),
            speaker: Some(Participant::new("sarah", "Dr. Sarah Chen", "CBT Expert")),
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["speaker"]["name"], "Dr. Sarah Chen");
    }

    #[test]
    fn event_type_and_session_accessors() {
        let events = [
            PresentationEvent::SessionStatusChanged {
                session_id: SessionId::new("s1"),
                status: SessionStatus::Ended,
            },
            PresentationEvent::TypingStarted {
                session_id: SessionId::new("s1"),
                speaker: ParticipantId::new("james"),
            },
            PresentationEvent::MessageRevealed {
                session_id: SessionId::new("s1"),
                message: message(1),
                speaker: None,
            },
            PresentationEvent::SpeakerActive {
                session_id: SessionId::new("s1"),
                speaker: ParticipantId::new("james"),
            },
            PresentationEvent::SpeakerIdle {
                session_id: SessionId::new("s1"),
                speaker: ParticipantId::new("james"),
            },
        ];
        let mut types: Vec<&str> = events.iter().map(PresentationEvent::event_type).collect();
        for e in &events {
            assert_eq!(e.session_id().as_str(), "s1");
        }
        types.sort_unstable();
        types.dedup();
        assert_eq!(types.len(), 5);
    }
}
