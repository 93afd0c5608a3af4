//! The [`Message`] type, its wire form, and the dedup identity.
//!
//! Messages travel over two channels with no shared ordering guarantee, so
//! the wire form ([`MessageFrame`]) keeps every field optional and lets
//! validation — not deserialization — decide what is malformed. A validated
//! [`Message`] is immutable once observed; [`MessageIdentity`] is the
//! exactly-once dedup key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::CoreError;
use crate::ids::ParticipantId;

/// A validated discussion message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Service-assigned message id, when the producer provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Who authored the message (a participant id, or the viewer).
    pub speaker: ParticipantId,
    /// Message body.
    pub text: String,
    /// Wall-clock time at the producer.
    pub timestamp: DateTime<Utc>,
    /// Monotonic position within the session, assigned by the producer.
    pub sequence: u64,
    /// Display name of the speaker, when the producer provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_name: Option<String>,
}

impl Message {
    /// The dedup key: the provided id, or a digest of the content fields.
    #[must_use]
    pub fn identity(&self) -> MessageIdentity {
        match &self.id {
            Some(id) => MessageIdentity(id.clone()),
            None => MessageIdentity(derive_identity(
                self.speaker.as_str(),
                &self.timestamp,
                &self.text,
            )),
        }
    }

    /// Whether the viewer authored this message.
    #[must_use]
    pub fn is_user(&self) -> bool {
        self.speaker.is_user()
    }
}

/// Identity of a message, stable across delivery channels.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MessageIdentity(String);

impl MessageIdentity {
    /// The identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn derive_identity(speaker: &str, timestamp: &DateTime<Utc>, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(speaker.as_bytes());
    hasher.update(b"\n");
    hasher.update(timestamp.to_rfc3339().as_bytes());
    hasher.update(b"\n");
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Wire form of a message as delivered by either channel.
///
/// All fields are optional so a partial frame deserializes cleanly and is
/// rejected by [`MessageFrame::into_message`] with the missing field named.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageFrame {
    /// Service-assigned message id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Speaker id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    /// Message body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Wall-clock time at the producer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Monotonic position within the session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
    /// Display name of the speaker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_name: Option<String>,
}

impl MessageFrame {
    /// Validate the frame into a [`Message`].
    ///
    /// Fails with [`CoreError::MalformedMessage`] naming the first missing
    /// required field. `id` and `speaker_name` stay optional.
    pub fn into_message(self) -> Result<Message, CoreError> {
        let speaker = self
            .speaker
            .filter(|s| !s.is_empty())
            .ok_or(CoreError::MalformedMessage { field: "speaker" })?;
        let text = self
            .text
            .ok_or(CoreError::MalformedMessage { field: "text" })?;
        let timestamp = self
            .timestamp
            .ok_or(CoreError::MalformedMessage { field: "timestamp" })?;
        let sequence = self
            .sequence
            .ok_or(CoreError::MalformedMessage { field: "sequence" })?;
        Ok(Message {
            id: self.id,
            speaker: ParticipantId::new(speaker),
            text,
            timestamp,
            sequence,
            speaker_name: self.speaker_name,
        })
    }
}

impl From<Message> for MessageFrame {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            speaker: Some(m.speaker.as_str().to_string()),
            text: Some(m.text),
            timestamp: Some(m.timestamp),
            sequence: Some(m.sequence),
            speaker_name: m.speaker_name,
        }
    }
}
