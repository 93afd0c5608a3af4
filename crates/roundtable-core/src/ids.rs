//! Branded identifier newtypes.
//!
//! `String` wrappers so a session id can never be passed where a participant
//! id is expected. Both serialize transparently as plain strings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::USER_SPEAKER;

/// Opaque session identifier assigned by the session control service.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wrap an existing id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a locally unique id (UUID v7, time-ordered).
    ///
    /// Used for correlation ids on the client side; real session ids come
    /// from the control service.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("session_{}", uuid::Uuid::now_v7()))
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of a discussion participant.
///
/// The reserved value [`ParticipantId::user`] denotes the viewer; every other
/// value names an automated participant.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Wrap an existing id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The reserved viewer id.
    #[must_use]
    pub fn user() -> Self {
        Self(USER_SPEAKER.to_string())
    }

    /// Whether this id denotes the viewer.
    #[must_use]
    pub fn is_user(&self) -> bool {
        self.0 == USER_SPEAKER
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_display_and_serde() {
        let id = SessionId::new("sess_42");
        assert_eq!(id.to_string(), "sess_42");
        assert_eq!(serde_json::to_value(&id).unwrap(), "sess_42");
        let back: SessionId = serde_json::from_str("\"sess_42\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn generated_session_ids_are_unique() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("session_"));
    }

    #[test]
    fn participant_user_detection() {
        assert!(ParticipantId::user().is_user());
        assert!(ParticipantId::new("user").is_user());
        assert!(!ParticipantId::new("sarah").is_user());
    }

    #[test]
    fn participant_id_serde_transparent() {
        let id = ParticipantId::new("maria");
        assert_eq!(serde_json::to_value(&id).unwrap(), "maria");
    }
}
