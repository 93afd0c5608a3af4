//! Wire protocol of the push service and the pull endpoint.
//!
//! Push frames are single JSON objects discriminated by an `event` tag.
//! The pull endpoint answers with a [`PollResponse`] body.

use serde::{Deserialize, Serialize};

use roundtable_core::ids::SessionId;
use roundtable_core::message::MessageFrame;

/// Frames sent from the client to the push service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Subscribe to a session's message stream.
    Join {
        /// Session to join.
        #[serde(rename = "sessionId")]
        session_id: SessionId,
    },
    /// Unsubscribe from a session's message stream.
    Leave {
        /// Session to leave.
        #[serde(rename = "sessionId")]
        session_id: SessionId,
    },
}

/// Frames received from the push service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Join acknowledgement, correlated by session id.
    Joined {
        /// The acknowledged session.
        #[serde(rename = "sessionId")]
        session_id: SessionId,
    },
    /// A message produced in the joined session.
    Message {
        /// The message payload; validated downstream.
        #[serde(flatten)]
        frame: MessageFrame,
    },
    /// Service-side error report.
    Error {
        /// Human-readable reason.
        reason: String,
    },
}

/// Body of the pull endpoint's response.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PollResponse {
    /// The ordered message log known to the service.
    pub messages: Vec<MessageFrame>,
}
