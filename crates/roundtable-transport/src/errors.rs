//! Transport-level errors.

use thiserror::Error;

/// Errors raised by the channel adapters.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Could not establish the push connection.
    #[error("connect failed: {0}")]
    Connect(String),

    /// WebSocket protocol or I/O failure.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// HTTP request failure (network, TLS, body decode).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated by the caller if needed.
        body: String,
    },

    /// A frame could not be encoded or decoded.
    #[error("invalid frame: {0}")]
    Frame(#[from] serde_json::Error),

    /// The channel is not connected (or its connection task is gone).
    #[error("channel not connected")]
    NotConnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_display() {
        let err = TransportError::Status {
            status: 503,
            body: "unavailable".into(),
        };
        assert_eq!(err.to_string(), "service returned 503: unavailable");
    }

    #[test]
    fn frame_error_from_serde() {
        let bad: Result<crate::wire::ServerFrame, _> = serde_json::from_str("{not json");
        let err: TransportError = bad.unwrap_err().into();
        assert!(err.to_string().starts_with("invalid frame"));
    }
}
