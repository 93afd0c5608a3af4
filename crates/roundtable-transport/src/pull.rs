//! Pull channel: on-demand retrieval of a session's message log.
//!
//! The poll endpoint is idempotent and may return fewer, equal, or
//! overlapping results versus the push channel; the reconciler's dedup makes
//! overlap harmless. `since_count` is forwarded as a hint — services are free
//! to ignore it and return the full log, and callers must slice defensively.

use async_trait::async_trait;
use tracing::debug;

use roundtable_core::ids::SessionId;
use roundtable_core::message::MessageFrame;

use crate::errors::TransportError;
use crate::wire::PollResponse;

/// On-demand retrieval of the ordered message log.
#[async_trait]
pub trait PullChannel: Send + Sync {
    /// Fetch the message log for a session.
    ///
    /// `since_count` is the number of messages the caller has already
    /// consumed. Implementations may pass it to the service as an
    /// optimization hint; callers must tolerate receiving the full log.
    async fn poll(
        &self,
        session_id: &SessionId,
        since_count: usize,
    ) -> Result<Vec<MessageFrame>, TransportError>;
}

/// HTTP implementation of [`PullChannel`].
pub struct HttpPullChannel {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPullChannel {
    /// Create a channel against the given base URL (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Create a channel with a caller-configured HTTP client.
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl PullChannel for HttpPullChannel {
    async fn poll(
        &self,
        session_id: &SessionId,
        since_count: usize,
    ) -> Result<Vec<MessageFrame>, TransportError> {
        let url = format!(
            "{}/api/sessions/{}/messages",
            self.base_url,
            session_id.as_str()
        );
        let response = self
            .http
            .get(&url)
            .query(&[("since", since_count)])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let body: PollResponse = response.json().await?;
        debug!(
            session_id = %session_id,
            since_count,
            returned = body.messages.len(),
            "polled message log"
        );
        Ok(body.messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn poll_returns_message_frames() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/sessions/s1/messages"))
            .and(query_param("since", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": [
                    {"speaker": "sarah", "text": "a", "timestamp": "2026-01-01T00:00:00Z", "sequence": 1},
                    {"speaker": "james", "text": "b", "timestamp": "2026-01-01T00:00:01Z", "sequence": 2},
                    {"speaker": "maria", "text": "c", "timestamp": "2026-01-01T00:00:02Z", "sequence": 3},
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let pull = HttpPullChannel::new(server.uri());
        let messages = pull.poll(&SessionId::new("s1"), 2).await.unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].sequence, Some(3));
    }

    #[tokio::test]
    async fn poll_empty_log() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/sessions/s1/messages"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"messages": []})),
            )
            .mount(&server)
            .await;

        let pull = HttpPullChannel::new(server.uri());
        let messages = pull.poll(&SessionId::new("s1"), 0).await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn poll_maps_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/sessions/s1/messages"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let pull = HttpPullChannel::new(server.uri());
        let err = pull.poll(&SessionId::new("s1"), 0).await.unwrap_err();
        assert_matches!(err, TransportError::Status { status: 500, body } if body == "boom");
    }

    #[tokio::test]
    async fn poll_is_repeatable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/sessions/s1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": [
                    {"speaker": "sarah", "text": "a", "timestamp": "2026-01-01T00:00:00Z", "sequence": 1},
                ]
            })))
            .expect(2)
            .mount(&server)
            .await;

        let pull = HttpPullChannel::new(server.uri());
        let first = pull.poll(&SessionId::new("s1"), 0).await.unwrap();
        let second = pull.poll(&SessionId::new("s1"), 0).await.unwrap();
        assert_eq!(first, second);
    }
}
