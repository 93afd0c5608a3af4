//! Session control API: the external service that owns discussions.
//!
//! Every method is a plain request/response call. Pause/resume and leave are
//! fire-and-forget from the session manager's point of view — a failure here
//! is logged upstream, never rolled back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use roundtable_core::ids::{ParticipantId, SessionId};

use crate::errors::TransportError;

/// Control operations on the discussion service.
#[async_trait]
pub trait SessionControl: Send + Sync {
    /// Start a discussion; the service assigns and returns the session id.
    async fn start_discussion(
        &self,
        topic: &str,
        participants: &[ParticipantId],
    ) -> Result<SessionId, TransportError>;

    /// Ask the service to stop producing messages.
    async fn pause(&self, session_id: &SessionId) -> Result<(), TransportError>;

    /// Ask the service to resume producing messages.
    async fn resume(&self, session_id: &SessionId) -> Result<(), TransportError>;

    /// Inject a viewer-authored message into the discussion.
    async fn inject_user_message(
        &self,
        session_id: &SessionId,
        text: &str,
    ) -> Result<(), TransportError>;

    /// Tell the service the viewer left the session.
    async fn leave(&self, session_id: &SessionId) -> Result<(), TransportError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StartRequest<'a> {
    topic: &'a str,
    participants: &'a [ParticipantId],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartResponse {
    session_id: SessionId,
}

#[derive(Serialize)]
struct InjectRequest<'a> {
    text: &'a str,
}

/// HTTP implementation of [`SessionControl`].
pub struct HttpSessionControl {
    http: reqwest::Client,
    base_url: String,
}

impl HttpSessionControl {
    /// Create a client against the given base URL (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Create a client with a caller-configured HTTP client.
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    async fn post_empty(&self, url: String) -> Result<(), TransportError> {
        let response = self.http.post(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SessionControl for HttpSessionControl {
    async fn start_discussion(
        &self,
        topic: &str,
        participants: &[ParticipantId],
    ) -> Result<SessionId, TransportError> {
        let url = format!("{}/api/sessions", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&StartRequest {
                topic,
                participants,
            })
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
        let body: StartResponse = response.json().await?;
        debug!(topic, session_id = %body.session_id, "discussion started");
        Ok(body.session_id)
    }

    async fn pause(&self, session_id: &SessionId) -> Result<(), TransportError> {
        self.post_empty(format!(
            "{}/api/sessions/{}/pause",
            self.base_url,
            session_id.as_str()
        ))
        .await
    }

    async fn resume(&self, session_id: &SessionId) -> Result<(), TransportError> {
        self.post_empty(format!(
            "{}/api/sessions/{}/resume",
            self.base_url,
            session_id.as_str()
        ))
        .await
    }

    async fn inject_user_message(
        &self,
        session_id: &SessionId,
        text: &str,
    ) -> Result<(), TransportError> {
        let url = format!(
            "{}/api/sessions/{}/messages",
            self.base_url,
            session_id.as_str()
        );
        let response = self.http.post(&url).json(&InjectRequest { text }).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn leave(&self, session_id: &SessionId) -> Result<(), TransportError> {
        self.post_empty(format!(
            "{}/api/sessions/{}/leave",
            self.base_url,
            session_id.as_str()
        ))
        .await
    }
}
