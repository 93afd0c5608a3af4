//! The session manager: sole authority on session state.
//!
//! Owns at most one live [`SessionContext`] at a time. `start` validates the
//! participant selection locally, asks the control service for a session id,
//! joins the push channel under a deadline, and only then spawns the
//! reconciler and playback tasks. Starting a new session supersedes and
//! terminates any prior one; teardown cancels the session token atomically
//! with the flip to `Ended`, so nothing from the old session is delivered
//! afterwards.

use std::collections::HashSet;
use std::sync::Arc;

use metrics::gauge;
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use roundtable_core::constants::{MAX_PARTICIPANTS, MIN_PARTICIPANTS};
use roundtable_core::errors::CoreError;
use roundtable_core::events::PresentationEvent;
use roundtable_core::ids::{ParticipantId, SessionId};
use roundtable_core::retry::RetryConfig;
use roundtable_core::session::{Participant, SessionStatus};
use roundtable_transport::control::{HttpSessionControl, SessionControl};
use roundtable_transport::pull::{HttpPullChannel, PullChannel};
use roundtable_transport::push::{PushChannel, PushEvent, WsPushChannel};

use crate::config::ClientConfig;
use crate::export::{ExportOptions, TranscriptExporter};
use crate::reconciler::Reconciler;
use crate::scheduler::PlaybackScheduler;
use crate::session::context::SessionContext;

/// Capacity of the presentation event broadcast. Receivers that fall this
/// far behind see a lag error, not a blocked scheduler.
const EVENT_CAPACITY: usize = 1024;

/// Client for live multi-party discussion sessions.
pub struct RoundtableClient {
    push: Arc<dyn PushChannel>,
    pull: Arc<dyn PullChannel>,
    control: Arc<dyn SessionControl>,
    config: ClientConfig,
    events: broadcast::Sender<PresentationEvent>,
    current: Mutex<Option<Arc<SessionContext>>>,
}

impl RoundtableClient {
    /// Create a client over caller-supplied channel adapters.
    pub fn new(
        push: Arc<dyn PushChannel>,
        pull: Arc<dyn PullChannel>,
        control: Arc<dyn SessionControl>,
        config: ClientConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            push,
            pull,
            control,
            config,
            events,
            current: Mutex::new(None),
        }
    }

    /// Create a client wired to the standard WebSocket + HTTP adapters from
    /// the configured URLs. Call [`connect`](Self::connect) before `start`.
    #[must_use]
    pub fn over_http(config: ClientConfig) -> Self {
        let retry: RetryConfig = config.retry;
        let push = Arc::new(WsPushChannel::new(config.push_url.clone(), retry));
        let pull = Arc::new(HttpPullChannel::new(config.http_base_url.clone()));
        let control = Arc::new(HttpSessionControl::new(config.http_base_url.clone()));
        Self::new(push, pull, control, config)
    }

    /// Establish the push connection.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.push
            .connect()
            .await
            .map_err(|e| CoreError::ChannelError {
                reason: e.to_string(),
            })
    }

    /// Subscribe to presentation events. Only events after this call are
    /// seen; slow receivers lag rather than blocking playback.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PresentationEvent> {
        self.events.subscribe()
    }

    /// The live session, if any.
    #[must_use]
    pub fn current_session(&self) -> Option<Arc<SessionContext>> {
        self.current.lock().clone()
    }

    /// Current lifecycle status (`Idle` when no session exists).
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.current
            .lock()
            .as_ref()
            .map_or(SessionStatus::Idle, |ctx| ctx.status())
    }

    /// Start a discussion session.
    ///
    /// Validates the selection locally (`2..=6` unique participant ids, no
    /// reserved ids) before any network effect, supersedes any live session,
    /// then drives `Joining → Active` under the configured join deadline.
    #[instrument(skip(self, participants))]
    pub async fn start(
        &self,
        topic: &str,
        participants: Vec<Participant>,
    ) -> Result<Arc<SessionContext>, CoreError> {
        validate_selection(&participants)?;

        self.end_current("superseded by new session").await;

        let ids: Vec<ParticipantId> = participants.iter().map(|p| p.id.clone()).collect();
        let session_id = self
            .control
            .start_discussion(topic, &ids)
            .await
            .map_err(|e| CoreError::RequestFailure {
                context: "start",
                reason: e.to_string(),
            })?;

        let ctx = Arc::new(SessionContext::new(
            session_id.clone(),
            topic,
            participants,
            self.config.default_speed,
        ));
        *self.current.lock() = Some(Arc::clone(&ctx));
        let _ = self.transition(&ctx, SessionStatus::Joining);

        // Subscribe before joining so neither the acknowledgement nor any
        // early message can be missed.
        let mut ack_rx = self.push.subscribe();
        let delivery_rx = self.push.subscribe();

        if let Err(e) = self.push.join(&session_id).await {
            self.end_context(&ctx).await;
            return Err(CoreError::ChannelError {
                reason: e.to_string(),
            });
        }

        let acked = timeout(
            self.config.join_timeout(),
            wait_for_ack(&mut ack_rx, &session_id),
        )
        .await;
        match acked {
            Ok(true) => {}
            Ok(false) | Err(_) => {
                warn!(session_id = %session_id, "join not acknowledged within deadline");
                self.end_context(&ctx).await;
                return Err(CoreError::JoinTimeout {
                    timeout_ms: self.config.join_timeout_ms,
                });
            }
        }

        let _ = self.transition(&ctx, SessionStatus::Active);
        gauge!("roundtable_sessions_active").set(1.0);

        // Unbounded: ingestion must keep accepting while playback is paused.
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let reconciler = Reconciler::new(
            Arc::clone(&ctx),
            Arc::clone(&self.pull),
            queue_tx,
            self.config.poll_interval(),
            self.config.gap_wait(),
        );
        let _ = tokio::spawn(reconciler.run(delivery_rx));
        let scheduler = PlaybackScheduler::new(
            Arc::clone(&ctx),
            self.events.clone(),
            self.config.base_delay(),
            self.config.highlight_window(),
        );
        let _ = tokio::spawn(scheduler.run(queue_rx));

        info!(session_id = %ctx.id, topic = %ctx.topic, "session active");
        Ok(ctx)
    }

    /// Pause playback. Idempotent; the backing request is fire-and-forget.
    ///
    /// Local status flips immediately, independent of the request's fate.
    pub fn pause(&self) -> Result<(), CoreError> {
        let ctx = self.require_session()?;
        match ctx.status() {
            SessionStatus::Paused => return Ok(()),
            SessionStatus::Active => {}
            _ => return Err(CoreError::NoActiveSession),
        }
        let _ = self.transition(&ctx, SessionStatus::Paused);
        ctx.set_paused(true);
        // Fire-and-forget: local state is authoritative for pacing. A failed
        // request only affects the far end's production rate — logged, never
        // rolled back.
        let control = Arc::clone(&self.control);
        let session_id = ctx.id.clone();
        let _ = tokio::spawn(async move {
            if let Err(e) = control.pause(&session_id).await {
                warn!(session_id = %session_id, error = %e, "pause request failed");
            }
        });
        Ok(())
    }

    /// Resume playback. Idempotent; the backing request is fire-and-forget.
    ///
    /// Local status flips immediately, independent of the request's fate.
    pub fn resume(&self) -> Result<(), CoreError> {
        let ctx = self.require_session()?;
        match ctx.status() {
            SessionStatus::Active => return Ok(()),
            SessionStatus::Paused => {}
            _ => return Err(CoreError::NoActiveSession),
        }
        let _ = self.transition(&ctx, SessionStatus::Active);
        ctx.set_paused(false);
        let control = Arc::clone(&self.control);
        let session_id = ctx.id.clone();
        let _ = tokio::spawn(async move {
            if let Err(e) = control.resume(&session_id).await {
                warn!(session_id = %session_id, error = %e, "resume request failed");
            }
        });
        Ok(())
    }

    /// Inject a viewer message into the discussion.
    ///
    /// The message comes back through the delivery channels like any other;
    /// nothing is revealed locally on success.
    pub async fn send_message(&self, text: &str) -> Result<(), CoreError> {
        let ctx = self.require_session()?;
        if ctx.status().is_terminal() {
            return Err(CoreError::NoActiveSession);
        }
        self.control
            .inject_user_message(&ctx.id, text)
            .await
            .map_err(|e| {
                warn!(session_id = %ctx.id, error = %e, "inject request failed");
                CoreError::RequestFailure {
                    context: "inject",
                    reason: e.to_string(),
                }
            })
    }

    /// Leave the current session, tearing down delivery and playback.
    pub async fn leave(&self) -> Result<(), CoreError> {
        let prior = self
            .current
            .lock()
            .take()
            .ok_or(CoreError::NoActiveSession)?;
        self.end_context(&prior).await;
        Ok(())
    }

    /// Leave and start over with the same topic and participants.
    pub async fn restart(&self) -> Result<Arc<SessionContext>, CoreError> {
        let (topic, participants) = {
            let current = self.current.lock();
            let ctx = current.as_ref().ok_or(CoreError::NoActiveSession)?;
            (ctx.topic.clone(), ctx.participants.clone())
        };
        self.start(&topic, participants).await
    }

    /// Set the playback speed multiplier for the live session.
    ///
    /// Takes effect on the next queued item.
    pub fn set_speed(&self, speed: f64) -> Result<(), CoreError> {
        let ctx = self.require_session()?;
        ctx.set_speed(speed);
        Ok(())
    }

    /// Export the revealed history as a structured JSON transcript.
    pub fn export_json(&self, options: ExportOptions) -> Result<String, CoreError> {
        let ctx = self.require_session()?;
        TranscriptExporter::new(options)
            .to_json(&ctx.topic, ctx.created_at, &ctx.history())
            .map_err(|e| CoreError::RequestFailure {
                context: "export",
                reason: e.to_string(),
            })
    }

    /// Export the revealed history as a line-oriented text transcript.
    pub fn export_text(&self, options: ExportOptions) -> Result<String, CoreError> {
        let ctx = self.require_session()?;
        Ok(TranscriptExporter::new(options).to_text(&ctx.topic, &ctx.history()))
    }

    fn require_session(&self) -> Result<Arc<SessionContext>, CoreError> {
        self.current
            .lock()
            .clone()
            .ok_or(CoreError::NoActiveSession)
    }

    async fn end_current(&self, reason: &str) {
        let prior = self.current.lock().take();
        if let Some(ctx) = prior {
            debug!(session_id = %ctx.id, reason, "ending session");
            self.end_context(&ctx).await;
        }
    }

    async fn end_context(&self, ctx: &Arc<SessionContext>) {
        // Cancel first: no timer or callback may act on a stale session
        // after the status flips.
        ctx.cancel();
        if self.transition(ctx, SessionStatus::Ended) {
            gauge!("roundtable_sessions_active").set(0.0);
        }
        {
            let mut current = self.current.lock();
            if current.as_ref().is_some_and(|c| Arc::ptr_eq(c, ctx)) {
                *current = None;
            }
        }
        // Best-effort notifications; failures only get logged.
        if let Err(e) = self.push.leave(&ctx.id).await {
            debug!(session_id = %ctx.id, error = %e, "push leave failed");
        }
        if let Err(e) = self.control.leave(&ctx.id).await {
            warn!(session_id = %ctx.id, error = %e, "leave request failed");
        }
    }

    fn transition(&self, ctx: &Arc<SessionContext>, next: SessionStatus) -> bool {
        if !ctx.set_status(next) {
            return false;
        }
        info!(session_id = %ctx.id, status = ?next, "session status changed");
        let _ = self.events.send(PresentationEvent::SessionStatusChanged {
            session_id: ctx.id.clone(),
            status: next,
        });
        true
    }
}

async fn wait_for_ack(rx: &mut broadcast::Receiver<PushEvent>, session_id: &SessionId) -> bool {
    loop {
        match rx.recv().await {
            Ok(PushEvent::Joined(id)) if &id == session_id => return true,
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => return false,
        }
    }
}

fn validate_selection(participants: &[Participant]) -> Result<(), CoreError> {
    let count = participants.len();
    if !(MIN_PARTICIPANTS..=MAX_PARTICIPANTS).contains(&count) {
        return Err(CoreError::selection_size(count));
    }
    let mut ids = HashSet::new();
    for p in participants {
        if p.id.is_user() {
            return Err(CoreError::selection_reserved(p.id.as_str()));
        }
        if !ids.insert(p.id.as_str()) {
            return Err(CoreError::selection_duplicate(p.id.as_str()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn roster(count: usize) -> Vec<Participant> {
        (0..count)
            .map(|i| Participant::new(format!("p{i}"), format!("Expert {i}"), "Panelist"))
            .collect()
    }

    #[test]
    fn selection_bounds_enforced() {
        assert_matches!(
            validate_selection(&roster(1)),
            Err(CoreError::InvalidSelection { .. })
        );
        assert_matches!(
            validate_selection(&roster(7)),
            Err(CoreError::InvalidSelection { .. })
        );
        assert!(validate_selection(&roster(2)).is_ok());
        assert!(validate_selection(&roster(6)).is_ok());
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut participants = roster(3);
        participants[2] = participants[0].clone();
        assert_matches!(
            validate_selection(&participants),
            Err(CoreError::InvalidSelection { .. })
        );
    }

    #[test]
    fn reserved_viewer_id_rejected() {
        let mut participants = roster(2);
        participants[0] = Participant::new("user", "Impostor", "Viewer");
        assert_matches!(
            validate_selection(&participants),
            Err(CoreError::InvalidSelection { .. })
        );
    }
}
