//! The per-session context object.
//!
//! One instance exists per live session and is discarded on `Ended`. It owns
//! everything scoped to the session: lifecycle status, pause/speed knobs, the
//! cancellation token all per-session tasks are children of, and the ordered
//! history of revealed messages. There is no ambient session state anywhere
//! else.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use roundtable_core::ids::{ParticipantId, SessionId};
use roundtable_core::message::Message;
use roundtable_core::session::{Participant, SessionInfo, SessionStatus};

/// Upper bound on the playback speed multiplier.
const MAX_SPEED: f64 = 10.0;

/// Lower bound on the playback speed multiplier.
const MIN_SPEED: f64 = 0.1;

/// State owned by one live session.
#[derive(Debug)]
pub struct SessionContext {
    /// Session id assigned by the control service.
    pub id: SessionId,
    /// Discussion topic.
    pub topic: String,
    /// Participant roster (validated at start).
    pub participants: Vec<Participant>,
    /// When the session was started locally.
    pub created_at: DateTime<Utc>,
    status_tx: watch::Sender<SessionStatus>,
    paused_tx: watch::Sender<bool>,
    speed_tx: watch::Sender<f64>,
    cancel: CancellationToken,
    history: Mutex<Vec<Message>>,
}

impl SessionContext {
    /// Create a context in `Idle` state.
    pub(crate) fn new(
        id: SessionId,
        topic: impl Into<String>,
        participants: Vec<Participant>,
        initial_speed: f64,
    ) -> Self {
        let (status_tx, _) = watch::channel(SessionStatus::Idle);
        let (paused_tx, _) = watch::channel(false);
        let (speed_tx, _) = watch::channel(initial_speed.clamp(MIN_SPEED, MAX_SPEED));
        Self {
            id,
            topic: topic.into(),
            participants,
            created_at: Utc::now(),
            status_tx,
            paused_tx,
            speed_tx,
            cancel: CancellationToken::new(),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        *self.status_tx.borrow()
    }

    /// Move to `next` if the state machine allows it. Returns whether the
    /// status actually changed.
    pub(crate) fn set_status(&self, next: SessionStatus) -> bool {
        let current = self.status();
        if !current.can_transition_to(next) {
            return false;
        }
        let _ = self.status_tx.send_replace(next);
        true
    }

    /// Watch lifecycle status changes.
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    /// Whether playback is currently paused.
    #[must_use]
    pub fn paused(&self) -> bool {
        *self.paused_tx.borrow()
    }

    pub(crate) fn set_paused(&self, paused: bool) {
        let _ = self.paused_tx.send_replace(paused);
    }

    /// Watch the pause flag.
    #[must_use]
    pub fn watch_paused(&self) -> watch::Receiver<bool> {
        self.paused_tx.subscribe()
    }

    /// Current playback speed multiplier.
    #[must_use]
    pub fn speed(&self) -> f64 {
        *self.speed_tx.borrow()
    }

    /// Set the playback speed multiplier (clamped to 0.1..=10).
    ///
    /// Takes effect on the next queued item, not retroactively.
    pub fn set_speed(&self, speed: f64) {
        let _ = self.speed_tx.send_replace(speed.clamp(MIN_SPEED, MAX_SPEED));
    }

    /// The token every per-session task is a child of.
    #[must_use]
    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Resolve when the session is torn down.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    /// Cancel all per-session tasks.
    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether teardown has begun.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Metadata for a participant id; `None` for the viewer or unknown ids.
    #[must_use]
    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    /// Append a revealed message to the session history.
    pub(crate) fn push_history(&self, message: Message) {
        self.history.lock().push(message);
    }

    /// The ordered history of revealed messages.
    #[must_use]
    pub fn history(&self) -> Vec<Message> {
        self.history.lock().clone()
    }

    /// Point-in-time snapshot.
    #[must_use]
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.id.clone(),
            topic: self.topic.clone(),
            participants: self.participants.clone(),
            status: self.status(),
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> SessionContext {
        SessionContext::new(
            SessionId::new("s1"),
            "anxiety",
            vec![
                Participant::new("sarah", "Dr. Sarah Chen", "CBT Expert"),
                Participant::new("james", "Dr. James Williams", "Holistic Healer"),
            ],
            1.0,
        )
    }

    #[test]
    fn starts_idle() {
        let ctx = context();
        assert_eq!(ctx.status(), SessionStatus::Idle);
        assert!(!ctx.paused());
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn valid_transitions_apply() {
        let ctx = context();
        assert!(ctx.set_status(SessionStatus::Joining));
        assert!(ctx.set_status(SessionStatus::Active));
        assert!(ctx.set_status(SessionStatus::Paused));
        assert!(ctx.set_status(SessionStatus::Active));
        assert!(ctx.set_status(SessionStatus::Ended));
        assert_eq!(ctx.status(), SessionStatus::Ended);
    }

    #[test]
    fn invalid_transitions_are_ignored() {
        let ctx = context();
        assert!(!ctx.set_status(SessionStatus::Active));
        assert_eq!(ctx.status(), SessionStatus::Idle);

        assert!(ctx.set_status(SessionStatus::Ended));
        assert!(!ctx.set_status(SessionStatus::Joining));
        assert_eq!(ctx.status(), SessionStatus::Ended);
    }

    #[test]
    fn speed_is_clamped() {
        let ctx = context();
        ctx.set_speed(100.0);
        assert!((ctx.speed() - 10.0).abs() < f64::EPSILON);
        ctx.set_speed(0.0);
        assert!((ctx.speed() - 0.1).abs() < f64::EPSILON);
        ctx.set_speed(2.0);
        assert!((ctx.speed() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn participant_lookup() {
        let ctx = context();
        assert_eq!(
            ctx.participant(&ParticipantId::new("sarah")).unwrap().name,
            "Dr. Sarah Chen"
        );
        assert!(ctx.participant(&ParticipantId::new("nobody")).is_none());
        assert!(ctx.participant(&ParticipantId::user()).is_none());
    }

    #[test]
    fn history_accumulates_in_order() {
        let ctx = context();
        for seq in 1..=3 {
            ctx.push_history(Message {
                id: None,
                speaker: ParticipantId::new("sarah"),
                text: format!("m{seq}"),
                timestamp: Utc::now(),
                sequence: seq,
                speaker_name: None,
            });
        }
        let history = ctx.history();
        assert_eq!(history.len(), 3);
        assert_eq!(
            history.iter().map(|m| m.sequence).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test]
    async fn cancellation_resolves_waiters() {
        let ctx = context();
        let wait = ctx.cancelled();
        ctx.cancel();
        wait.await;
        assert!(ctx.is_cancelled());
    }
}
