//! Playback scheduler: decouples data arrival from presentation reveal.
//!
//! One task per session consumes the reconciler's ordered queue and releases
//! messages at a controlled pace. Ingestion is never blocked by pacing — the
//! queue keeps filling while playback holds. Speed is sampled when an item is
//! dequeued, so changes apply to the next item, never retroactively. While
//! paused, nothing is revealed; on resume, queued items drain in original
//! order.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::sync::{broadcast, mpsc};
use tokio::time::sleep;
use tracing::debug;

use roundtable_core::events::PresentationEvent;
use roundtable_core::message::Message;

use crate::session::context::SessionContext;

/// Per-session pacing task.
///
/// Presentation events go out over a broadcast sender: sends never await, so
/// a slow renderer lags instead of stalling playback.
pub(crate) struct PlaybackScheduler {
    ctx: Arc<SessionContext>,
    events: broadcast::Sender<PresentationEvent>,
    base_delay: Duration,
    highlight_window: Duration,
}

impl PlaybackScheduler {
    pub(crate) fn new(
        ctx: Arc<SessionContext>,
        events: broadcast::Sender<PresentationEvent>,
        base_delay: Duration,
        highlight_window: Duration,
    ) -> Self {
        Self {
            ctx,
            events,
            base_delay,
            highlight_window,
        }
    }

    /// Reveal loop. Runs until the session is cancelled or the queue closes.
    pub(crate) async fn run(self, mut queue: mpsc::UnboundedReceiver<Message>) {
        let cancel = self.ctx.cancel_token();
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                next = queue.recv() => match next {
                    Some(msg) => {
                        if !self.present(msg).await {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
        debug!(session_id = %self.ctx.id, "playback scheduler stopped");
    }

    /// Pace and reveal one message. Returns `false` on cancellation.
    async fn present(&self, msg: Message) -> bool {
        // Revealed output never advances while paused; the queue behind us
        // keeps accepting.
        if !self.hold_while_paused().await {
            return false;
        }

        if msg.is_user() {
            // Viewer messages appear immediately, no typing phase.
            self.reveal(msg, false);
            return true;
        }

        // Speed sampled at dequeue: changes apply from the next item on.
        let speed = self.ctx.speed();
        let delay = self.base_delay.div_f64(speed);
        let _ = self.events.send(PresentationEvent::TypingStarted {
            session_id: self.ctx.id.clone(),
            speaker: msg.speaker.clone(),
        });
        tokio::select! {
            () = self.ctx.cancelled() => return false,
            () = sleep(delay) => {}
        }
        // A pause that landed during the typing delay holds the reveal.
        if !self.hold_while_paused().await {
            return false;
        }
        self.reveal(msg, true);
        true
    }

    fn reveal(&self, msg: Message, highlight: bool) {
        let speaker_meta = self.ctx.participant(&msg.speaker).cloned();
        let speaker = msg.speaker.clone();
        self.ctx.push_history(msg.clone());
        counter!("roundtable_messages_revealed_total").increment(1);
        let _ = self.events.send(PresentationEvent::MessageRevealed {
            session_id: self.ctx.id.clone(),
            message: msg,
            speaker: speaker_meta,
        });
        if !highlight {
            return;
        }
        let _ = self.events.send(PresentationEvent::SpeakerActive {
            session_id: self.ctx.id.clone(),
            speaker: speaker.clone(),
        });
        // The highlight clears on its own window, concurrently with the next
        // item's typing phase. Child of the session token: teardown wins.
        let ctx = Arc::clone(&self.ctx);
        let events = self.events.clone();
        let window = self.highlight_window;
        let _ = tokio::spawn(async move {
            tokio::select! {
                () = ctx.cancelled() => {}
                () = sleep(window) => {
                    let _ = events.send(PresentationEvent::SpeakerIdle {
                        session_id: ctx.id.clone(),
                        speaker,
                    });
                }
            }
        });
    }

    /// Block until playback is unpaused. Returns `false` on cancellation.
    async fn hold_while_paused(&self) -> bool {
        let mut paused = self.ctx.watch_paused();
        loop {
            if !*paused.borrow() {
                return true;
            }
            tokio::select! {
                () = self.ctx.cancelled() => return false,
                changed = paused.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
            }
        }
    }
}
