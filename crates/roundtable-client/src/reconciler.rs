//! Delivery reconciler: two unreliable channels in, one exactly-once,
//! sequence-ordered timeline out.
//!
//! Each session runs one reconcile task — the sole writer of delivery state.
//! Push frames are applied as they arrive; the pull channel is polled on a
//! fixed cadence and only the suffix beyond the count already consumed is
//! considered. Both paths funnel through one `apply` operation that drops
//! duplicates by message identity and orders output by sequence number.
//!
//! Ordering policy: an out-of-sequence message is buffered until the gap is
//! filled by either path, up to a bounded wait. When the wait elapses the
//! buffer is flushed in sequence order anyway — liveness wins over strict
//! ordering on persistent gaps. A message that fills a gap *after* the flush
//! is forwarded immediately (never re-ordered ahead of already-forwarded
//! messages).

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep_until};
use tracing::{debug, info, warn};

use roundtable_core::message::{Message, MessageFrame, MessageIdentity};
use roundtable_transport::pull::PullChannel;
use roundtable_transport::push::PushEvent;

use crate::session::context::SessionContext;

/// The playback queue is gone; the session is tearing down.
pub(crate) struct OutputClosed;

/// Per-session merge state and its collaborators.
///
/// The output queue is unbounded: ingestion must never be blocked by
/// presentation pacing, however long playback stays paused.
pub(crate) struct Reconciler {
    ctx: Arc<SessionContext>,
    pull: Arc<dyn PullChannel>,
    out: mpsc::UnboundedSender<Message>,
    poll_interval: Duration,
    gap_wait: Duration,
    seen: HashSet<MessageIdentity>,
    highest_applied: u64,
    pull_baseline: usize,
    pending: BTreeMap<u64, Message>,
    gap_deadline: Option<Instant>,
}

impl Reconciler {
    pub(crate) fn new(
        ctx: Arc<SessionContext>,
        pull: Arc<dyn PullChannel>,
        out: mpsc::UnboundedSender<Message>,
        poll_interval: Duration,
        gap_wait: Duration,
    ) -> Self {
        Self {
            ctx,
            pull,
            out,
            poll_interval,
            gap_wait,
            seen: HashSet::new(),
            highest_applied: 0,
            pull_baseline: 0,
            pending: BTreeMap::new(),
            gap_deadline: None,
        }
    }

    /// Merge loop. Runs until the session is cancelled, the push
    /// subscription closes and polling becomes impossible, or the playback
    /// queue is dropped.
    pub(crate) async fn run(mut self, mut push_rx: broadcast::Receiver<PushEvent>) {
        let cancel = self.ctx.cancel_token();
        let mut poll_tick = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        poll_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut push_open = true;

        loop {
            let gap_at = self.gap_deadline;
            let result = tokio::select! {
                () = cancel.cancelled() => break,
                event = push_rx.recv(), if push_open => match event {
                    Ok(PushEvent::Message(frame)) => self.apply_frame(frame, "push"),
                    Ok(PushEvent::Joined(_)) => Ok(()),
                    Ok(PushEvent::Error { reason }) => {
                        warn!(session_id = %self.ctx.id, %reason, "push channel error; continuing on pull only");
                        Ok(())
                    }
                    Ok(PushEvent::Disconnected) => {
                        warn!(session_id = %self.ctx.id, "push channel disconnected; continuing on pull only");
                        Ok(())
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // The poll path repairs whatever the lag dropped.
                        warn!(session_id = %self.ctx.id, skipped, "push subscription lagged");
                        Ok(())
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!(session_id = %self.ctx.id, "push subscription closed; poll-only from here");
                        push_open = false;
                        Ok(())
                    }
                },
                _ = poll_tick.tick() => self.poll_once().await,
                () = sleep_until(gap_at.unwrap_or_else(far_future)), if gap_at.is_some() => {
                    self.flush_pending()
                }
            };
            if result.is_err() {
                break;
            }
        }
        debug!(session_id = %self.ctx.id, "reconciler stopped");
    }

    /// Poll the pull channel and apply the unseen suffix.
    pub(crate) async fn poll_once(&mut self) -> Result<(), OutputClosed> {
        let frames = match self.pull.poll(&self.ctx.id, self.pull_baseline).await {
            Ok(frames) => frames,
            Err(e) => {
                warn!(session_id = %self.ctx.id, error = %e, "poll failed; retrying next tick");
                return Ok(());
            }
        };
        let total = frames.len();
        // The service normally returns the full log; only the suffix beyond
        // the baseline is new. A service that honors the `since` hint returns
        // fewer — then everything it returned goes through `apply`, where
        // dedup makes any overlap harmless.
        let fresh: Vec<MessageFrame> = if total > self.pull_baseline {
            frames.into_iter().skip(self.pull_baseline).collect()
        } else {
            frames
        };
        for frame in fresh {
            self.apply_frame(frame, "pull")?;
        }
        self.pull_baseline = self.pull_baseline.max(total);
        Ok(())
    }

    /// The single apply operation both delivery paths route through.
    pub(crate) fn apply_frame(
        &mut self,
        frame: MessageFrame,
        source: &'static str,
    ) -> Result<(), OutputClosed> {
        let msg = match frame.into_message() {
            Ok(msg) => msg,
            Err(e) => {
                counter!("roundtable_messages_malformed_total").increment(1);
                warn!(session_id = %self.ctx.id, source, error = %e, "dropping malformed message");
                return Ok(());
            }
        };
        if !msg.is_user() && self.ctx.participant(&msg.speaker).is_none() {
            warn!(session_id = %self.ctx.id, speaker = %msg.speaker, "dropping message from unknown speaker");
            return Ok(());
        }
        if !self.seen.insert(msg.identity()) {
            counter!("roundtable_messages_duplicate_total").increment(1);
            debug!(session_id = %self.ctx.id, source, sequence = msg.sequence, "duplicate dropped");
            return Ok(());
        }

        if msg.sequence <= self.highest_applied {
            // A gap filler arriving after the bounded wait already flushed.
            counter!("roundtable_messages_late_total").increment(1);
            debug!(
                session_id = %self.ctx.id,
                sequence = msg.sequence,
                highest = self.highest_applied,
                "late message after gap flush; forwarding"
            );
            return self.forward(msg);
        }

        if msg.sequence == self.highest_applied + 1 {
            self.highest_applied = msg.sequence;
            self.forward(msg)?;
            self.drain_contiguous()
        } else {
            debug!(
                session_id = %self.ctx.id,
                source,
                sequence = msg.sequence,
                highest = self.highest_applied,
                "buffering out-of-sequence message"
            );
            let _ = self.pending.insert(msg.sequence, msg);
            if self.gap_deadline.is_none() {
                self.gap_deadline = Some(Instant::now() + self.gap_wait);
            }
            Ok(())
        }
    }

    /// Forward buffered messages that became contiguous.
    fn drain_contiguous(&mut self) -> Result<(), OutputClosed> {
        while self
            .pending
            .first_key_value()
            .is_some_and(|(&seq, _)| seq == self.highest_applied + 1)
        {
            if let Some((seq, msg)) = self.pending.pop_first() {
                self.highest_applied = seq;
                self.forward(msg)?;
            }
        }
        if self.pending.is_empty() {
            self.gap_deadline = None;
        }
        Ok(())
    }

    /// Bounded wait elapsed: forward everything buffered, in sequence order.
    pub(crate) fn flush_pending(&mut self) -> Result<(), OutputClosed> {
        let flushed = std::mem::take(&mut self.pending);
        self.gap_deadline = None;
        if flushed.is_empty() {
            return Ok(());
        }
        counter!("roundtable_gap_flushes_total").increment(1);
        warn!(
            session_id = %self.ctx.id,
            count = flushed.len(),
            highest = self.highest_applied,
            "sequence gap not filled within bounded wait; forwarding out of order"
        );
        for (seq, msg) in flushed {
            self.highest_applied = self.highest_applied.max(seq);
            self.forward(msg)?;
        }
        Ok(())
    }

    fn forward(&self, msg: Message) -> Result<(), OutputClosed> {
        if self.out.send(msg).is_err() {
            debug!(session_id = %self.ctx.id, "playback queue closed");
            return Err(OutputClosed);
        }
        Ok(())
    }
}

fn far_future() -> Instant {
    Instant::now() + Duration::from_secs(3_600)
}
