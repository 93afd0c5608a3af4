//! Push channel: server-initiated message delivery.
//!
//! [`WsPushChannel`] keeps one WebSocket to the push service. A supervisor
//! task owns the socket: it fans incoming frames out to subscribers, drains
//! outbound `join`/`leave` frames, and reconnects with backoff when the
//! connection drops — rejoining the last joined session so delivery resumes
//! without caller involvement. While disconnected, the client survives on
//! the pull channel alone.

use std::sync::Arc;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use metrics::counter;
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use roundtable_core::ids::SessionId;
use roundtable_core::message::MessageFrame;
use roundtable_core::retry::RetryConfig;

use crate::errors::TransportError;
use crate::wire::{ClientFrame, ServerFrame};

/// Broadcast capacity for push events.
const EVENT_CAPACITY: usize = 256;

/// Outbound frame queue depth.
const OUTBOUND_CAPACITY: usize = 32;

/// Events emitted by a push channel.
#[derive(Clone, Debug)]
pub enum PushEvent {
    /// Join acknowledgement for the given session.
    Joined(SessionId),
    /// A message frame arrived.
    Message(MessageFrame),
    /// The service reported an error.
    Error {
        /// Human-readable reason.
        reason: String,
    },
    /// The connection dropped; a reconnect attempt follows.
    Disconnected,
}

/// Server-initiated delivery of session messages.
#[async_trait]
pub trait PushChannel: Send + Sync {
    /// Establish the connection.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Subscribe to a session's message stream.
    async fn join(&self, session_id: &SessionId) -> Result<(), TransportError>;

    /// Unsubscribe from a session's message stream.
    async fn leave(&self, session_id: &SessionId) -> Result<(), TransportError>;

    /// Subscribe to channel events. Only events after this call are seen.
    fn subscribe(&self) -> broadcast::Receiver<PushEvent>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket implementation of [`PushChannel`].
pub struct WsPushChannel {
    url: String,
    retry: RetryConfig,
    events: broadcast::Sender<PushEvent>,
    outbound_tx: mpsc::Sender<ClientFrame>,
    outbound_rx: Mutex<Option<mpsc::Receiver<ClientFrame>>>,
    joined: Arc<Mutex<Option<SessionId>>>,
    cancel: CancellationToken,
}

impl WsPushChannel {
    /// Create a channel for the given `ws://`/`wss://` URL. Does not connect.
    pub fn new(url: impl Into<String>, retry: RetryConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        Self {
            url: url.into(),
            retry,
            events,
            outbound_tx,
            outbound_rx: Mutex::new(Some(outbound_rx)),
            joined: Arc::new(Mutex::new(None)),
            cancel: CancellationToken::new(),
        }
    }

    /// Tear the connection down and stop the supervisor task.
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

#[async_trait]
impl PushChannel for WsPushChannel {
    async fn connect(&self) -> Result<(), TransportError> {
        let Some(outbound_rx) = self.outbound_rx.lock().take() else {
            // Already connected (or connecting); idempotent.
            return Ok(());
        };
        let (stream, _) = match connect_async(self.url.as_str()).await {
            Ok(connected) => connected,
            Err(e) => {
                // Put the receiver back so a later connect can succeed.
                *self.outbound_rx.lock() = Some(outbound_rx);
                return Err(TransportError::Connect(e.to_string()));
            }
        };
        info!(url = %self.url, "push channel connected");
        let _ = tokio::spawn(supervise(
            self.url.clone(),
            self.retry,
            self.events.clone(),
            outbound_rx,
            Arc::clone(&self.joined),
            self.cancel.clone(),
            stream,
        ));
        Ok(())
    }

    async fn join(&self, session_id: &SessionId) -> Result<(), TransportError> {
        *self.joined.lock() = Some(session_id.clone());
        self.outbound_tx
            .send(ClientFrame::Join {
                session_id: session_id.clone(),
            })
            .await
            .map_err(|_| TransportError::NotConnected)
    }

    async fn leave(&self, session_id: &SessionId) -> Result<(), TransportError> {
        {
            let mut joined = self.joined.lock();
            if joined.as_ref() == Some(session_id) {
                *joined = None;
            }
        }
        self.outbound_tx
            .send(ClientFrame::Leave {
                session_id: session_id.clone(),
            })
            .await
            .map_err(|_| TransportError::NotConnected)
    }

    fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.events.subscribe()
    }
}

/// Own the socket for the channel's lifetime: pump one connection until it
/// drops, then reconnect with backoff and rejoin.
async fn supervise(
    url: String,
    retry: RetryConfig,
    events: broadcast::Sender<PushEvent>,
    mut outbound: mpsc::Receiver<ClientFrame>,
    joined: Arc<Mutex<Option<SessionId>>>,
    cancel: CancellationToken,
    mut stream: WsStream,
) {
    loop {
        run_connection(&mut stream, &events, &mut outbound, &cancel).await;
        if cancel.is_cancelled() {
            return;
        }
        let _ = events.send(PushEvent::Disconnected);

        let mut attempt: u32 = 0;
        stream = loop {
            attempt += 1;
            if !retry.should_retry(attempt - 1) {
                warn!(attempt, "push reconnect attempts exhausted");
                let _ = events.send(PushEvent::Error {
                    reason: "reconnect attempts exhausted".into(),
                });
                return;
            }
            tokio::select! {
                () = cancel.cancelled() => return,
                () = sleep(retry.backoff_delay(attempt)) => {}
            }
            match connect_async(url.as_str()).await {
                Ok((s, _)) => {
                    counter!("roundtable_push_reconnects_total").increment(1);
                    info!(attempt, "push channel reconnected");
                    break s;
                }
                Err(e) => warn!(attempt, error = %e, "push reconnect failed"),
            }
        };

        let rejoin = joined.lock().clone();
        if let Some(session_id) = rejoin {
            debug!(session_id = %session_id, "rejoining after reconnect");
            if let Err(e) = send_frame(&mut stream, &ClientFrame::Join { session_id }).await {
                warn!(error = %e, "rejoin failed");
                // Fall through: the next run_connection exits quickly and
                // the reconnect loop takes over again.
            }
        }
    }
}

/// Pump one connection until it errors, closes, or is cancelled.
async fn run_connection(
    stream: &mut WsStream,
    events: &broadcast::Sender<PushEvent>,
    outbound: &mut mpsc::Receiver<ClientFrame>,
    cancel: &CancellationToken,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                let _ = stream.close(None).await;
                return;
            }
            frame = outbound.recv() => match frame {
                Some(frame) => {
                    if let Err(e) = send_frame(stream, &frame).await {
                        warn!(error = %e, "push send failed");
                        return;
                    }
                }
                // All channel handles dropped; nothing left to send for.
                None => return,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(msg)) if msg.is_text() => {
                    if let Ok(text) = msg.to_text() {
                        dispatch_frame(text, events);
                    }
                }
                Some(Ok(Message::Close(_))) => {
                    debug!("push service closed the connection");
                    return;
                }
                Some(Ok(_)) => {} // ping/pong/binary: ignored
                Some(Err(e)) => {
                    warn!(error = %e, "push read failed");
                    return;
                }
                None => return,
            },
        }
    }
}

fn dispatch_frame(text: &str, events: &broadcast::Sender<PushEvent>) {
    match serde_json::from_str::<ServerFrame>(text) {
        Ok(ServerFrame::Joined { session_id }) => {
            let _ = events.send(PushEvent::Joined(session_id));
        }
        Ok(ServerFrame::Message { frame }) => {
            let _ = events.send(PushEvent::Message(frame));
        }
        Ok(ServerFrame::Error { reason }) => {
            warn!(%reason, "push service error");
            let _ = events.send(PushEvent::Error { reason });
        }
        Err(e) => {
            counter!("roundtable_push_frames_invalid_total").increment(1);
            warn!(error = %e, "dropping unparseable push frame");
        }
    }
}

async fn send_frame(stream: &mut WsStream, frame: &ClientFrame) -> Result<(), TransportError> {
    let json = serde_json::to_string(frame)?;
    stream.send(Message::text(json)).await?;
    Ok(())
}
