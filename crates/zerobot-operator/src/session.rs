//! [`TransportSession`] – one WebSocket link to the vehicle.
//!
//! * Connects once to a fixed URL (default `ws://localhost:8555`).
//! * Reports lifecycle events (`Connecting`, `Connected`, `MessageReceived`,
//!   `Closed`) as timestamped [`StatusUpdate`]s on a broadcast channel.
//! * Sends are accepted only while the link is [`LinkState::Open`]; anything
//!   attempted before the handshake completes or after the close is dropped,
//!   never queued for later delivery.
//! * A closed session is terminal.  There is no automatic reconnect: control
//!   must never resume silently after an outage the operator didn't see.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{Notify, broadcast, mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use zerobot_types::Command;

/// Capacity of the status broadcast channel.
const STATUS_CAPACITY: usize = 64;

/// Connection state of a [`TransportSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    Connecting,
    Open,
    Closed { reason: String },
}

impl LinkState {
    pub fn is_open(&self) -> bool {
        matches!(self, LinkState::Open)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, LinkState::Closed { .. })
    }
}

/// Lifecycle events reported to observers (status line, message log).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Connecting { url: String },
    Connected,
    MessageReceived(String),
    Closed { reason: String },
}

/// A [`SessionEvent`] stamped with the time it happened.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub timestamp: DateTime<Utc>,
    pub event: SessionEvent,
}

/// The seam between the operator actor and whatever carries its commands.
pub trait CommandLink: Send + Sync {
    /// Hand `command` to the link.  Silently dropped when the link is not
    /// open.
    fn transmit(&self, command: &Command);

    /// Watch the link's state; the operator stops when it turns
    /// [`LinkState::Closed`].
    fn watch_state(&self) -> watch::Receiver<LinkState>;
}

impl<L: CommandLink + ?Sized> CommandLink for Arc<L> {
    fn transmit(&self, command: &Command) {
        (**self).transmit(command)
    }

    fn watch_state(&self) -> watch::Receiver<LinkState> {
        (**self).watch_state()
    }
}

/// Client end of the teleop WebSocket.
pub struct TransportSession {
    url: String,
    outbound: mpsc::UnboundedSender<String>,
    state: watch::Receiver<LinkState>,
    status: broadcast::Sender<StatusUpdate>,
    close: Arc<Notify>,
}

impl TransportSession {
    /// Start connecting to `url` on the current Tokio runtime.
    ///
    /// Returns the session and a status receiver that is subscribed before
    /// the first event is emitted, so no lifecycle event is missed.
    pub fn connect(url: impl Into<String>) -> (Self, broadcast::Receiver<StatusUpdate>) {
        let url = url.into();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(LinkState::Connecting);
        let (status, status_rx) = broadcast::channel(STATUS_CAPACITY);
        let close = Arc::new(Notify::new());

        let link = LinkTask {
            url: url.clone(),
            outbound: outbound_rx,
            state: state_tx,
            status: status.clone(),
            close: Arc::clone(&close),
        };
        tokio::spawn(link.run());

        (
            Self {
                url,
                outbound,
                state,
                status,
                close,
            },
            status_rx,
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current state of the link.
    pub fn link_state(&self) -> LinkState {
        self.state.borrow().clone()
    }

    /// Subscribe another observer to lifecycle events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusUpdate> {
        self.status.subscribe()
    }

    /// Send `command` if the link is open.
    ///
    /// Returns `true` when the command was handed to the socket writer.
    pub fn send(&self, command: &Command) -> bool {
        if !self.state.borrow().is_open() {
            debug!(command = %command, "link not open, command dropped");
            return false;
        }
        self.outbound.send(command.encode()).is_ok()
    }

    /// Close the link.  Commands already handed to the writer are flushed
    /// first.
    pub fn close(&self) {
        self.close.notify_one();
    }

    /// Wait until the link has closed; returns the close reason.
    pub async fn closed(&self) -> String {
        let mut state = self.state.clone();
        loop {
            if let LinkState::Closed { reason } = &*state.borrow_and_update() {
                return reason.clone();
            }
            if state.changed().await.is_err() {
                return "link task ended".to_string();
            }
        }
    }
}

impl CommandLink for TransportSession {
    fn transmit(&self, command: &Command) {
        self.send(command);
    }

    fn watch_state(&self) -> watch::Receiver<LinkState> {
        self.state.clone()
    }
}

// ---------------------------------------------------------------------------
// Connection task
// ---------------------------------------------------------------------------

struct LinkTask {
    url: String,
    outbound: mpsc::UnboundedReceiver<String>,
    state: watch::Sender<LinkState>,
    status: broadcast::Sender<StatusUpdate>,
    close: Arc<Notify>,
}

impl LinkTask {
    fn emit(&self, event: SessionEvent) {
        // No observers is a normal condition.
        let _ = self.status.send(StatusUpdate {
            timestamp: Utc::now(),
            event,
        });
    }

    async fn run(mut self) {
        self.emit(SessionEvent::Connecting {
            url: self.url.clone(),
        });
        info!(url = %self.url, "connecting");

        let connected = tokio::select! {
            result = connect_async(self.url.as_str()) => result,
            _ = self.close.notified() => {
                self.finish("closed by operator".to_string());
                return;
            }
        };
        let ws_stream = match connected {
            Ok((ws_stream, _response)) => ws_stream,
            Err(e) => {
                self.finish(format!("connect to {} failed: {e}", self.url));
                return;
            }
        };

        self.state.send_replace(LinkState::Open);
        self.emit(SessionEvent::Connected);
        info!(url = %self.url, "connected");

        let (mut ws_tx, mut ws_rx) = ws_stream.split();

        let reason = loop {
            tokio::select! {
                biased;

                // ── Outbound: operator → vehicle ───────────────────────────
                line = self.outbound.recv() => {
                    let Some(line) = line else {
                        break "session dropped".to_string();
                    };
                    if let Err(e) = ws_tx.send(Message::Text(line.into())).await {
                        break format!("send failed: {e}");
                    }
                }
                _ = self.close.notified() => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break "closed by operator".to_string();
                }
                // ── Inbound: vehicle → operator ────────────────────────────
                msg = ws_rx.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.emit(SessionEvent::MessageReceived(text.as_str().to_string()));
                        }
                        Some(Ok(Message::Close(frame))) => {
                            break match frame {
                                Some(frame) if !frame.reason.is_empty() => format!(
                                    "closed by vehicle ({}): {}",
                                    u16::from(frame.code),
                                    frame.reason.as_str()
                                ),
                                Some(frame) => {
                                    format!("closed by vehicle ({})", u16::from(frame.code))
                                }
                                None => "closed by vehicle".to_string(),
                            };
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => break format!("connection error: {e}"),
                        None => break "connection lost".to_string(),
                    }
                }
            }
        };

        self.finish(reason);
    }

    fn finish(&self, reason: String) {
        warn!(url = %self.url, reason = %reason, "link closed");
        self.state.send_replace(LinkState::Closed {
            reason: reason.clone(),
        });
        self.emit(SessionEvent::Closed { reason });
    }
}
