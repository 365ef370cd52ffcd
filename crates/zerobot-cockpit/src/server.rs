//! [`CockpitServer`] – HTTP + WebSocket server on the vehicle.
//!
//! Listens on `0.0.0.0:8555` (configurable via [`CockpitServer::with_port`]
//! and [`CockpitServer::with_host`]).
//!
//! * Regular HTTP requests → 200 OK with the embedded operator page.
//! * WebSocket upgrades → one interpreter task per connection.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use futures_util::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{Instant, sleep_until};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use zerobot_kernel::{CommandInterpreter, ConnectionId, DriveArbiter};
use zerobot_types::ZeroBotError;

/// Default TCP port for the teleop HTTP/WebSocket server.
pub const DEFAULT_PORT: u16 = 8555;

/// The compiled-in operator page (HTML + CSS + JS).
const OPERATOR_HTML: &str = include_str!("operator.html");

// ---------------------------------------------------------------------------
// CockpitServer
// ---------------------------------------------------------------------------

/// Teleop server: serves the operator page and interprets drive commands.
pub struct CockpitServer {
    arbiter: DriveArbiter,
    host: IpAddr,
    port: u16,
}

impl CockpitServer {
    /// Create a server driving `arbiter` on `0.0.0.0:`[`DEFAULT_PORT`].
    pub fn new(arbiter: DriveArbiter) -> Self {
        Self {
            arbiter,
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
        }
    }

    /// Override the listening port (builder-style).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Override the bind address (builder-style).
    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Bind the configured address and serve forever.
    ///
    /// # Errors
    ///
    /// Returns [`ZeroBotError::Transport`] if the TCP listener cannot bind.
    pub async fn run(self) -> Result<(), ZeroBotError> {
        let addr = self.addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ZeroBotError::Transport(format!("bind error on {addr}: {e}")))?;
        self.serve(listener).await
    }

    /// Serve on an already-bound listener.
    ///
    /// Accept errors are logged and the loop continues; a single bad
    /// connection never takes the server down.
    pub async fn serve(self, listener: TcpListener) -> Result<(), ZeroBotError> {
        let local = listener
            .local_addr()
            .map_err(|e| ZeroBotError::Transport(format!("listener address: {e}")))?;
        info!(addr = %local, "teleop server listening");
        warn!(
            addr = %local,
            "teleop endpoint has no authentication or encryption; expose it only on a trusted network"
        );

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let arbiter = self.arbiter.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, peer, arbiter).await {
                            error!(peer = %peer, error = %e, "client error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "accept error");
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Per-connection handler
// ---------------------------------------------------------------------------

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    arbiter: DriveArbiter,
) -> Result<(), ZeroBotError> {
    // Peek at the request head to decide between WebSocket and plain HTTP.
    // `peek` leaves the bytes in place for tungstenite's handshake.
    let mut buf = [0u8; 1024];
    let n = stream
        .peek(&mut buf)
        .await
        .map_err(|e| ZeroBotError::Transport(format!("peek error from {peer}: {e}")))?;

    if is_websocket_upgrade(&buf[..n]) {
        handle_ws(stream, peer, arbiter).await
    } else {
        serve_html(stream).await
    }
}

fn is_websocket_upgrade(head: &[u8]) -> bool {
    String::from_utf8_lossy(head).lines().any(|line| {
        let line = line.to_ascii_lowercase();
        line.starts_with("upgrade:") && line.contains("websocket")
    })
}

// ---------------------------------------------------------------------------
// Plain HTTP: serve the embedded operator page
// ---------------------------------------------------------------------------

async fn serve_html(mut stream: TcpStream) -> Result<(), ZeroBotError> {
    let body = OPERATOR_HTML;
    let response = format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: text/html; charset=utf-8\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        body.len(),
        body
    );
    stream
        .write_all(response.as_bytes())
        .await
        .map_err(|e| ZeroBotError::Transport(format!("HTTP write error: {e}")))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// WebSocket: one interpreter per connection
// ---------------------------------------------------------------------------

async fn handle_ws(
    stream: TcpStream,
    peer: SocketAddr,
    arbiter: DriveArbiter,
) -> Result<(), ZeroBotError> {
    let ws_stream = accept_async(stream)
        .await
        .map_err(|e| ZeroBotError::Transport(format!("WS handshake from {peer}: {e}")))?;

    let connection = ConnectionId::new();
    info!(peer = %peer, connection = %connection, "operator connected");

    let reason = drive_connection(ws_stream, connection, &arbiter).await;

    info!(peer = %peer, connection = %connection, reason = %reason, "operator disconnected");
    Ok(())
}

/// Run one connection's interpreter until the message stream ends.
///
/// Inbound commands and the safety deadline are two arms of the same
/// `select!`, so an expiry can never interleave with a command for the same
/// connection.  A lapsed deadline is always honoured before the next frame
/// is applied.  When the stream ends the connection's drive is released.
///
/// Returns a human-readable close reason.
pub(crate) async fn drive_connection<S, E>(
    mut messages: S,
    connection: ConnectionId,
    arbiter: &DriveArbiter,
) -> String
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    let mut interpreter = CommandInterpreter::new();

    let reason = loop {
        let deadline = interpreter.deadline();

        tokio::select! {
            biased;

            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                expire_if_due(&mut interpreter, arbiter, connection);
            }
            msg = messages.next() => {
                // A frame that arrives after the deadline must not rescue
                // the lapsed window.
                expire_if_due(&mut interpreter, arbiter, connection);
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_line(&mut interpreter, arbiter, connection, text.as_str());
                    }
                    Some(Ok(Message::Close(_))) => break "closed by operator".to_string(),
                    None => break "connection lost".to_string(),
                    Some(Err(e)) => break format!("connection error: {e}"),
                    Some(Ok(_)) => {}
                }
            }
        }
    };

    debug!(connection = %connection, state = ?interpreter.state(), "forgetting interpreter");
    interpreter.reset();
    release(arbiter, connection);
    reason
}

/// Apply one inbound text frame.  Malformed input is logged and dropped
/// without touching the interpreter or the drive.
pub(crate) fn handle_line(
    interpreter: &mut CommandInterpreter,
    arbiter: &DriveArbiter,
    connection: ConnectionId,
    line: &str,
) {
    match interpreter.receive(line, Instant::now()) {
        Ok(target) => {
            debug!(connection = %connection, command = line, "command accepted");
            if let Err(e) = arbiter.apply(connection, target) {
                warn!(connection = %connection, error = %e, "drive rejected target");
            }
        }
        Err(e) if e.is_malformed_command() => {
            warn!(connection = %connection, error = %e, "ignoring malformed command");
        }
        Err(e) => {
            error!(connection = %connection, error = %e, "interpreter rejected command");
        }
    }
}

fn expire_if_due(interpreter: &mut CommandInterpreter, arbiter: &DriveArbiter, connection: ConnectionId) {
    if interpreter.expire(Instant::now()).is_some() {
        warn!(connection = %connection, "safety window lapsed, forcing stop");
        release(arbiter, connection);
    }
}

fn release(arbiter: &DriveArbiter, connection: ConnectionId) {
    if let Err(e) = arbiter.release(connection) {
        warn!(connection = %connection, error = %e, "drive rejected stop");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
