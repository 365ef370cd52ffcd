//! End-to-end: operator client ↔ cockpit server over a real loopback socket.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::SinkExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{Instant, sleep};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use zerobot_cockpit::CockpitServer;
use zerobot_hal::{DriveHistory, SimDrive};
use zerobot_kernel::DriveArbiter;
use zerobot_operator::{OperatorSession, TransportSession};
use zerobot_types::{Direction, Motion};

async fn start_server() -> (SocketAddr, DriveArbiter, DriveHistory) {
    let drive = SimDrive::new("drive_base");
    let history = drive.history();
    let arbiter = DriveArbiter::new(Box::new(drive));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = CockpitServer::new(arbiter.clone());
    tokio::spawn(server.serve(listener));
    (addr, arbiter, history)
}

/// Poll `cond` every 5ms until it holds or `limit` elapses.
async fn wait_until(limit: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < limit {
        if cond() {
            return true;
        }
        sleep(Duration::from_millis(5)).await;
    }
    cond()
}

#[tokio::test]
async fn operator_press_and_release_reach_the_drive() {
    let (addr, arbiter, history) = start_server().await;

    let (session, _status) = TransportSession::connect(format!("ws://{addr}"));
    let session = Arc::new(session);
    assert!(wait_until(Duration::from_secs(5), || session.link_state().is_open()).await);

    let (handle, _task) =
        OperatorSession::new(Arc::clone(&session), Duration::from_millis(50)).spawn();

    handle.press(Direction::Forward);
    let forward = Motion::new(100, 0).unwrap();
    assert!(wait_until(Duration::from_secs(2), || arbiter.current() == forward).await);

    // Held long enough for several refreshes; the 100ms window never lapses.
    sleep(Duration::from_millis(300)).await;
    assert_eq!(arbiter.current(), forward);

    handle.release(Direction::Forward);
    assert!(wait_until(Duration::from_secs(2), || arbiter.current().is_stop()).await);
    assert_eq!(history.snapshot(), vec![forward, Motion::STOP]);

    session.close();
    session.closed().await;
}

#[tokio::test]
async fn silent_client_is_stopped_by_the_safety_window() {
    let (addr, arbiter, _history) = start_server().await;

    let (mut ws, _) = connect_async(format!("ws://{addr}")).await.unwrap();
    let sent_at = Instant::now();
    ws.send(Message::Text("move:300:0:100".into())).await.unwrap();

    let right = Motion::new(0, 100).unwrap();
    assert!(wait_until(Duration::from_secs(1), || arbiter.current() == right).await);

    assert!(wait_until(Duration::from_secs(2), || arbiter.current().is_stop()).await);
    assert!(sent_at.elapsed() >= Duration::from_millis(300));

    // The socket is still open: a fresh command drives again.
    ws.send(Message::Text("move:300:-100:0".into())).await.unwrap();
    let back = Motion::new(-100, 0).unwrap();
    assert!(wait_until(Duration::from_secs(1), || arbiter.current() == back).await);
}

#[tokio::test]
async fn closing_the_socket_stops_immediately() {
    let (addr, arbiter, _history) = start_server().await;

    let (mut ws, _) = connect_async(format!("ws://{addr}")).await.unwrap();
    ws.send(Message::Text("move:60000:100:100".into())).await.unwrap();
    assert!(wait_until(Duration::from_secs(1), || !arbiter.current().is_stop()).await);

    ws.close(None).await.unwrap();
    assert!(wait_until(Duration::from_secs(1), || arbiter.current().is_stop()).await);
}

#[tokio::test]
async fn plain_http_gets_the_operator_page() {
    let (addr, _arbiter, _history) = start_server().await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: zerobot\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.contains("text/html"));
    assert!(response.contains("WebSocket"));
}
