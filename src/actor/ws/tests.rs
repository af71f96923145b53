use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;
use tungstenite::protocol::Role;

use super::client::OUTBOX_CAPACITY;
use super::{ClientSink, Delivery, TransportError, WsActor};
use crate::actor::messages::WsMsg;
use crate::compiler::Diagnostic;
use crate::reload::message::HotReloadMessage;

const WAIT: Duration = Duration::from_secs(5);

/// In-memory client that records what it was sent.
#[derive(Clone, Default)]
struct FakeClient {
    sent: Arc<Mutex<Vec<String>>>,
    dead: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl FakeClient {
    fn kinds(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .map(|json| HotReloadMessage::from_json(json).unwrap().kind().to_string())
            .collect()
    }

    fn kill(&self) {
        self.dead.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl ClientSink for FakeClient {
    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        if self.dead.load(Ordering::SeqCst) {
            return Err(TransportError::Write(tungstenite::Error::ConnectionClosed));
        }
        self.sent.lock().push(text.to_string());
        Ok(())
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Client whose writes block until the gate is released or dropped.
struct BlockedClient {
    gate: crossbeam::channel::Receiver<()>,
}

impl ClientSink for BlockedClient {
    fn send_text(&mut self, _text: &str) -> Result<(), TransportError> {
        let _ = self.gate.recv();
        Ok(())
    }

    fn close(&mut self) {}
}

fn actor() -> (mpsc::Sender<WsMsg>, WsActor) {
    let (tx, rx) = mpsc::channel(8);
    (tx, WsActor::new(rx))
}

/// Poll `condition` from a plain test thread.
fn wait_for(condition: impl Fn() -> bool) {
    let deadline = Instant::now() + WAIT;
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached");
        std::thread::sleep(Duration::from_millis(5));
    }
}

/// Poll `condition` without blocking the runtime the actor runs on.
async fn eventually(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + WAIT;
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not reached");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[test]
fn test_new_client_is_greeted() {
    let (_tx, mut actor) = actor();
    let client = FakeClient::default();
    actor.add_client(Box::new(client.clone()));

    wait_for(|| client.kinds() == ["connected"]);
    assert_eq!(actor.open_clients(), 1);
}

#[test]
fn test_client_dead_on_arrival_is_pruned() {
    let (_tx, mut actor) = actor();
    let client = FakeClient::default();
    client.kill();
    actor.add_client(Box::new(client));

    wait_for(|| actor.open_clients() == 0);
    let delivery = actor.broadcast(&HotReloadMessage::update(1, vec![]));
    assert_eq!(delivery, Delivery { queued: 0, pruned: 1 });
}

#[test]
fn test_broadcast_prunes_dead_client() {
    let (_tx, mut actor) = actor();
    let clients: Vec<FakeClient> = (0..3).map(|_| FakeClient::default()).collect();
    for client in &clients {
        actor.add_client(Box::new(client.clone()));
    }
    wait_for(|| clients.iter().all(|c| c.kinds().len() == 1));

    // The failed write is noticed by the next broadcast
    clients[1].kill();
    actor.broadcast(&HotReloadMessage::reload(2, vec!["/main.js".into()]));
    wait_for(|| actor.open_clients() == 2);

    assert_eq!(
        actor.broadcast(&HotReloadMessage::update(3, vec![])),
        Delivery {
            queued: 2,
            pruned: 1
        }
    );
    for client in [&clients[0], &clients[2]] {
        wait_for(|| client.kinds().len() == 3);
        assert_eq!(client.kinds(), ["connected", "reload", "update"]);
    }

    let next = actor.broadcast(&HotReloadMessage::update(4, vec![]));
    assert_eq!(next, Delivery { queued: 2, pruned: 0 });
}

#[test]
fn test_client_that_falls_behind_is_dropped() {
    let (_tx, mut actor) = actor();
    let (gate_tx, gate_rx) = crossbeam::channel::unbounded();
    actor.add_client(Box::new(BlockedClient { gate: gate_rx }));
    let healthy = FakeClient::default();
    actor.add_client(Box::new(healthy.clone()));

    let mut pruned = 0;
    for generation in 0..(OUTBOX_CAPACITY as u64 + 2) {
        pruned += actor.broadcast(&HotReloadMessage::update(generation, vec![])).pruned;
        // Keep the healthy client caught up so only the blocked one overflows
        wait_for(|| healthy.kinds().len() == generation as usize + 2);
    }

    assert_eq!(pruned, 1);
    assert_eq!(actor.open_clients(), 1);
    wait_for(|| healthy.kinds().len() == OUTBOX_CAPACITY + 3);
    drop(gate_tx);
}

#[test]
fn test_broadcast_without_clients() {
    let (_tx, mut actor) = actor();
    assert_eq!(
        actor.broadcast(&HotReloadMessage::update(1, vec![])),
        Delivery::default()
    );
}

#[tokio::test]
async fn test_run_delivers_in_order_and_closes_on_shutdown() {
    let (tx, actor) = actor();
    let handle = tokio::spawn(actor.run());
    let client = FakeClient::default();

    tx.send(WsMsg::AddClient(Box::new(client.clone()))).await.unwrap();
    tx.send(WsMsg::Broadcast(HotReloadMessage::update(1, vec![])))
        .await
        .unwrap();
    tx.send(WsMsg::Broadcast(HotReloadMessage::error(1, vec![])))
        .await
        .unwrap();
    tx.send(WsMsg::Shutdown).await.unwrap();
    handle.await.unwrap();

    eventually(|| client.is_closed()).await;
    assert_eq!(client.kinds(), ["connected", "update", "error"]);
}

#[tokio::test]
async fn test_client_added_after_broadcast_gets_no_history() {
    let (tx, actor) = actor();
    let handle = tokio::spawn(actor.run());

    tx.send(WsMsg::Broadcast(HotReloadMessage::reload(1, vec![])))
        .await
        .unwrap();
    let late = FakeClient::default();
    tx.send(WsMsg::AddClient(Box::new(late.clone()))).await.unwrap();
    tx.send(WsMsg::Shutdown).await.unwrap();
    handle.await.unwrap();

    eventually(|| late.is_closed()).await;
    assert_eq!(late.kinds(), ["connected"]);
}

#[tokio::test]
async fn test_heartbeat_pings_clients() {
    let (tx, rx) = mpsc::channel(8);
    let actor = WsActor::new(rx).with_heartbeat(Duration::from_millis(20));
    let handle = tokio::spawn(actor.run());
    let client = FakeClient::default();
    tx.send(WsMsg::AddClient(Box::new(client.clone()))).await.unwrap();

    eventually(|| client.kinds().iter().any(|k| k == "ping")).await;

    drop(tx);
    handle.await.unwrap();
    eventually(|| client.is_closed()).await;
}

#[tokio::test]
async fn test_peer_that_never_reads_does_not_stall_others() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let peer = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
    let (stream, _) = listener.accept().unwrap();
    let stalled = WebSocket::from_raw_socket(stream, Role::Server, None);

    let (tx, actor) = actor();
    let handle = tokio::spawn(actor.run());
    let healthy = FakeClient::default();
    tx.send(WsMsg::AddClient(Box::new(stalled))).await.unwrap();
    tx.send(WsMsg::AddClient(Box::new(healthy.clone()))).await.unwrap();

    // Large enough to fill both socket buffers of the stalled connection
    let huge = Diagnostic::error("x".repeat(8 << 20));
    for _ in 0..2 {
        let msg = HotReloadMessage::error(0, vec![huge.clone()]);
        tx.send(WsMsg::Broadcast(msg)).await.unwrap();
    }
    tx.send(WsMsg::Broadcast(HotReloadMessage::reload(1, vec![])))
        .await
        .unwrap();

    eventually(|| healthy.kinds() == ["connected", "error", "error", "reload"]).await;

    tx.send(WsMsg::Shutdown).await.unwrap();
    tokio::time::timeout(WAIT, handle).await.unwrap().unwrap();
    eventually(|| healthy.is_closed()).await;

    // Unblocks the stalled writer thread
    drop(peer);
}
