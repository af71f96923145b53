use std::io::{Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use thiserror::Error;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::WsActor;
use crate::reload::message::HotReloadMessage;

/// Messages queued for one client before it counts as stalled.
pub(super) const OUTBOX_CAPACITY: usize = 16;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("websocket handshake failed: {0}")]
    Handshake(String),

    #[error("websocket write failed")]
    Write(#[from] tungstenite::Error),
}

/// Write half of a browser connection.
///
/// Implemented for any tungstenite [`WebSocket`]; tests substitute fakes.
/// Writes may block, so every sink is driven from its own writer thread.
pub trait ClientSink: Send {
    fn send_text(&mut self, text: &str) -> Result<(), TransportError>;

    /// Send a close frame. Best effort.
    fn close(&mut self);
}

impl<S: Read + Write + Send> ClientSink for WebSocket<S> {
    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        self.send(Message::text(text.to_owned()))?;
        Ok(())
    }

    fn close(&mut self) {
        if WebSocket::close(self, None).is_ok() {
            let _ = self.flush();
        }
    }
}

/// Connection lifecycle: `Connecting -> Open -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ClientState {
    Connecting,
    Open,
    Closed,
}

enum Outgoing {
    Text(Arc<str>),
    Close,
}

/// A registered WebSocket client.
///
/// The actor only ever queues; the socket itself belongs to the writer
/// thread, so a peer that stops reading stalls nobody but itself.
pub(super) struct RegisteredClient {
    pub(super) id: u64,
    pub(super) state: ClientState,
    outbox: Sender<Outgoing>,
    /// Cleared by the writer thread once the socket is unusable
    alive: Arc<AtomicBool>,
}

impl RegisteredClient {
    fn spawn(id: u64, sink: Box<dyn ClientSink>) -> std::io::Result<Self> {
        let (outbox, inbox) = channel::bounded(OUTBOX_CAPACITY);
        let alive = Arc::new(AtomicBool::new(true));
        let writer_alive = Arc::clone(&alive);

        thread::Builder::new()
            .name(format!("hotserve-ws-{id}"))
            .spawn(move || write_loop(id, sink, inbox, writer_alive))?;

        Ok(Self {
            id,
            state: ClientState::Connecting,
            outbox,
            alive,
        })
    }

    pub(super) fn is_alive(&self) -> bool {
        self.state != ClientState::Closed && self.alive.load(Ordering::Acquire)
    }

    /// Queue one message.
    ///
    /// Returns false, and closes the client, if its socket failed or it has
    /// fallen [`OUTBOX_CAPACITY`] messages behind.
    pub(super) fn deliver(&mut self, json: &Arc<str>) -> bool {
        if !self.is_alive() {
            self.state = ClientState::Closed;
            return false;
        }

        match self.outbox.try_send(Outgoing::Text(Arc::clone(json))) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                crate::debug!("ws"; "client #{} is not reading, dropping it", self.id);
                self.state = ClientState::Closed;
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                self.state = ClientState::Closed;
                false
            }
        }
    }

    /// Ask the writer to send a close frame after what is already queued.
    pub(super) fn close(&mut self) {
        if self.state != ClientState::Closed {
            let _ = self.outbox.try_send(Outgoing::Close);
        }
        self.state = ClientState::Closed;
    }
}

/// Drain one client's queue into its socket.
///
/// Ends on a write failure, after a close frame, or when the actor drops
/// the client; dropping the sink closes the connection.
fn write_loop(id: u64, mut sink: Box<dyn ClientSink>, inbox: Receiver<Outgoing>, alive: Arc<AtomicBool>) {
    for outgoing in inbox {
        match outgoing {
            Outgoing::Text(json) => {
                if let Err(e) = sink.send_text(&json) {
                    crate::debug!("ws"; "client #{} disconnected: {}", id, e);
                    break;
                }
            }
            Outgoing::Close => {
                sink.close();
                break;
            }
        }
    }
    alive.store(false, Ordering::Release);
}

impl WsActor {
    /// Register a new connection and greet it.
    ///
    /// No compile history is replayed; the client learns about the next
    /// compile like everyone else.
    pub(super) fn add_client(&mut self, sink: Box<dyn ClientSink>) {
        self.next_id += 1;
        let mut client = match RegisteredClient::spawn(self.next_id, sink) {
            Ok(client) => client,
            Err(e) => {
                crate::log!("ws"; "failed to start writer for client #{}: {}", self.next_id, e);
                return;
            }
        };

        let greeting: Arc<str> = HotReloadMessage::connected().to_json().into();
        if !client.deliver(&greeting) {
            crate::log!("ws"; "failed to greet client #{}", client.id);
            return;
        }

        client.state = ClientState::Open;
        self.clients.push(client);
        crate::debug!("ws"; "client #{} connected (total: {})", self.next_id, self.clients.len());
    }

    /// Clients whose socket has not failed yet.
    pub fn open_clients(&self) -> usize {
        self.clients
            .iter()
            .filter(|c| c.state == ClientState::Open && c.is_alive())
            .count()
    }
}
