//! WebSocket Actor - Live Notification Channel
//!
//! This actor is responsible for:
//! - Holding the connections upgraded by the HTTP server
//! - Broadcasting reload / update / error messages to all of them
//! - Heartbeat pings, which is how dead connections get noticed
//!
//! Clients never send anything the server acts on, so connections are
//! write-only here. Each connection gets a writer thread fed by a bounded
//! queue; the actor itself never touches a socket. A failed write, or a
//! full queue, prunes the connection.
//!
//! # Architecture
//!
//! ```text
//! Coordinator --[Broadcast]--> WsActor --[queue]--> writer --> Client
//!                                 ^        [queue]--> writer --> Client
//! HTTP server --[AddClient]-------+
//! ```

mod client;
mod delivery;

#[cfg(test)]
mod tests;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use super::messages::WsMsg;
use crate::reload::message::HotReloadMessage;
use client::RegisteredClient;

pub use client::{ClientSink, TransportError};
pub use delivery::Delivery;

/// Keep-alive interval
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// WebSocket Actor - manages client connections and broadcasts
pub struct WsActor {
    /// Channel to receive messages
    rx: mpsc::Receiver<WsMsg>,
    /// Connected clients, in connection order
    clients: Vec<RegisteredClient>,
    next_id: u64,
    heartbeat: Duration,
}

impl WsActor {
    pub fn new(rx: mpsc::Receiver<WsMsg>) -> Self {
        Self {
            rx,
            clients: Vec::new(),
            next_id: 0,
            heartbeat: HEARTBEAT_INTERVAL,
        }
    }

    /// Override the heartbeat interval.
    pub fn with_heartbeat(mut self, interval: Duration) -> Self {
        self.heartbeat = interval;
        self
    }

    /// Run the actor event loop
    ///
    /// Stops on [`WsMsg::Shutdown`] or when every sender is gone; either way
    /// all connections get a close frame.
    pub async fn run(mut self) {
        let mut heartbeat = tokio::time::interval_at(Instant::now() + self.heartbeat, self.heartbeat);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                msg = self.rx.recv() => match msg {
                    Some(WsMsg::Broadcast(msg)) => {
                        self.broadcast(&msg);
                    }
                    Some(WsMsg::AddClient(sink)) => self.add_client(sink),
                    Some(WsMsg::Shutdown) | None => break,
                },
                _ = heartbeat.tick() => {
                    if !self.clients.is_empty() {
                        self.broadcast(&HotReloadMessage::ping());
                    }
                }
            }
        }

        crate::debug!("ws"; "shutting down ({} client(s))", self.clients.len());
        self.close_all();
    }
}
