//! Actor Message Definitions
//!
//! ```text
//! FsActor --WatchBatch--> Coordinator --Broadcast--> WsActor
//!                                          ^
//! HTTP server ----------AddClient----------+
//! ```

use std::fmt;

use super::ws::ClientSink;
use crate::reload::message::HotReloadMessage;

/// Messages to WebSocket Actor
pub enum WsMsg {
    /// Send to every open client
    Broadcast(HotReloadMessage),
    /// Register a connection that finished the upgrade handshake
    AddClient(Box<dyn ClientSink>),
    /// Close all connections and stop
    Shutdown,
}

impl fmt::Debug for WsMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Broadcast(msg) => f.debug_tuple("Broadcast").field(msg).finish(),
            Self::AddClient(_) => f.write_str("AddClient"),
            Self::Shutdown => f.write_str("Shutdown"),
        }
    }
}
