use std::sync::Arc;

use super::WsActor;
use super::client::ClientState;
use crate::reload::message::HotReloadMessage;

/// Outcome of one fan-out.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub queued: usize,
    pub pruned: usize,
}

impl WsActor {
    /// Broadcast a message to all open clients.
    ///
    /// Never waits on a socket. A client whose socket failed, or that is too
    /// far behind, is dropped; the others still receive the message.
    pub(super) fn broadcast(&mut self, msg: &HotReloadMessage) -> Delivery {
        if self.clients.is_empty() {
            crate::debug!("ws"; "no clients connected");
            return Delivery::default();
        }

        let json: Arc<str> = msg.to_json().into();
        let mut delivery = Delivery::default();

        self.clients.retain_mut(|client| {
            if client.state == ClientState::Open && client.deliver(&json) {
                delivery.queued += 1;
                return true;
            }
            delivery.pruned += 1;
            false
        });

        crate::debug!("ws"; "{} to {} client(s), {} pruned", msg.kind(), delivery.queued, delivery.pruned);
        delivery
    }

    /// Send a close frame to every client and forget them.
    pub(super) fn close_all(&mut self) {
        for mut client in self.clients.drain(..) {
            client.close();
        }
    }
}
