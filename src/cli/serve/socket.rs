//! WebSocket upgrade for the live notification channel.
//!
//! The upgrade happens on the HTTP listener itself; the finished socket is
//! handed to the WebSocket actor, which owns it from then on.

use anyhow::{Result, anyhow};
use tiny_http::{Method, Request, Response, StatusCode};
use tokio::sync::mpsc;
use tungstenite::WebSocket;
use tungstenite::handshake::derive_accept_key;
use tungstenite::protocol::Role;

use super::response::{self, header, header_value};
use crate::actor::messages::WsMsg;
use crate::actor::ws::TransportError;

/// Complete the handshake and register the connection.
pub fn accept(request: Request, ws_tx: &mpsc::Sender<WsMsg>) -> Result<()> {
    let key = match handshake_key(&request) {
        Ok(key) => key,
        Err(e) => {
            crate::debug!("ws"; "{}", e);
            return response::respond_bad_request(request, &e.to_string());
        }
    };

    // tiny_http adds `Upgrade` and `Connection` itself
    let response = Response::empty(StatusCode(101))
        .with_header(header("Sec-WebSocket-Accept", &derive_accept_key(key.as_bytes()))?);
    let stream = request.upgrade("websocket", response);
    let socket = WebSocket::from_raw_socket(stream, Role::Server, None);

    ws_tx
        .blocking_send(WsMsg::AddClient(Box::new(socket)))
        .map_err(|_| anyhow!("notification channel closed"))
}

/// Validate the upgrade request and return its `Sec-WebSocket-Key`.
fn handshake_key(request: &Request) -> Result<String, TransportError> {
    if request.method() != &Method::Get {
        return Err(TransportError::Handshake("upgrade must use GET".into()));
    }

    let is_websocket = header_value(request, "Upgrade")
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("websocket"));
    if !is_websocket {
        return Err(TransportError::Handshake(
            "missing `Upgrade: websocket` header".into(),
        ));
    }

    header_value(request, "Sec-WebSocket-Key")
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| TransportError::Handshake("missing `Sec-WebSocket-Key` header".into()))
}
