//! End-to-end request handling over a real socket.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread;

use tiny_http::Server;
use tokio::sync::mpsc;

use super::response::GENERATION_HEADER;
use super::*;
use crate::asset::{Asset, Manifest};

struct TestServer {
    addr: SocketAddr,
    store: Arc<AssetStore>,
    ws_rx: mpsc::Receiver<WsMsg>,
    server: Arc<Server>,
}

impl TestServer {
    fn start(live_reload: bool) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let addr = server.server_addr().to_ip().unwrap();
        let store = Arc::new(AssetStore::new());
        let (ws_tx, ws_rx) = mpsc::channel(8);
        let (shutdown, _rx) = Shutdown::new();

        let ctx = Arc::new(ServeContext {
            store: Arc::clone(&store),
            ws_tx,
            shutdown,
            options: ResolveOptions::default(),
            live_reload,
        });

        let loop_server = Arc::clone(&server);
        thread::spawn(move || run_request_loop(&loop_server, ctx));

        Self {
            addr,
            store,
            ws_rx,
            server,
        }
    }

    fn publish(&self, entries: &[(&str, &str)]) -> u64 {
        let manifest: Manifest = entries
            .iter()
            .map(|(path, content)| Asset::new(path, content.as_bytes().to_vec()))
            .collect();
        self.store.publish(manifest)
    }

    /// Send one raw request; returns status code and the full response text.
    fn request(&self, method: &str, path: &str, extra_headers: &[&str]) -> (u16, String) {
        let mut stream = TcpStream::connect(self.addr).unwrap();
        let mut raw = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n");
        for header in extra_headers {
            raw.push_str(header);
            raw.push_str("\r\n");
        }
        raw.push_str("\r\n");
        stream.write_all(raw.as_bytes()).unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        let status = response
            .split_whitespace()
            .nth(1)
            .and_then(|code| code.parse().ok())
            .unwrap();
        (status, response)
    }

    fn get(&self, path: &str) -> (u16, String) {
        self.request("GET", path, &[])
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.unblock();
    }
}

fn header_of<'a>(response: &'a str, name: &str) -> Option<&'a str> {
    response
        .lines()
        .take_while(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case(name))
        .map(|(_, value)| value.trim())
}

fn body_of(response: &str) -> &str {
    response.split_once("\r\n\r\n").map_or("", |(_, body)| body)
}

#[test]
fn test_loading_page_before_first_build() {
    let server = TestServer::start(true);
    let (status, response) = server.get("/");
    assert_eq!(status, 503);
    assert!(header_of(&response, "Content-Type").unwrap().starts_with("text/html"));
    assert!(body_of(&response).contains(CLIENT_PATH));
}

#[test]
fn test_loading_page_shows_failed_first_build() {
    let server = TestServer::start(true);
    server
        .store
        .record_failure(crate::compiler::Diagnostics::single_error("Unexpected token <"));

    let (status, response) = server.get("/app/dashboard");
    assert_eq!(status, 503);
    let body = body_of(&response);
    assert!(body.contains("Build failed"));
    assert!(body.contains("error: Unexpected token &lt;"));
    // Later errors and the eventual reload arrive over the live channel
    assert!(body.contains(&format!(r#"<script src="{CLIENT_PATH}"></script></body>"#)));

    server.publish(&[("/index.html", "<body>ok</body>")]);
    let (status, _) = server.get("/app/dashboard");
    assert_eq!(status, 200);
}

#[test]
fn test_serves_asset_with_headers() {
    let server = TestServer::start(false);
    let generation = server.publish(&[("/index.html", "<body></body>"), ("/main.js", "go()")]);

    let (status, response) = server.get("/main.js");
    assert_eq!(status, 200);
    assert_eq!(body_of(&response), "go()");
    assert!(header_of(&response, "Content-Type").unwrap().starts_with("text/javascript"));
    assert_eq!(
        header_of(&response, "Cache-Control"),
        Some("no-cache, no-store, must-revalidate")
    );
    assert_eq!(
        header_of(&response, GENERATION_HEADER),
        Some(generation.to_string().as_str())
    );
    assert_eq!(
        header_of(&response, "ETag"),
        server.store.lookup("/main.js").map(|a| a.etag()).as_deref()
    );
}

#[test]
fn test_if_none_match_is_304() {
    let server = TestServer::start(false);
    server.publish(&[("/app.css", "body{}")]);
    let etag = server.store.lookup("/app.css").unwrap().etag();

    let if_none_match = format!("If-None-Match: {etag}");
    let (status, response) = server.request("GET", "/app.css", &[&if_none_match]);
    assert_eq!(status, 304);
    assert_eq!(body_of(&response), "");
}

#[test]
fn test_head_has_no_body() {
    let server = TestServer::start(false);
    server.publish(&[("/main.js", "go()")]);

    let (status, response) = server.request("HEAD", "/main.js", &[]);
    assert_eq!(status, 200);
    assert_eq!(body_of(&response), "");
}

#[test]
fn test_missing_file_is_404_and_route_falls_back() {
    let server = TestServer::start(false);
    server.publish(&[("/index.html", "<body>shell</body>"), ("/main.js", "go()")]);

    let (status, _) = server.get("/does-not-exist.png");
    assert_eq!(status, 404);

    let (status, response) = server.get("/app/dashboard");
    assert_eq!(status, 200);
    assert_eq!(body_of(&response), "<body>shell</body>");
}

#[test]
fn test_html_gets_client_script() {
    let server = TestServer::start(true);
    server.publish(&[("/index.html", "<html><body>hi</body></html>")]);

    let (_, response) = server.get("/");
    assert!(body_of(&response).contains(&format!(r#"<script src="{CLIENT_PATH}"></script></body>"#)));

    let (status, response) = server.get(CLIENT_PATH);
    assert_eq!(status, 200);
    assert!(body_of(&response).contains(WS_PATH));
}

#[test]
fn test_other_methods_rejected() {
    let server = TestServer::start(false);
    server.publish(&[("/index.html", "x")]);
    let (status, response) = server.request("POST", "/index.html", &["Content-Length: 0"]);
    assert_eq!(status, 405);
    assert_eq!(header_of(&response, "Allow"), Some("GET, HEAD"));
}

#[test]
fn test_plain_get_on_ws_path_is_bad_request() {
    let server = TestServer::start(true);
    let (status, _) = server.get(WS_PATH);
    assert_eq!(status, 400);
}

#[test]
fn test_websocket_upgrade_registers_client() {
    let mut server = TestServer::start(true);
    let url = format!("ws://{}{WS_PATH}", server.addr);

    let (mut client, response) = tungstenite::connect(url.as_str()).unwrap();
    assert_eq!(response.status().as_u16(), 101);

    let Some(WsMsg::AddClient(mut sink)) = server.ws_rx.blocking_recv() else {
        panic!("expected a registered client");
    };
    sink.send_text("{\"type\":\"ping\",\"ts\":1}").unwrap();

    let message = client.read().unwrap();
    assert_eq!(message.into_text().unwrap().as_str(), "{\"type\":\"ping\",\"ts\":1}");
}
