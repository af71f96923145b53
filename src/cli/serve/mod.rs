//! Development server with live reload support.
//!
//! One listener answers both static requests (from the current asset store
//! snapshot) and the live reload WebSocket under `/__hotserve/`.

mod content;
mod lifecycle;
mod path;
mod response;
mod route;
mod socket;

#[cfg(test)]
mod tests;

pub use route::{ResolveOptions, Resolved, resolve};

use std::sync::Arc;

use anyhow::{Context, Result};
use tiny_http::{Method, Request, Server};
use tokio::sync::mpsc;

use crate::actor::Coordinator;
use crate::actor::messages::WsMsg;
use crate::asset::AssetStore;
use crate::compiler::CompilerAdapter;
use crate::config::ServeConfig;
use crate::core::Shutdown;
use crate::log;

/// Embedded live reload client.
pub const CLIENT_PATH: &str = "/__hotserve/client.js";

/// WebSocket endpoint of the live notification channel.
pub const WS_PATH: &str = "/__hotserve/ws";

/// Request handler threads.
const REQUEST_THREADS: usize = 4;

/// What every request handler needs; cheap to share.
struct ServeContext {
    store: Arc<AssetStore>,
    ws_tx: mpsc::Sender<WsMsg>,
    shutdown: Shutdown,
    options: ResolveOptions,
    live_reload: bool,
}

/// Run the development server until Ctrl+C.
///
/// Binding happens before anything else, so a taken port fails fast. The
/// first compile starts right after; requests arriving earlier get the
/// loading page.
pub fn serve(config: ServeConfig) -> Result<()> {
    let (server, addr) = lifecycle::bind_with_retry(config.interface, config.port)?;
    let server = Arc::new(server);

    let (shutdown, shutdown_rx) = Shutdown::new();
    lifecycle::install_shutdown_handler(Arc::clone(&server), shutdown.clone())?;

    let compiler = crate::compiler::configure(&config)?;
    let adapter = CompilerAdapter::new(compiler);
    crate::debug!("serve"; "compiler: {}", adapter.name());

    let config = Arc::new(config);
    let store = Arc::new(AssetStore::new());
    let coordinator = Coordinator::new(Arc::clone(&config), Arc::clone(&store), adapter)
        .with_shutdown_signal(shutdown_rx);

    let ctx = Arc::new(ServeContext {
        store,
        ws_tx: coordinator.notifier(),
        shutdown,
        options: ResolveOptions {
            spa_fallback: config.spa_fallback,
            root_document: config.root_document.clone(),
        },
        live_reload: config.live_reload,
    });

    log!("serve"; "http://{}", addr);

    let actors = lifecycle::spawn_actors(coordinator);
    run_request_loop(&server, ctx)?;
    lifecycle::wait_for_shutdown(actors);
    Ok(())
}

fn run_request_loop(server: &Server, ctx: Arc<ServeContext>) -> Result<()> {
    // Handlers never wait on a compile, but a slow client should not hold
    // up everyone else
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(REQUEST_THREADS)
        .thread_name(|i| format!("hotserve-http-{i}"))
        .build()
        .context("failed to create request thread pool")?;

    for request in server.incoming_requests() {
        let ctx = Arc::clone(&ctx);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &ctx) {
                log!("serve"; "request error: {e:#}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, ctx: &ServeContext) -> Result<()> {
    // Early exit if shutdown requested
    if ctx.shutdown.is_requested() {
        return response::respond_unavailable(request);
    }

    if !matches!(request.method(), Method::Get | Method::Head) {
        return response::respond_method_not_allowed(request);
    }

    match path::route_of(request.url()) {
        CLIENT_PATH => return response::respond_client_js(request),
        WS_PATH => return socket::accept(request, &ctx.ws_tx),
        _ => {}
    }

    // One snapshot per request: the response never mixes generations
    let snapshot = ctx.store.snapshot();
    let generation = snapshot.generation();
    let url = request.url().to_owned();

    match resolve(&snapshot, &url, &ctx.options) {
        Resolved::Asset(asset) | Resolved::Fallback(asset) => {
            response::respond_asset(request, asset, generation, ctx.live_reload)
        }
        Resolved::NotFound(page) => {
            response::respond_not_found(request, page, generation, ctx.live_reload)
        }
        Resolved::Loading => {
            let failure = ctx.store.last_failure();
            response::respond_loading(request, failure.as_deref(), ctx.live_reload)
        }
    }
}
