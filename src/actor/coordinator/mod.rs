//! Actor Coordinator - Wires up the Hot Reload Actor System
//!
//! The Coordinator is a thin orchestrator that:
//! - Creates communication channels
//! - Starts the watcher and the WebSocket actor
//! - Runs the compile loop until shutdown, then stops everything

mod pipeline;
mod runtime;
mod watch_paths;


use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::fs::FsActor;
use super::messages::WsMsg;
use super::ws::WsActor;
use crate::asset::AssetStore;
use crate::compiler::CompilerAdapter;
use crate::config::ServeConfig;
use crate::core::WatchBatch;
use runtime::Orchestrator;

const CHANNEL_BUFFER: usize = 32;

/// Grace period for the WebSocket actor to send close frames.
const WS_CLOSE_TIMEOUT: Duration = Duration::from_millis(500);

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    config: Arc<ServeConfig>,
    store: Arc<AssetStore>,
    adapter: CompilerAdapter,
    ws_tx: mpsc::Sender<WsMsg>,
    ws_rx: mpsc::Receiver<WsMsg>,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    pub fn new(config: Arc<ServeConfig>, store: Arc<AssetStore>, adapter: CompilerAdapter) -> Self {
        let (ws_tx, ws_rx) = mpsc::channel(CHANNEL_BUFFER);
        Self {
            config,
            store,
            adapter,
            ws_tx,
            ws_rx,
            shutdown_rx: None,
        }
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Sender for the WebSocket actor; the HTTP server registers upgraded
    /// connections through it.
    pub fn notifier(&self) -> mpsc::Sender<WsMsg> {
        self.ws_tx.clone()
    }

    /// Run the actor system.
    ///
    /// The watcher starts before the initial compile. If it cannot start,
    /// the last build keeps being served without rebuilds.
    pub async fn run(self) {
        let (batch_tx, batch_rx) = mpsc::channel::<WatchBatch>(CHANNEL_BUFFER);

        let paths = watch_paths::collect_watch_paths(&self.config);
        let filter = watch_paths::watch_filter(&self.config);
        let batches = match FsActor::new(paths, filter, self.config.debounce(), batch_tx) {
            Ok(fs) => {
                tokio::spawn(fs.run());
                Some(batch_rx)
            }
            Err(e) => {
                crate::log!("watch"; "{:#}; changes will not trigger rebuilds", anyhow::Error::from(e));
                None
            }
        };

        self.run_with_batches(batches).await;
    }

    /// Run with an externally provided change stream.
    async fn run_with_batches(self, batches: Option<mpsc::Receiver<WatchBatch>>) {
        let ws_handle = tokio::spawn(WsActor::new(self.ws_rx).run());
        tokio::spawn(runtime::log_compile_events(self.adapter.subscribe()));

        crate::debug!("actor"; "start");
        let limits = self.config.diagnostic_limits();
        Orchestrator::new(self.store, self.adapter, self.ws_tx.clone(), limits)
            .run(batches, self.shutdown_rx)
            .await;

        let _ = self.ws_tx.send(WsMsg::Shutdown).await;
        let _ = tokio::time::timeout(WS_CLOSE_TIMEOUT, ws_handle).await;
        crate::debug!("actor"; "stopped");
    }
}
