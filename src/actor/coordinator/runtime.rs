//! The orchestrator loop: schedule compiles, publish, broadcast.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel::{Receiver, TryRecvError};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use super::pipeline::CompilePipeline;
use crate::actor::messages::WsMsg;
use crate::asset::{AssetStore, Manifest};
use crate::compiler::{CompileEvent, CompileRequest, CompilerAdapter, DiagnosticLimits, Diagnostics};
use crate::core::WatchBatch;
use crate::logger::{status_error, status_success, status_warning};
use crate::reload::classify;
use crate::reload::message::HotReloadMessage;

/// How often the shutdown channel is polled.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

type CompileResult = Result<Manifest, Diagnostics>;
type CompileTask = JoinHandle<CompileResult>;

pub(super) struct Orchestrator {
    store: Arc<AssetStore>,
    adapter: CompilerAdapter,
    ws_tx: mpsc::Sender<WsMsg>,
    pipeline: CompilePipeline,
    running: Option<CompileTask>,
    started: Instant,
    limits: DiagnosticLimits,
}

impl Orchestrator {
    pub fn new(
        store: Arc<AssetStore>,
        adapter: CompilerAdapter,
        ws_tx: mpsc::Sender<WsMsg>,
        limits: DiagnosticLimits,
    ) -> Self {
        Self {
            store,
            adapter,
            ws_tx,
            pipeline: CompilePipeline::new(),
            running: None,
            started: Instant::now(),
            limits,
        }
    }

    /// Run until shutdown is requested.
    ///
    /// Without `batches` only the initial compile runs.
    pub async fn run(
        mut self,
        mut batches: Option<mpsc::Receiver<WatchBatch>>,
        shutdown_rx: Option<Receiver<()>>,
    ) {
        let shutdown = wait_shutdown(shutdown_rx);
        tokio::pin!(shutdown);

        let initial = self.pipeline.initial();
        self.start(initial);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    crate::debug!("actor"; "shutdown signal received");
                    break;
                }
                result = wait_task(&mut self.running) => self.on_finished(result).await,
                batch = recv_batch(&mut batches) => match batch {
                    Some(batch) => {
                        if let Some(request) = self.pipeline.on_changes(batch) {
                            self.start(request);
                        }
                    }
                    None => {
                        crate::debug!("watch"; "watcher stopped");
                        batches = None;
                    }
                },
            }
        }

        abort_task(&mut self.running);
    }

    fn start(&mut self, request: CompileRequest) {
        let adapter = self.adapter.clone();
        self.started = Instant::now();
        self.running = Some(tokio::spawn(async move { adapter.compile(request).await }));
    }

    async fn on_finished(&mut self, result: CompileResult) {
        let ok = result.is_ok();
        match result {
            Ok(manifest) => self.publish(manifest).await,
            Err(diagnostics) => self.report_failure(diagnostics).await,
        }

        if let Some(request) = self.pipeline.finish(ok) {
            crate::debug!("compile"; "changes arrived during compile, rebuilding");
            self.start(request);
        }
    }

    /// Publish, then broadcast. Clients notified of generation N can
    /// already fetch it.
    async fn publish(&mut self, manifest: Manifest) {
        let previous = self.store.snapshot();
        let diff = classify::diff(previous.manifest(), &manifest);
        let assets = manifest.len();

        let generation = self.store.publish(manifest);
        status_success(&format!(
            "gen {generation} · {assets} asset{} · {}",
            if assets == 1 { "" } else { "s" },
            format_elapsed(self.started.elapsed())
        ));

        if assets == 0 {
            status_warning("build produced no assets");
        }

        self.broadcast(classify::notification(&diff, generation)).await;
    }

    /// Keep serving the last good generation; tell browsers what broke.
    ///
    /// Only the first diagnostics of each severity go out, so a bundler
    /// printing thousands of lines still yields a small message.
    async fn report_failure(&mut self, diagnostics: Diagnostics) {
        let summary = diagnostics.to_string();
        let diagnostics = diagnostics.limited(self.limits);
        let detail = diagnostics
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        status_error(&summary, &detail);

        self.store.record_failure(diagnostics.clone());
        let generation = self.store.current_generation();
        self.broadcast(HotReloadMessage::error(generation, diagnostics.into_vec()))
            .await;
    }

    async fn broadcast(&self, msg: HotReloadMessage) {
        if self.ws_tx.send(WsMsg::Broadcast(msg)).await.is_err() {
            crate::debug!("ws"; "notification channel closed");
        }
    }
}

/// Log compile start / finish events from the adapter.
pub(super) async fn log_compile_events(mut events: broadcast::Receiver<CompileEvent>) {
    loop {
        match events.recv().await {
            Ok(CompileEvent::Started { id, reason }) => {
                crate::debug!("compile"; "#{} started ({})", id, reason);
            }
            Ok(CompileEvent::Finished { id, ok, elapsed }) => {
                let outcome = if ok { "ok" } else { "failed" };
                crate::debug!("compile"; "#{} {} in {}", id, outcome, format_elapsed(elapsed));
            }
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    if elapsed.as_secs() >= 1 {
        format!("{:.2}s", elapsed.as_secs_f64())
    } else {
        format!("{}ms", elapsed.as_millis())
    }
}

/// Wait for the compile task (blocks forever if None).
///
/// The handle is only cleared once it completes, so losing a `select!`
/// race never drops a result.
async fn wait_task(task: &mut Option<CompileTask>) -> CompileResult {
    let Some(handle) = task.as_mut() else {
        return std::future::pending().await;
    };
    let result = handle.await;
    *task = None;
    result.unwrap_or_else(|e| Err(Diagnostics::single_error(format!("compile task failed: {e}"))))
}

/// Abort compile task if running. Its result is discarded.
fn abort_task(task: &mut Option<CompileTask>) {
    if let Some(t) = task.take() {
        t.abort();
        crate::debug!("compile"; "interrupted running compile");
    }
}

async fn recv_batch(batches: &mut Option<mpsc::Receiver<WatchBatch>>) -> Option<WatchBatch> {
    match batches {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Resolves once shutdown is requested (or its sender is gone).
async fn wait_shutdown(rx: Option<Receiver<()>>) {
    let Some(rx) = rx else {
        return std::future::pending().await;
    };
    loop {
        match rx.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => return,
            Err(TryRecvError::Empty) => tokio::time::sleep(SHUTDOWN_POLL).await,
        }
    }
}
