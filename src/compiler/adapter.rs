//! Async wrapper around a [`Compiler`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;

use super::{CompileRequest, Compiler, Diagnostics};
use crate::asset::Manifest;

const EVENT_BUFFER: usize = 16;

/// Compile lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileEvent {
    Started { id: u64, reason: String },
    Finished { id: u64, ok: bool, elapsed: Duration },
}

/// Runs the compiler on a blocking worker so the runtime keeps serving.
///
/// Never lets a compiler failure escape: panics and worker errors come back
/// as error diagnostics.
#[derive(Clone)]
pub struct CompilerAdapter {
    compiler: Arc<dyn Compiler>,
    events: broadcast::Sender<CompileEvent>,
}

impl CompilerAdapter {
    pub fn new(compiler: Arc<dyn Compiler>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self { compiler, events }
    }

    pub fn name(&self) -> &str {
        self.compiler.name()
    }

    /// Subscribe to compile-start / compile-done events.
    ///
    /// Slow subscribers lose the oldest events rather than blocking compiles.
    pub fn subscribe(&self) -> broadcast::Receiver<CompileEvent> {
        self.events.subscribe()
    }

    pub async fn compile(&self, request: CompileRequest) -> Result<Manifest, Diagnostics> {
        let id = request.id;
        let _ = self.events.send(CompileEvent::Started {
            id,
            reason: request.reason(),
        });

        let started = Instant::now();
        let compiler = Arc::clone(&self.compiler);
        let result = match tokio::task::spawn_blocking(move || compiler.run(&request)).await {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(Diagnostics::from_panic(e.into_panic())),
            Err(e) => Err(Diagnostics::single_error(format!("compile task failed: {e}"))),
        };
        let result = result.map_err(|diags| diags.ensure_error("compile failed"));

        let _ = self.events.send(CompileEvent::Finished {
            id,
            ok: result.is_ok(),
            elapsed: started.elapsed(),
        });

        result
    }
}
