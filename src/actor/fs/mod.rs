//! FileSystem Actor
//!
//! Watches the source roots and sends debounced [`WatchBatch`]es to the
//! coordinator. Implements the "Watcher-First" pattern: the watcher is live
//! before the initial compile starts, so no edit made during startup is lost.
//!
//! Architecture:
//! ```text
//! notify → bridge thread → Debouncer (filter + dedup + timing) → WatchBatch
//! ```

use std::path::PathBuf;
use std::time::Duration;

use notify::RecommendedWatcher;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::core::WatchBatch;

// Pure filtering, timing and deduplication.
mod debouncer;
// Paths that never trigger a rebuild.
mod filter;
// Watch root attach/re-attach lifecycle.
mod watch_roots;

#[cfg(test)]
mod tests;

use debouncer::Debouncer;
pub use filter::WatchFilter;
use watch_roots::WatchRoots;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to start file watcher")]
    Init(#[source] notify::Error),

    #[error("failed to watch `{}`", .0.display())]
    Attach(PathBuf, #[source] notify::Error),
}

/// FileSystem Actor - watches for file changes
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    watcher: RecommendedWatcher,
    /// Watch-root consistency layer (attach/re-attach root directories)
    watch_roots: WatchRoots,
    /// Debounced batches out
    batch_tx: mpsc::Sender<WatchBatch>,
    debouncer: Debouncer,
}

impl FsActor {
    /// Create a new FsActor with Watcher-First pattern
    ///
    /// Roots that are missing now are attached once they appear. A root
    /// that fails to attach is logged and skipped; only a watcher that
    /// cannot be created at all is an error.
    pub fn new(
        paths: Vec<PathBuf>,
        filter: WatchFilter,
        window: Duration,
        batch_tx: mpsc::Sender<WatchBatch>,
    ) -> Result<Self, WatchError> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })
        .map_err(WatchError::Init)?;

        let mut watch_roots = WatchRoots::new(paths);
        let attached = watch_roots.attach_existing(&mut watcher);
        crate::debug!("watch"; "watching {} root(s)", attached);

        Ok(Self {
            notify_rx,
            watcher,
            watch_roots,
            batch_tx,
            debouncer: Debouncer::new(window, filter),
        })
    }

    /// Run the actor event loop
    ///
    /// Returns once the batch receiver is dropped.
    pub async fn run(self) {
        let notify_rx = self.notify_rx;
        let batch_tx = self.batch_tx;
        let mut debouncer = self.debouncer;
        let mut watcher = self.watcher;
        let mut watch_roots = self.watch_roots;

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        // notify delivers on its own thread through a std channel; forward
        // into the runtime. Ends when the watcher (and its sender) is dropped.
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                Some(event) = async_rx.recv() => debouncer.add_event(&event),
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    watch_roots.maintain(&mut watcher);
                    let Some(batch) = debouncer.take_if_ready() else {
                        continue;
                    };
                    crate::debug!("watch"; "batch of {} change(s)", batch.len());
                    if batch_tx.send(batch).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
}
