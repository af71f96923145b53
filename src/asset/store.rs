//! Current build output with atomic replacement.
//!
//! Uses `arc-swap` for lock-free reads: request handlers load one
//! [`Snapshot`] and answer entirely from it, so a response never mixes
//! assets from two generations even while a publish is in progress.
//!
//! The store also remembers why the latest compile failed, until the next
//! publish, so pages served before any build exists can explain themselves.

use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};

use super::{Asset, Manifest};
use crate::compiler::Diagnostics;

/// A published manifest tagged with its generation.
#[derive(Debug, Default)]
pub struct Snapshot {
    generation: u64,
    manifest: Arc<Manifest>,
}

impl Snapshot {
    /// Generation of this snapshot (0 = nothing published yet).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn lookup(&self, path: &str) -> Option<&Asset> {
        self.manifest.get(path)
    }

    /// Whether any compile has been published yet.
    pub fn is_ready(&self) -> bool {
        self.generation > 0
    }
}

/// In-memory asset store.
///
/// Only the coordinator publishes; any number of threads read.
#[derive(Debug)]
pub struct AssetStore {
    current: ArcSwap<Snapshot>,
    failure: ArcSwapOption<Diagnostics>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Snapshot::default()),
            failure: ArcSwapOption::empty(),
        }
    }

    /// Atomically replace the current manifest. Returns the new generation.
    pub fn publish(&self, manifest: Manifest) -> u64 {
        let manifest = Arc::new(manifest);
        let previous = self.current.rcu(|current| Snapshot {
            generation: current.generation + 1,
            manifest: Arc::clone(&manifest),
        });
        self.failure.store(None);
        previous.generation + 1
    }

    /// Remember the diagnostics of a failed compile. Nothing is published.
    pub fn record_failure(&self, diagnostics: Diagnostics) {
        self.failure.store(Some(Arc::new(diagnostics)));
    }

    /// Diagnostics of the latest compile, if it failed.
    pub fn last_failure(&self) -> Option<Arc<Diagnostics>> {
        self.failure.load_full()
    }

    /// Look up one asset in the current manifest.
    pub fn lookup(&self, path: &str) -> Option<Asset> {
        self.current.load().lookup(path).cloned()
    }

    /// The current snapshot, for answering several lookups consistently.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    pub fn current_generation(&self) -> u64 {
        self.current.load().generation
    }
}

impl Default for AssetStore {
    fn default() -> Self {
        Self::new()
    }
}
