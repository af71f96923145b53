//! Server state tracking for serve mode.
//!
//! - [`Phase`]: where the compile pipeline currently is
//! - [`Shutdown`]: shutdown request shared by the Ctrl+C handler, the HTTP
//!   loop and the actor runtime

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::channel::{self, Receiver, Sender};

/// Compile pipeline phase.
///
/// ```text
/// Idle -> Compiling -> Published -> Idle
///                   \-> Failed ---/
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Compiling,
    Published,
    Failed,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Compiling => "compiling",
            Self::Published => "published",
            Self::Failed => "failed",
        }
    }
}

/// Shutdown request handle.
///
/// Cloned into every party that needs to observe or trigger shutdown. The
/// flag is checked by request handlers; the channel wakes the actor runtime.
#[derive(Debug, Clone)]
pub struct Shutdown {
    requested: Arc<AtomicBool>,
    tx: Sender<()>,
}

impl Shutdown {
    /// Create a handle plus the receiver the actor runtime waits on.
    pub fn new() -> (Self, Receiver<()>) {
        let (tx, rx) = channel::bounded(1);
        let handle = Self {
            requested: Arc::new(AtomicBool::new(false)),
            tx,
        };
        (handle, rx)
    }

    /// Request shutdown. Idempotent.
    pub fn trigger(&self) {
        if !self.requested.swap(true, Ordering::SeqCst) {
            let _ = self.tx.try_send(());
        }
    }

    /// Check if shutdown has been requested
    ///
    /// Uses Relaxed ordering for performance - worst case is serving
    /// a few more requests before stopping
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_is_idempotent() {
        let (shutdown, rx) = Shutdown::new();
        assert!(!shutdown.is_requested());

        shutdown.trigger();
        shutdown.clone().trigger();

        assert!(shutdown.is_requested());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_phase_labels() {
        assert_eq!(Phase::Compiling.label(), "compiling");
        assert_eq!(Phase::Failed.label(), "failed");
    }
}
