//! Core types - pure abstractions shared across the codebase.

mod event;
mod state;

pub use event::{ChangeKind, WatchBatch, WatchEvent};
pub use state::{Phase, Shutdown};
