//! Actor System for Hot Reload
//!
//! Message-passing concurrency for serve mode:
//!
//! ```text
//! FsActor --> Coordinator --> WsActor
//! (watch)     (compile,       (broadcast)
//!              publish)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - File system watcher with debouncing
//! - `ws` - WebSocket broadcast
//! - `coordinator` - Wires up and runs actors, schedules compiles

pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod ws;

pub use coordinator::Coordinator;
