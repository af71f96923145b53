//! Reload Module
//!
//! Decides and encodes what connected browsers are told after each compile.
//!
//! # Modules
//!
//! - `classify` - Manifest diffing and update-vs-reload decision
//! - `message` - Wire messages (connected, reload, update, error, ping)

pub mod classify;
pub mod message;
