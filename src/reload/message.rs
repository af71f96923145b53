//! Live Reload Message Protocol
//!
//! JSON messages pushed from the server to browser clients over WebSocket.
//!
//! # Message Types
//!
//! - `connected`: sent once when a client's connection opens
//! - `reload`: full page reload
//! - `update`: stylesheets changed (or nothing changed), patch in place
//! - `error`: compile failed, show overlay and keep the running page
//! - `ping`: keep-alive, used to detect dead connections

use serde::{Deserialize, Serialize};

use crate::compiler::Diagnostic;

/// Message sent over WebSocket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HotReloadMessage {
    /// Connection established
    Connected {
        /// Server version for compatibility check
        version: String,
    },

    /// Full page reload
    Reload {
        generation: u64,
        #[serde(rename = "affectedPaths")]
        affected_paths: Vec<String>,
    },

    /// In-place stylesheet update; also clears an error overlay
    Update {
        generation: u64,
        #[serde(rename = "affectedPaths")]
        affected_paths: Vec<String>,
    },

    /// Compile failed. `generation` is the still-served generation.
    Error {
        generation: u64,
        diagnostics: Vec<Diagnostic>,
    },

    /// Keep-alive ping
    Ping {
        /// Unix milliseconds
        ts: u64,
    },
}

impl HotReloadMessage {
    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn reload(generation: u64, affected_paths: Vec<String>) -> Self {
        Self::Reload {
            generation,
            affected_paths,
        }
    }

    pub fn update(generation: u64, affected_paths: Vec<String>) -> Self {
        Self::Update {
            generation,
            affected_paths,
        }
    }

    pub fn error(generation: u64, diagnostics: Vec<Diagnostic>) -> Self {
        Self::Error {
            generation,
            diagnostics,
        }
    }

    pub fn ping() -> Self {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self::Ping { ts }
    }

    /// Message type tag, for log output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Reload { .. } => "reload",
            Self::Update { .. } => "update",
            Self::Error { .. } => "error",
            Self::Ping { .. } => "ping",
        }
    }

    /// Generation the message refers to, if any.
    pub fn generation(&self) -> Option<u64> {
        match self {
            Self::Reload { generation, .. }
            | Self::Update { generation, .. }
            | Self::Error { generation, .. } => Some(*generation),
            Self::Connected { .. } | Self::Ping { .. } => None,
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload","generation":0,"affectedPaths":[]}"#.to_string())
    }

    /// Parse from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
