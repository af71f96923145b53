//! Compiler boundary.
//!
//! The bundler is a black box behind the [`Compiler`] trait: given the
//! project it either produces a [`Manifest`] or [`Diagnostics`]. The
//! [`CompilerAdapter`] runs it off the async runtime and reports progress.
//!
//! - `adapter` - async wrapper with compile-start / compile-done events
//! - `command` - runs an external build command, reads its output root
//! - `snapshot` - serves the source root as-is (no build step)
//! - `diagnostics` - error/warning values and output parsing

mod adapter;
mod command;
mod diagnostics;
mod snapshot;

use std::sync::Arc;

use anyhow::Result;

pub use adapter::{CompileEvent, CompilerAdapter};
pub use command::CommandCompiler;
pub use diagnostics::{Diagnostic, DiagnosticLimits, Diagnostics, Severity};
pub use snapshot::SnapshotCompiler;

use crate::asset::Manifest;
use crate::config::ServeConfig;
use crate::core::WatchEvent;

/// An external compiler.
///
/// `run` may block for a long time; callers go through [`CompilerAdapter`].
/// Implementations must not touch the asset store.
pub trait Compiler: Send + Sync + 'static {
    /// Short name for log output.
    fn name(&self) -> &str;

    /// Build the project once.
    fn run(&self, request: &CompileRequest) -> Result<Manifest, Diagnostics>;
}

/// One compile run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    /// Monotonic run id, starting at 1
    pub id: u64,
    /// Changes coalesced since the previous run (empty for the initial build)
    pub events: Vec<WatchEvent>,
}

impl CompileRequest {
    pub fn new(id: u64, events: Vec<WatchEvent>) -> Self {
        Self { id, events }
    }

    pub fn is_initial(&self) -> bool {
        self.events.is_empty()
    }

    /// Human-readable trigger description.
    pub fn reason(&self) -> String {
        match self.events.as_slice() {
            [] => "initial build".to_string(),
            [event] => {
                let name = event
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| event.path.display().to_string());
                format!("{name} {}", event.kind.label())
            }
            events => format!("{} changes", events.len()),
        }
    }
}

/// Pick the compiler for a configuration.
///
/// A configured build command wins; without one the source root is served
/// as-is.
pub fn configure(config: &ServeConfig) -> Result<Arc<dyn Compiler>> {
    if config.command.is_empty() {
        return Ok(Arc::new(SnapshotCompiler::new(config.source_root.clone())));
    }

    let compiler = CommandCompiler::new(&config.command, &config.root, &config.output_root)?;
    Ok(Arc::new(compiler))
}
