//! Pass-through compiler: the manifest is the source root itself.

use std::path::PathBuf;

use super::{CompileRequest, Compiler, Diagnostics};
use crate::asset::{Manifest, scan_dir};

/// Serves a directory of already-built files.
pub struct SnapshotCompiler {
    source_root: PathBuf,
}

impl SnapshotCompiler {
    pub fn new(source_root: PathBuf) -> Self {
        Self { source_root }
    }
}

impl Compiler for SnapshotCompiler {
    fn name(&self) -> &str {
        "snapshot"
    }

    fn run(&self, _request: &CompileRequest) -> Result<Manifest, Diagnostics> {
        scan_dir(&self.source_root).map_err(|e| Diagnostics::single_error(format!("{e}")))
    }
}
