use std::path::{Component, Path, PathBuf};

use crate::utils::path::is_editor_artifact;

/// Directories whose contents never trigger a rebuild.
const IGNORED_DIRS: &[&str] = &[".git", "node_modules", "target"];

/// Decides which changed paths the watcher drops.
#[derive(Debug, Clone, Default)]
pub struct WatchFilter {
    /// Prefix stripped before matching [`IGNORED_DIRS`] components
    project_root: PathBuf,
    /// Whole subtrees to ignore (the output root)
    ignored_roots: Vec<PathBuf>,
}

impl WatchFilter {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ignored_roots: Vec::new(),
        }
    }

    /// Ignore everything under `root`.
    pub fn ignore(mut self, root: impl Into<PathBuf>) -> Self {
        self.ignored_roots.push(root.into());
        self
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        if self.ignored_roots.iter().any(|root| path.starts_with(root)) {
            return true;
        }

        let relative = path.strip_prefix(&self.project_root).unwrap_or(path);
        let in_ignored_dir = relative.components().any(|c| match c {
            Component::Normal(name) => IGNORED_DIRS.iter().any(|dir| name == *dir),
            _ => false,
        });

        in_ignored_dir || is_editor_artifact(path)
    }
}
