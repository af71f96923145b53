//! Build a manifest from files on disk.

use std::path::{Path, PathBuf};

use jwalk::WalkDir;
use thiserror::Error;

use super::{Asset, Manifest};
use crate::utils::path::{is_editor_artifact, to_url_path};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("output directory `{}` does not exist", .0.display())]
    MissingRoot(PathBuf),

    #[error("failed to read `{}`", .0.display())]
    Read(PathBuf, #[source] std::io::Error),

    #[error("failed to list `{}`: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: jwalk::Error,
    },
}

impl ScanError {
    fn walk(root: &Path, source: jwalk::Error) -> Self {
        let path = source.path().unwrap_or(root).to_path_buf();
        Self::Walk { path, source }
    }
}

/// Read every file under `root` into a manifest.
///
/// Editor artifacts and dot-files are skipped, as are files inside
/// dot-directories (`.git`, `.cache`). Output paths are relative to `root`.
/// A directory that cannot be listed fails the scan rather than vanishing
/// from the manifest.
pub fn scan_dir(root: &Path) -> Result<Manifest, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::MissingRoot(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).skip_hidden(true) {
        let mut entry = entry.map_err(|e| ScanError::walk(root, e))?;
        if let Some(e) = entry.read_children_error.take() {
            return Err(ScanError::walk(root, e));
        }

        let path = entry.path();
        if entry.file_type().is_file() && !is_editor_artifact(&path) {
            files.push(path);
        }
    }
    files.sort();

    let mut manifest = Manifest::new();
    for path in files {
        let content = std::fs::read(&path).map_err(|e| ScanError::Read(path.clone(), e))?;
        let relative = path.strip_prefix(root).unwrap_or(&path);
        manifest.insert(Asset::new(to_url_path(relative), content));
    }

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_dir() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("assets")).unwrap();
        fs::create_dir_all(root.join(".cache")).unwrap();
        fs::write(root.join("index.html"), "<html></html>").unwrap();
        fs::write(root.join("assets/app.css"), "body{}").unwrap();
        fs::write(root.join("assets/.app.css.swp"), "junk").unwrap();
        fs::write(root.join(".cache/state"), "junk").unwrap();

        let manifest = scan_dir(root).unwrap();
        let paths: Vec<_> = manifest.paths().collect();
        assert_eq!(paths, ["/assets/app.css", "/index.html"]);
        assert_eq!(manifest.get("/index.html").unwrap().content(), b"<html></html>");
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_unreadable_dir_is_error() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let locked = temp.path().join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("app.js"), "x").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not bind a privileged user
        let readable = fs::read_dir(&locked).is_ok();
        let result = scan_dir(temp.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        if readable {
            return;
        }

        assert!(matches!(result, Err(ScanError::Walk { .. })));
    }

    #[test]
    fn test_scan_missing_root() {
        let temp = TempDir::new().unwrap();
        let err = scan_dir(&temp.path().join("dist")).unwrap_err();
        assert!(matches!(err, ScanError::MissingRoot(_)));
    }
}
