use std::path::{Path, PathBuf};

use crate::actor::fs::WatchFilter;
use crate::config::ServeConfig;

/// Roots to watch: the source root plus any extra `watch` paths.
///
/// With a build command the output root is written by every compile, so
/// nothing under it is watched.
pub(super) fn collect_watch_paths(config: &ServeConfig) -> Vec<PathBuf> {
    let mut paths = vec![config.source_root.clone()];
    for path in &config.watch {
        if !paths.contains(path) {
            paths.push(path.clone());
        }
    }

    if config.has_command() {
        drop_output_paths(&mut paths, &config.output_root);
    }

    paths
}

/// Events under the output root would retrigger the build that caused them.
pub(super) fn watch_filter(config: &ServeConfig) -> WatchFilter {
    let filter = WatchFilter::new(&config.root);
    if config.has_command() {
        filter.ignore(&config.output_root)
    } else {
        filter
    }
}

fn drop_output_paths(paths: &mut Vec<PathBuf>, output_root: &Path) {
    paths.retain(|path| {
        let inside = path.starts_with(output_root);
        if inside {
            crate::log!("watch"; "not watching `{}`: inside the output root", path.display());
        }
        !inside
    });
}
