//! Compile Result Classification
//!
//! Pure functions deciding what browsers should do after a successful
//! compile. No actor machinery, no side effects.

use crate::asset::{AssetKind, Manifest};

use super::message::HotReloadMessage;

/// Output paths that differ between two manifests.
///
/// Each list is sorted (manifests iterate in path order).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ManifestDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<String>,
}

impl ManifestDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// All affected paths in path order.
    pub fn affected(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .added
            .iter()
            .chain(&self.removed)
            .chain(&self.changed)
            .cloned()
            .collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len()
    }
}

/// Compare two manifests by content hash.
pub fn diff(old: &Manifest, new: &Manifest) -> ManifestDiff {
    let mut result = ManifestDiff::default();

    for asset in new.iter() {
        match old.get(asset.path()) {
            None => result.added.push(asset.path().to_string()),
            Some(previous) if previous.hash() != asset.hash() => {
                result.changed.push(asset.path().to_string())
            }
            Some(_) => {}
        }
    }

    result.removed = old
        .paths()
        .filter(|path| !new.contains(path))
        .map(str::to_string)
        .collect();

    result
}

/// What browsers should do with a new generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadAction {
    /// Patch stylesheets in place
    Update,
    /// Full page reload
    Reload,
}

impl ReloadAction {
    /// Stylesheet-only edits hot-swap; any other change reloads.
    ///
    /// Added or removed assets always reload, since pages may reference them
    /// in ways a stylesheet swap cannot follow.
    pub fn for_diff(diff: &ManifestDiff) -> Self {
        if !diff.added.is_empty() || !diff.removed.is_empty() {
            return Self::Reload;
        }

        let all_stylesheets = diff
            .changed
            .iter()
            .all(|path| AssetKind::from_url_path(path).is_hot_swappable());

        if all_stylesheets {
            Self::Update
        } else {
            Self::Reload
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Reload => "reload",
        }
    }
}

/// Build the broadcast for a published generation.
pub fn notification(diff: &ManifestDiff, generation: u64) -> HotReloadMessage {
    let affected = diff.affected();
    match ReloadAction::for_diff(diff) {
        ReloadAction::Update => HotReloadMessage::update(generation, affected),
        ReloadAction::Reload => HotReloadMessage::reload(generation, affected),
    }
}
