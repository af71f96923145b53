use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};

use notify::event::{ModifyKind, RenameMode};
use rustc_hash::FxHashMap;

use super::filter::WatchFilter;
use crate::core::{ChangeKind, WatchBatch, WatchEvent};
use crate::utils::path::normalize_path;

pub(super) const DEFAULT_WINDOW_MS: u64 = 200;

/// How long to sleep with nothing pending. Bounds how late a watch root
/// that reappeared gets re-attached.
pub(super) const IDLE_TICK: Duration = Duration::from_secs(2);

/// Pure debouncer: filtering, timing and event deduplication.
pub(super) struct Debouncer {
    window: Duration,
    filter: WatchFilter,
    /// Path → (kind, time of last accepted raw event)
    pub(super) changes: FxHashMap<PathBuf, (ChangeKind, SystemTime)>,
    pub(super) last_event: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new(window: Duration, filter: WatchFilter) -> Self {
        Self {
            window,
            filter,
            changes: FxHashMap::default(),
            last_event: None,
        }
    }

    /// Add a notify event, applying dedup rules:
    /// - Deleted + Created/Modified → the new kind (file was restored)
    /// - Modified + Deleted → Deleted
    /// - Created + Deleted → dropped
    /// - otherwise the first event wins
    pub(super) fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;

        crate::debug!("watch"; "raw notify: {:?} {:?}", event.kind, event.paths);

        for (index, path) in event.paths.iter().enumerate() {
            let kind = match event.kind {
                EventKind::Create(_) => ChangeKind::Created,
                EventKind::Remove(_) => ChangeKind::Deleted,
                // Metadata-only changes (mtime/chmod) would loop with tools
                // that touch their inputs.
                EventKind::Modify(ModifyKind::Metadata(_)) => return,
                EventKind::Modify(ModifyKind::Name(mode)) => rename_kind(mode, index),
                EventKind::Modify(_) => ChangeKind::Modified,
                _ => return,
            };

            let path = normalize_path(path);
            if self.filter.is_ignored(&path) {
                continue;
            }

            self.merge(path, kind);
            self.last_event = Some(Instant::now());
        }
    }

    fn merge(&mut self, path: PathBuf, kind: ChangeKind) {
        let now = SystemTime::now();

        let Some(&(existing, _)) = self.changes.get(&path) else {
            crate::debug!("watch"; "event {}: {}", kind.label(), path.display());
            self.changes.insert(path, (kind, now));
            return;
        };

        let merged = match (existing, kind) {
            (ChangeKind::Deleted, ChangeKind::Created | ChangeKind::Modified) => Some(kind),
            (ChangeKind::Modified, ChangeKind::Deleted) => Some(ChangeKind::Deleted),
            (ChangeKind::Created, ChangeKind::Deleted) => None,
            _ => Some(existing),
        };

        match merged {
            Some(kind) => {
                if kind != existing {
                    crate::debug!("watch"; "{}->{}: {}", existing.label(), kind.label(), path.display());
                }
                self.changes.insert(path, (kind, now));
            }
            None => {
                crate::debug!("watch"; "discard created+deleted: {}", path.display());
                self.changes.remove(&path);
            }
        }
    }

    /// Take the batch if the window elapsed. Sorted by path.
    pub(super) fn take_if_ready(&mut self) -> Option<WatchBatch> {
        if !self.is_ready() {
            return None;
        }

        let changes = std::mem::take(&mut self.changes);
        self.last_event = None;

        let mut batch: WatchBatch = changes
            .into_iter()
            .map(|(path, (kind, timestamp))| WatchEvent {
                path,
                kind,
                timestamp,
            })
            .collect();

        if batch.is_empty() {
            return None;
        }

        batch.sort_by(|a, b| a.path.cmp(&b.path));
        Some(batch)
    }

    /// Window elapsed since the last accepted event.
    ///
    /// Also true with nothing pending, so an emptied window gets reset.
    pub(super) fn is_ready(&self) -> bool {
        self.last_event
            .is_some_and(|last| last.elapsed() >= self.window)
    }

    /// Precise sleep duration until next possible ready time.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return IDLE_TICK;
        };

        self.window
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}

/// Rename events report the old name as `From` and the new one as `To`;
/// `Both` carries `[from, to]`.
fn rename_kind(mode: RenameMode, index: usize) -> ChangeKind {
    match (mode, index) {
        (RenameMode::From, _) | (RenameMode::Both, 0) => ChangeKind::Deleted,
        (RenameMode::To, _) | (RenameMode::Both, _) => ChangeKind::Created,
        _ => ChangeKind::Modified,
    }
}
