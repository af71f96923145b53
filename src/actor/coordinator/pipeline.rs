//! Compile scheduling state machine.
//!
//! At most one compile is in flight. Changes arriving meanwhile are folded
//! into a single follow-up run, however many batches there were.
//!
//! ```text
//! Idle --changes--> Compiling --ok--> Published --> Idle
//!                       |   \-err--> Failed -----> Idle
//!                       |                 \
//!                       +<-- pending changes --+
//! ```

use crate::compiler::CompileRequest;
use crate::core::{Phase, WatchBatch, WatchEvent};

pub(super) struct CompilePipeline {
    phase: Phase,
    /// Changes seen since the running compile started
    pending: Vec<WatchEvent>,
    next_id: u64,
}

impl CompilePipeline {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            pending: Vec::new(),
            next_id: 1,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// The startup build.
    pub fn initial(&mut self) -> CompileRequest {
        self.begin(Vec::new())
    }

    /// A debounced batch arrived.
    ///
    /// Returns the run to start now, or `None` if a compile is in flight
    /// (the batch is remembered for the follow-up run).
    pub fn on_changes(&mut self, batch: WatchBatch) -> Option<CompileRequest> {
        if batch.is_empty() {
            return None;
        }

        merge(&mut self.pending, batch);
        if self.phase == Phase::Compiling {
            crate::debug!("compile"; "compile running, {} change(s) pending", self.pending.len());
            return None;
        }

        let events = std::mem::take(&mut self.pending);
        Some(self.begin(events))
    }

    /// The in-flight compile finished.
    ///
    /// Returns the follow-up run if changes arrived while it was running.
    pub fn finish(&mut self, ok: bool) -> Option<CompileRequest> {
        self.transition(if ok { Phase::Published } else { Phase::Failed });
        self.transition(Phase::Idle);

        if self.pending.is_empty() {
            return None;
        }
        let events = std::mem::take(&mut self.pending);
        Some(self.begin(events))
    }

    fn begin(&mut self, events: Vec<WatchEvent>) -> CompileRequest {
        let request = CompileRequest::new(self.next_id, events);
        self.next_id += 1;
        self.transition(Phase::Compiling);
        request
    }

    fn transition(&mut self, to: Phase) {
        crate::debug!("compile"; "{} -> {}", self.phase.label(), to.label());
        self.phase = to;
    }
}

/// Fold a batch into the pending set; the latest event per path wins.
fn merge(pending: &mut Vec<WatchEvent>, batch: WatchBatch) {
    for event in batch {
        match pending.iter_mut().find(|e| e.path == event.path) {
            Some(existing) => *existing = event,
            None => pending.push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ChangeKind;

    fn batch(paths: &[&str]) -> WatchBatch {
        paths
            .iter()
            .map(|p| WatchEvent::new(*p, ChangeKind::Modified))
            .collect()
    }

    #[test]
    fn test_initial_run() {
        let mut pipeline = CompilePipeline::new();
        let request = pipeline.initial();
        assert_eq!(request.id, 1);
        assert!(request.is_initial());
        assert_eq!(pipeline.phase(), Phase::Compiling);

        assert!(pipeline.finish(true).is_none());
        assert_eq!(pipeline.phase(), Phase::Idle);
    }

    #[test]
    fn test_changes_when_idle_start_immediately() {
        let mut pipeline = CompilePipeline::new();
        pipeline.initial();
        pipeline.finish(true);

        let request = pipeline.on_changes(batch(&["/p/src/a.js"])).unwrap();
        assert_eq!(request.id, 2);
        assert_eq!(request.events.len(), 1);
    }

    #[test]
    fn test_batches_during_compile_coalesce_into_one_run() {
        let mut pipeline = CompilePipeline::new();
        pipeline.initial();

        assert!(pipeline.on_changes(batch(&["/p/src/a.js"])).is_none());
        assert!(pipeline.on_changes(batch(&["/p/src/b.css", "/p/src/a.js"])).is_none());
        assert!(pipeline.on_changes(batch(&["/p/src/c.ts"])).is_none());
        assert!(pipeline.has_pending());

        let follow_up = pipeline.finish(false).unwrap();
        assert_eq!(follow_up.id, 2);
        let paths: Vec<_> = follow_up.events.iter().map(|e| e.path.clone()).collect();
        assert_eq!(paths.len(), 3);
        assert_eq!(pipeline.phase(), Phase::Compiling);

        // Nothing arrived during the follow-up: back to idle
        assert!(pipeline.finish(true).is_none());
        assert!(!pipeline.has_pending());
    }

    #[test]
    fn test_empty_batch_ignored() {
        let mut pipeline = CompilePipeline::new();
        assert!(pipeline.on_changes(Vec::new()).is_none());
        assert_eq!(pipeline.phase(), Phase::Idle);
    }

    #[test]
    fn test_latest_event_per_path_wins() {
        let mut pending = Vec::new();
        merge(&mut pending, vec![WatchEvent::new("/p/a.js", ChangeKind::Created)]);
        merge(&mut pending, vec![WatchEvent::new("/p/a.js", ChangeKind::Deleted)]);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].kind, ChangeKind::Deleted);
    }
}
