use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;

use super::debouncer::{DEFAULT_WINDOW_MS, Debouncer, IDLE_TICK};
use super::watch_roots::WatchRoots;
use super::{FsActor, WatchFilter};
use crate::core::ChangeKind;
use crate::utils::path::normalize_path;

/// Root that does not exist, so `normalize_path` leaves test paths alone.
const ROOT: &str = "/hotserve-fs-test";

fn make_debouncer() -> Debouncer {
    Debouncer::new(
        Duration::from_millis(DEFAULT_WINDOW_MS),
        WatchFilter::new(ROOT).ignore(format!("{ROOT}/dist")),
    )
}

fn path(name: &str) -> PathBuf {
    Path::new(ROOT).join(name)
}

fn make_event(names: Vec<&str>, kind: notify::EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths: names.into_iter().map(path).collect(),
        attrs: Default::default(),
    }
}

fn modify_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Data(
        notify::event::DataChange::Any,
    ))
}

fn create_kind() -> notify::EventKind {
    notify::EventKind::Create(notify::event::CreateKind::File)
}

fn remove_kind() -> notify::EventKind {
    notify::EventKind::Remove(notify::event::RemoveKind::File)
}

fn kind_of(debouncer: &Debouncer, name: &str) -> ChangeKind {
    debouncer.changes[&path(name)].0
}

#[test]
fn test_debouncer_empty() {
    let debouncer = make_debouncer();
    assert!(!debouncer.is_ready());
    assert_eq!(debouncer.sleep_duration(), IDLE_TICK);
}

#[test]
fn test_event_routing_by_kind() {
    let mut debouncer = make_debouncer();

    debouncer.add_event(&make_event(vec!["src/a.js"], create_kind()));
    debouncer.add_event(&make_event(vec!["src/b.js"], modify_kind()));
    debouncer.add_event(&make_event(vec!["src/c.js"], remove_kind()));

    assert_eq!(debouncer.changes.len(), 3);
    assert_eq!(kind_of(&debouncer, "src/a.js"), ChangeKind::Created);
    assert_eq!(kind_of(&debouncer, "src/b.js"), ChangeKind::Modified);
    assert_eq!(kind_of(&debouncer, "src/c.js"), ChangeKind::Deleted);
}

#[test]
fn test_filtered_paths_ignored() {
    let mut debouncer = make_debouncer();

    debouncer.add_event(&make_event(vec!["src/.app.js.swp"], modify_kind()));
    debouncer.add_event(&make_event(vec!["dist/main.js"], modify_kind()));
    debouncer.add_event(&make_event(vec!["node_modules/x/index.js"], modify_kind()));

    assert!(debouncer.changes.is_empty());
    assert!(debouncer.last_event.is_none());
}

#[test]
fn test_metadata_changes_ignored() {
    let mut debouncer = make_debouncer();
    let kind = notify::EventKind::Modify(notify::event::ModifyKind::Metadata(
        notify::event::MetadataKind::WriteTime,
    ));
    debouncer.add_event(&make_event(vec!["src/a.js"], kind));
    assert!(debouncer.changes.is_empty());
}

#[test]
fn test_rename_maps_to_delete_and_create() {
    let mut debouncer = make_debouncer();
    let kind = notify::EventKind::Modify(notify::event::ModifyKind::Name(
        notify::event::RenameMode::Both,
    ));
    debouncer.add_event(&make_event(vec!["src/old.js", "src/new.js"], kind));

    assert_eq!(kind_of(&debouncer, "src/old.js"), ChangeKind::Deleted);
    assert_eq!(kind_of(&debouncer, "src/new.js"), ChangeKind::Created);
}

#[test]
fn test_dedup_first_event_wins() {
    let mut debouncer = make_debouncer();

    debouncer.add_event(&make_event(vec!["src/a.js"], create_kind()));
    debouncer.add_event(&make_event(vec!["src/a.js"], modify_kind()));

    assert_eq!(debouncer.changes.len(), 1);
    assert_eq!(kind_of(&debouncer, "src/a.js"), ChangeKind::Created);
}

#[test]
fn test_delete_then_create_restores() {
    let mut debouncer = make_debouncer();

    debouncer.add_event(&make_event(vec!["src/a.js"], remove_kind()));
    debouncer.add_event(&make_event(vec!["src/a.js"], create_kind()));

    assert_eq!(debouncer.changes.len(), 1);
    assert_eq!(kind_of(&debouncer, "src/a.js"), ChangeKind::Created);
}

#[test]
fn test_create_then_delete_discards() {
    let mut debouncer = make_debouncer();

    debouncer.add_event(&make_event(vec!["src/a.js"], create_kind()));
    debouncer.add_event(&make_event(vec!["src/a.js"], remove_kind()));
    assert!(debouncer.changes.is_empty(), "created+deleted should discard");
}

#[test]
fn test_modify_then_delete_upgrades() {
    let mut debouncer = make_debouncer();

    debouncer.add_event(&make_event(vec!["src/a.js"], modify_kind()));
    debouncer.add_event(&make_event(vec!["src/a.js"], remove_kind()));
    assert_eq!(kind_of(&debouncer, "src/a.js"), ChangeKind::Deleted);
}

#[test]
fn test_sleep_duration_after_event() {
    let mut debouncer = make_debouncer();
    debouncer.last_event = Some(std::time::Instant::now());

    let dur = debouncer.sleep_duration();
    assert!(dur >= Duration::from_millis(DEFAULT_WINDOW_MS - 10));
    assert!(dur <= Duration::from_millis(DEFAULT_WINDOW_MS));
}

#[test]
fn test_take_if_ready_waits_for_window() {
    let mut debouncer = Debouncer::new(Duration::from_millis(30), WatchFilter::new(ROOT));

    debouncer.add_event(&make_event(vec!["src/b.js", "src/a.js"], modify_kind()));
    assert!(debouncer.take_if_ready().is_none());

    std::thread::sleep(Duration::from_millis(40));
    let batch = debouncer.take_if_ready().unwrap();
    let paths: Vec<_> = batch.iter().map(|e| e.path.clone()).collect();
    assert_eq!(paths, [path("src/a.js"), path("src/b.js")]);
    assert!(debouncer.last_event.is_none());
    assert!(debouncer.take_if_ready().is_none());
}

#[test]
fn test_window_resets_on_new_event() {
    let mut debouncer = Debouncer::new(Duration::from_millis(50), WatchFilter::new(ROOT));

    debouncer.add_event(&make_event(vec!["src/a.js"], modify_kind()));
    std::thread::sleep(Duration::from_millis(30));
    debouncer.add_event(&make_event(vec!["src/b.js"], modify_kind()));
    std::thread::sleep(Duration::from_millis(30));

    // 60ms since the first event, 30ms since the last
    assert!(debouncer.take_if_ready().is_none());
}

#[test]
fn test_watch_roots_attach_late() {
    let temp = TempDir::new().unwrap();
    let root = normalize_path(temp.path());
    let src = root.join("src");

    let mut watcher = notify::recommended_watcher(|_: notify::Result<notify::Event>| {}).unwrap();
    let mut roots = WatchRoots::new(vec![src.clone()]);
    assert_eq!(roots.attach_existing(&mut watcher), 0);

    std::fs::create_dir_all(&src).unwrap();
    roots.maintain(&mut watcher);
    assert!(roots.is_attached(&src));

    std::fs::remove_dir_all(&src).unwrap();
    roots.maintain(&mut watcher);
    assert!(!roots.is_attached(&src));
}

#[tokio::test]
async fn test_actor_emits_batch_for_real_change() {
    let temp = TempDir::new().unwrap();
    let root = normalize_path(temp.path());
    let src = root.join("src");
    std::fs::create_dir_all(&src).unwrap();

    let (tx, mut rx) = mpsc::channel(8);
    let actor = FsActor::new(
        vec![src.clone()],
        WatchFilter::new(&root).ignore(root.join("dist")),
        Duration::from_millis(50),
        tx,
    )
    .unwrap();
    let handle = tokio::spawn(actor.run());

    std::fs::write(src.join("app.css"), "body{}").unwrap();

    let batch = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no batch within timeout")
        .unwrap();
    assert!(batch.iter().any(|e| e.path == src.join("app.css")));

    handle.abort();
}
