// tests/watch_events.rs

use std::path::PathBuf;
use std::sync::Arc;

use notify::event::{
    AccessKind, CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind, RenameMode,
};
use notify::{Event, EventKind};
use tokio::sync::mpsc;

use devloop::engine::RuntimeEvent;
use devloop::fs::mock::MockFileSystem;
use devloop::fs::FileSystem;
use devloop::errors::DevloopError;
use devloop::watch::{
    compute_file_hash, ensure_watch_dir, is_relevant_kind, ContentCache, EventForwarder, WatchFilter,
};

const ROOT: &str = "/proj";

fn abs(rel: &str) -> PathBuf {
    PathBuf::from(ROOT).join(rel)
}

fn created(rel: &str) -> Event {
    Event::new(EventKind::Create(CreateKind::File)).add_path(abs(rel))
}

fn modified(rel: &str) -> Event {
    Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content))).add_path(abs(rel))
}

fn forwarder(
    fs: &MockFileSystem,
    exclude: &[&str],
    use_hash: bool,
) -> (EventForwarder, mpsc::Receiver<RuntimeEvent>) {
    let exclude: Vec<String> = exclude.iter().map(|s| s.to_string()).collect();
    let filter = WatchFilter::new(&exclude).unwrap();
    let (tx, rx) = mpsc::channel(16);
    let fs: Arc<dyn FileSystem> = Arc::new(fs.clone());
    (EventForwarder::new(ROOT, filter, use_hash, fs, tx), rx)
}

fn drain(rx: &mut mpsc::Receiver<RuntimeEvent>) -> Vec<RuntimeEvent> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

fn changed(rel: &str) -> RuntimeEvent {
    RuntimeEvent::FileChanged(rel.to_string())
}

#[test]
fn add_and_content_change_events_are_relevant() {
    assert!(is_relevant_kind(&EventKind::Create(CreateKind::File)));
    assert!(is_relevant_kind(&EventKind::Create(CreateKind::Any)));
    assert!(is_relevant_kind(&EventKind::Modify(ModifyKind::Data(DataChange::Content))));
    assert!(is_relevant_kind(&EventKind::Modify(ModifyKind::Any)));
    assert!(is_relevant_kind(&EventKind::Modify(ModifyKind::Name(RenameMode::To))));
}

#[test]
fn removal_access_metadata_and_folders_are_ignored() {
    assert!(!is_relevant_kind(&EventKind::Create(CreateKind::Folder)));
    assert!(!is_relevant_kind(&EventKind::Remove(RemoveKind::File)));
    assert!(!is_relevant_kind(&EventKind::Access(AccessKind::Any)));
    assert!(!is_relevant_kind(&EventKind::Modify(ModifyKind::Metadata(
        MetadataKind::WriteTime
    ))));
}

#[tokio::test]
async fn file_events_become_root_relative_triggers() {
    let fs = MockFileSystem::new();
    fs.add_file(abs("src/a.ts"), "let a = 1;");
    fs.add_file(abs("src/nested/b.test.ts"), "test()");
    let (mut fwd, mut rx) = forwarder(&fs, &[], false);

    assert!(fwd.forward(created("src/a.ts")).await);
    assert!(fwd.forward(modified("src/nested/b.test.ts")).await);

    assert_eq!(
        drain(&mut rx),
        vec![changed("src/a.ts"), changed("src/nested/b.test.ts")]
    );
}

#[tokio::test]
async fn directories_and_vanished_files_are_not_forwarded() {
    let fs = MockFileSystem::new();
    fs.add_file(abs("src/dir/a.ts"), "x");
    let (mut fwd, mut rx) = forwarder(&fs, &[], false);

    // Directory (only an ancestor of a file).
    fwd.forward(Event::new(EventKind::Create(CreateKind::Any)).add_path(abs("src/dir")))
        .await;
    // Reported as modified but already gone.
    fwd.forward(modified("src/gone.ts")).await;

    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn irrelevant_kinds_are_not_forwarded() {
    let fs = MockFileSystem::new();
    fs.add_file(abs("src/a.ts"), "x");
    let (mut fwd, mut rx) = forwarder(&fs, &[], false);

    fwd.forward(Event::new(EventKind::Remove(RemoveKind::File)).add_path(abs("src/a.ts")))
        .await;
    fwd.forward(
        Event::new(EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)))
            .add_path(abs("src/a.ts")),
    )
    .await;

    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn excluded_paths_are_dropped() {
    let fs = MockFileSystem::new();
    fs.add_file(abs("src/generated/api.ts"), "x");
    fs.add_file(abs("src/app.ts"), "y");
    let (mut fwd, mut rx) = forwarder(&fs, &["src/generated/**"], false);

    fwd.forward(modified("src/generated/api.ts")).await;
    fwd.forward(modified("src/app.ts")).await;

    assert_eq!(drain(&mut rx), vec![changed("src/app.ts")]);
}

#[tokio::test]
async fn unchanged_content_is_dropped_when_hashing() {
    let fs = MockFileSystem::new();
    fs.add_file(abs("src/a.ts"), "const a = 1;");
    let (mut fwd, mut rx) = forwarder(&fs, &[], true);

    fwd.forward(modified("src/a.ts")).await;
    // e.g. the formatter rewrote the file without changing it
    fwd.forward(modified("src/a.ts")).await;
    fs.add_file(abs("src/a.ts"), "const a = 2;");
    fwd.forward(modified("src/a.ts")).await;

    assert_eq!(drain(&mut rx), vec![changed("src/a.ts"), changed("src/a.ts")]);
}

#[tokio::test]
async fn without_hashing_every_change_is_forwarded() {
    let fs = MockFileSystem::new();
    fs.add_file(abs("src/a.ts"), "same");
    let (mut fwd, mut rx) = forwarder(&fs, &[], false);

    fwd.forward(modified("src/a.ts")).await;
    fwd.forward(modified("src/a.ts")).await;

    assert_eq!(drain(&mut rx).len(), 2);
}

#[tokio::test]
async fn closed_runtime_stops_forwarding() {
    let fs = MockFileSystem::new();
    fs.add_file(abs("src/a.ts"), "x");
    let (mut fwd, rx) = forwarder(&fs, &[], false);
    drop(rx);

    assert!(!fwd.forward(modified("src/a.ts")).await);
}

#[test]
fn content_cache_tracks_each_file_separately() {
    let fs = MockFileSystem::new();
    fs.add_file("/p/a.ts", "a");
    fs.add_file("/p/b.ts", "a");
    let mut cache = ContentCache::new();

    assert!(cache.has_changed(&fs, PathBuf::from("/p/a.ts").as_path()));
    assert!(cache.has_changed(&fs, PathBuf::from("/p/b.ts").as_path()));
    assert!(!cache.has_changed(&fs, PathBuf::from("/p/a.ts").as_path()));
    assert_eq!(cache.len(), 2);

    // Unreadable files always count as changed and are forgotten.
    fs.remove_file("/p/b.ts");
    assert!(cache.has_changed(&fs, PathBuf::from("/p/b.ts").as_path()));
    assert_eq!(cache.len(), 1);
}

#[test]
fn hash_depends_on_content_only() {
    let fs = MockFileSystem::new();
    fs.add_file("/p/one", "hello");
    fs.add_file("/p/two", "hello");
    fs.add_file("/p/three", "world");

    let one = compute_file_hash(&fs, PathBuf::from("/p/one").as_path()).unwrap();
    let two = compute_file_hash(&fs, PathBuf::from("/p/two").as_path()).unwrap();
    let three = compute_file_hash(&fs, PathBuf::from("/p/three").as_path()).unwrap();

    assert_eq!(one, two);
    assert_ne!(one, three);
    assert_eq!(one, blake3::hash(b"hello").to_hex().to_string());
}

#[test]
fn exclude_globs_match_root_relative_paths() {
    let filter = WatchFilter::new(&["src/**/*.snap".to_string(), "src/tmp/*".to_string()]).unwrap();

    assert!(filter.is_excluded("src/a/b/c.snap"));
    assert!(filter.is_excluded("src/tmp/x.ts"));
    assert!(!filter.is_excluded("src/app.ts"));
    assert!(!WatchFilter::default().is_excluded("anything"));
}

#[test]
fn missing_source_dir_is_rejected_before_watching() {
    let fs = MockFileSystem::new();
    fs.add_file(abs("src/app.ts"), "x");

    assert!(ensure_watch_dir(&fs, &abs("src")).is_ok());
    assert!(ensure_watch_dir(&fs, PathBuf::from(ROOT).as_path()).is_ok());

    let err = ensure_watch_dir(&fs, &abs("missing_src")).unwrap_err();
    assert!(matches!(err, DevloopError::ConfigError(_)));
    assert!(err.to_string().contains("does not exist"));
}
