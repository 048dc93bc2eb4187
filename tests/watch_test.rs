//! Tests for applying filesystem events through the watch coordinator

use dirdex::{IndexStore, Indexer, StoreMutations, WatchCoordinator, WatchEvent, WatchOptions};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Store with `root` registered and indexed. Returns the canonical root.
fn indexed_store(index_dir: &Path, root: &Path) -> (IndexStore, PathBuf) {
    let store = IndexStore::open(index_dir).unwrap();
    {
        let indexer = Indexer::new(&store);
        let mut writer = store.writer().unwrap();
        indexer.add_root(&mut writer, root).unwrap();
        writer.commit().unwrap();
    }
    (store, root.canonicalize().unwrap())
}

#[test]
fn test_register_all_watches_every_directory() {
    let index_dir = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    write(&docs.path().join("a/b/c.txt"), "deep");
    let (store, root) = indexed_store(index_dir.path(), docs.path());

    let mut coordinator = WatchCoordinator::new(Indexer::new(&store), WatchOptions::default()).unwrap();
    let watched = coordinator.register_all().unwrap();

    assert_eq!(watched, 3);
    assert!(coordinator.registry().contains(&root));
    assert!(coordinator.registry().contains(&root.join("a/b")));
}

#[test]
fn test_created_subtree_is_watched_and_indexed() {
    let index_dir = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    let (store, root) = indexed_store(index_dir.path(), docs.path());

    let mut coordinator = WatchCoordinator::new(Indexer::new(&store), WatchOptions::default()).unwrap();
    coordinator.register_all().unwrap();

    // The whole chain appears before the first event is handled
    write(&root.join("d2/d3/note.txt"), "created later");
    coordinator.handle_event(WatchEvent::Created(root.join("d2")));

    assert!(coordinator.registry().contains(&root.join("d2")));
    assert!(coordinator.registry().contains(&root.join("d2/d3")));
    assert_eq!(
        store.snapshot().unwrap().document_paths().unwrap(),
        vec![root.join("d2/d3/note.txt")]
    );
}

#[test]
fn test_modified_file_is_reindexed() {
    let index_dir = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    write(&docs.path().join("a.txt"), "old text");
    let (store, root) = indexed_store(index_dir.path(), docs.path());

    let mut coordinator = WatchCoordinator::new(Indexer::new(&store), WatchOptions::default()).unwrap();
    coordinator.register_all().unwrap();

    fs::write(root.join("a.txt"), "new text").unwrap();
    coordinator.handle_event(WatchEvent::Modified(root.join("a.txt")));

    let record = store
        .snapshot()
        .unwrap()
        .document(&root.join("a.txt"))
        .unwrap()
        .unwrap();
    assert_eq!(record.content, "new text");
}

#[test]
fn test_deleted_directory_drops_its_documents() {
    let index_dir = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    write(&docs.path().join("keep.txt"), "keep");
    write(&docs.path().join("sub/one.txt"), "one");
    write(&docs.path().join("sub/two.txt"), "two");
    let (store, root) = indexed_store(index_dir.path(), docs.path());

    let mut coordinator = WatchCoordinator::new(Indexer::new(&store), WatchOptions::default()).unwrap();
    coordinator.register_all().unwrap();

    fs::remove_dir_all(root.join("sub")).unwrap();
    coordinator.handle_event(WatchEvent::Deleted(root.join("sub")));
    coordinator.prune_stale();

    let snapshot = store.snapshot().unwrap();
    assert_eq!(snapshot.document_paths().unwrap(), vec![root.join("keep.txt")]);
    assert!(snapshot.contains_directory(&root).unwrap());
    assert!(!coordinator.registry().contains(&root.join("sub")));
}

#[test]
fn test_events_outside_roots_are_ignored() {
    let index_dir = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    let (store, _root) = indexed_store(index_dir.path(), docs.path());
    let stray = elsewhere.path().canonicalize().unwrap().join("stray.txt");
    write(&stray, "not ours");

    let mut coordinator = WatchCoordinator::new(Indexer::new(&store), WatchOptions::default()).unwrap();
    coordinator.register_all().unwrap();
    coordinator.handle_event(WatchEvent::Created(stray));

    assert_eq!(store.snapshot().unwrap().document_count().unwrap(), 0);
}

#[test]
fn test_overflow_resync_catches_up() {
    let index_dir = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    write(&docs.path().join("a.txt"), "apple");
    let (store, root) = indexed_store(index_dir.path(), docs.path());

    let options = WatchOptions {
        resync_on_overflow: true,
        ..WatchOptions::default()
    };
    let mut coordinator = WatchCoordinator::new(Indexer::new(&store), options).unwrap();
    coordinator.register_all().unwrap();

    fs::remove_file(root.join("a.txt")).unwrap();
    write(&root.join("b.txt"), "banana");
    coordinator.handle_event(WatchEvent::Overflow(None));

    let snapshot = store.snapshot().unwrap();
    assert_eq!(snapshot.document_paths().unwrap(), vec![root.join("b.txt")]);
    assert!(snapshot.contains_directory(&root).unwrap());
}

#[test]
fn test_busy_store_drops_event_without_panicking() {
    let index_dir = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    let (store, root) = indexed_store(index_dir.path(), docs.path());

    let mut coordinator = WatchCoordinator::new(Indexer::new(&store), WatchOptions::default()).unwrap();
    coordinator.register_all().unwrap();

    let held = store.writer().unwrap();
    write(&root.join("late.txt"), "late");
    coordinator.handle_event(WatchEvent::Created(root.join("late.txt")));
    drop(held);

    assert_eq!(store.snapshot().unwrap().document_count().unwrap(), 0);
}

#[cfg(unix)]
#[test]
fn test_created_symlink_is_not_followed() {
    let index_dir = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    write(&outside.path().join("secret/s.txt"), "not under any root");
    let (store, root) = indexed_store(index_dir.path(), docs.path());

    let mut coordinator = WatchCoordinator::new(Indexer::new(&store), WatchOptions::default()).unwrap();
    coordinator.register_all().unwrap();

    let link = root.join("link");
    std::os::unix::fs::symlink(outside.path().join("secret"), &link).unwrap();
    coordinator.handle_event(WatchEvent::Created(link.clone()));

    assert!(!coordinator.registry().contains(&link));
    assert_eq!(store.snapshot().unwrap().document_count().unwrap(), 0);
}

#[test]
fn test_deleted_file_removes_only_that_document() {
    let index_dir = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    write(&docs.path().join("a.txt"), "apple");
    write(&docs.path().join("a.txt.bak"), "apple backup");
    let (store, root) = indexed_store(index_dir.path(), docs.path());

    let mut coordinator = WatchCoordinator::new(Indexer::new(&store), WatchOptions::default()).unwrap();
    coordinator.register_all().unwrap();

    fs::remove_file(root.join("a.txt")).unwrap();
    coordinator.handle_event(WatchEvent::Deleted(root.join("a.txt")));

    let snapshot = store.snapshot().unwrap();
    assert_eq!(snapshot.document_paths().unwrap(), vec![root.join("a.txt.bak")]);
    assert!(snapshot.contains_directory(&root).unwrap());
}

#[test]
fn test_deleted_root_drops_documents_and_record() {
    let index_dir = TempDir::new().unwrap();
    let base = TempDir::new().unwrap();
    let docs = base.path().join("docs");
    write(&docs.join("a.txt"), "apple");
    write(&docs.join("sub/b.txt"), "banana");
    let (store, root) = indexed_store(index_dir.path(), &docs);

    let mut coordinator = WatchCoordinator::new(Indexer::new(&store), WatchOptions::default()).unwrap();
    coordinator.register_all().unwrap();

    fs::remove_dir_all(&root).unwrap();
    coordinator.handle_event(WatchEvent::Deleted(root.clone()));

    let snapshot = store.snapshot().unwrap();
    assert_eq!(snapshot.document_count().unwrap(), 0);
    assert!(!snapshot.contains_directory(&root).unwrap());
}

#[test]
fn test_run_picks_up_nested_directories_from_live_events() {
    let index_dir = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    let (store, root) = indexed_store(index_dir.path(), docs.path());
    let target = root.join("d1/d2/d3/note.txt");

    let (handle_tx, handle_rx) = crossbeam_channel::bounded(1);
    std::thread::scope(|scope| {
        let watcher = scope.spawn(|| {
            let mut coordinator =
                WatchCoordinator::new(Indexer::new(&store), WatchOptions::default()).unwrap();
            coordinator.register_all().unwrap();
            handle_tx.send(coordinator.stop_handle()).unwrap();
            coordinator.run()
        });

        let stop = handle_rx.recv().unwrap();
        fs::create_dir(root.join("d1")).unwrap();
        fs::create_dir(root.join("d1/d2")).unwrap();
        fs::create_dir(root.join("d1/d2/d3")).unwrap();
        fs::write(&target, "written after the tree appeared").unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut indexed = false;
        while Instant::now() < deadline {
            if store.snapshot().unwrap().document(&target).unwrap().is_some() {
                indexed = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }

        stop.stop();
        watcher.join().unwrap().unwrap();
        assert!(indexed, "{} was never indexed", target.display());
    });
}
