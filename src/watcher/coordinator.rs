//! Event loop that keeps the index in step with live filesystem changes.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, select};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use walkdir::WalkDir;

use super::error::WatchError;
use super::event::WatchEvent;
use super::registry::WatchRegistry;
use crate::indexer::{Indexer, IndexerResult};
use crate::storage::StoreMutations;
use crate::utils::normalize_path;

/// Lifecycle of a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Registering,
    Watching,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Re-walk affected roots when the native queue overflows.
    pub resync_on_overflow: bool,
    /// How often the loop wakes without events to prune stale watches.
    pub poll_interval: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            resync_on_overflow: false,
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Requests a running coordinator to stop after its current batch.
#[derive(Debug, Clone)]
pub struct StopHandle(Sender<()>);

impl StopHandle {
    pub fn stop(&self) {
        // The coordinator may already be gone
        let _ = self.0.send(());
    }
}

enum Tick {
    Batch(Vec<Event>),
    Failed(notify::Error),
    Idle,
    Stop,
    Closed,
}

/// Watches every registered root and feeds changes to the indexer.
///
/// Events are handled one at a time, each with its own commit.
pub struct WatchCoordinator<'a> {
    indexer: Indexer<'a>,
    options: WatchOptions,
    roots: Vec<PathBuf>,
    registry: WatchRegistry,
    watcher: RecommendedWatcher,
    events: Receiver<notify::Result<Event>>,
    stop_tx: Sender<()>,
    stop_rx: Receiver<()>,
    state: WatchState,
}

impl std::fmt::Debug for WatchCoordinator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchCoordinator")
            .field("state", &self.state)
            .field("roots", &self.roots)
            .field("watched_dirs", &self.registry.len())
            .finish()
    }
}

impl<'a> WatchCoordinator<'a> {
    /// Create the native watcher. Nothing is watched until
    /// [`register_all`](Self::register_all) or [`run`](Self::run).
    pub fn new(indexer: Indexer<'a>, options: WatchOptions) -> Result<Self, WatchError> {
        let (tx, events) = crossbeam_channel::unbounded();
        let watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);

        Ok(Self {
            indexer,
            options,
            roots: Vec::new(),
            registry: WatchRegistry::new(),
            watcher,
            events,
            stop_tx,
            stop_rx,
            state: WatchState::Idle,
        })
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(self.stop_tx.clone())
    }

    pub fn registry(&self) -> &WatchRegistry {
        &self.registry
    }

    /// Load the roots from the catalog and watch every directory below them.
    ///
    /// Returns the number of watched directories.
    pub fn register_all(&mut self) -> Result<usize, WatchError> {
        self.state = WatchState::Registering;
        self.roots = self
            .indexer
            .catalog()
            .list_all()?
            .into_iter()
            .map(|record| record.root_path)
            .collect();

        for root in self.roots.clone() {
            if root.is_file() {
                // A file root is watched through its parent
                if let Some(parent) = root.parent() {
                    self.register_tree(parent, false);
                }
            } else {
                self.register_tree(&root, true);
            }
        }

        Ok(self.registry.len())
    }

    /// Watch the registered roots until stopped.
    ///
    /// Returns when a stop is requested, the native channel closes, or no
    /// watched directory remains.
    pub fn run(&mut self) -> Result<(), WatchError> {
        let dirs = self.register_all()?;
        if dirs == 0 {
            tracing::warn!("[watcher] no accessible roots to watch");
            self.state = WatchState::Stopped;
            return Ok(());
        }

        crate::log_event!(
            "watcher",
            "monitoring",
            "{} roots in {dirs} directories",
            self.roots.len()
        );
        self.state = WatchState::Watching;

        loop {
            match self.next_tick() {
                Tick::Batch(batch) => {
                    for event in &batch {
                        for watch_event in WatchEvent::from_notify(event) {
                            self.handle_event(watch_event);
                        }
                    }
                    self.prune_stale();
                }
                Tick::Failed(e) => tracing::error!("[watcher] file watch error: {e}"),
                Tick::Idle => self.prune_stale(),
                Tick::Stop => {
                    crate::log_event!("watcher", "stop requested");
                    break;
                }
                Tick::Closed => {
                    self.state = WatchState::Stopped;
                    return Err(WatchError::ChannelClosed);
                }
            }

            if self.registry.is_empty() {
                tracing::warn!("[watcher] all roots became inaccessible");
                break;
            }
        }

        self.state = WatchState::Stopped;
        Ok(())
    }

    fn next_tick(&self) -> Tick {
        let first = select! {
            recv(self.events) -> msg => msg,
            recv(self.stop_rx) -> _ => return Tick::Stop,
            default(self.options.poll_interval) => return Tick::Idle,
        };

        let mut batch = match first {
            Ok(Ok(event)) => vec![event],
            Ok(Err(e)) => return Tick::Failed(e),
            Err(_) => return Tick::Closed,
        };

        // Drain what is already queued so stale watches are pruned once
        drain_queued(&self.events, &mut batch);
        Tick::Batch(batch)
    }

    /// Apply one event to the index.
    ///
    /// Failures are logged; the event is dropped and the coordinator stays
    /// usable.
    pub fn handle_event(&mut self, event: WatchEvent) {
        match event {
            WatchEvent::Created(path) => {
                if !self.is_tracked(&path) {
                    return;
                }
                // Watch the new subtree before indexing it so nothing created
                // meanwhile goes unnoticed
                if is_real_dir(&path) {
                    self.register_tree(&path, true);
                }
                crate::log_event!("watcher", "created", "{}", path.display());
                self.with_writer(&path, |indexer, writer| {
                    indexer.index_tree(writer, &path, true).map(drop)
                });
            }
            WatchEvent::Modified(path) => {
                if !self.is_tracked(&path) {
                    return;
                }
                crate::log_event!("watcher", "modified", "{}", path.display());
                self.with_writer(&path, |indexer, writer| {
                    indexer.reindex_path(writer, &path).map(drop)
                });
            }
            WatchEvent::Deleted(path) => {
                if !self.is_tracked(&path) {
                    return;
                }
                crate::log_event!("watcher", "deleted", "{}", path.display());
                self.with_writer(&path, |indexer, writer| {
                    indexer.delete_by_path_or_prefix(writer, &path).map(drop)
                });
            }
            WatchEvent::Overflow(path) => self.handle_overflow(path),
        }
    }

    /// Drop watches on directories that no longer exist.
    pub fn prune_stale(&mut self) {
        for dir in self.registry.prune_missing() {
            // The backend usually drops the watch on its own
            let _ = self.watcher.unwatch(&dir);
            crate::debug_event!("watcher", "unwatched", "{}", dir.display());
        }
    }

    fn handle_overflow(&mut self, path: Option<PathBuf>) {
        if !self.options.resync_on_overflow {
            tracing::warn!(
                "[watcher] event queue overflowed{}, changes may be missed",
                path.as_ref()
                    .map(|p| format!(" at {}", p.display()))
                    .unwrap_or_default()
            );
            return;
        }

        let affected: Vec<PathBuf> = match path {
            Some(path) => self
                .roots
                .iter()
                .filter(|root| path.starts_with(root))
                .cloned()
                .collect(),
            None => self.roots.clone(),
        };

        for root in affected {
            crate::log_event!("watcher", "resync", "{}", root.display());
            if is_real_dir(&root) {
                self.register_tree(&root, true);
            }
            self.with_writer(&root, |indexer, writer| {
                indexer.reindex_path(writer, &root).map(drop)
            });
        }
    }

    /// Watch `dir` and, when `recursive`, every directory below it.
    ///
    /// A directory that cannot be watched is logged and its subtree skipped.
    fn register_tree(&mut self, dir: &Path, recursive: bool) {
        let max_depth = if recursive { usize::MAX } else { 0 };
        let mut entries = WalkDir::new(dir)
            .follow_links(false)
            .follow_root_links(false)
            .max_depth(max_depth)
            .into_iter();

        while let Some(entry) = entries.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("[watcher] cannot walk: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }

            if let Err(e) = self.watch_dir(entry.path()) {
                tracing::warn!("[watcher] {e}");
                entries.skip_current_dir();
            }
        }
    }

    fn watch_dir(&mut self, dir: &Path) -> Result<(), WatchError> {
        let dir = normalize_path(dir).map_err(|e| WatchError::PathWatchFailed {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
        if self.registry.contains(&dir) {
            return Ok(());
        }

        self.watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: dir.clone(),
                reason: e.to_string(),
            })?;
        crate::debug_event!("watcher", "watching", "{}", dir.display());
        self.registry.insert(dir);
        Ok(())
    }

    fn is_tracked(&self, path: &Path) -> bool {
        let tracked = self.roots.iter().any(|root| path.starts_with(root));
        if !tracked {
            crate::debug_event!("watcher", "outside roots", "{}", path.display());
        }
        tracked
    }

    /// Run one mutation under its own writer and commit it.
    fn with_writer<F>(&self, path: &Path, apply: F)
    where
        F: FnOnce(&Indexer<'a>, &mut dyn StoreMutations) -> IndexerResult<()>,
    {
        let mut writer = match self.indexer.store().writer() {
            Ok(writer) => writer,
            Err(e) => {
                tracing::warn!("[watcher] dropped event for {}: {e}", path.display());
                return;
            }
        };

        let result = apply(&self.indexer, &mut writer).and_then(|()| Ok(writer.commit()?));
        if let Err(e) = result {
            tracing::error!("[watcher] failed to apply {}: {e}", path.display());
            if let Err(e) = writer.rollback() {
                tracing::error!("[watcher] rollback failed: {e}");
            }
        }
    }
}

/// Move every queued event into `batch`, logging errors in between.
///
/// Returns the number of errors seen.
fn drain_queued(events: &Receiver<notify::Result<Event>>, batch: &mut Vec<Event>) -> usize {
    let mut errors = 0;
    while let Ok(msg) = events.try_recv() {
        match msg {
            Ok(event) => batch.push(event),
            Err(e) => {
                tracing::error!("[watcher] file watch error: {e}");
                errors += 1;
            }
        }
    }
    errors
}

/// Directory check that does not follow symlinks.
fn is_real_dir(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.is_dir())
}
