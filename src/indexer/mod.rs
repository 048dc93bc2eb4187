//! Keeps documents in the index in step with files on disk.
//!
//! All operations take the caller's mutation handle and leave committing to
//! the caller, except [`Indexer::reindex_all`] which commits per phase.

mod error;

pub use error::{IndexerError, IndexerResult};

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::catalog::{DirectoryCatalog, RegisterOutcome};
use crate::extract::{
    ContentExtractor, ExtractError, LanguageDetector, SniffingExtractor, StopwordDetector,
};
use crate::storage::{IndexStore, StoreMutations};
use crate::types::{DirectoryRecord, DocumentRecord, Language};
use crate::utils::normalize_path;

/// Default per-file size cap (16 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Counters for one tree walk.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub files_indexed: usize,
    pub files_skipped: usize,
}

impl IndexStats {
    fn merge(&mut self, other: IndexStats) {
        self.files_indexed += other.files_indexed;
        self.files_skipped += other.files_skipped;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Indexed { root: PathBuf, stats: IndexStats },
    AlreadyRegistered(PathBuf),
}

/// Result of a full rebuild.
#[derive(Debug, Default)]
pub struct ReindexReport {
    /// Roots walked successfully.
    pub indexed: Vec<(PathBuf, IndexStats)>,
    /// Roots whose walk failed, with the cause.
    pub failed: Vec<(PathBuf, IndexerError)>,
}

impl ReindexReport {
    pub fn totals(&self) -> IndexStats {
        let mut total = IndexStats::default();
        for (_, stats) in &self.indexed {
            total.merge(*stats);
        }
        total
    }
}

pub struct Indexer<'a> {
    store: &'a IndexStore,
    extractor: Box<dyn ContentExtractor>,
    detector: Box<dyn LanguageDetector>,
    max_file_size: u64,
}

impl std::fmt::Debug for Indexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Indexer")
            .field("store", &self.store.location())
            .field("max_file_size", &self.max_file_size)
            .finish()
    }
}

impl<'a> Indexer<'a> {
    pub fn new(store: &'a IndexStore) -> Self {
        Self {
            store,
            extractor: Box::new(SniffingExtractor),
            detector: Box::new(StopwordDetector),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    pub fn with_extractor(mut self, extractor: impl ContentExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn with_detector(mut self, detector: impl LanguageDetector + 'static) -> Self {
        self.detector = Box::new(detector);
        self
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn store(&self) -> &'a IndexStore {
        self.store
    }

    pub fn catalog(&self) -> DirectoryCatalog<'a> {
        DirectoryCatalog::new(self.store)
    }

    /// Walk `root` and upsert every extractable regular file.
    ///
    /// Unextractable files and unreadable entries below the root are logged
    /// and counted as skipped. A root that cannot be read at all is an error.
    pub fn index_tree(
        &self,
        writer: &mut dyn StoreMutations,
        root: &Path,
        is_new: bool,
    ) -> IndexerResult<IndexStats> {
        let root = normalize_path(root).map_err(|source| IndexerError::Unreadable {
            path: root.to_path_buf(),
            source,
        })?;
        fs::symlink_metadata(&root).map_err(|source| IndexerError::Unreadable {
            path: root.clone(),
            source,
        })?;

        let verb = if is_new { "adding" } else { "updating" };
        let mut stats = IndexStats::default();

        // A symlinked root is not followed either
        for entry in WalkDir::new(&root).follow_links(false).follow_root_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("skipping unreadable entry: {e}");
                    stats.files_skipped += 1;
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            match self.extract_document(path) {
                Ok(record) => {
                    writer.upsert_document(&record)?;
                    crate::log_event!("indexer", verb, "{} [{}]", path.display(), record.language);
                    stats.files_indexed += 1;
                }
                Err(e) => {
                    tracing::warn!("skipping {}: {e}", path.display());
                    stats.files_skipped += 1;
                }
            }
        }

        Ok(stats)
    }

    /// Extract and upsert a single file.
    pub fn upsert_document(&self, writer: &mut dyn StoreMutations, path: &Path) -> IndexerResult<()> {
        let path = normalize_path(path).map_err(|source| IndexerError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let record = self
            .extract_document(&path)
            .map_err(|source| IndexerError::Extract {
                path: path.clone(),
                source,
            })?;
        writer.upsert_document(&record)?;
        Ok(())
    }

    /// Delete the document at `path`, or every document under it when it
    /// names a directory. A matching root record goes too.
    ///
    /// Returns the number of documents deleted.
    pub fn delete_by_path_or_prefix(
        &self,
        writer: &mut dyn StoreMutations,
        path: &Path,
    ) -> IndexerResult<usize> {
        let path = normalize_path(path).map_err(|source| IndexerError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let removed = writer.delete_documents_under(&path)?;
        if self.store.snapshot()?.contains_directory(&path)? {
            writer.delete_directory(&path)?;
            crate::log_event!("indexer", "root removed", "{}", path.display());
        }
        Ok(removed)
    }

    /// Replace the documents under `path` with a fresh walk.
    ///
    /// Root records are never touched. A path that no longer exists only
    /// loses its documents.
    pub fn reindex_path(
        &self,
        writer: &mut dyn StoreMutations,
        path: &Path,
    ) -> IndexerResult<IndexStats> {
        let path = normalize_path(path).map_err(|source| IndexerError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        writer.delete_documents_under(&path)?;
        if fs::symlink_metadata(&path).is_err() {
            return Ok(IndexStats::default());
        }
        self.index_tree(writer, &path, false)
    }

    /// Register `path` as a root and index its tree.
    pub fn add_root(&self, writer: &mut dyn StoreMutations, path: &Path) -> IndexerResult<AddOutcome> {
        match self.catalog().register(writer, path)? {
            RegisterOutcome::AlreadyRegistered(root) => Ok(AddOutcome::AlreadyRegistered(root)),
            RegisterOutcome::Registered(record) => {
                let stats = self.index_tree(writer, &record.root_path, true)?;
                Ok(AddOutcome::Indexed {
                    root: record.root_path,
                    stats,
                })
            }
        }
    }

    /// Purge the store and rebuild it from the registered roots.
    ///
    /// The purge and the re-added root records are committed together before
    /// any walk, so a failure there changes nothing and no later failure can
    /// lose a root. Each root's documents are then committed on their own; a
    /// root whose walk fails keeps its record, loses its documents, and is
    /// listed in the report.
    pub fn reindex_all(&self, writer: &mut dyn StoreMutations) -> IndexerResult<ReindexReport> {
        let roots = self.catalog().list_all()?;

        if let Err(e) = purge_keeping_roots(writer, &roots) {
            if let Err(e) = writer.rollback() {
                tracing::error!("rollback after failed purge: {e}");
            }
            return Err(IndexerError::PurgeFailed(e));
        }
        crate::log_event!("indexer", "purged", "{} roots to rebuild", roots.len());

        let mut report = ReindexReport::default();
        for root in roots {
            match self.rebuild_root(writer, &root.root_path) {
                Ok(stats) => report.indexed.push((root.root_path, stats)),
                Err(e) => {
                    tracing::warn!("reindex of {} failed: {e}", root.root_path.display());
                    if let Err(e) = writer.rollback() {
                        tracing::error!("rollback for {} failed: {e}", root.root_path.display());
                    }
                    report.failed.push((root.root_path, e));
                }
            }
        }

        Ok(report)
    }

    fn rebuild_root(&self, writer: &mut dyn StoreMutations, root: &Path) -> IndexerResult<IndexStats> {
        let stats = self.index_tree(writer, root, false)?;
        writer.commit()?;
        Ok(stats)
    }

    fn extract_document(&self, path: &Path) -> Result<DocumentRecord, ExtractError> {
        let size = fs::metadata(path)?.len();
        if size > self.max_file_size {
            return Err(ExtractError::TooLarge {
                size,
                limit: self.max_file_size,
            });
        }

        let bytes = fs::read(path)?;
        let content = self.extractor.extract_plain_text(&bytes)?;
        let language = self
            .detector
            .best_tag(&content)
            .map(|tag| Language::classify(&tag))
            .unwrap_or_default();

        Ok(DocumentRecord::new(path, language, content))
    }
}

/// Wipe the store and write back `roots` in one commit.
fn purge_keeping_roots(
    writer: &mut dyn StoreMutations,
    roots: &[DirectoryRecord],
) -> Result<(), crate::storage::StorageError> {
    writer.delete_all()?;
    for root in roots {
        writer.add_directory(root)?;
    }
    writer.commit()
}
