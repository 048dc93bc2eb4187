//! Tantivy-backed store for directory and document records.
//!
//! One index holds both record kinds. Mutations go through an exclusive
//! [`StoreWriter`] handle; reads go through a [`StoreSnapshot`] taken at the
//! time of the call.

mod error;
mod fuzzy;
mod schema;
mod snapshot;

pub use error::{StorageError, StorageResult};
pub use schema::{DOC_TYPE_DIRECTORY, DOC_TYPE_DOCUMENT, StoreSchema};
pub use snapshot::{Hit, Hits, SearchResults, StoreSnapshot};

use std::path::{Path, PathBuf};

use tantivy::directory::MmapDirectory;
use tantivy::tokenizer::{LowerCaser, RemoveLongFilter, SimpleTokenizer, TextAnalyzer};
use tantivy::{
    Index, IndexReader, IndexSettings, IndexWriter, ReloadPolicy, TantivyDocument as Document,
    Term,
};

use crate::types::{DirectoryRecord, DocumentRecord, Language};

/// Default writer memory budget (50MB).
pub const DEFAULT_HEAP_SIZE: usize = 50_000_000;

/// Mutation operations of an exclusive store handle.
///
/// Changes become visible to readers only on [`commit`](Self::commit).
pub trait StoreMutations {
    /// Replace the document keyed by `record.path`.
    fn upsert_document(&mut self, record: &DocumentRecord) -> StorageResult<()>;

    /// Replace the directory record keyed by `record.root_path`.
    fn add_directory(&mut self, record: &DirectoryRecord) -> StorageResult<()>;

    /// Delete the document whose key is exactly `path`.
    fn delete_document(&mut self, path: &Path) -> StorageResult<()>;

    /// Delete every committed document whose path lies under `prefix`.
    ///
    /// Returns the number of documents scheduled for deletion.
    fn delete_documents_under(&mut self, prefix: &Path) -> StorageResult<usize>;

    /// Delete the directory record for `root`.
    fn delete_directory(&mut self, root: &Path) -> StorageResult<()>;

    /// Delete every record of both kinds.
    fn delete_all(&mut self) -> StorageResult<()>;

    fn commit(&mut self) -> StorageResult<()>;

    /// Discard everything since the last commit.
    fn rollback(&mut self) -> StorageResult<()>;
}

/// Handle to the on-disk index.
pub struct IndexStore {
    location: PathBuf,
    index: Index,
    reader: IndexReader,
    schema: StoreSchema,
    heap_size: usize,
}

impl std::fmt::Debug for IndexStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexStore")
            .field("location", &self.location)
            .field("heap_size", &self.heap_size)
            .finish()
    }
}

impl IndexStore {
    /// Create or open a store at `location`.
    pub fn open(location: impl AsRef<Path>) -> StorageResult<Self> {
        Self::open_with_heap_size(location, DEFAULT_HEAP_SIZE)
    }

    /// Create or open a store with an explicit writer memory budget.
    pub fn open_with_heap_size(location: impl AsRef<Path>, heap_size: usize) -> StorageResult<Self> {
        let location = location.as_ref().to_path_buf();
        std::fs::create_dir_all(&location)?;

        let index = if location.join("meta.json").exists() {
            Index::open_in_dir(&location)?
        } else {
            let dir = MmapDirectory::open(&location)?;
            Index::create(dir, StoreSchema::build(), IndexSettings::default())?
        };

        // Tokenizers are not persisted with the index
        index
            .tokenizers()
            .register(Language::Polish.tokenizer_name(), polish_analyzer());

        let schema = StoreSchema::from_schema(&index.schema())?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        tracing::debug!("opened index at {}", location.display());

        Ok(Self {
            location,
            index,
            reader,
            schema,
            heap_size,
        })
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn schema(&self) -> &StoreSchema {
        &self.schema
    }

    /// Acquire the exclusive mutation handle.
    ///
    /// Fails with [`StorageError::Busy`] while another handle, in this or
    /// another process, holds the index lock.
    pub fn writer(&self) -> StorageResult<StoreWriter<'_>> {
        let writer = self
            .index
            .writer_with_num_threads::<Document>(1, self.heap_size)
            .map_err(|e| StorageError::from_writer(e, &self.location))?;

        Ok(StoreWriter {
            store: self,
            writer,
        })
    }

    /// Read view of the latest committed state.
    pub fn snapshot(&self) -> StorageResult<StoreSnapshot> {
        self.reader.reload()?;
        Ok(StoreSnapshot::new(
            self.index.clone(),
            self.reader.searcher(),
            self.schema.clone(),
        ))
    }
}

/// Exclusive mutation handle. The index lock is released on drop.
pub struct StoreWriter<'a> {
    store: &'a IndexStore,
    writer: IndexWriter<Document>,
}

impl std::fmt::Debug for StoreWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreWriter")
            .field("location", &self.store.location)
            .finish()
    }
}

impl StoreMutations for StoreWriter<'_> {
    fn upsert_document(&mut self, record: &DocumentRecord) -> StorageResult<()> {
        let schema = &self.store.schema;
        let key = record.path.to_string_lossy();

        self.writer
            .delete_term(Term::from_field_text(schema.path, key.as_ref()));

        let mut doc = Document::new();
        doc.add_text(schema.doc_type, DOC_TYPE_DOCUMENT);
        doc.add_text(schema.path, key.as_ref());
        doc.add_text(schema.name, &record.name);
        doc.add_text(schema.language, record.language.tag());
        doc.add_text(schema.text_field(record.language), &record.content);

        self.writer.add_document(doc)?;
        Ok(())
    }

    fn add_directory(&mut self, record: &DirectoryRecord) -> StorageResult<()> {
        let schema = &self.store.schema;
        let key = record.root_path.to_string_lossy();

        self.writer
            .delete_term(Term::from_field_text(schema.root, key.as_ref()));

        let mut doc = Document::new();
        doc.add_text(schema.doc_type, DOC_TYPE_DIRECTORY);
        doc.add_text(schema.root, key.as_ref());
        doc.add_u64(schema.registered_at, record.registered_at);

        self.writer.add_document(doc)?;
        Ok(())
    }

    fn delete_document(&mut self, path: &Path) -> StorageResult<()> {
        let term = Term::from_field_text(self.store.schema.path, path.to_string_lossy().as_ref());
        self.writer.delete_term(term);
        Ok(())
    }

    fn delete_documents_under(&mut self, prefix: &Path) -> StorageResult<usize> {
        // Linear scan over committed keys; there is no path-prefix index
        let snapshot = self.store.snapshot()?;
        let doomed: Vec<PathBuf> = snapshot
            .document_paths()?
            .into_iter()
            .filter(|path| path.starts_with(prefix))
            .collect();

        for path in &doomed {
            self.delete_document(path)?;
        }

        Ok(doomed.len())
    }

    fn delete_directory(&mut self, root: &Path) -> StorageResult<()> {
        let term = Term::from_field_text(self.store.schema.root, root.to_string_lossy().as_ref());
        self.writer.delete_term(term);
        Ok(())
    }

    fn delete_all(&mut self) -> StorageResult<()> {
        self.writer.delete_all_documents()?;
        Ok(())
    }

    fn commit(&mut self) -> StorageResult<()> {
        self.writer.commit()?;
        self.store.reader.reload()?;
        Ok(())
    }

    fn rollback(&mut self) -> StorageResult<()> {
        self.writer.rollback()?;
        Ok(())
    }
}

fn polish_analyzer() -> TextAnalyzer {
    TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(40))
        .filter(LowerCaser)
        .build()
}
