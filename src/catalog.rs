//! Registry of watched roots.
//!
//! Roots are stored as directory records in the same index as documents.
//! Removing a root cascades to every document under it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::storage::{IndexStore, StorageError, StoreMutations};
use crate::types::DirectoryRecord;
use crate::utils::{get_utc_timestamp, normalize_root};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Store(#[from] StorageError),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered(DirectoryRecord),
    AlreadyRegistered(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveOutcome {
    /// Normalized path that was removed.
    pub path: PathBuf,
    /// Documents deleted under the path.
    pub documents: usize,
    /// Whether the path was itself a registered root.
    pub root_removed: bool,
}

/// Catalog operations over a store.
///
/// Reads see the last committed state; writes go through the caller's
/// mutation handle and become visible on its commit.
#[derive(Debug, Clone, Copy)]
pub struct DirectoryCatalog<'a> {
    store: &'a IndexStore,
}

impl<'a> DirectoryCatalog<'a> {
    pub fn new(store: &'a IndexStore) -> Self {
        Self { store }
    }

    /// Register `path` as a root. The path must exist and be readable.
    pub fn register(
        &self,
        writer: &mut dyn StoreMutations,
        path: &Path,
    ) -> CatalogResult<RegisterOutcome> {
        let root = normalize_root(path).map_err(|source| CatalogError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        check_readable(&root)?;

        if self.contains(&root)? {
            return Ok(RegisterOutcome::AlreadyRegistered(root));
        }

        let record = DirectoryRecord::new(root, get_utc_timestamp());
        writer.add_directory(&record)?;
        crate::debug_event!("catalog", "registered", "{}", record.root_path.display());

        Ok(RegisterOutcome::Registered(record))
    }

    /// All registered roots, sorted by path.
    pub fn list_all(&self) -> CatalogResult<Vec<DirectoryRecord>> {
        Ok(self.store.snapshot()?.directories()?)
    }

    /// Whether `root` is a registered root key.
    pub fn contains(&self, root: &Path) -> CatalogResult<bool> {
        Ok(self.store.snapshot()?.contains_directory(root)?)
    }

    /// Delete `path`'s root record, if any, and every document under it.
    pub fn remove_cascade(
        &self,
        writer: &mut dyn StoreMutations,
        path: &Path,
    ) -> CatalogResult<RemoveOutcome> {
        let path = normalize_root(path).map_err(|source| CatalogError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let documents = writer.delete_documents_under(&path)?;
        let root_removed = self.contains(&path)?;
        if root_removed {
            writer.delete_directory(&path)?;
        }

        crate::debug_event!(
            "catalog",
            "removed",
            "{} ({documents} documents)",
            path.display()
        );

        Ok(RemoveOutcome {
            path,
            documents,
            root_removed,
        })
    }

    /// Wipe every root and document.
    pub fn purge_all(&self, writer: &mut dyn StoreMutations) -> CatalogResult<()> {
        writer.delete_all()?;
        Ok(())
    }
}

fn check_readable(path: &Path) -> CatalogResult<()> {
    let unreadable = |source| CatalogError::Unreadable {
        path: path.to_path_buf(),
        source,
    };

    let metadata = fs::metadata(path).map_err(unreadable)?;
    if metadata.is_dir() {
        fs::read_dir(path).map_err(unreadable)?;
    } else {
        fs::File::open(path).map_err(unreadable)?;
    }
    Ok(())
}
