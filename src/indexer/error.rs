use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::extract::ExtractError;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Storage error: {0}")]
    Store(#[from] StorageError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Failed to extract {}: {source}", path.display())]
    Extract {
        path: PathBuf,
        #[source]
        source: ExtractError,
    },

    #[error("Cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Purge failed, index left unchanged: {0}")]
    PurgeFailed(#[source] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type IndexerResult<T> = Result<T, IndexerError>;
