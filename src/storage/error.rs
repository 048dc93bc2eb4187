use std::path::PathBuf;

use tantivy::TantivyError;
use tantivy::directory::error::OpenDirectoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] TantivyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory error: {0}")]
    Directory(#[from] OpenDirectoryError),

    #[error("Index at {} is locked by another process", location.display())]
    Busy { location: PathBuf },

    #[error("Schema error: missing field '{0}', the index was created by an incompatible version")]
    SchemaMismatch(String),

    #[error("Invalid field value for {field}: {reason}")]
    InvalidFieldValue { field: String, reason: String },
}

pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// Map a writer-creation failure, surfacing lock contention as `Busy`.
    pub(crate) fn from_writer(error: TantivyError, location: &std::path::Path) -> Self {
        match error {
            TantivyError::LockFailure(..) => StorageError::Busy {
                location: location.to_path_buf(),
            },
            other => StorageError::Tantivy(other),
        }
    }
}
