//! Full-text index kept in sync with watched directory trees.
//!
//! - [`catalog`]: registered roots
//! - [`indexer`]: walking, extracting and upserting files
//! - [`watcher`]: live filesystem events driving the indexer
//! - [`search`]: interactive query sessions
//! - [`storage`]: the tantivy-backed store they all share

pub mod catalog;
pub mod cli;
pub mod config;
pub mod extract;
pub mod indexer;
pub mod logging;
pub mod search;
pub mod storage;
pub mod types;
pub mod utils;
pub mod watcher;

pub use catalog::{CatalogError, DirectoryCatalog, RegisterOutcome, RemoveOutcome};
pub use config::Settings;
pub use indexer::{AddOutcome, IndexStats, Indexer, IndexerError, ReindexReport};
pub use search::{MatchMode, QueryConfig, QuerySession};
pub use storage::{IndexStore, StorageError, StoreMutations, StoreSnapshot};
pub use types::{DirectoryRecord, DocumentRecord, Language};
pub use watcher::{WatchCoordinator, WatchEvent, WatchOptions, WatchState};
