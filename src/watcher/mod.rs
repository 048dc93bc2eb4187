//! Live synchronization of registered roots.
//!
//! # Architecture
//!
//! ```text
//! notify::RecommendedWatcher (one non-recursive watch per directory)
//!         |
//!   crossbeam channel
//!         |
//! WatchCoordinator -- WatchEvent --> Indexer --> IndexStore
//!   - WatchRegistry (watched directories)
//!   - StopHandle (Ctrl-C)
//! ```

mod coordinator;
mod error;
mod event;
mod registry;

pub use coordinator::{StopHandle, WatchCoordinator, WatchOptions, WatchState};
pub use error::WatchError;
pub use event::WatchEvent;
pub use registry::WatchRegistry;
