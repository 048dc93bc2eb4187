//! Daemon mode: watch every registered root until interrupted.

use crate::indexer::Indexer;
use crate::watcher::{WatchCoordinator, WatchError, WatchOptions};

/// Run the watch loop, stopping on Ctrl-C.
pub fn run_watch(indexer: Indexer<'_>, options: WatchOptions) -> Result<(), WatchError> {
    let mut coordinator = WatchCoordinator::new(indexer, options)?;

    let stop = coordinator.stop_handle();
    ctrlc::set_handler(move || stop.stop()).map_err(|e| WatchError::InitFailed {
        reason: format!("cannot install Ctrl-C handler: {e}"),
    })?;

    println!("Watching registered roots for changes. Press Ctrl-C to stop.");
    coordinator.run()?;
    println!("Stopped watching.");
    Ok(())
}
