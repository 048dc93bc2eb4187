//! Command implementations for the CLI.

pub mod batch;
pub mod search;
pub mod watch;

pub use batch::run_commands;
pub use search::run_search;
pub use watch::run_watch;
