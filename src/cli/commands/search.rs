//! Interactive search over the index.

use std::io::{BufRead, Write};

use crate::config::SearchConfig;
use crate::search::QuerySession;
use crate::storage::{IndexStore, StorageResult};

/// Run a query session on one snapshot taken now.
///
/// The prompt is only shown when `interactive` is set.
pub fn run_search<R: BufRead, W: Write>(
    store: &IndexStore,
    config: &SearchConfig,
    interactive: bool,
    input: R,
    output: &mut W,
) -> StorageResult<()> {
    let snapshot = store.snapshot()?;
    crate::debug_event!(
        "search",
        "snapshot",
        "{} documents",
        snapshot.document_count()?
    );

    let prompt = if interactive { config.prompt.as_str() } else { "" };
    QuerySession::new(&snapshot)
        .prompt(prompt)
        .snippet_chars(config.snippet_chars)
        .run(input, output)?;
    Ok(())
}
