//! Batch mode: run `--purge`, `--add`, `--rm`, `--reindex` and `--list` in
//! order under one writer.

use std::io::Write;

use crate::cli::script::BatchCommand;
use crate::indexer::{AddOutcome, Indexer, IndexerResult};
use crate::storage::StoreMutations;

/// Run `commands` in order, committing after each one.
///
/// A failing command is rolled back and reported on `out`; later commands
/// still run. Returns the number of failures. Only failing to acquire the
/// writer or to write `out` aborts the batch.
pub fn run_commands<W: Write>(
    indexer: &Indexer<'_>,
    commands: &[BatchCommand],
    out: &mut W,
) -> IndexerResult<usize> {
    let mut writer = indexer.store().writer()?;
    let mut failures = 0;

    for command in commands {
        crate::debug_event!("batch", "command", "{command:?}");
        let result = run_one(indexer, &mut writer, command, out)
            .and_then(|failed| Ok(writer.commit().map(|()| failed)?));

        match result {
            Ok(failed) => failures += failed,
            Err(e) => {
                failures += 1;
                writer.rollback()?;
                writeln!(out, "Error: {e}")?;
            }
        }
    }

    Ok(failures)
}

/// Returns the number of per-root failures inside a successful command.
fn run_one<W: Write>(
    indexer: &Indexer<'_>,
    writer: &mut dyn StoreMutations,
    command: &BatchCommand,
    out: &mut W,
) -> IndexerResult<usize> {
    let catalog = indexer.catalog();

    match command {
        BatchCommand::Purge => {
            catalog.purge_all(writer)?;
            writeln!(out, "Removed all roots and documents from the index.")?;
        }
        BatchCommand::Add(path) => {
            writeln!(out, "Indexing {}", path.display())?;
            match indexer.add_root(writer, path)? {
                AddOutcome::Indexed { root, stats } => writeln!(
                    out,
                    "Registered {}: {} files indexed, {} skipped",
                    root.display(),
                    stats.files_indexed,
                    stats.files_skipped
                )?,
                AddOutcome::AlreadyRegistered(root) => {
                    writeln!(out, "{} is already registered", root.display())?
                }
            }
        }
        BatchCommand::Remove(path) => {
            let outcome = catalog.remove_cascade(writer, path)?;
            if outcome.root_removed || outcome.documents > 0 {
                writeln!(
                    out,
                    "Removed {}: {} documents",
                    outcome.path.display(),
                    outcome.documents
                )?;
            } else {
                writeln!(out, "Nothing indexed under {}", outcome.path.display())?;
            }
        }
        BatchCommand::Reindex => {
            let report = indexer.reindex_all(writer)?;
            for (root, stats) in &report.indexed {
                writeln!(
                    out,
                    "Reindexed {}: {} files indexed, {} skipped",
                    root.display(),
                    stats.files_indexed,
                    stats.files_skipped
                )?;
            }
            for (root, e) in &report.failed {
                writeln!(out, "Failed to reindex {}: {e}", root.display())?;
            }
            return Ok(report.failed.len());
        }
        BatchCommand::List => {
            let roots = catalog.list_all()?;
            writeln!(out, "Registered roots ({}):", roots.len())?;
            for root in roots {
                writeln!(out, "  {}", root.root_path.display())?;
            }
        }
    }

    Ok(0)
}
