//! `dirdex`: manage watched roots, or watch them when given no commands.

use anyhow::Context;
use clap::Parser;

use dirdex::cli::commands::{run_commands, run_watch};
use dirdex::cli::{Cli, load_settings, parse_commands};
use dirdex::{Indexer, IndexStore, logging};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let commands = match parse_commands(&cli.commands) {
        Ok(commands) => commands,
        Err(e) => {
            eprintln!("Error: {e}\n\nRun 'dirdex --help' for the list of commands.");
            std::process::exit(2);
        }
    };

    let settings = load_settings(cli.config.as_deref(), cli.index_path)
        .context("Failed to load configuration")?;
    logging::init_with_config(&settings.logging);

    let store = IndexStore::open_with_heap_size(
        &settings.index_path,
        settings.indexing.writer_heap_size,
    )
    .with_context(|| format!("Cannot open index at {}", settings.index_path.display()))?;
    let indexer = Indexer::new(&store).max_file_size(settings.indexing.max_file_size);

    if commands.is_empty() {
        run_watch(indexer, (&settings.watch).into())?;
        return Ok(());
    }

    let mut stdout = std::io::stdout().lock();
    let failures = run_commands(&indexer, &commands, &mut stdout)?;
    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}
