//! `dirdex-search`: query the index from stdin.

use anyhow::Context;
use clap::Parser;
use is_terminal::IsTerminal;

use dirdex::cli::commands::run_search;
use dirdex::cli::{SearchCli, load_settings};
use dirdex::{IndexStore, logging};

fn main() -> anyhow::Result<()> {
    let cli = SearchCli::parse();

    let settings = load_settings(cli.config.as_deref(), cli.index_path)
        .context("Failed to load configuration")?;
    logging::init_with_config(&settings.logging);

    let store = IndexStore::open(&settings.index_path)
        .with_context(|| format!("Cannot open index at {}", settings.index_path.display()))?;

    let stdin = std::io::stdin();
    let interactive = stdin.is_terminal();
    let mut stdout = std::io::stdout().lock();

    run_search(&store, &settings.search, interactive, stdin.lock(), &mut stdout)?;
    Ok(())
}
