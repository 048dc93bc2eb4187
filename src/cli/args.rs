//! CLI argument parsing using clap.

use clap::{
    Parser,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

const BATCH_HELP: &str = "\
Commands (run in the order given, each may repeat):
  --purge          Remove every root and document from the index
  --add <PATH>     Register a root and index its tree
  --rm <PATH>      Remove a root, or any indexed path, and its documents
  --reindex        Rebuild the index from the registered roots
  --list           Print the registered roots

Without commands, dirdex watches all registered roots and keeps the index
in sync until interrupted.

Examples:
  $ dirdex --add ~/notes --add ~/papers --list
  $ dirdex --rm ~/papers --reindex
  $ dirdex";

/// Keep a full-text index in sync with watched directories.
#[derive(Parser, Debug)]
#[command(
    name = "dirdex",
    version,
    styles = clap_cargo_style(),
    after_help = BATCH_HELP
)]
pub struct Cli {
    /// Path to a custom settings file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Index directory, overriding the configured one
    #[arg(long, value_name = "DIR")]
    pub index_path: Option<PathBuf>,

    /// Batch commands; see below
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub commands: Vec<String>,
}

/// Query the index interactively.
///
/// Lines starting with `%` are directives: `%lang en|pl`,
/// `%term`, `%phrase`, `%fuzzy`, `%limit N`, `%details on|off`,
/// `%color on|off`. Other lines are queries. An empty line exits.
#[derive(Parser, Debug)]
#[command(name = "dirdex-search", version, styles = clap_cargo_style())]
pub struct SearchCli {
    /// Path to a custom settings file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Index directory, overriding the configured one
    #[arg(long, value_name = "DIR")]
    pub index_path: Option<PathBuf>,
}
