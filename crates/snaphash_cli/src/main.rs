//! snaphash CLI: fingerprint file trees with a persistent, policy-aware cache.
//!
//! Provides `snaphash hash` to print fingerprints, `snaphash stats` to inspect
//! the cache, and `snaphash gc` to drop entries no longer reachable from a set
//! of roots.

#![warn(missing_docs)]

mod gc;
mod hash;
mod logging;
mod session;
mod stats;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// snaphash: memoized content fingerprints for file trees.
#[derive(Parser, Debug)]
#[command(name = "snaphash", version, about = "Memoized snapshot fingerprints")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `snaphash.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the fingerprint of every location under the given roots.
    Hash(HashArgs),
    /// Show what the persisted cache holds.
    Stats(StoreArgs),
    /// Remove cache entries not reachable from the given roots.
    Gc(GcArgs),
}

/// Arguments for the `snaphash hash` subcommand.
#[derive(Parser, Debug)]
pub struct HashArgs {
    /// Files or directories to fingerprint.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Hash without consulting or filling the cache.
    #[arg(long)]
    pub no_cache: bool,

    #[command(flatten)]
    pub store: StoreArgs,
}

/// Arguments for the `snaphash gc` subcommand.
#[derive(Parser, Debug)]
pub struct GcArgs {
    /// Roots whose entries should be kept.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    #[command(flatten)]
    pub store: StoreArgs,
}

/// Cache location override shared by commands that open the store.
#[derive(Parser, Debug)]
pub struct StoreArgs {
    /// Cache directory (defaults to `cache.dir` from the configuration).
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

/// Colored output selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Color when stderr is a terminal.
    Auto,
    /// Always color.
    Always,
    /// Never color.
    Never,
}

/// Output format for `snaphash hash`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// One `<fingerprint> <path>` line per location.
    Text,
    /// A JSON array of `{ "path", "fingerprint" }` objects.
    Json,
}

/// Global flags resolved once and handed to every command.
pub struct GlobalArgs {
    /// Suppress non-error output.
    pub quiet: bool,
    /// Configuration file override.
    pub config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };
    logging::init(cli.verbose, cli.quiet, color);

    let global = GlobalArgs {
        quiet: cli.quiet,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Hash(ref args) => hash::run(args, &global),
        Command::Stats(ref args) => stats::run(args, &global),
        Command::Gc(ref args) => gc::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
