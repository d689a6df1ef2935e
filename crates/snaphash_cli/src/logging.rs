//! Tracing subscriber setup for the CLI.

use std::io;

use tracing::Level;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Level used when `RUST_LOG` is unset.
fn default_level(verbose: bool, quiet: bool) -> Level {
    if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::WARN
    }
}

fn default_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    format!("snaphash={level},snaphash_cli={level},snaphash_cache={level},snaphash_config={level}")
}

/// Installs a compact stderr subscriber. `RUST_LOG` overrides the flags.
pub fn init(verbose: bool, quiet: bool, color: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(default_level(verbose, quiet))));

    let layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(io::stderr)
        .with_ansi(color)
        .with_target(false);

    if let Err(e) = tracing_subscriber::registry()
        .with(env_filter)
        .with(layer)
        .try_init()
    {
        tracing::debug!(error = %e, "keeping previously installed subscriber");
    }
}
