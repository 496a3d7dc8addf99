//! depsteer CLI binary.

mod cli;
mod commands;

use miette::Result;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins; otherwise `--verbose` raises the floor from warn to info.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "info" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = cli::parse();
    init_logging(args.verbose);
    commands::dispatch(args)
}
