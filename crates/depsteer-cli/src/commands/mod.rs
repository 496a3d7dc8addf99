//! Command dispatch and handler modules.

mod check;
mod resolve;
mod tree;

use miette::Result;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    tracing::debug!("Running {:?}", cli.command);
    match cli.command {
        Command::Resolve { scope, rules } => resolve::exec(scope, rules),
        Command::Tree {
            scope,
            depth,
            why,
            rules,
        } => tree::exec(scope, depth, why, rules),
        Command::Check { rules } => check::exec(&rules),
    }
}
