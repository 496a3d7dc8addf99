//! CLI argument definitions for depsteer.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "depsteer",
    version,
    about = "Steer dependency resolution with declarative rule sets",
    long_about = "depsteer applies replace, substitute, reject, deny, exclude and align rules \
                  to the dependency scopes declared in Steer.toml and shows how every version \
                  was chosen."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve scopes with the rule sets applied
    Resolve {
        /// Resolve only this scope
        #[arg(short, long)]
        scope: Option<String>,
        /// Additional rule file (repeatable)
        #[arg(short, long = "rules")]
        rules: Vec<PathBuf>,
    },

    /// Display the resolved dependency tree
    Tree {
        /// Show only this scope
        #[arg(short, long)]
        scope: Option<String>,
        /// Maximum depth
        #[arg(long)]
        depth: Option<u32>,
        /// Explain why a dependency is included
        #[arg(long)]
        why: Option<String>,
        /// Additional rule file (repeatable)
        #[arg(short, long = "rules")]
        rules: Vec<PathBuf>,
    },

    /// Validate rule files
    Check {
        /// Rule file to check (repeatable)
        #[arg(short, long = "rules")]
        rules: Vec<PathBuf>,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
