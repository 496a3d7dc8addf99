//! Handler for `depsteer tree`.

use std::path::PathBuf;

use miette::Result;

use depsteer_ops::ops_tree::{self, TreeOptions};

pub fn exec(
    scope: Option<String>,
    depth: Option<u32>,
    why: Option<String>,
    rules: Vec<PathBuf>,
) -> Result<()> {
    let cwd = std::env::current_dir().map_err(depsteer_util::errors::SteerError::Io)?;
    let opts = TreeOptions {
        scope,
        depth: depth.map(|d| d as usize),
        why,
        rules,
    };
    ops_tree::tree(&cwd, &opts)
}
