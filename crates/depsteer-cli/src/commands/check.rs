//! Check command implementation.

use std::path::PathBuf;

use miette::Result;

pub fn exec(rules: &[PathBuf]) -> Result<()> {
    let cwd = std::env::current_dir().map_err(depsteer_util::errors::SteerError::Io)?;
    depsteer_ops::ops_check::check(&cwd, rules)
}
