//! Handler for `depsteer resolve`.

use std::path::PathBuf;

use miette::Result;

use depsteer_ops::ops_resolve::{self, ResolveOptions};

pub fn exec(scope: Option<String>, rules: Vec<PathBuf>) -> Result<()> {
    let cwd = std::env::current_dir().map_err(depsteer_util::errors::SteerError::Io)?;
    ops_resolve::resolve(&cwd, &ResolveOptions { scope, rules })
}
