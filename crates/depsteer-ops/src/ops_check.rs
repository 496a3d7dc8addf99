//! Operation: validate rule files without resolving anything.
//!
//! Every file is parsed, its patterns compiled, and its single-pass rules
//! registered on an empty scope so configuration errors (such as a
//! substitution without a version) surface before a real resolution.

use std::path::{Path, PathBuf};

use depsteer_core::manifest::MANIFEST_FILE;
use depsteer_core::ruleset::RuleSet;
use depsteer_core::scope::DependencyScope;
use depsteer_resolver::apply::apply_rules;
use depsteer_util::errors::SteerError;

use crate::ops_setup::{load_rule_sets, Project};

/// Check the manifest's rule files (when a `Steer.toml` is found) and `extra`.
pub fn check(project_dir: &Path, extra: &[PathBuf]) -> miette::Result<()> {
    let mut paths = Vec::new();
    if depsteer_util::fs::find_ancestor_with(project_dir, MANIFEST_FILE).is_some() {
        let project = Project::discover(project_dir)?;
        paths.extend(project.manifest.rule_paths(&project.root));
    }
    paths.extend(extra.iter().map(|p| project_dir.join(p)));

    if paths.is_empty() {
        return Err(SteerError::Generic {
            message: format!("No rule files to check: pass --rules or list rule-files in {MANIFEST_FILE}"),
        }
        .into());
    }

    let sets = load_rule_sets(&paths)?;
    for set in sets.iter() {
        validate(set)?;
        depsteer_util::progress::status("Checked", &set.name);
        println!("{}", summary(set));
    }
    println!("{} rule set(s) OK", sets.len());
    Ok(())
}

fn validate(set: &RuleSet) -> miette::Result<()> {
    let mut scope = DependencyScope::new(format!("{}Check", set.name));
    apply_rules(&mut scope, set)?;
    Ok(())
}

/// `name: N rules (replace 1, substitute 0, ...)`
pub fn summary(set: &RuleSet) -> String {
    format!(
        "{}: {} rules (replace {}, substitute {}, reject {}, deny {}, exclude {}, align {})",
        set.name,
        set.rule_count(),
        set.replace.len(),
        set.substitute.len(),
        set.reject.len(),
        set.deny.len(),
        set.exclude.len(),
        set.align.len()
    )
}
