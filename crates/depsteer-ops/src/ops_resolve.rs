//! Operation: resolve every scope with the rule sets applied.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use depsteer_resolver::engine::ScopeReport;
use depsteer_util::errors::SteerError;

use crate::ops_setup::Project;

/// Options for `depsteer resolve`.
#[derive(Debug, Default)]
pub struct ResolveOptions {
    /// Resolve only this scope.
    pub scope: Option<String>,
    /// Rule files to load in addition to the manifest's `rule-files`.
    pub rules: Vec<PathBuf>,
}

/// Resolve the project's scopes and print the selected modules.
pub fn resolve(project_dir: &Path, opts: &ResolveOptions) -> miette::Result<()> {
    let project = Project::discover(project_dir)?;
    let rules = project.merged_rules(&opts.rules)?;
    let scopes = project.scopes(opts.scope.as_deref())?;
    let engine = project.engine(rules)?;

    for scope in &scopes {
        depsteer_util::progress::status("Resolving", &scope.name);
    }
    let reports = engine.resolve_all(&scopes)?;

    let mut failed = Vec::new();
    for report in &reports {
        print!("{}", render_report(report));
        for unresolved in report.resolution.unresolved() {
            depsteer_util::progress::status_warn("Unresolved", &unresolved.to_string());
        }
        if !report.is_resolved() {
            failed.push(report.scope.as_str());
        }
    }

    if !failed.is_empty() {
        return Err(SteerError::Resolution {
            message: format!("unresolved dependencies in {}", failed.join(", ")),
        }
        .into());
    }
    Ok(())
}

/// Selected modules of one scope, with the alignment outcome and the reason
/// behind every rule-driven selection.
pub fn render_report(report: &ScopeReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", report.scope);
    let _ = writeln!(out, "  alignment: {}", report.outcome);
    for module in report.resolution.selected_modules() {
        let _ = writeln!(out, "  {module}");
        for reason in report.insight.reasons_for(&module.module().to_string()) {
            let _ = writeln!(out, "      {reason}");
        }
    }
    out
}
