//! Operation: display the resolved dependency tree of each scope.

use std::path::{Path, PathBuf};

use crate::ops_setup::Project;

/// Options for `depsteer tree`.
#[derive(Debug, Default)]
pub struct TreeOptions {
    pub scope: Option<String>,
    /// Maximum tree depth to display.
    pub depth: Option<usize>,
    /// Show the path from the scope to this module instead of the tree.
    pub why: Option<String>,
    pub rules: Vec<PathBuf>,
}

pub fn tree(project_dir: &Path, opts: &TreeOptions) -> miette::Result<()> {
    let project = Project::discover(project_dir)?;
    let rules = project.merged_rules(&opts.rules)?;
    let scopes = project.scopes(opts.scope.as_deref())?;
    let engine = project.engine(rules)?;

    for scope in &scopes {
        let report = engine.resolve(scope)?;
        let graph = report.graph();

        if let Some(ref target) = opts.why {
            match graph.find_path(target) {
                Some(path) => {
                    println!("Path to {target} in {}:", report.scope);
                    for (i, node) in path.iter().enumerate() {
                        let indent = "  ".repeat(i);
                        println!("{indent}{node}");
                    }
                }
                None => println!("Dependency '{target}' not found in {}.", report.scope),
            }
            continue;
        }

        print!("{}", graph.print_tree(opts.depth));
        for unresolved in report.resolution.unresolved() {
            println!("(unresolved) {unresolved}");
        }
        if !report.insight.is_empty() {
            print!("{}", report.insight);
        }
        println!();
    }
    Ok(())
}
