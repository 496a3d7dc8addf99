//! Shared project loading: manifest lookup, rule sets, scopes, engine.

use std::path::{Path, PathBuf};

use depsteer_core::manifest::{Manifest, MANIFEST_FILE};
use depsteer_core::ruleset::{RuleSet, RuleSets};
use depsteer_core::scope::DependencyScope;
use depsteer_resolver::catalog::{Catalog, CatalogResolver};
use depsteer_resolver::engine::RuleEngine;
use depsteer_util::errors::SteerError;

/// A loaded `Steer.toml` and the directory it lives in.
#[derive(Debug)]
pub struct Project {
    pub root: PathBuf,
    pub manifest: Manifest,
}

impl Project {
    /// Find `Steer.toml` in `start` or any parent directory and load it.
    pub fn discover(start: &Path) -> miette::Result<Self> {
        let root = depsteer_util::fs::find_ancestor_with(start, MANIFEST_FILE).ok_or_else(|| {
            SteerError::Manifest {
                message: format!(
                    "No {MANIFEST_FILE} found in {} or any parent directory",
                    start.display()
                ),
            }
        })?;
        let manifest = Manifest::from_path(&root.join(MANIFEST_FILE))?;
        Ok(Self { root, manifest })
    }

    /// Load the manifest's rule files followed by `extra` files.
    pub fn rule_sets(&self, extra: &[PathBuf]) -> miette::Result<RuleSets> {
        load_rule_sets(self.manifest.rule_paths(&self.root).iter().chain(extra))
    }

    /// The merged rule set selected by the manifest's `[rules]` table.
    pub fn merged_rules(&self, extra: &[PathBuf]) -> miette::Result<RuleSet> {
        let sets = self.rule_sets(extra)?;
        if !sets.is_empty() {
            depsteer_util::progress::status_info(
                "Loaded",
                &format!("{} rule set(s): {}", sets.len(), sets.names().join(", ")),
            );
        }
        Ok(sets.select(&self.manifest.rules))
    }

    /// Declared scopes, or only the one named `filter`.
    pub fn scopes(&self, filter: Option<&str>) -> miette::Result<Vec<DependencyScope>> {
        let scopes = self.manifest.dependency_scopes()?;
        let Some(name) = filter else {
            return Ok(scopes);
        };
        let selected: Vec<DependencyScope> =
            scopes.into_iter().filter(|s| s.name == name).collect();
        if selected.is_empty() {
            return Err(SteerError::Manifest {
                message: format!("No scope named '{name}' in {MANIFEST_FILE}"),
            }
            .into());
        }
        Ok(selected)
    }

    pub fn engine(&self, rules: RuleSet) -> miette::Result<RuleEngine<CatalogResolver>> {
        let catalog = Catalog::from_entries(&self.manifest.modules)?;
        tracing::debug!("Catalog has {} modules", catalog.module_count());
        Ok(RuleEngine::new(CatalogResolver::new(catalog), rules)
            .with_config(self.manifest.alignment.clone()))
    }
}

/// Load every rule file in order; later sets with a repeated name win.
pub fn load_rule_sets<'a, I>(paths: I) -> miette::Result<RuleSets>
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    let mut sets = RuleSets::new();
    for path in paths {
        tracing::debug!("Loading rule file {}", path.display());
        sets.add(RuleSet::from_path(path)?);
    }
    Ok(sets)
}
