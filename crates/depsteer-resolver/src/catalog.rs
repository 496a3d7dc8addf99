//! In-memory graph resolution over a module catalog.
//!
//! Walks the scope breadth-first from its declared dependencies and resolves
//! conflicts by picking the highest requested version, repeating the walk
//! until the selection stops changing (a newly selected version can bring in
//! different transitive requests).

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use depsteer_core::manifest::ModuleEntry;
use depsteer_core::module::{ModuleCoordinate, ModuleId};
use depsteer_core::scope::{DependencyScope, ResolutionStrategy};
use depsteer_core::selector::VersionSelector;
use depsteer_core::version::compare_versions;
use depsteer_util::errors::{SteerError, SteerResult};

use crate::adapter::{
    GraphResolver, ResolutionResult, ResolvedDependencyRecord, SelectionCause,
    UnresolvedDependency, VersionOverrides,
};

const MAX_ROUNDS: usize = 32;

/// Published module versions and their dependencies.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    modules: BTreeMap<ModuleId, BTreeMap<String, Vec<ModuleCoordinate>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `[[module]]` manifest entries.
    pub fn from_entries(entries: &[ModuleEntry]) -> Result<Self, SteerError> {
        let mut catalog = Self::new();
        for entry in entries {
            let coordinate = entry.coordinate()?;
            catalog.add(&coordinate, entry.dependency_coordinates()?);
        }
        Ok(catalog)
    }

    /// Publish `coordinate` (which must carry a version) with its dependencies.
    pub fn add(&mut self, coordinate: &ModuleCoordinate, dependencies: Vec<ModuleCoordinate>) {
        if let Some(version) = &coordinate.version {
            self.modules
                .entry(coordinate.module())
                .or_default()
                .insert(version.clone(), dependencies);
        }
    }

    /// Builder form of [`Catalog::add`] taking `group:name:version` strings.
    /// Malformed notation is ignored.
    pub fn with_module(mut self, id: &str, dependencies: &[&str]) -> Self {
        if let Some(coordinate) = ModuleCoordinate::parse(id) {
            let deps = dependencies
                .iter()
                .filter_map(|d| ModuleCoordinate::parse(d))
                .collect();
            self.add(&coordinate, deps);
        }
        self
    }

    /// Published versions of `module`, lowest first.
    pub fn versions(&self, module: &ModuleId) -> Vec<&str> {
        let mut versions: Vec<&str> = self
            .modules
            .get(module)
            .map(|v| v.keys().map(String::as_str).collect())
            .unwrap_or_default();
        versions.sort_by(|a, b| compare_versions(a, b));
        versions
    }

    pub fn contains(&self, module: &ModuleId, version: &str) -> bool {
        self.modules
            .get(module)
            .is_some_and(|v| v.contains_key(version))
    }

    pub fn dependencies(&self, module: &ModuleId, version: &str) -> &[ModuleCoordinate] {
        self.modules
            .get(module)
            .and_then(|v| v.get(version))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }
}

/// A [`GraphResolver`] backed by a [`Catalog`].
#[derive(Debug, Clone, Default)]
pub struct CatalogResolver {
    catalog: Catalog,
}

/// How a request arrived at its version.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Hint {
    Plain,
    Forced,
    Rule(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Choice {
    version: String,
    /// Published and not rejected.
    available: bool,
}

#[derive(Debug, Clone)]
enum Target {
    Module {
        module: ModuleId,
        choice: Option<Choice>,
        hint: Hint,
    },
    Replaced {
        with: ModuleId,
        reason: String,
    },
}

#[derive(Debug, Clone)]
struct Edge {
    from: Option<ModuleCoordinate>,
    requested: ModuleCoordinate,
    target: Target,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Selection {
    version: String,
    available: bool,
    cause: SelectionCause,
}

type Selections = HashMap<ModuleId, Selection>;

impl CatalogResolver {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// One breadth-first walk of the scope, expanding each module once at its
    /// currently selected version.
    fn walk(
        &self,
        scope: &DependencyScope,
        overrides: &VersionOverrides,
        selected: &Selections,
    ) -> Vec<Edge> {
        let mut edges = Vec::new();
        let mut expanded: HashSet<ModuleId> = HashSet::new();
        let mut queue: VecDeque<(Option<ModuleCoordinate>, ModuleCoordinate)> = scope
            .dependencies
            .iter()
            .map(|d| (None, d.coordinate.clone()))
            .collect();

        while let Some((from, requested)) = queue.pop_front() {
            if scope.strategy.is_excluded(&requested.module()).is_some() {
                continue;
            }
            let target = self.target_for(scope, overrides, selected, &requested);

            if let Target::Module { module, choice, .. } = &target {
                let expand_version = selected
                    .get(module)
                    .map(|s| s.version.clone())
                    .or_else(|| choice.as_ref().map(|c| c.version.clone()));
                if let Some(version) = expand_version {
                    if scope.transitive
                        && self.catalog.contains(module, &version)
                        && expanded.insert(module.clone())
                    {
                        let parent = module.with_version(version.clone());
                        for dep in self.catalog.dependencies(module, &version) {
                            queue.push_back((Some(parent.clone()), dep.clone()));
                        }
                    }
                }
            }

            edges.push(Edge {
                from,
                requested,
                target,
            });
        }
        edges
    }

    /// Where a single request ends up: substitution, then replacement, then
    /// force, then alignment override, then the requested selector.
    fn target_for(
        &self,
        scope: &DependencyScope,
        overrides: &VersionOverrides,
        selected: &Selections,
        requested: &ModuleCoordinate,
    ) -> Target {
        let (request, mut hint) = match scope.strategy.substitution_for(requested) {
            Some(sub) => (sub.to.clone(), Hint::Rule(sub.reason.clone())),
            None => (requested.clone(), Hint::Plain),
        };
        let module = request.module();

        if let Some(replacement) = scope.strategy.replacement_for(&module) {
            if selected.contains_key(&replacement.with) {
                return Target::Replaced {
                    with: replacement.with.clone(),
                    reason: replacement.reason.clone(),
                };
            }
        }

        let forced = scope.forced_versions(&module);
        let aligned = overrides
            .for_module(&module)
            .filter(|o| request.version.as_deref() != Some(o.version.as_str()));

        let selector = if let Some(force) = forced.first() {
            hint = Hint::Forced;
            force.clone()
        } else if let Some(entry) = aligned {
            hint = Hint::Rule(entry.reason.clone());
            entry.constraint()
        } else {
            request.version.clone().unwrap_or_else(|| "+".to_string())
        };

        Target::Module {
            choice: self.choose_version(&module, &selector, &scope.strategy),
            module,
            hint,
        }
    }

    fn choose_version(
        &self,
        module: &ModuleId,
        selector: &str,
        strategy: &ResolutionStrategy,
    ) -> Option<Choice> {
        let parsed = VersionSelector::parse(selector);
        if !parsed.is_dynamic() {
            return Some(Choice {
                version: selector.to_string(),
                available: self.catalog.contains(module, selector)
                    && !strategy.is_rejected(module, selector),
            });
        }
        self.catalog
            .versions(module)
            .into_iter()
            .rev()
            .find(|v| parsed.accept(v) && !strategy.is_rejected(module, v))
            .map(|v| Choice {
                version: v.to_string(),
                available: true,
            })
    }
}

/// Conflict resolution: a force wins outright, otherwise the highest
/// available candidate version.
fn select(edges: &[Edge]) -> Selections {
    let mut candidates: BTreeMap<&ModuleId, Vec<(&Choice, &Hint)>> = BTreeMap::new();
    for edge in edges {
        if let Target::Module {
            module,
            choice: Some(choice),
            hint,
        } = &edge.target
        {
            candidates.entry(module).or_default().push((choice, hint));
        }
    }

    let mut selections = Selections::new();
    for (module, options) in candidates {
        let forced = options.iter().find(|(_, hint)| matches!(hint, Hint::Forced));
        let selection = match forced {
            Some((choice, _)) => Selection {
                version: choice.version.clone(),
                available: choice.available,
                cause: SelectionCause::Forced,
            },
            None => {
                let highest = |available: bool| {
                    options
                        .iter()
                        .filter(|(c, _)| c.available == available)
                        .max_by(|a, b| compare_versions(&a.0.version, &b.0.version))
                };
                let Some((winner, _)) = highest(true).or_else(|| highest(false)) else {
                    continue;
                };
                let by_rule = options.iter().find_map(|(choice, hint)| match hint {
                    Hint::Rule(reason) if choice.version == winner.version => Some(reason),
                    _ => None,
                });
                let distinct: HashSet<&str> =
                    options.iter().map(|(c, _)| c.version.as_str()).collect();
                let cause = match by_rule {
                    Some(reason) => SelectionCause::Other(reason.clone()),
                    None if distinct.len() > 1 => SelectionCause::ConflictResolution,
                    None => SelectionCause::Requested,
                };
                Selection {
                    version: winner.version.clone(),
                    available: winner.available,
                    cause,
                }
            }
        };
        selections.insert(module.clone(), selection);
    }
    selections
}

fn build_result(edges: &[Edge], selected: &Selections) -> ResolutionResult {
    let mut records = Vec::new();
    let mut unresolved: Vec<UnresolvedDependency> = Vec::new();

    for edge in edges {
        let (module, cause_override) = match &edge.target {
            Target::Module { module, .. } => (module, None),
            Target::Replaced { with, reason } => {
                (with, Some(SelectionCause::Other(reason.clone())))
            }
        };
        match selected.get(module) {
            Some(selection) if selection.available => records.push(ResolvedDependencyRecord {
                from: edge.from.clone(),
                requested: edge.requested.clone(),
                selected: module.with_version(selection.version.clone()),
                cause: cause_override.unwrap_or_else(|| selection.cause.clone()),
            }),
            other => {
                let reason = match other {
                    Some(selection) => format!(
                        "version {} is not published or was rejected",
                        selection.version
                    ),
                    None => "no published version matches".to_string(),
                };
                if !unresolved.iter().any(|u| u.requested == edge.requested) {
                    unresolved.push(UnresolvedDependency {
                        requested: edge.requested.clone(),
                        reason,
                    });
                }
            }
        }
    }

    if unresolved.is_empty() {
        ResolutionResult::Resolved(records)
    } else {
        ResolutionResult::PartiallyUnresolved {
            unresolved,
            records,
        }
    }
}

impl GraphResolver for CatalogResolver {
    fn resolve(
        &self,
        scope: &DependencyScope,
        overrides: &VersionOverrides,
    ) -> SteerResult<ResolutionResult> {
        let mut selected = Selections::new();
        for _ in 0..MAX_ROUNDS {
            let edges = self.walk(scope, overrides, &selected);
            let next = select(&edges);
            if next == selected {
                return Ok(build_result(&edges, &selected));
            }
            selected = next;
        }
        Err(SteerError::Resolution {
            message: format!(
                "selection for {} did not settle after {MAX_ROUNDS} rounds",
                scope.name
            ),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::VersionOverride;
    use depsteer_core::scope::{Exclusion, Rejection, Replacement, Substitution};

    fn id(s: &str) -> ModuleId {
        ModuleId::parse(s).unwrap()
    }

    fn coord(s: &str) -> ModuleCoordinate {
        ModuleCoordinate::parse(s).unwrap()
    }

    fn resolver() -> CatalogResolver {
        CatalogResolver::new(
            Catalog::new()
                .with_module("g:a:1.0", &[])
                .with_module("g:a:1.1", &[])
                .with_module("g:a:1.2", &[])
                .with_module("g:b:1.0", &["g:a:1.0"])
                .with_module("g:b:1.2", &["g:a:1.2", "g:c:2.0"])
                .with_module("g:c:2.0", &[])
                .with_module("g:c:2.1", &[])
                .with_module("h:x:1.0", &["g:a:1.1"]),
        )
    }

    fn resolve(scope: &DependencyScope) -> ResolutionResult {
        resolver().resolve(scope, &VersionOverrides::new()).unwrap()
    }

    #[test]
    fn versions_sorted_numerically() {
        let catalog = Catalog::new()
            .with_module("g:a:1.10", &[])
            .with_module("g:a:1.9", &[])
            .with_module("g:a:1.2", &[]);
        assert_eq!(catalog.versions(&id("g:a")), vec!["1.2", "1.9", "1.10"]);
        assert_eq!(catalog.module_count(), 1);
    }

    #[test]
    fn direct_requests_are_selected_as_requested() {
        let scope = DependencyScope::new("c").with_dependency("g:a:1.0");
        let result = resolve(&scope);
        assert!(result.is_resolved());
        let record = &result.records()[0];
        assert_eq!(record.selected, coord("g:a:1.0"));
        assert_eq!(record.cause, SelectionCause::Requested);
        assert!(record.from.is_none());
    }

    #[test]
    fn highest_version_wins_conflicts() {
        let scope = DependencyScope::new("c")
            .with_dependency("g:a:1.0")
            .with_dependency("h:x:1.0");
        let result = resolve(&scope);
        assert_eq!(result.selected_version(&id("g:a")), Some("1.1"));
        let a = result
            .records()
            .iter()
            .find(|r| r.requested == coord("g:a:1.0"))
            .unwrap();
        assert_eq!(a.cause, SelectionCause::ConflictResolution);
    }

    #[test]
    fn transitive_dependencies_follow_selected_version() {
        let scope = DependencyScope::new("c")
            .with_dependency("g:b:1.0")
            .with_dependency("g:b:1.2");
        let result = resolve(&scope);
        assert_eq!(result.selected_version(&id("g:b")), Some("1.2"));
        assert_eq!(result.selected_version(&id("g:a")), Some("1.2"));
        assert_eq!(result.selected_version(&id("g:c")), Some("2.0"));
        let c = result
            .records()
            .iter()
            .find(|r| r.selected.is_module(&id("g:c")))
            .unwrap();
        assert_eq!(c.from, Some(coord("g:b:1.2")));
    }

    #[test]
    fn non_transitive_scope_only_resolves_declared() {
        let mut scope = DependencyScope::new("c").with_dependency("g:b:1.2");
        scope.transitive = false;
        let result = resolve(&scope);
        assert_eq!(result.records().len(), 1);
    }

    #[test]
    fn forces_win_over_higher_requests() {
        let scope = DependencyScope::new("c")
            .with_dependency("g:a:1.2")
            .with_force("g:a:1.0");
        let result = resolve(&scope);
        assert_eq!(result.selected_version(&id("g:a")), Some("1.0"));
        assert_eq!(result.records()[0].cause, SelectionCause::Forced);
    }

    #[test]
    fn dynamic_selectors_pick_highest_match() {
        let scope = DependencyScope::new("c").with_dependency("g:a:[1.0,1.2)");
        assert_eq!(resolve(&scope).selected_version(&id("g:a")), Some("1.1"));

        let scope = DependencyScope::new("c").with_dependency("g:a:latest.release");
        assert_eq!(resolve(&scope).selected_version(&id("g:a")), Some("1.2"));
    }

    #[test]
    fn overrides_cap_requests_that_differ() {
        let scope = DependencyScope::new("c")
            .with_dependency("g:a:1.0")
            .with_dependency("g:c:2.1");
        let mut overrides = VersionOverrides::new();
        overrides.insert(id("g:a"), VersionOverride::new("1.1", "aligned to 1.1 by test"));
        overrides.insert(id("g:c"), VersionOverride::new("2.1", "aligned to 2.1 by test"));
        let result = resolver().resolve(&scope, &overrides).unwrap();

        let a = &result.records()[0];
        assert_eq!(a.selected, coord("g:a:1.1"));
        assert_eq!(a.cause, SelectionCause::Other("aligned to 1.1 by test".to_string()));
        let c = &result.records()[1];
        assert_eq!(c.selected, coord("g:c:2.1"));
        assert_eq!(c.cause, SelectionCause::Requested);
    }

    #[test]
    fn substitution_redirects_request() {
        let mut scope = DependencyScope::new("c").with_dependency("h:old:1.0");
        scope.strategy.substitutions.push(Substitution {
            from: coord("h:old"),
            to: coord("g:c:2.0"),
            reason: "substituted".to_string(),
        });
        let result = resolve(&scope);
        assert!(result.is_resolved());
        let record = &result.records()[0];
        assert_eq!(record.requested, coord("h:old:1.0"));
        assert_eq!(record.selected, coord("g:c:2.0"));
        assert_eq!(record.cause, SelectionCause::Other("substituted".to_string()));
    }

    #[test]
    fn rejected_versions_are_skipped_by_dynamic_selectors() {
        let mut scope = DependencyScope::new("c").with_dependency("g:a:1.+");
        scope.strategy.rejections.push(Rejection {
            module: coord("g:a:1.2"),
            reason: "broken".to_string(),
        });
        assert_eq!(resolve(&scope).selected_version(&id("g:a")), Some("1.1"));
    }

    #[test]
    fn rejected_exact_version_is_unresolved() {
        let mut scope = DependencyScope::new("c").with_dependency("g:a:1.2");
        scope.strategy.rejections.push(Rejection {
            module: coord("g:a"),
            reason: "banned".to_string(),
        });
        let result = resolve(&scope);
        assert!(!result.is_resolved());
        assert_eq!(result.unresolved()[0].requested, coord("g:a:1.2"));
    }

    #[test]
    fn conflict_resolution_passes_over_rejected_candidates() {
        let mut scope = DependencyScope::new("c")
            .with_dependency("g:a:1.0")
            .with_dependency("h:x:1.0");
        scope.strategy.rejections.push(Rejection {
            module: coord("g:a:1.1"),
            reason: "broken".to_string(),
        });
        let result = resolve(&scope);
        assert!(result.is_resolved());
        assert_eq!(result.selected_version(&id("g:a")), Some("1.0"));
    }

    #[test]
    fn exclusions_drop_edges() {
        let mut scope = DependencyScope::new("c").with_dependency("g:b:1.2");
        scope.strategy.exclusions.push(Exclusion {
            module: id("g:c"),
            reason: String::new(),
        });
        let result = resolve(&scope);
        assert!(result.selected_version(&id("g:c")).is_none());
        assert_eq!(result.selected_version(&id("g:a")), Some("1.2"));
    }

    #[test]
    fn replacement_applies_when_both_present() {
        let mut scope = DependencyScope::new("c")
            .with_dependency("g:c:2.0")
            .with_dependency("g:a:1.0");
        scope.strategy.replacements.push(Replacement {
            module: id("g:c"),
            with: id("g:a"),
            reason: "replaced by g:a".to_string(),
        });
        let result = resolve(&scope);
        assert!(result.is_resolved());
        assert!(result.selected_version(&id("g:c")).is_none());
        let record = &result.records()[0];
        assert_eq!(record.selected, coord("g:a:1.0"));
        assert_eq!(record.cause, SelectionCause::Other("replaced by g:a".to_string()));
    }

    #[test]
    fn replacement_ignored_when_alone() {
        let mut scope = DependencyScope::new("c").with_dependency("g:c:2.0");
        scope.strategy.replacements.push(Replacement {
            module: id("g:c"),
            with: id("g:a"),
            reason: String::new(),
        });
        assert_eq!(resolve(&scope).selected_version(&id("g:c")), Some("2.0"));
    }

    #[test]
    fn missing_module_is_unresolved_but_rest_resolves() {
        let scope = DependencyScope::new("c")
            .with_dependency("g:a:1.0")
            .with_dependency("g:missing:1.0");
        let result = resolve(&scope);
        match &result {
            ResolutionResult::PartiallyUnresolved {
                unresolved,
                records,
            } => {
                assert_eq!(unresolved.len(), 1);
                assert_eq!(unresolved[0].requested, coord("g:missing:1.0"));
                assert_eq!(records.len(), 1);
            }
            other => panic!("expected partial failure, got {other:?}"),
        }
    }
}
