//! Dependency scopes: the declared dependencies resolved together (one
//! classpath) and the resolution strategy that steers them.

use crate::module::{ModuleCoordinate, ModuleId};

/// Suffix appended to the names of scopes copied for alignment passes.
pub const COPY_SUFFIX: &str = "Alignment";

/// A dependency declared directly in a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredDependency {
    pub coordinate: ModuleCoordinate,
    /// Pin this version regardless of conflict resolution.
    pub force: bool,
}

impl DeclaredDependency {
    pub fn new(coordinate: ModuleCoordinate) -> Self {
        Self {
            coordinate,
            force: false,
        }
    }

    pub fn forced(coordinate: ModuleCoordinate) -> Self {
        Self {
            coordinate,
            force: true,
        }
    }
}

/// A substitution registered on a strategy: requests for `from` become `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    /// When `from` carries a version, only requests for that version match.
    pub from: ModuleCoordinate,
    pub to: ModuleCoordinate,
    pub reason: String,
}

impl Substitution {
    pub fn matches(&self, requested: &ModuleCoordinate) -> bool {
        requested.organization == self.from.organization
            && requested.name == self.from.name
            && self
                .from
                .version
                .as_deref()
                .map_or(true, |v| requested.version.as_deref() == Some(v))
    }
}

/// Candidate versions that must never be selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub module: ModuleCoordinate,
    pub reason: String,
}

impl Rejection {
    pub fn rejects(&self, module: &ModuleId, candidate: &str) -> bool {
        self.module.is_module(module)
            && self
                .module
                .version
                .as_deref()
                .map_or(true, |v| v == candidate)
    }
}

/// A module removed from the scope entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    pub module: ModuleId,
    pub reason: String,
}

/// `module` is superseded by `with` when both are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub module: ModuleId,
    pub with: ModuleId,
    pub reason: String,
}

/// Everything the graph resolver must honour beyond the declared requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionStrategy {
    /// Strategy-level forced versions.
    pub forced_modules: Vec<ModuleCoordinate>,
    pub substitutions: Vec<Substitution>,
    pub rejections: Vec<Rejection>,
    pub exclusions: Vec<Exclusion>,
    pub replacements: Vec<Replacement>,
}

impl ResolutionStrategy {
    pub fn is_excluded(&self, module: &ModuleId) -> Option<&Exclusion> {
        self.exclusions.iter().find(|e| &e.module == module)
    }

    pub fn substitution_for(&self, requested: &ModuleCoordinate) -> Option<&Substitution> {
        self.substitutions.iter().find(|s| s.matches(requested))
    }

    pub fn replacement_for(&self, module: &ModuleId) -> Option<&Replacement> {
        self.replacements.iter().find(|r| &r.module == module)
    }

    pub fn is_rejected(&self, module: &ModuleId, candidate: &str) -> bool {
        self.rejections.iter().any(|r| r.rejects(module, candidate))
    }
}

/// A set of declared dependencies resolved together, plus its strategy.
///
/// Cloning a scope yields a fully independent snapshot: no part of it is
/// shared with the original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyScope {
    pub name: String,
    /// Non-transitive scopes resolve only their declared dependencies.
    pub transitive: bool,
    pub dependencies: Vec<DeclaredDependency>,
    pub strategy: ResolutionStrategy,
    copy_of: Option<String>,
}

impl DependencyScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transitive: true,
            dependencies: Vec::new(),
            strategy: ResolutionStrategy::default(),
            copy_of: None,
        }
    }

    pub fn with_dependency(mut self, notation: &str) -> Self {
        if let Some(coord) = ModuleCoordinate::parse(notation) {
            self.dependencies.push(DeclaredDependency::new(coord));
        }
        self
    }

    pub fn with_forced_dependency(mut self, notation: &str) -> Self {
        if let Some(coord) = ModuleCoordinate::parse(notation) {
            self.dependencies.push(DeclaredDependency::forced(coord));
        }
        self
    }

    pub fn with_force(mut self, notation: &str) -> Self {
        if let Some(coord) = ModuleCoordinate::parse(notation) {
            self.strategy.forced_modules.push(coord);
        }
        self
    }

    /// Whether this scope is a snapshot taken for an alignment pass.
    pub fn is_copy(&self) -> bool {
        self.copy_of.is_some()
    }

    /// Name of the scope this snapshot was taken from (its own name otherwise).
    pub fn source_name(&self) -> &str {
        self.copy_of.as_deref().unwrap_or(&self.name)
    }

    /// An independent snapshot named for the alignment phase, e.g.
    /// `compileClasspathBaselineAlignment`.
    pub fn copy_for(&self, phase: &str) -> Self {
        let source = self.source_name().to_string();
        Self {
            name: format!("{source}{phase}{COPY_SUFFIX}"),
            copy_of: Some(source),
            ..self.clone()
        }
    }

    /// Every forced version that applies to `module`, from strategy-level
    /// forces and from declared dependencies marked `force`.
    pub fn forced_versions(&self, module: &ModuleId) -> Vec<String> {
        let strategy = self.strategy.forced_modules.iter();
        let declared = self
            .dependencies
            .iter()
            .filter(|d| d.force)
            .map(|d| &d.coordinate);
        strategy
            .chain(declared)
            .filter(|c| c.is_module(module))
            .filter_map(|c| c.version.clone())
            .collect()
    }
}
