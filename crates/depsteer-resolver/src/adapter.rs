//! The graph resolution service the rule engine steers.
//!
//! The engine never resolves a graph itself. It hands a [`DependencyScope`]
//! and a set of [`VersionOverrides`] to a [`GraphResolver`] and reads back one
//! [`ResolvedDependencyRecord`] per dependency edge.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use depsteer_core::align::AlignRule;
use depsteer_core::module::{ModuleCoordinate, ModuleId};
use depsteer_core::scope::DependencyScope;
use depsteer_util::errors::SteerResult;

/// Why the resolver selected the version it did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionCause {
    /// The requested version, unchallenged.
    Requested,
    /// The winner among several requested versions.
    ConflictResolution,
    /// A force pinned the version.
    Forced,
    /// A rule chose the version; carries the rule's justification.
    Other(String),
}

impl SelectionCause {
    pub fn is_expected(&self) -> bool {
        matches!(self, SelectionCause::Requested)
    }

    pub fn is_conflict_resolution(&self) -> bool {
        matches!(self, SelectionCause::ConflictResolution)
    }
}

impl fmt::Display for SelectionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionCause::Requested => f.write_str("requested"),
            SelectionCause::ConflictResolution => f.write_str("conflict resolution"),
            SelectionCause::Forced => f.write_str("forced"),
            SelectionCause::Other(reason) => f.write_str(reason),
        }
    }
}

/// One resolved edge of the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependencyRecord {
    /// The dependent module; `None` for dependencies declared by the scope.
    pub from: Option<ModuleCoordinate>,
    pub requested: ModuleCoordinate,
    pub selected: ModuleCoordinate,
    pub cause: SelectionCause,
}

impl ResolvedDependencyRecord {
    pub fn selected_module(&self) -> ModuleId {
        self.selected.module()
    }

    pub fn selected_version(&self) -> &str {
        self.selected.version_str()
    }
}

/// A request the resolver could not satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedDependency {
    pub requested: ModuleCoordinate,
    pub reason: String,
}

impl fmt::Display for UnresolvedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.requested, self.reason)
    }
}

/// Output of one resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionResult {
    Resolved(Vec<ResolvedDependencyRecord>),
    PartiallyUnresolved {
        unresolved: Vec<UnresolvedDependency>,
        records: Vec<ResolvedDependencyRecord>,
    },
}

impl ResolutionResult {
    pub fn records(&self) -> &[ResolvedDependencyRecord] {
        match self {
            ResolutionResult::Resolved(records) => records,
            ResolutionResult::PartiallyUnresolved { records, .. } => records,
        }
    }

    pub fn unresolved(&self) -> &[UnresolvedDependency] {
        match self {
            ResolutionResult::Resolved(_) => &[],
            ResolutionResult::PartiallyUnresolved { unresolved, .. } => unresolved,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolutionResult::Resolved(_))
    }

    /// Distinct selected coordinates, in first-seen order.
    pub fn selected_modules(&self) -> Vec<&ModuleCoordinate> {
        let mut seen = Vec::new();
        for record in self.records() {
            if !seen.contains(&&record.selected) {
                seen.push(&record.selected);
            }
        }
        seen
    }

    /// The version selected for `module`, if it is in the graph.
    pub fn selected_version(&self, module: &ModuleId) -> Option<&str> {
        self.records()
            .iter()
            .find(|r| r.selected.is_module(module))
            .map(|r| r.selected_version())
    }
}

/// A version steer for one module: use at most `version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionOverride {
    pub version: String,
    /// Human-readable justification, recorded as the selection cause.
    pub reason: String,
}

impl VersionOverride {
    pub fn new(version: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            reason: reason.into(),
        }
    }

    /// The constraint requested in place of the original version: the
    /// highest available version not above the aligned one.
    pub fn constraint(&self) -> String {
        format!("(,{}]", self.version)
    }
}

/// Module identity to version override.
///
/// Entries are either for one module, or for every module an align rule
/// matches, so modules that only appear once the overrides are applied are
/// steered too.
#[derive(Debug, Clone, Default)]
pub struct VersionOverrides {
    modules: BTreeMap<ModuleId, VersionOverride>,
    rules: Vec<(Arc<AlignRule>, VersionOverride)>,
}

impl VersionOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, module: ModuleId, entry: VersionOverride) {
        self.modules.insert(module, entry);
    }

    pub fn insert_rule(&mut self, rule: Arc<AlignRule>, entry: VersionOverride) {
        self.rules.push((rule, entry));
    }

    /// The override for `module`: an explicit module entry first, then the
    /// first rule matching it.
    pub fn for_module(&self, module: &ModuleId) -> Option<&VersionOverride> {
        self.modules.get(module).or_else(|| {
            self.rules
                .iter()
                .find(|(rule, _)| rule.matches_module(module))
                .map(|(_, entry)| entry)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty() && self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.modules.len() + self.rules.len()
    }
}

/// A graph resolution service.
///
/// `resolve` is a blocking call and may be expensive. Implementations must be
/// usable from several threads at once, each resolving a different scope.
pub trait GraphResolver: Send + Sync {
    /// Resolve `scope` with `overrides` applied to every matching request.
    fn resolve(
        &self,
        scope: &DependencyScope,
        overrides: &VersionOverrides,
    ) -> SteerResult<ResolutionResult>;

    /// An isolated snapshot of `scope` for an alignment phase. Nothing done to
    /// the snapshot may leak back into `scope`.
    fn copy_scope(&self, scope: &DependencyScope, phase: &str) -> DependencyScope {
        scope.copy_for(phase)
    }
}

impl<R: GraphResolver + ?Sized> GraphResolver for &R {
    fn resolve(
        &self,
        scope: &DependencyScope,
        overrides: &VersionOverrides,
    ) -> SteerResult<ResolutionResult> {
        (**self).resolve(scope, overrides)
    }

    fn copy_scope(&self, scope: &DependencyScope, phase: &str) -> DependencyScope {
        (**self).copy_scope(scope, phase)
    }
}
