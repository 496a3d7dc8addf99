//! The fixed-point version alignment engine.
//!
//! Alignment runs against snapshots of a scope, never the scope itself:
//!
//! 1. **Baseline**: resolve an untouched copy and elect a version for every
//!    align rule. Rules whose modules already agree are dropped.
//! 2. **Stabilization**: resolve a fresh copy with the current assignment
//!    applied as version overrides, elect again, and stop once the election
//!    reproduces the assignment that was applied.
//!
//! The number of stabilization passes is capped; running out of passes is a
//! configuration error.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use depsteer_core::align::AlignRule;
use depsteer_core::config::DEFAULT_MAX_PASSES;
use depsteer_core::module::ModuleCoordinate;
use depsteer_core::scope::DependencyScope;
use depsteer_core::selector::is_dynamic;
use depsteer_util::errors::{SteerError, SteerResult};

use crate::adapter::{
    GraphResolver, ResolvedDependencyRecord, UnresolvedDependency, VersionOverride,
    VersionOverrides,
};
use crate::election::elect;

/// The version elected for one align rule in one pass.
#[derive(Debug, Clone)]
pub struct AlignedVersion {
    /// Position of the rule in the engine's rule list; its identity.
    pub rule_index: usize,
    pub rule: Arc<AlignRule>,
    pub version: String,
    /// Records of the matched modules the version was elected from.
    pub dependencies: Vec<ResolvedDependencyRecord>,
    pub warnings: Vec<String>,
}

impl AlignedVersion {
    /// Distinct selected versions among the contributing records.
    pub fn resolved_versions(&self) -> BTreeSet<&str> {
        self.dependencies
            .iter()
            .map(ResolvedDependencyRecord::selected_version)
            .collect()
    }

    /// Whether the matched modules still need to move to the elected version.
    pub fn needs_alignment(&self) -> bool {
        let versions = self.resolved_versions();
        versions.len() > 1 || versions.iter().any(|v| *v != self.version)
    }

    /// Justification attached to every override this assignment produces.
    pub fn reason(&self) -> String {
        format!(
            "aligned to {} {}",
            self.version,
            self.rule.provenance.justification()
        )
    }
}

/// Rule to version mapping produced by one pass. Two assignments are equal
/// when they name the same rules with the same versions.
#[derive(Debug, Clone, Default)]
pub struct AlignedVersionAssignment {
    entries: Vec<AlignedVersion>,
}

impl PartialEq for AlignedVersionAssignment {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|(a, b)| a.rule_index == b.rule_index && a.version == b.version)
    }
}

impl Eq for AlignedVersionAssignment {}

impl AlignedVersionAssignment {
    pub fn entries(&self) -> &[AlignedVersion] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn version_for(&self, rule_index: usize) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.rule_index == rule_index)
            .map(|e| e.version.as_str())
    }

    /// The assignment as per-module overrides for the graph resolver.
    pub fn overrides(&self) -> VersionOverrides {
        let mut overrides = VersionOverrides::new();
        for entry in &self.entries {
            overrides.insert_rule(
                Arc::clone(&entry.rule),
                VersionOverride::new(entry.version.clone(), entry.reason()),
            );
        }
        overrides
    }

    fn rule_indices(&self) -> Vec<usize> {
        self.entries.iter().map(|e| e.rule_index).collect()
    }
}

impl fmt::Display for AlignedVersionAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .entries
            .iter()
            .map(|e| format!("{} => {}", e.rule.group_pattern(), e.version))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// What alignment did for a scope.
#[derive(Debug, Clone)]
pub enum AlignmentOutcome {
    /// Alignment is switched off in configuration.
    Disabled,
    NoRules,
    NotTransitive,
    /// Snapshots taken for alignment are never aligned themselves.
    CopiedScope,
    /// The baseline had unresolved dependencies; the scope resolves as is.
    Skipped { unresolved: Vec<UnresolvedDependency> },
    /// Every rule's modules already shared one version in the baseline.
    AlreadyAligned,
    Aligned {
        assignment: AlignedVersionAssignment,
        passes: usize,
    },
    /// Applying the assignment left dependencies unresolved. The assignment
    /// still applies so the failure shows up in the final resolution.
    Broken {
        assignment: AlignedVersionAssignment,
        passes: usize,
        unresolved: Vec<UnresolvedDependency>,
    },
}

impl AlignmentOutcome {
    pub fn assignment(&self) -> Option<&AlignedVersionAssignment> {
        match self {
            AlignmentOutcome::Aligned { assignment, .. }
            | AlignmentOutcome::Broken { assignment, .. } => Some(assignment),
            _ => None,
        }
    }

    pub fn overrides(&self) -> VersionOverrides {
        self.assignment()
            .map(AlignedVersionAssignment::overrides)
            .unwrap_or_default()
    }

    pub fn passes(&self) -> usize {
        match self {
            AlignmentOutcome::Aligned { passes, .. }
            | AlignmentOutcome::Broken { passes, .. } => *passes,
            _ => 0,
        }
    }
}

impl fmt::Display for AlignmentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignmentOutcome::Disabled => f.write_str("alignment disabled"),
            AlignmentOutcome::NoRules => f.write_str("no align rules"),
            AlignmentOutcome::NotTransitive => f.write_str("skipped (not transitive)"),
            AlignmentOutcome::CopiedScope => f.write_str("skipped (alignment copy)"),
            AlignmentOutcome::Skipped { unresolved } => write!(
                f,
                "skipped ({} unresolved dependencies)",
                unresolved.len()
            ),
            AlignmentOutcome::AlreadyAligned => f.write_str("already aligned"),
            AlignmentOutcome::Aligned { assignment, passes } => {
                write!(f, "aligned {assignment} after {passes} pass(es)")
            }
            AlignmentOutcome::Broken {
                assignment,
                unresolved,
                ..
            } => write!(
                f,
                "aligned {assignment} with {} unresolved dependencies",
                unresolved.len()
            ),
        }
    }
}

/// Runs alignment for one scope at a time against a [`GraphResolver`].
///
/// The engine holds no per-scope state, so a shared reference may align
/// several scopes from different threads.
pub struct AlignmentEngine<R> {
    resolver: R,
    rules: Vec<Arc<AlignRule>>,
    max_passes: usize,
}

impl<R: GraphResolver> AlignmentEngine<R> {
    pub fn new(resolver: R, rules: Vec<Arc<AlignRule>>) -> Self {
        Self {
            resolver,
            rules,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    pub fn rules(&self) -> &[Arc<AlignRule>] {
        &self.rules
    }

    pub fn align(&self, scope: &DependencyScope) -> SteerResult<AlignmentOutcome> {
        if self.rules.is_empty() {
            return Ok(AlignmentOutcome::NoRules);
        }
        if scope.is_copy() {
            tracing::debug!("Not aligning {}, it is an alignment copy", scope.name);
            return Ok(AlignmentOutcome::CopiedScope);
        }
        if !scope.transitive {
            tracing::debug!("Not aligning {}, it is not transitive", scope.name);
            return Ok(AlignmentOutcome::NotTransitive);
        }

        let baseline_scope = self.resolver.copy_scope(scope, "Baseline");
        let baseline = self
            .resolver
            .resolve(&baseline_scope, &VersionOverrides::new())?;
        if !baseline.is_resolved() {
            let unresolved = baseline.unresolved().to_vec();
            tracing::warn!(
                "Resolution rules could not resolve all dependencies to align {}. \
                 This scope will not be aligned and the unresolved dependencies will surface in its resolution",
                scope.name
            );
            let names: Vec<String> = unresolved.iter().map(ToString::to_string).collect();
            tracing::info!("Unresolved dependencies in {}: {}", scope.name, names.join(", "));
            return Ok(AlignmentOutcome::Skipped { unresolved });
        }

        let all: Vec<usize> = (0..self.rules.len()).collect();
        let elected = self.elect_all(scope, &all, baseline.records(), None)?;
        let mut current = AlignedVersionAssignment {
            entries: elected
                .entries
                .into_iter()
                .filter(AlignedVersion::needs_alignment)
                .collect(),
        };
        if current.is_empty() {
            tracing::debug!("Dependencies of {} are already aligned", scope.name);
            return Ok(AlignmentOutcome::AlreadyAligned);
        }

        let active = current.rule_indices();
        let mut previous_records = baseline.records().to_vec();
        for pass in 1..=self.max_passes {
            let copy = self.resolver.copy_scope(scope, &format!("Pass{pass}"));
            let result = self.resolver.resolve(&copy, &current.overrides())?;
            if !result.is_resolved() {
                tracing::warn!(
                    "Aligned dependencies of {} could not all be resolved on pass {pass}",
                    scope.name
                );
                return Ok(AlignmentOutcome::Broken {
                    assignment: current,
                    passes: pass,
                    unresolved: result.unresolved().to_vec(),
                });
            }

            let next = self.elect_all(scope, &active, result.records(), Some(&previous_records))?;
            if next == current {
                tracing::debug!("Aligned {} to {current} in {pass} pass(es)", scope.name);
                return Ok(AlignmentOutcome::Aligned {
                    assignment: current,
                    passes: pass,
                });
            }
            current = next;
            previous_records = result.records().to_vec();
        }

        Err(SteerError::AlignmentNonConvergent {
            scope: scope.source_name().to_string(),
            passes: self.max_passes,
        }
        .into())
    }

    /// Elect every rule in `indices` that matches at least one record.
    fn elect_all(
        &self,
        scope: &DependencyScope,
        indices: &[usize],
        records: &[ResolvedDependencyRecord],
        previous: Option<&[ResolvedDependencyRecord]>,
    ) -> SteerResult<AlignedVersionAssignment> {
        let mut entries = Vec::new();
        for &rule_index in indices {
            let Some(rule) = self.rules.get(rule_index) else {
                continue;
            };
            let dependencies: Vec<ResolvedDependencyRecord> = records
                .iter()
                .filter(|r| rule.matches_module(&r.selected_module()))
                .cloned()
                .collect();
            if dependencies.is_empty() {
                continue;
            }
            let candidates: Vec<ModuleCoordinate> = dependencies
                .iter()
                .map(|r| candidate(r, previous))
                .collect();
            let elected = elect(rule, &candidates, scope)?;
            entries.push(AlignedVersion {
                rule_index,
                rule: Arc::clone(rule),
                version: elected.version,
                dependencies,
                warnings: elected.warnings,
            });
        }
        Ok(AlignedVersionAssignment { entries })
    }
}

/// The version a record contributes to an election.
///
/// When the previous pass selected the module only because it was requested
/// or won conflict resolution, the requested version is used so that an
/// override applied in this pass is not read back as the natural answer.
fn candidate(
    record: &ResolvedDependencyRecord,
    previous: Option<&[ResolvedDependencyRecord]>,
) -> ModuleCoordinate {
    let Some(previous) = previous else {
        return record.selected.clone();
    };
    let module = record.selected_module();
    let unconstrained = previous
        .iter()
        .find(|p| p.selected.is_module(&module))
        .is_some_and(|p| p.cause.is_expected() || p.cause.is_conflict_resolution());

    match record.requested.version.as_deref() {
        Some(requested)
            if unconstrained && record.requested.is_module(&module) && !is_dynamic(requested) =>
        {
            module.with_version(requested)
        }
        _ => record.selected.clone(),
    }
}
