//! Rule orchestration for whole scopes.
//!
//! Per scope: deny check on declared dependencies, single-pass rules into the
//! resolution strategy, alignment, then the final resolution with the stable
//! alignment overrides applied.

use rayon::prelude::*;

use depsteer_core::config::AlignmentConfig;
use depsteer_core::ruleset::RuleSet;
use depsteer_core::scope::DependencyScope;
use depsteer_util::errors::SteerResult;

use crate::adapter::{GraphResolver, ResolutionResult};
use crate::alignment::{AlignmentEngine, AlignmentOutcome};
use crate::apply::{apply_rules, check_denied};
use crate::graph::DependencyGraph;
use crate::insight::Insight;

/// Everything known about one scope after rules were applied.
#[derive(Debug, Clone)]
pub struct ScopeReport {
    pub scope: String,
    pub outcome: AlignmentOutcome,
    pub resolution: ResolutionResult,
    pub insight: Insight,
}

impl ScopeReport {
    pub fn is_resolved(&self) -> bool {
        self.resolution.is_resolved()
    }

    pub fn graph(&self) -> DependencyGraph {
        DependencyGraph::from_resolution(&self.scope, &self.resolution)
    }
}

/// Applies a merged rule set to scopes through a [`GraphResolver`].
pub struct RuleEngine<R> {
    resolver: R,
    rules: RuleSet,
    config: AlignmentConfig,
}

impl<R: GraphResolver> RuleEngine<R> {
    pub fn new(resolver: R, rules: RuleSet) -> Self {
        Self {
            resolver,
            rules,
            config: AlignmentConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AlignmentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Deny check plus single-pass rules, on a copy of `scope`.
    pub fn prepare(&self, scope: &DependencyScope) -> SteerResult<DependencyScope> {
        check_denied(scope, &self.rules.deny)?;
        let mut prepared = scope.clone();
        apply_rules(&mut prepared, &self.rules)?;
        Ok(prepared)
    }

    /// Run alignment on an already prepared scope.
    pub fn align(&self, scope: &DependencyScope) -> SteerResult<AlignmentOutcome> {
        if !self.config.enabled {
            return Ok(AlignmentOutcome::Disabled);
        }
        AlignmentEngine::new(&self.resolver, self.rules.align.clone())
            .with_max_passes(self.config.max_passes)
            .align(scope)
    }

    pub fn resolve(&self, scope: &DependencyScope) -> SteerResult<ScopeReport> {
        let prepared = self.prepare(scope)?;
        let outcome = self.align(&prepared)?;
        let overrides = outcome.overrides();
        let resolution = self.resolver.resolve(&prepared, &overrides)?;

        if let Some(assignment) = outcome.assignment() {
            for entry in assignment.entries() {
                tracing::debug!("{}: {}", prepared.name, entry.reason());
            }
        }
        let insight = Insight::from_records(&prepared.name, resolution.records());
        Ok(ScopeReport {
            scope: prepared.name,
            outcome,
            resolution,
            insight,
        })
    }

    /// Resolve independent scopes in parallel. Reports come back in input
    /// order; the first error aborts the batch.
    pub fn resolve_all(&self, scopes: &[DependencyScope]) -> SteerResult<Vec<ScopeReport>> {
        scopes.par_iter().map(|scope| self.resolve(scope)).collect()
    }
}
