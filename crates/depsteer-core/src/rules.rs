//! The single-pass resolution rules and the provenance every rule carries.
//!
//! Alignment rules live in [`crate::align`]; everything here is applied once
//! per scope before alignment starts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::module::{ModuleCoordinate, ModuleId};

/// Where a rule came from and why it exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Name of the rule set the rule was loaded from.
    #[serde(default, rename = "ruleSet")]
    pub rule_set: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub date: String,
}

impl Provenance {
    pub fn new(rule_set: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            rule_set: rule_set.into(),
            reason: reason.into(),
            ..Self::default()
        }
    }

    /// `by <rule set> (<reason>)`, used in justification messages.
    pub fn justification(&self) -> String {
        if self.reason.is_empty() {
            format!("by {}", self.rule_set)
        } else {
            format!("by {} ({})", self.rule_set, self.reason)
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule set {}", self.rule_set)?;
        if !self.reason.is_empty() {
            write!(f, ", reason: {}", self.reason)?;
        }
        if !self.author.is_empty() {
            write!(f, ", author: {}", self.author)?;
        }
        Ok(())
    }
}

/// Declares that `module` has been superseded by `with`; when both appear in
/// a graph, `with` wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceRule {
    pub module: ModuleId,
    pub with: ModuleId,
    pub provenance: Provenance,
}

/// Swap every request for `module` (optionally only one version of it) for
/// the `with` coordinate. `with` must carry a version by the time the rule is
/// applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstituteRule {
    pub module: ModuleCoordinate,
    pub with: ModuleCoordinate,
    pub provenance: Provenance,
}

/// Never select `module` (or only the given version of it) as a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectRule {
    pub module: ModuleCoordinate,
    pub provenance: Provenance,
}

/// Fail the build if `module` (or only the given version of it) is declared
/// directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenyRule {
    pub module: ModuleCoordinate,
    pub provenance: Provenance,
}

impl DenyRule {
    /// Whether a directly declared coordinate is denied by this rule.
    pub fn denies(&self, declared: &ModuleCoordinate) -> bool {
        declared.organization == self.module.organization
            && declared.name == self.module.name
            && self
                .module
                .version
                .as_deref()
                .map_or(true, |v| declared.version.as_deref() == Some(v))
    }
}

/// Drop `module` from the scope, wherever it is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludeRule {
    pub module: ModuleId,
    pub provenance: Provenance,
}
