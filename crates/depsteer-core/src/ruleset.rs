//! Rule documents, compiled rule sets, and merging of named rule sets.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use depsteer_util::errors::SteerError;

use crate::align::{AlignRule, AlignRuleSpec};
use crate::config::RulesConfig;
use crate::module::{ModuleCoordinate, ModuleId};
use crate::rules::{DenyRule, ExcludeRule, Provenance, RejectRule, ReplaceRule, SubstituteRule};

/// A rule document, as read from a JSON rule file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDocument {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub replace: Vec<ModuleRuleSpec>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub substitute: Vec<ModuleRuleSpec>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub reject: Vec<ModuleRuleSpec>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub deny: Vec<ModuleRuleSpec>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub exclude: Vec<ModuleRuleSpec>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub align: Vec<AlignRuleSpec>,
}

/// A replace/substitute/reject/deny/exclude entry in a rule document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRuleSpec {
    pub module: String,
    #[serde(default)]
    pub with: Option<String>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub date: String,
}

impl ModuleRuleSpec {
    fn provenance(&self, rule_set: &str) -> Provenance {
        Provenance {
            rule_set: rule_set.to_string(),
            reason: self.reason.clone(),
            author: self.author.clone(),
            date: self.date.clone(),
        }
    }

    fn with_notation(&self, kind: &str) -> Result<&str, SteerError> {
        self.with.as_deref().ok_or_else(|| SteerError::RuleSet {
            message: format!("{kind} rule for {} has no 'with' module", self.module),
        })
    }
}

/// Treat an explicit JSON `null` list the same as a missing one.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A compiled, named collection of rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub name: String,
    pub replace: Vec<ReplaceRule>,
    pub substitute: Vec<SubstituteRule>,
    pub reject: Vec<RejectRule>,
    pub deny: Vec<DenyRule>,
    pub exclude: Vec<ExcludeRule>,
    pub align: Vec<Arc<AlignRule>>,
}

impl RuleSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Compile a rule document. Every rule's provenance names `name`.
    pub fn from_document(name: &str, doc: &RuleDocument) -> Result<Self, SteerError> {
        let mut set = Self::new(name);
        for spec in &doc.replace {
            set.replace.push(ReplaceRule {
                module: parse_module_id(&spec.module)?,
                with: parse_module_id(spec.with_notation("replace")?)?,
                provenance: spec.provenance(name),
            });
        }
        for spec in &doc.substitute {
            set.substitute.push(SubstituteRule {
                module: parse_coordinate(&spec.module)?,
                with: parse_coordinate(spec.with_notation("substitute")?)?,
                provenance: spec.provenance(name),
            });
        }
        for spec in &doc.reject {
            set.reject.push(RejectRule {
                module: parse_coordinate(&spec.module)?,
                provenance: spec.provenance(name),
            });
        }
        for spec in &doc.deny {
            set.deny.push(DenyRule {
                module: parse_coordinate(&spec.module)?,
                provenance: spec.provenance(name),
            });
        }
        for spec in &doc.exclude {
            set.exclude.push(ExcludeRule {
                module: parse_module_id(&spec.module)?,
                provenance: spec.provenance(name),
            });
        }
        for spec in &doc.align {
            set.align.push(Arc::new(AlignRule::compile(spec, name)?));
        }
        Ok(set)
    }

    /// Parse and compile a JSON rule document.
    pub fn from_json_str(name: &str, json: &str) -> miette::Result<Self> {
        let doc: RuleDocument = serde_json::from_str(json).map_err(|e| SteerError::RuleSet {
            message: format!("Failed to parse rule set '{name}': {e}"),
        })?;
        Ok(Self::from_document(name, &doc)?)
    }

    /// Load a `.json` rule file; the rule set is named after the file stem.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = depsteer_util::fs::read_to_string(path)?;
        let name = depsteer_util::fs::file_stem(path);
        Self::from_json_str(&name, &content)
    }

    pub fn rule_count(&self) -> usize {
        self.replace.len()
            + self.substitute.len()
            + self.reject.len()
            + self.deny.len()
            + self.exclude.len()
            + self.align.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rule_count() == 0
    }

    /// Concatenate rule sets in order into one set called `name`.
    pub fn flatten<'a, I>(name: &str, sets: I) -> Self
    where
        I: IntoIterator<Item = &'a RuleSet>,
    {
        let mut merged = Self::new(name);
        for set in sets {
            merged.replace.extend(set.replace.iter().cloned());
            merged.substitute.extend(set.substitute.iter().cloned());
            merged.reject.extend(set.reject.iter().cloned());
            merged.deny.extend(set.deny.iter().cloned());
            merged.exclude.extend(set.exclude.iter().cloned());
            merged.align.extend(set.align.iter().cloned());
        }
        merged
    }
}

/// Rule sets keyed by name, in the order they were first added.
#[derive(Debug, Clone, Default)]
pub struct RuleSets {
    sets: Vec<RuleSet>,
}

impl RuleSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule set. A set with the same name as an existing one replaces it.
    pub fn add(&mut self, set: RuleSet) {
        if let Some(existing) = self.sets.iter_mut().find(|s| s.name == set.name) {
            tracing::warn!(
                "Found rules with the same name. Overriding existing rule set {}",
                set.name
            );
            *existing = set;
        } else {
            self.sets.push(set);
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.sets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleSet> {
        self.sets.iter()
    }

    /// Merge the rule sets selected by `config` into one.
    pub fn select(&self, config: &RulesConfig) -> RuleSet {
        if self.sets.is_empty() {
            tracing::warn!("No resolution rules have been loaded");
        }
        let selected = self.sets.iter().filter(|s| {
            let used = config.selects(&s.name);
            if !used {
                tracing::debug!("Skipping rule set {}", s.name);
            }
            used
        });
        RuleSet::flatten("merged", selected)
    }
}

fn parse_module_id(notation: &str) -> Result<ModuleId, SteerError> {
    ModuleId::parse(notation).ok_or_else(|| SteerError::RuleSet {
        message: format!("Unknown module syntax: {notation}"),
    })
}

fn parse_coordinate(notation: &str) -> Result<ModuleCoordinate, SteerError> {
    ModuleCoordinate::parse(notation).ok_or_else(|| SteerError::RuleSet {
        message: format!("Unknown module syntax: {notation}"),
    })
}
