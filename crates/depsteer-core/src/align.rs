//! Align rules: which modules belong together and must share one version.
//!
//! Patterns are compiled once, when the rule is built, into anchored
//! [`Regex`]es. `Regex` matching does not mutate the pattern, so one rule can
//! be matched from any number of threads at once.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use depsteer_util::errors::SteerError;

use crate::module::ModuleId;
use crate::rules::Provenance;

/// Name of the built-in `match` transform that strips qualifiers.
pub const EXCLUDE_SUFFIXES: &str = "EXCLUDE_SUFFIXES";

const EXCLUDE_SUFFIXES_PATTERN: &str = r"^(\d+\.)?(\d+\.)?(\*|\d+)";

/// An align rule as written in a rule document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignRuleSpec {
    #[serde(default)]
    pub name: Option<String>,
    pub group: String,
    #[serde(default, deserialize_with = "crate::ruleset::null_as_empty")]
    pub includes: Vec<String>,
    #[serde(default, deserialize_with = "crate::ruleset::null_as_empty")]
    pub excludes: Vec<String>,
    #[serde(default, rename = "match")]
    pub match_pattern: Option<String>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub date: String,
}

/// Extracts the comparable part of a version before election.
#[derive(Debug, Clone)]
pub struct MatchTransform {
    source: String,
    pattern: Regex,
}

impl MatchTransform {
    /// Build from a named transform or a raw regular expression.
    pub fn parse(source: &str) -> Result<Self, SteerError> {
        let pattern = match source {
            EXCLUDE_SUFFIXES => EXCLUDE_SUFFIXES_PATTERN,
            other => other,
        };
        Ok(Self {
            source: source.to_string(),
            pattern: compile(pattern, false)?,
        })
    }

    /// The first match of the pattern in `version`, if any.
    pub fn apply(&self, version: &str) -> Option<String> {
        self.pattern
            .find(version)
            .map(|m| m.as_str().to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// A compiled align rule.
#[derive(Debug, Clone)]
pub struct AlignRule {
    pub name: Option<String>,
    group_source: String,
    group: Regex,
    includes: Vec<Regex>,
    excludes: Vec<Regex>,
    pub match_transform: Option<MatchTransform>,
    pub provenance: Provenance,
}

impl AlignRule {
    /// Compile a rule document entry. `rule_set` becomes part of its provenance.
    pub fn compile(spec: &AlignRuleSpec, rule_set: &str) -> Result<Self, SteerError> {
        Ok(Self {
            name: spec.name.clone(),
            group_source: spec.group.clone(),
            group: compile(&spec.group, true)?,
            includes: spec
                .includes
                .iter()
                .map(|p| compile(p, true))
                .collect::<Result<_, _>>()?,
            excludes: spec
                .excludes
                .iter()
                .map(|p| compile(p, true))
                .collect::<Result<_, _>>()?,
            match_transform: spec
                .match_pattern
                .as_deref()
                .map(MatchTransform::parse)
                .transpose()?,
            provenance: Provenance {
                rule_set: rule_set.to_string(),
                reason: spec.reason.clone(),
                author: spec.author.clone(),
                date: spec.date.clone(),
            },
        })
    }

    /// Whether the module `group:name` belongs to this rule's alignment group.
    ///
    /// The group must match; the name must match an include (if any are
    /// configured) and no exclude.
    pub fn matches(&self, group: &str, name: &str) -> bool {
        self.group.is_match(group)
            && (self.includes.is_empty() || self.includes.iter().any(|p| p.is_match(name)))
            && !self.excludes.iter().any(|p| p.is_match(name))
    }

    pub fn matches_module(&self, module: &ModuleId) -> bool {
        self.matches(&module.organization, &module.name)
    }

    pub fn group_pattern(&self) -> &str {
        &self.group_source
    }
}

impl fmt::Display for AlignRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "align rule '{name}'")?,
            None => write!(f, "align rule for group '{}'", self.group_source)?,
        }
        write!(f, " ({})", self.provenance)
    }
}

/// Compile `pattern`, anchoring it so it must match the whole input.
fn compile(pattern: &str, anchored: bool) -> Result<Regex, SteerError> {
    let source = if anchored {
        format!("^(?:{pattern})$")
    } else {
        pattern.to_string()
    };
    Regex::new(&source).map_err(|e| SteerError::RuleSet {
        message: format!("Invalid pattern '{pattern}': {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(group: &str, includes: &[&str], excludes: &[&str]) -> AlignRule {
        let spec = AlignRuleSpec {
            group: group.to_string(),
            includes: includes.iter().map(|s| s.to_string()).collect(),
            excludes: excludes.iter().map(|s| s.to_string()).collect(),
            ..AlignRuleSpec::default()
        };
        AlignRule::compile(&spec, "test-rules").unwrap()
    }

    #[test]
    fn group_must_match_entirely() {
        let r = rule("com.fasterxml.jackson.core", &[], &[]);
        assert!(r.matches("com.fasterxml.jackson.core", "jackson-databind"));
        assert!(!r.matches("com.fasterxml.jackson.core.extra", "jackson-databind"));
        assert!(!r.matches("xcom.fasterxml.jackson.core", "jackson-databind"));
    }

    #[test]
    fn group_regex() {
        let r = rule(r"com\.netflix\..*", &[], &[]);
        assert!(r.matches("com.netflix.ribbon", "ribbon-core"));
        assert!(!r.matches("com.google", "guava"));
    }

    #[test]
    fn includes_restrict_names() {
        let r = rule("g", &["a", "b.*"], &[]);
        assert!(r.matches("g", "a"));
        assert!(r.matches("g", "b-extra"));
        assert!(!r.matches("g", "c"));
        assert!(!r.matches("g", "ab"));
    }

    #[test]
    fn excludes_remove_names() {
        let r = rule("g", &[], &["internal-.*"]);
        assert!(r.matches("g", "a"));
        assert!(!r.matches("g", "internal-tools"));
    }

    #[test]
    fn invalid_pattern_is_a_rule_set_error() {
        let spec = AlignRuleSpec {
            group: "g(".to_string(),
            ..AlignRuleSpec::default()
        };
        let err = AlignRule::compile(&spec, "broken").unwrap_err();
        assert!(err.to_string().contains("Invalid pattern"), "got: {err}");
    }

    #[test]
    fn exclude_suffixes_transform() {
        let t = MatchTransform::parse(EXCLUDE_SUFFIXES).unwrap();
        assert_eq!(t.apply("1.2.3-rc1").as_deref(), Some("1.2.3"));
        assert_eq!(t.apply("2.9.10.1").as_deref(), Some("2.9.10"));
        assert_eq!(t.apply("final"), None);
    }

    #[test]
    fn raw_regex_transform_takes_first_match() {
        let t = MatchTransform::parse(r"\d+\.\d+").unwrap();
        assert_eq!(t.apply("v1.2.3").as_deref(), Some("1.2"));
    }

    #[test]
    fn matching_is_shareable_across_threads() {
        let r = std::sync::Arc::new(rule("g", &["a.*"], &["ab"]));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let r = r.clone();
                std::thread::spawn(move || {
                    (0..500).all(|_| {
                        r.matches("g", &format!("a{i}")) && !r.matches("g", "ab")
                    })
                })
            })
            .collect();
        for h in handles {
            assert!(h.join().unwrap());
        }
    }
}
