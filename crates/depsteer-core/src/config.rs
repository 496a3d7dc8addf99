use serde::{Deserialize, Deserializer, Serialize};

/// Default upper bound on alignment stabilisation passes.
pub const DEFAULT_MAX_PASSES: usize = 5;

/// Prefix marking a rule set as opt-in.
pub const OPTIONAL_PREFIX: &str = "optional-";

/// Rule-set selection from `[rules]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Only these rule sets are used, when non-empty.
    #[serde(default)]
    pub include: Vec<String>,
    /// These rule sets are never used.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Opt-in rule sets, named without their `optional-` prefix.
    #[serde(default)]
    pub optional: Vec<String>,
}

impl RulesConfig {
    /// Whether the rule set called `name` takes part in resolution.
    pub fn selects(&self, name: &str) -> bool {
        if let Some(short) = name.strip_prefix(OPTIONAL_PREFIX) {
            return self.optional.iter().any(|o| o == short) && !self.is_excluded(name);
        }
        (self.include.is_empty() || self.include.iter().any(|i| i == name))
            && !self.is_excluded(name)
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.exclude.iter().any(|e| e == name)
    }
}

/// Alignment settings from `[alignment]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(
        default = "default_max_passes",
        rename = "max-passes",
        deserialize_with = "at_least_one_pass"
    )]
    pub max_passes: usize,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_passes: default_max_passes(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_max_passes() -> usize {
    DEFAULT_MAX_PASSES
}

fn at_least_one_pass<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let passes = usize::deserialize(deserializer)?;
    if passes == 0 {
        return Err(serde::de::Error::custom("max-passes must be at least 1"));
    }
    Ok(passes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_include_selects_everything_not_optional() {
        let cfg = RulesConfig::default();
        assert!(cfg.selects("platform"));
        assert!(!cfg.selects("optional-strict"));
    }

    #[test]
    fn include_restricts() {
        let cfg = RulesConfig {
            include: vec!["platform".to_string()],
            ..RulesConfig::default()
        };
        assert!(cfg.selects("platform"));
        assert!(!cfg.selects("security"));
    }

    #[test]
    fn exclude_wins_over_include() {
        let cfg = RulesConfig {
            include: vec!["platform".to_string()],
            exclude: vec!["platform".to_string()],
            ..RulesConfig::default()
        };
        assert!(!cfg.selects("platform"));
    }

    #[test]
    fn optional_sets_are_opt_in_by_short_name() {
        let cfg = RulesConfig {
            optional: vec!["strict".to_string()],
            ..RulesConfig::default()
        };
        assert!(cfg.selects("optional-strict"));
        assert!(!cfg.selects("optional-lenient"));
    }

    #[test]
    fn alignment_defaults() {
        let cfg: AlignmentConfig = toml::from_str("").unwrap();
        assert!(cfg.enabled);
        assert_eq!(cfg.max_passes, DEFAULT_MAX_PASSES);
    }

    #[test]
    fn zero_max_passes_is_rejected() {
        let err = toml::from_str::<AlignmentConfig>("max-passes = 0").unwrap_err();
        assert!(err.to_string().contains("max-passes must be at least 1"));

        let cfg: AlignmentConfig = toml::from_str("max-passes = 2").unwrap();
        assert_eq!(cfg.max_passes, 2);
    }
}
