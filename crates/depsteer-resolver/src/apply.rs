//! Single-pass rules: deny checks and strategy registration.
//!
//! Each rule is evaluated exactly once per scope, before alignment. Replace,
//! substitute, reject and exclude rules become entries in the scope's
//! [`ResolutionStrategy`](depsteer_core::scope::ResolutionStrategy) which the
//! graph resolver honours on every pass.

use depsteer_core::rules::DenyRule;
use depsteer_core::ruleset::RuleSet;
use depsteer_core::scope::{DependencyScope, Exclusion, Rejection, Replacement, Substitution};
use depsteer_util::errors::SteerError;

/// Fail if any directly declared dependency matches a deny rule.
pub fn check_denied(scope: &DependencyScope, rules: &[DenyRule]) -> Result<(), SteerError> {
    for dependency in &scope.dependencies {
        if let Some(rule) = rules.iter().find(|r| r.denies(&dependency.coordinate)) {
            return Err(SteerError::DependencyDenied {
                coordinate: dependency.coordinate.to_string(),
                rule_set: rule.provenance.rule_set.clone(),
                reason: rule.provenance.reason.clone(),
                author: rule.provenance.author.clone(),
            });
        }
    }
    Ok(())
}

/// Register the replace, substitute, reject and exclude rules on `scope`.
pub fn apply_rules(scope: &mut DependencyScope, rules: &RuleSet) -> Result<(), SteerError> {
    let strategy = &mut scope.strategy;

    for rule in &rules.replace {
        strategy.replacements.push(Replacement {
            module: rule.module.clone(),
            with: rule.with.clone(),
            reason: format!(
                "replaced {} with {} {}",
                rule.module,
                rule.with,
                rule.provenance.justification()
            ),
        });
    }

    for rule in &rules.substitute {
        if !rule.with.has_version() {
            return Err(SteerError::SubstituteMissingVersion {
                coordinate: rule.with.to_string(),
                rule_set: rule.provenance.rule_set.clone(),
                reason: rule.provenance.reason.clone(),
                author: rule.provenance.author.clone(),
            });
        }
        strategy.substitutions.push(Substitution {
            from: rule.module.clone(),
            to: rule.with.clone(),
            reason: format!(
                "substituted {} with {} {}",
                rule.module,
                rule.with,
                rule.provenance.justification()
            ),
        });
    }

    for rule in &rules.reject {
        strategy.rejections.push(Rejection {
            module: rule.module.clone(),
            reason: format!("rejected {}", rule.provenance.justification()),
        });
    }

    for rule in &rules.exclude {
        strategy.exclusions.push(Exclusion {
            module: rule.module.clone(),
            reason: format!("excluded {}", rule.provenance.justification()),
        });
    }

    tracing::debug!(
        "Applied {} replace, {} substitute, {} reject and {} exclude rules to {}",
        rules.replace.len(),
        rules.substitute.len(),
        rules.reject.len(),
        rules.exclude.len(),
        scope.name
    );
    Ok(())
}
