//! Version election: the single version an align rule's modules should share.

use std::collections::BTreeSet;

use depsteer_core::align::AlignRule;
use depsteer_core::module::{ModuleCoordinate, ModuleId};
use depsteer_core::scope::DependencyScope;
use depsteer_core::selector::{is_dynamic, SelectorKind, VersionSelector};
use depsteer_core::version::{max_version, min_version};
use depsteer_util::errors::{SteerError, SteerResult};

/// The outcome of one election.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElectedVersion {
    pub version: String,
    /// Versions the rule's `match` pattern could not transform.
    pub warnings: Vec<String>,
}

/// Elect the aligned version for `rule` among the `matched` coordinates.
///
/// Without forces this is the highest (match-transformed) version. Static
/// forces on any matched module win with the lowest of them; otherwise the
/// most specific dynamic force decides.
pub fn elect(
    rule: &AlignRule,
    matched: &[ModuleCoordinate],
    scope: &DependencyScope,
) -> SteerResult<ElectedVersion> {
    if matched.iter().any(|c| is_dynamic(c.version_str())) {
        let resolved: Vec<&str> = matched.iter().map(ModuleCoordinate::version_str).collect();
        return Err(SteerError::DynamicVersionInElection {
            rule: rule.to_string(),
            versions: format!("[{}]", resolved.join(", ")),
        }
        .into());
    }

    let mut warnings = Vec::new();
    let versions: Vec<String> = matched
        .iter()
        .map(|c| transform(rule, c.version_str(), &mut warnings))
        .collect();

    let highest = max_version(versions.iter().map(String::as_str))
        .ok_or_else(|| SteerError::Generic {
            message: format!("No resolved versions to elect from for {rule}"),
        })?
        .to_string();

    let modules: BTreeSet<ModuleId> = matched.iter().map(ModuleCoordinate::module).collect();
    let forces: Vec<String> = modules
        .iter()
        .flat_map(|m| scope.forced_versions(m))
        .collect();

    let version = if forces.is_empty() {
        highest
    } else {
        elect_forced(rule, &forces, &versions, highest)?
    };
    tracing::debug!("Elected {version} for {rule} in {}", scope.name);
    Ok(ElectedVersion { version, warnings })
}

fn transform(rule: &AlignRule, version: &str, warnings: &mut Vec<String>) -> String {
    let Some(pattern) = &rule.match_transform else {
        return version.to_string();
    };
    match pattern.apply(version) {
        Some(matched) => matched,
        None => {
            if !is_dynamic(version) {
                let warning = format!(
                    "Version {version} did not match '{}' of {rule}, using it unmodified",
                    pattern.source()
                );
                tracing::warn!("{warning}");
                warnings.push(warning);
            }
            version.to_string()
        }
    }
}

fn elect_forced(
    rule: &AlignRule,
    forces: &[String],
    versions: &[String],
    highest: String,
) -> SteerResult<String> {
    let (dynamic, fixed): (Vec<&str>, Vec<&str>) = forces
        .iter()
        .map(String::as_str)
        .partition(|f| is_dynamic(f));

    if let Some(lowest) = min_version(fixed) {
        return Ok(lowest.to_string());
    }

    let mut best: Option<(u8, VersionSelector)> = None;
    for force in dynamic {
        let selector = VersionSelector::parse(force);
        let rank = selector
            .kind()
            .specificity()
            .ok_or_else(|| SteerError::UnsupportedSelector {
                selector: force.to_string(),
                rule: rule.to_string(),
            })?;
        if best.as_ref().map_or(true, |(r, _)| rank > *r) {
            best = Some((rank, selector));
        }
    }
    let Some((_, selector)) = best else {
        return Ok(highest);
    };

    if selector.kind() == SelectorKind::Latest {
        return Ok(highest);
    }
    max_version(
        versions
            .iter()
            .map(String::as_str)
            .filter(|v| selector.accept(v)),
    )
    .map(str::to_string)
    .ok_or_else(|| {
        SteerError::ForceSelectorUnsatisfied {
            selector: selector.to_string(),
            rule: rule.to_string(),
        }
        .into()
    })
}
