//! Version selectors: the notation a dependency uses to ask for a version.
//!
//! A selector is classified once, when parsed:
//!
//! | Notation                      | Kind           |
//! |-------------------------------|----------------|
//! | `1.2.3`                       | `Exact`        |
//! | `[1.0,2.0)`, `]1.0,2.0[`      | `Range`        |
//! | `1.2.+`, `+`                  | `SubVersion`   |
//! | `latest.release`              | `Latest`       |
//! | `LATEST`, `RELEASE`           | `OtherDynamic` |
//!
//! Every kind except `Exact` is dynamic.

use std::cmp::Ordering;
use std::fmt;

use crate::version::{compare_versions, Interval, Version};

/// Classification of a selector, without its parsed payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectorKind {
    Exact,
    Range,
    SubVersion,
    Latest,
    OtherDynamic,
}

impl SelectorKind {
    /// Specificity rank used to choose between forced dynamic selectors.
    ///
    /// Higher is more specific. `OtherDynamic` has no rank.
    pub fn specificity(self) -> Option<u8> {
        match self {
            SelectorKind::Latest => Some(1),
            SelectorKind::SubVersion => Some(2),
            SelectorKind::Range => Some(3),
            SelectorKind::Exact => Some(4),
            SelectorKind::OtherDynamic => None,
        }
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Exact,
    Range(Interval),
    SubVersion { prefix: String },
    Latest { status: String },
    OtherDynamic,
}

/// A parsed version selector.
#[derive(Debug, Clone)]
pub struct VersionSelector {
    raw: String,
    matcher: Matcher,
}

impl VersionSelector {
    pub fn parse(selector: &str) -> Self {
        let raw = selector.trim().to_string();
        let matcher = if let Some(range) = Interval::parse(&raw) {
            Matcher::Range(range)
        } else if let Some(prefix) = raw.strip_suffix('+') {
            Matcher::SubVersion {
                prefix: prefix.to_string(),
            }
        } else if let Some(status) = raw.strip_prefix("latest.") {
            Matcher::Latest {
                status: status.to_string(),
            }
        } else if raw == "LATEST" || raw == "RELEASE" {
            Matcher::OtherDynamic
        } else {
            Matcher::Exact
        };
        Self { raw, matcher }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> SelectorKind {
        match self.matcher {
            Matcher::Exact => SelectorKind::Exact,
            Matcher::Range(_) => SelectorKind::Range,
            Matcher::SubVersion { .. } => SelectorKind::SubVersion,
            Matcher::Latest { .. } => SelectorKind::Latest,
            Matcher::OtherDynamic => SelectorKind::OtherDynamic,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind() != SelectorKind::Exact
    }

    /// Whether `candidate`, a concrete version, satisfies this selector.
    pub fn accept(&self, candidate: &str) -> bool {
        match &self.matcher {
            Matcher::Exact => self.raw == candidate,
            Matcher::Range(range) => range.contains(&Version::parse(candidate)),
            Matcher::SubVersion { prefix } => candidate.starts_with(prefix.as_str()),
            Matcher::Latest { status } => {
                status != "release" || !Version::parse(candidate).is_snapshot()
            }
            Matcher::OtherDynamic => match self.raw.as_str() {
                "RELEASE" => !Version::parse(candidate).is_snapshot(),
                _ => true,
            },
        }
    }

    /// Order two selectors by their version text.
    pub fn compare(&self, other: &Self) -> Ordering {
        compare_versions(&self.raw, &other.raw)
    }
}

impl PartialEq for VersionSelector {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for VersionSelector {}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Whether a version string is a dynamic selector rather than a concrete version.
pub fn is_dynamic(version: &str) -> bool {
    VersionSelector::parse(version).is_dynamic()
}
