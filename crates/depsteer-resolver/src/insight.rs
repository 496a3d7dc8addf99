//! Per-scope record of why modules ended up where they did.

use std::collections::BTreeMap;
use std::fmt;

use crate::adapter::{ResolvedDependencyRecord, SelectionCause};

/// Human-readable reasons keyed by `org:name`.
#[derive(Debug, Clone, Default)]
pub struct Insight {
    pub scope: String,
    reasons: BTreeMap<String, Vec<String>>,
}

impl Insight {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            reasons: BTreeMap::new(),
        }
    }

    /// Collect the rule-driven selections among `records`, keyed by the
    /// requested module.
    pub fn from_records(scope: impl Into<String>, records: &[ResolvedDependencyRecord]) -> Self {
        let mut insight = Self::new(scope);
        for record in records {
            if let SelectionCause::Other(reason) = &record.cause {
                insight.add(record.requested.module().to_string(), reason.clone());
            }
        }
        insight
    }

    pub fn add(&mut self, module: impl Into<String>, reason: impl Into<String>) {
        let reason = reason.into();
        let entry = self.reasons.entry(module.into()).or_default();
        if !entry.contains(&reason) {
            entry.push(reason);
        }
    }

    pub fn reasons_for(&self, module: &str) -> &[String] {
        self.reasons.get(module).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.reasons.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }

    pub fn len(&self) -> usize {
        self.reasons.len()
    }
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reasons.is_empty() {
            return write!(f, "No rule actions in {}.", self.scope);
        }
        writeln!(f, "Rule actions in {} ({}):", self.scope, self.reasons.len())?;
        for (module, reasons) in &self.reasons {
            writeln!(f, "  {module}: {}", reasons.join("; "))?;
        }
        Ok(())
    }
}
