use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use depsteer_util::errors::SteerError;

use crate::config::{AlignmentConfig, RulesConfig};
use crate::module::ModuleCoordinate;
use crate::scope::{DeclaredDependency, DependencyScope};

/// File name of the project manifest.
pub const MANIFEST_FILE: &str = "Steer.toml";

/// The parsed representation of a `Steer.toml` file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// JSON rule documents, relative to the manifest's directory.
    #[serde(default, rename = "rule-files")]
    pub rule_files: Vec<String>,

    #[serde(default)]
    pub rules: RulesConfig,

    #[serde(default)]
    pub alignment: AlignmentConfig,

    #[serde(default, rename = "scope")]
    pub scopes: Vec<ScopeEntry>,

    /// The module catalog the local resolver draws versions from.
    #[serde(default, rename = "module")]
    pub modules: Vec<ModuleEntry>,
}

/// A `[[scope]]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeEntry {
    pub name: String,
    #[serde(default = "default_transitive")]
    pub transitive: bool,
    #[serde(default)]
    pub dependencies: Vec<DependencyEntry>,
    /// Strategy-level forced versions (`"group:name:version"`).
    #[serde(default)]
    pub forces: Vec<String>,
}

fn default_transitive() -> bool {
    true
}

/// A declared dependency: `"group:name:version"` or a table with `force`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyEntry {
    Short(String),
    Detailed {
        coordinate: String,
        #[serde(default)]
        force: bool,
    },
}

/// A `[[module]]` table: one published version of a module and what it depends on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleEntry {
    pub id: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl ModuleEntry {
    /// The module's coordinate, which must carry a version.
    pub fn coordinate(&self) -> Result<ModuleCoordinate, SteerError> {
        parse_coordinate(&self.id)
            .and_then(|c| {
                if c.has_version() {
                    Ok(c)
                } else {
                    Err(manifest_error(format!("Module {} has no version", self.id)))
                }
            })
    }

    pub fn dependency_coordinates(&self) -> Result<Vec<ModuleCoordinate>, SteerError> {
        self.dependencies.iter().map(|d| parse_coordinate(d)).collect()
    }
}

impl ScopeEntry {
    pub fn to_scope(&self) -> Result<DependencyScope, SteerError> {
        let mut scope = DependencyScope::new(self.name.clone());
        scope.transitive = self.transitive;
        for entry in &self.dependencies {
            let dependency = match entry {
                DependencyEntry::Short(s) => DeclaredDependency::new(parse_coordinate(s)?),
                DependencyEntry::Detailed { coordinate, force } => DeclaredDependency {
                    coordinate: parse_coordinate(coordinate)?,
                    force: *force,
                },
            };
            scope.dependencies.push(dependency);
        }
        for force in &self.forces {
            scope.strategy.forced_modules.push(parse_coordinate(force)?);
        }
        Ok(scope)
    }
}

impl Manifest {
    /// Load and parse a `Steer.toml` file from the given path.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SteerError::Manifest {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::parse_toml(&content)
    }

    /// Parse a `Steer.toml` from a string.
    pub fn parse_toml(content: &str) -> miette::Result<Self> {
        toml::from_str(content).map_err(|e| {
            SteerError::Manifest {
                message: format!("Failed to parse Steer.toml: {e}"),
            }
            .into()
        })
    }

    /// All declared scopes, converted.
    pub fn dependency_scopes(&self) -> Result<Vec<DependencyScope>, SteerError> {
        self.scopes.iter().map(ScopeEntry::to_scope).collect()
    }

    /// Rule file paths resolved against the manifest directory.
    pub fn rule_paths(&self, project_root: &Path) -> Vec<PathBuf> {
        self.rule_files.iter().map(|f| project_root.join(f)).collect()
    }
}

fn parse_coordinate(notation: &str) -> Result<ModuleCoordinate, SteerError> {
    ModuleCoordinate::parse(notation)
        .ok_or_else(|| manifest_error(format!("Unknown module syntax: {notation}")))
}

fn manifest_error(message: String) -> SteerError {
    SteerError::Manifest { message }
}
