use std::fmt;

/// A module identity: `organization:name`, without a version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId {
    pub organization: String,
    pub name: String,
}

impl ModuleId {
    pub fn new(organization: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            name: name.into(),
        }
    }

    /// Parse `"organization:name"`. Both parts must be non-empty.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [org, name] if !org.is_empty() && !name.is_empty() => Some(Self::new(*org, *name)),
            _ => None,
        }
    }

    pub fn with_version(&self, version: impl Into<String>) -> ModuleCoordinate {
        ModuleCoordinate {
            organization: self.organization.clone(),
            name: self.name.clone(),
            version: Some(version.into()),
        }
    }

    /// `organization:name`.
    pub fn coordinates(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.organization, self.name)
    }
}

/// A module identity plus an optional version (or version selector).
///
/// Identity is `(organization, name)`; the version is contextual.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleCoordinate {
    pub organization: String,
    pub name: String,
    pub version: Option<String>,
}

impl ModuleCoordinate {
    pub fn new(
        organization: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        let version = version.into();
        Self {
            organization: organization.into(),
            name: name.into(),
            version: if version.is_empty() { None } else { Some(version) },
        }
    }

    /// Parse `"organization:name"` or `"organization:name:version"`.
    ///
    /// An empty trailing version (`"g:a:"`) is treated as no version.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [org, name] if !org.is_empty() && !name.is_empty() => {
                Some(Self::new(*org, *name, ""))
            }
            [org, name, version] if !org.is_empty() && !name.is_empty() => {
                Some(Self::new(*org, *name, *version))
            }
            _ => None,
        }
    }

    pub fn module(&self) -> ModuleId {
        ModuleId::new(self.organization.clone(), self.name.clone())
    }

    pub fn has_version(&self) -> bool {
        self.version.is_some()
    }

    pub fn version_str(&self) -> &str {
        self.version.as_deref().unwrap_or("")
    }

    /// Whether this coordinate refers to `module`, ignoring version.
    pub fn is_module(&self, module: &ModuleId) -> bool {
        self.organization == module.organization && self.name == module.name
    }

    /// `organization:name` or `organization:name:version`.
    pub fn coordinates(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ModuleCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}:{}:{}", self.organization, self.name, v),
            None => write!(f, "{}:{}", self.organization, self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_module_id() {
        let id = ModuleId::parse("com.example:lib").unwrap();
        assert_eq!(id.organization, "com.example");
        assert_eq!(id.name, "lib");
        assert_eq!(id.coordinates(), "com.example:lib");
    }

    #[test]
    fn module_id_rejects_other_shapes() {
        assert!(ModuleId::parse("com.example").is_none());
        assert!(ModuleId::parse("com.example:lib:1.0").is_none());
        assert!(ModuleId::parse(":lib").is_none());
    }

    #[test]
    fn coordinate_with_and_without_version() {
        let c = ModuleCoordinate::parse("g:a:1.0").unwrap();
        assert_eq!(c.version.as_deref(), Some("1.0"));
        assert_eq!(c.to_string(), "g:a:1.0");

        let c = ModuleCoordinate::parse("g:a").unwrap();
        assert!(!c.has_version());
        assert_eq!(c.to_string(), "g:a");

        let c = ModuleCoordinate::parse("g:a:").unwrap();
        assert!(!c.has_version());
    }

    #[test]
    fn coordinate_rejects_four_parts() {
        assert!(ModuleCoordinate::parse("g:a:1.0:jdk8").is_none());
        assert!(ModuleCoordinate::parse("").is_none());
    }

    #[test]
    fn coordinate_identity_is_module() {
        let c = ModuleCoordinate::parse("g:a:1.0").unwrap();
        assert_eq!(c.module(), ModuleId::new("g", "a"));
        assert!(c.is_module(&ModuleId::new("g", "a")));
        assert!(!c.is_module(&ModuleId::new("g", "b")));
    }
}
