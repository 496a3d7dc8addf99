use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all depsteer operations.
#[derive(Debug, Error, Diagnostic)]
pub enum SteerError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed project manifest (e.g. Steer.toml).
    #[error("Manifest error: {message}")]
    #[diagnostic(help("Check your Steer.toml for syntax errors"))]
    Manifest { message: String },

    /// Malformed rule document, rule pattern, or module notation.
    #[error("Rule set error: {message}")]
    #[diagnostic(help("Check the rule file for invalid module notation or regular expressions"))]
    RuleSet { message: String },

    /// A directly declared dependency matched a deny rule.
    #[error("Dependency {coordinate} denied by dependency rule: {reason} (rule set {rule_set}, author {author})")]
    DependencyDenied {
        coordinate: String,
        rule_set: String,
        reason: String,
        author: String,
    },

    /// A substitute rule names a replacement without a version.
    #[error("The dependency to be substituted ({coordinate}) must have a version. Invalid rule in rule set {rule_set}: {reason} (author: {author})")]
    #[diagnostic(help("Give the substitution target a version, e.g. group:name:1.0"))]
    SubstituteMissingVersion {
        coordinate: String,
        rule_set: String,
        reason: String,
        author: String,
    },

    /// Alignment did not reach a fixed point within the pass limit.
    #[error("The maximum number of alignment passes were attempted ({passes}) for {scope}")]
    #[diagnostic(help("Two align rules may match overlapping modules and disagree on the version"))]
    AlignmentNonConvergent { scope: String, passes: usize },

    /// A dynamic selector reached version election for an align rule.
    #[error("A dynamic version was included in {versions} for {rule}")]
    DynamicVersionInElection { rule: String, versions: String },

    /// A forced dynamic selector kind cannot be ranked by specificity.
    #[error("Unknown selector type {selector} forced for {rule}")]
    UnsupportedSelector { selector: String, rule: String },

    /// No aligned candidate satisfies the most specific forced selector.
    #[error("No aligned version satisfies forced selector {selector} for {rule}")]
    ForceSelectorUnsatisfied { selector: String, rule: String },

    /// The graph resolution service failed outright.
    #[error("Dependency resolution failed: {message}")]
    Resolution { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type SteerResult<T> = miette::Result<T>;
