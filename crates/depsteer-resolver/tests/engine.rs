use std::sync::atomic::{AtomicUsize, Ordering};

use depsteer_core::config::AlignmentConfig;
use depsteer_core::module::ModuleId;
use depsteer_core::ruleset::RuleSet;
use depsteer_core::scope::DependencyScope;
use depsteer_resolver::adapter::{GraphResolver, ResolutionResult, VersionOverrides};
use depsteer_resolver::alignment::AlignmentOutcome;
use depsteer_resolver::catalog::{Catalog, CatalogResolver};
use depsteer_resolver::engine::RuleEngine;
use depsteer_util::errors::{SteerError, SteerResult};

const PLATFORM_RULES: &str = r#"{
    "replace": [],
    "substitute": [
        { "module": "h:legacy:1.0", "with": "g:b:1.2", "reason": "legacy moved into g", "author": "Platform Team", "date": "2024-01-01" }
    ],
    "reject": [
        { "module": "g:a:1.1", "reason": "broken release", "author": "Platform Team", "date": "2024-01-01" }
    ],
    "deny": [
        { "module": "bad:lib:6.6", "reason": "licence", "author": "Legal", "date": "2024-01-01" }
    ],
    "exclude": null,
    "align": [
        { "name": "g family", "group": "g", "reason": "align g", "author": "Platform Team", "date": "2024-01-01" }
    ]
}"#;

fn resolver() -> CatalogResolver {
    CatalogResolver::new(
        Catalog::new()
            .with_module("g:a:1.0", &[])
            .with_module("g:a:1.1", &[])
            .with_module("g:a:1.2", &[])
            .with_module("g:b:1.0", &[])
            .with_module("g:b:1.2", &[])
            .with_module("h:legacy:1.0", &[])
            .with_module("h:x:1.0", &["g:a:1.0"])
            .with_module("h:y:1.0", &["g:a:1.1"]),
    )
}

fn rules() -> RuleSet {
    RuleSet::from_json_str("platform", PLATFORM_RULES).unwrap()
}

struct Counting {
    calls: AtomicUsize,
    inner: CatalogResolver,
}

impl GraphResolver for Counting {
    fn resolve(
        &self,
        scope: &DependencyScope,
        overrides: &VersionOverrides,
    ) -> SteerResult<ResolutionResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve(scope, overrides)
    }
}

#[test]
fn deny_fails_before_any_resolution() {
    let resolver = Counting {
        calls: AtomicUsize::new(0),
        inner: resolver(),
    };
    let engine = RuleEngine::new(&resolver, rules());
    let scope = DependencyScope::new("compile")
        .with_dependency("g:a:1.0")
        .with_dependency("bad:lib:6.6");

    let err = engine.resolve(&scope).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SteerError>(),
        Some(SteerError::DependencyDenied { .. })
    ));
    let message = err.to_string();
    assert!(message.contains("bad:lib:6.6"));
    assert!(message.contains("platform"));
    assert!(message.contains("licence"));
    assert!(message.contains("Legal"));
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn substitution_and_alignment_end_to_end() {
    let engine = RuleEngine::new(resolver(), rules());
    let scope = DependencyScope::new("compile")
        .with_dependency("g:a:1.0")
        .with_dependency("h:legacy:1.0");

    let report = engine.resolve(&scope).unwrap();
    assert!(report.is_resolved());
    assert_eq!(report.outcome.assignment().unwrap().version_for(0), Some("1.2"));
    let a = ModuleId::new("g", "a");
    assert_eq!(report.resolution.selected_version(&a), Some("1.2"));
    assert_eq!(
        report.resolution.selected_version(&ModuleId::new("g", "b")),
        Some("1.2")
    );
    assert_eq!(
        report.insight.reasons_for("g:a"),
        &["aligned to 1.2 by platform (align g)".to_string()]
    );
    assert_eq!(
        report.insight.reasons_for("h:legacy"),
        &["substituted h:legacy:1.0 with g:b:1.2 by platform (legacy moved into g)".to_string()]
    );
}

#[test]
fn rejected_versions_are_skipped_by_alignment() {
    let engine = RuleEngine::new(resolver(), rules());
    let scope = DependencyScope::new("compile")
        .with_dependency("g:a:1.0")
        .with_dependency("h:y:1.0")
        .with_dependency("g:b:1.0");
    let report = engine.resolve(&scope).unwrap();
    assert!(matches!(report.outcome, AlignmentOutcome::AlreadyAligned));
    assert_eq!(
        report.resolution.selected_version(&ModuleId::new("g", "a")),
        Some("1.0")
    );
}

#[test]
fn unresolved_dependency_surfaces_unchanged() {
    let engine = RuleEngine::new(resolver(), rules());
    let scope = DependencyScope::new("compile")
        .with_dependency("g:a:1.0")
        .with_dependency("g:b:1.2")
        .with_dependency("g:missing:2.0");

    let report = engine.resolve(&scope).unwrap();
    assert!(matches!(report.outcome, AlignmentOutcome::Skipped { .. }));
    assert!(!report.is_resolved());
    assert_eq!(report.resolution.unresolved()[0].requested.to_string(), "g:missing:2.0");
    assert_eq!(
        report.resolution.selected_version(&ModuleId::new("g", "a")),
        Some("1.0")
    );
}

#[test]
fn disabled_alignment_leaves_versions_alone() {
    let config = AlignmentConfig {
        enabled: false,
        ..AlignmentConfig::default()
    };
    let engine = RuleEngine::new(resolver(), rules()).with_config(config);
    let scope = DependencyScope::new("compile")
        .with_dependency("g:a:1.0")
        .with_dependency("g:b:1.2");
    let report = engine.resolve(&scope).unwrap();
    assert!(matches!(report.outcome, AlignmentOutcome::Disabled));
    assert_eq!(
        report.resolution.selected_version(&ModuleId::new("g", "a")),
        Some("1.0")
    );
}

#[test]
fn scopes_resolve_concurrently_in_order() {
    let engine = RuleEngine::new(resolver(), rules());
    let scopes: Vec<DependencyScope> = (0..8)
        .map(|i| {
            DependencyScope::new(format!("scope{i}"))
                .with_dependency("g:a:1.0")
                .with_dependency(if i % 2 == 0 { "g:b:1.2" } else { "g:b:1.0" })
        })
        .collect();

    let reports = engine.resolve_all(&scopes).unwrap();
    assert_eq!(reports.len(), 8);
    for (i, report) in reports.iter().enumerate() {
        assert_eq!(report.scope, format!("scope{i}"));
        let expected = if i % 2 == 0 { "1.2" } else { "1.0" };
        assert_eq!(
            report.resolution.selected_version(&ModuleId::new("g", "a")),
            Some(expected)
        );
    }
}

#[test]
fn one_denied_scope_fails_the_batch() {
    let engine = RuleEngine::new(resolver(), rules());
    let scopes = vec![
        DependencyScope::new("ok").with_dependency("g:a:1.0"),
        DependencyScope::new("denied").with_dependency("bad:lib:6.6"),
    ];
    assert!(engine.resolve_all(&scopes).is_err());
}

#[test]
fn report_graph_is_rooted_at_scope() {
    let engine = RuleEngine::new(resolver(), rules());
    let scope = DependencyScope::new("runtime").with_dependency("h:x:1.0");
    let report = engine.resolve(&scope).unwrap();
    let tree = report.graph().print_tree(None);
    assert!(tree.starts_with("runtime\n"));
    assert!(tree.contains("h:x:1.0"));
    assert!(tree.contains("g:a:1.0"));
}
