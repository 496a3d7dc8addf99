use std::fs;

use tempfile::TempDir;

use depsteer_core::config::RulesConfig;
use depsteer_core::module::ModuleId;
use depsteer_core::ruleset::{RuleSet, RuleSets};

const NETFLIX_STYLE: &str = r#"{
    "replace": [],
    "substitute": [],
    "reject": [],
    "deny": [],
    "exclude": [],
    "align": [
        {
            "name": "align-jersey",
            "group": "com\\.sun\\.jersey",
            "includes": [],
            "excludes": ["jersey-(client|server)-spring"],
            "reason": "Align jersey",
            "author": "Example Person <person@example.org>",
            "date": "2016-03-17T20:21:20.368Z"
        }
    ]
}"#;

#[test]
fn rule_set_is_named_after_file_stem() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("jersey-rules.json");
    fs::write(&path, NETFLIX_STYLE).unwrap();

    let set = RuleSet::from_path(&path).unwrap();
    assert_eq!(set.name, "jersey-rules");
    assert_eq!(set.align.len(), 1);

    let rule = &set.align[0];
    assert_eq!(rule.provenance.rule_set, "jersey-rules");
    assert_eq!(rule.provenance.author, "Example Person <person@example.org>");
    assert!(rule.matches_module(&ModuleId::new("com.sun.jersey", "jersey-core")));
    assert!(!rule.matches_module(&ModuleId::new("com.sun.jersey", "jersey-server-spring")));
    assert!(!rule.matches_module(&ModuleId::new("com.sun.jerseyx", "jersey-core")));
}

#[test]
fn missing_file_names_the_path() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("absent.json");
    let err = RuleSet::from_path(&path).unwrap_err();
    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn include_list_limits_rule_sets() {
    let tmp = TempDir::new().unwrap();
    let mut sets = RuleSets::new();
    for name in ["first", "second", "third"] {
        let path = tmp.path().join(format!("{name}.json"));
        fs::write(&path, NETFLIX_STYLE).unwrap();
        sets.add(RuleSet::from_path(&path).unwrap());
    }

    let merged = sets.select(&RulesConfig {
        include: vec!["third".to_string(), "first".to_string()],
        ..RulesConfig::default()
    });
    let names: Vec<&str> = merged
        .align
        .iter()
        .map(|r| r.provenance.rule_set.as_str())
        .collect();
    assert_eq!(names, vec!["first", "third"]);
}
