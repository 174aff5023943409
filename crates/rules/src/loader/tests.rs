//! Tests for the rule loader module.

use std::fs;

use tempfile::TempDir;

use super::*;
use crate::schema::DetectionRule;

const VALID_RULE_YAML: &str = r#"
apiVersion: v1
kind: DetectionRule
metadata:
  id: test-rule
  name: Test Rule
  enabled: true
index: [keyword_as_array]
exceptions:
  - entries:
      - field: keyword
        operator: included
        type: match
        value: word one
"#;

fn temp_loader() -> (TempDir, RuleLoader) {
    let dir = TempDir::new().expect("create tempdir");
    let loader = RuleLoader::new(dir.path().to_path_buf());
    (dir, loader)
}

#[test]
fn load_rule_from_file() {
    let (dir, loader) = temp_loader();
    let rule_path = dir.path().join("test-rule.yml");
    fs::write(&rule_path, VALID_RULE_YAML).unwrap();

    let rule = loader.load_file(&rule_path).unwrap();
    assert_eq!(rule.id(), "test-rule");
    assert_eq!(rule.metadata.name, "Test Rule");
    assert_eq!(rule.exceptions.len(), 1);
}

#[test]
fn load_all_skips_dotfiles_and_unsupported_files() {
    let (dir, loader) = temp_loader();

    fs::write(dir.path().join("rule1.yml"), VALID_RULE_YAML).unwrap();
    fs::write(dir.path().join(".hidden.yml"), VALID_RULE_YAML).unwrap();
    fs::write(dir.path().join("readme.txt"), "not a rule").unwrap();

    let results = loader.load_all().unwrap();

    let loaded = results
        .iter()
        .filter(|r| matches!(r.status, LoadStatus::Loaded { .. }))
        .count();
    let skipped = results
        .iter()
        .filter(|r| matches!(r.status, LoadStatus::Skipped { .. }))
        .count();

    assert_eq!(loaded, 1);
    assert_eq!(skipped, 2);
    assert_eq!(loader.ids(), vec!["test-rule".to_string()]);
}

#[test]
fn load_all_recursive_subdirectories() {
    let (dir, loader) = temp_loader();

    fs::write(dir.path().join("rule1.yml"), VALID_RULE_YAML).unwrap();

    let sub = dir.path().join("subdir");
    fs::create_dir(&sub).unwrap();
    let sub_yaml = VALID_RULE_YAML.replace("test-rule", "sub-rule");
    fs::write(sub.join("sub-rule.yml"), sub_yaml).unwrap();

    let results = loader.load_all().unwrap();
    let loaded: Vec<&str> = results
        .iter()
        .filter_map(|r| match &r.status {
            LoadStatus::Loaded { rule_id } => Some(rule_id.as_str()),
            _ => None,
        })
        .collect();

    assert_eq!(loaded.len(), 2, "Should load rules from root and subdirectory");
    assert!(loader.get("test-rule").is_some());
    assert!(loader.get("sub-rule").is_some());
}

#[test]
fn json_rules_load() {
    let (dir, loader) = temp_loader();
    let json = r#"{
  "apiVersion": "v1",
  "kind": "DetectionRule",
  "metadata": {"id": "json-rule", "name": "JSON rule"},
  "exceptions": [
    {"entries": [{"field": "keyword", "operator": "excluded", "type": "exists"}]}
  ]
}"#;
    fs::write(dir.path().join("json-rule.json"), json).unwrap();

    loader.load_all().unwrap();
    let rule = loader.get("json-rule").unwrap();
    assert_eq!(rule.exceptions.items()[0].entries()[0].label(), "does not exist");
}

#[test]
fn write_and_read_back() {
    let (dir, loader) = temp_loader();
    let rule: DetectionRule = serde_yaml::from_str(VALID_RULE_YAML).unwrap();

    let path = loader.write_rule(&rule).unwrap();
    assert_eq!(path, dir.path().join("test-rule.yml"));
    assert!(!dir.path().join(".test-rule.tmp").exists());

    let reloaded = loader.load_file(&path).unwrap();
    assert_eq!(reloaded.to_rule(), rule);
    assert!(loader.get("test-rule").is_some());
}

#[test]
fn write_rejects_invalid_rule() {
    let (dir, loader) = temp_loader();
    let mut rule: DetectionRule = serde_yaml::from_str(VALID_RULE_YAML).unwrap();
    rule.exceptions[0].entries[0].entry_type = "matches".to_string();

    let err = loader.write_rule(&rule).unwrap_err();
    assert!(matches!(err, RuleError::Configuration(_)));
    assert!(!dir.path().join("test-rule.yml").exists());
}

#[test]
fn delete_rule_removes_file_and_entry() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("custom-name.yml"), VALID_RULE_YAML).unwrap();
    loader.load_all().unwrap();

    // Deletion follows the file the rule came from, not its id.
    loader.delete_rule("test-rule").unwrap();
    assert!(!dir.path().join("custom-name.yml").exists());
    assert!(loader.get("test-rule").is_none());
}

#[test]
fn delete_nonexistent_rule_errors() {
    let (_dir, loader) = temp_loader();
    let err = loader.delete_rule("nope").unwrap_err();
    assert!(matches!(err, RuleError::NotFound(_)));
}

#[test]
fn invalid_yaml_produces_error_not_panic() {
    let (dir, loader) = temp_loader();
    let path = dir.path().join("broken.yml");
    fs::write(&path, "apiVersion: v1\nkind: [unclosed").unwrap();

    assert!(matches!(loader.load_file(&path), Err(RuleError::Parse(_))));
}

#[test]
fn empty_id_fails_validation() {
    let (dir, loader) = temp_loader();
    let path = dir.path().join("empty-id.yml");
    fs::write(&path, VALID_RULE_YAML.replace("id: test-rule", "id: \"\"")).unwrap();

    assert!(matches!(loader.load_file(&path), Err(RuleError::Validation(_))));
}

#[test]
fn unknown_kind_fails_validation() {
    let (dir, loader) = temp_loader();
    let path = dir.path().join("alert.yml");
    fs::write(&path, VALID_RULE_YAML.replace("kind: DetectionRule", "kind: Alert")).unwrap();

    let err = loader.load_file(&path).unwrap_err();
    assert!(err.to_string().contains("unknown rule kind"));
}

#[test]
fn load_all_reports_failed_files() {
    let (dir, loader) = temp_loader();
    fs::write(dir.path().join("good.yml"), VALID_RULE_YAML).unwrap();
    let bad = VALID_RULE_YAML.replace("operator: included", "operator: include");
    fs::write(dir.path().join("bad.yml"), bad.replace("test-rule", "bad-rule")).unwrap();

    let results = loader.load_all().unwrap();
    let failed: Vec<&str> = results
        .iter()
        .filter_map(|r| match &r.status {
            LoadStatus::Failed { error } => Some(error.as_str()),
            _ => None,
        })
        .collect();

    assert_eq!(failed.len(), 1);
    assert!(failed[0].contains("exceptions[0].entries[0].operator"));
    assert!(failed[0].contains("Did you mean 'included'?"));
    assert_eq!(loader.ids(), vec!["test-rule".to_string()]);
}

#[test]
fn new_creates_missing_directory() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a").join("b");
    let loader = RuleLoader::new(nested.clone());
    assert!(nested.is_dir());
    assert_eq!(loader.rules_dir(), nested.as_path());
}
