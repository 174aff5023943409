use super::*;
use sift_lists::ListType;

fn valid_rule() -> DetectionRule {
    serde_yaml::from_str(
        r#"
apiVersion: v1
kind: DetectionRule
metadata:
  id: keyword-array
  name: Keyword array
index: [keyword_as_array]
exceptions:
  - item_id: known-words
    entries:
      - field: keyword
        operator: included
        type: match_any
        value: [word one, word two]
  - entries:
      - field: keyword
        operator: included
        type: list
        list: { id: safe-words.txt, type: keyword }
      - field: host.name
        operator: excluded
        type: exists
"#,
    )
    .unwrap()
}

fn entry(yaml: &str) -> EntryDefinition {
    serde_yaml::from_str(yaml).unwrap()
}

#[test]
fn valid_rule_passes() {
    let result = validate_rule(&valid_rule());
    assert!(result.valid, "errors: {:?}", result.errors);
    assert!(result.warnings.is_empty());
}

#[test]
fn valid_rule_compiles() {
    let compiled = compile_rule(&valid_rule()).unwrap();
    assert_eq!(compiled.id(), "keyword-array");
    assert_eq!(compiled.exceptions.len(), 2);
    assert_eq!(compiled.exceptions.items()[0].item_id.as_deref(), Some("known-words"));
    assert_eq!(compiled.exceptions.items()[1].entries().len(), 2);
    assert_eq!(
        compiled.exceptions.list_references()[0].list_type,
        ListType::Keyword
    );
}

#[test]
fn invalid_api_version() {
    let mut rule = valid_rule();
    rule.api_version = "v2".to_string();
    let result = validate_rule(&rule);
    assert!(!result.valid);
    assert!(result.errors.iter().any(|e| e.path == "apiVersion"));
}

#[test]
fn invalid_kind_suggests() {
    let mut rule = valid_rule();
    rule.kind = "DetectionRul".to_string();
    let result = validate_rule(&rule);
    let err = result.errors.iter().find(|e| e.path == "kind").unwrap();
    assert_eq!(err.suggestion.as_deref(), Some("Did you mean 'DetectionRule'?"));
}

#[test]
fn non_kebab_id_warns() {
    let mut rule = valid_rule();
    rule.metadata.id = "Keyword_Array".to_string();
    let result = validate_rule(&rule);
    assert!(result.valid);
    assert!(result.warnings.iter().any(|w| w.path == "metadata.id"));
}

#[test]
fn empty_name_and_index_pattern_fail() {
    let mut rule = valid_rule();
    rule.metadata.name = "  ".to_string();
    rule.index = vec![String::new()];
    let result = validate_rule(&rule);
    assert!(result.errors.iter().any(|e| e.path == "metadata.name"));
    assert!(result.errors.iter().any(|e| e.path == "index[0]"));
}

#[test]
fn empty_item_rejected() {
    let mut rule = valid_rule();
    rule.exceptions[1].entries.clear();
    let err = compile_rule(&rule).unwrap_err();
    assert_eq!(err.errors.len(), 1);
    assert_eq!(err.errors[0].path, "exceptions[1].entries");
}

#[test]
fn duplicate_item_ids_rejected() {
    let mut rule = valid_rule();
    rule.exceptions[1].item_id = Some("known-words".to_string());
    let result = validate_rule(&rule);
    assert!(result
        .errors
        .iter()
        .any(|e| e.path == "exceptions[1].item_id" && e.message.contains("duplicate")));
}

#[test]
fn unknown_operator_suggests() {
    let err = compile_entry(&entry(
        "{ field: keyword, operator: include, type: match, value: x }",
    ))
    .unwrap_err();
    assert_eq!(err.errors[0].path, "operator");
    assert_eq!(err.errors[0].suggestion.as_deref(), Some("Did you mean 'included'?"));
}

#[test]
fn unknown_type_suggests() {
    let err = compile_entry(&entry(
        "{ field: keyword, operator: included, type: matchany, value: [x] }",
    ))
    .unwrap_err();
    assert_eq!(err.errors[0].path, "type");
    assert_eq!(err.errors[0].suggestion.as_deref(), Some("Did you mean 'match_any'?"));
}

#[test]
fn match_requires_single_value() {
    let err = compile_entry(&entry(
        "{ field: keyword, operator: included, type: match, value: [a, b] }",
    ))
    .unwrap_err();
    assert_eq!(err.errors[0].path, "value");
    assert!(err.errors[0].suggestion.as_deref().unwrap().contains("match_any"));

    assert!(compile_entry(&entry("{ field: keyword, operator: included, type: match }")).is_err());
}

#[test]
fn match_any_requires_values() {
    assert!(compile_entry(&entry(
        "{ field: keyword, operator: included, type: match_any, value: [] }"
    ))
    .is_err());
    assert!(compile_entry(&entry(
        "{ field: keyword, operator: included, type: match_any, value: one }"
    ))
    .is_err());
}

#[test]
fn exists_rejects_value() {
    let err = compile_entry(&entry(
        "{ field: keyword, operator: included, type: exists, value: x }",
    ))
    .unwrap_err();
    assert_eq!(err.errors[0].path, "value");

    let ok = compile_entry(&entry("{ field: keyword, operator: excluded, type: exists }")).unwrap();
    assert_eq!(ok, ExceptionEntry::exists("keyword", Operator::Excluded));
}

#[test]
fn list_requires_reference() {
    let err = compile_entry(&entry("{ field: keyword, operator: included, type: list }")).unwrap_err();
    assert_eq!(err.errors[0].path, "list");

    let err = compile_entry(&entry(
        "{ field: keyword, operator: included, type: list, list: { id: words, type: keywrd } }",
    ))
    .unwrap_err();
    assert_eq!(err.errors[0].path, "list.type");
    assert_eq!(err.errors[0].suggestion.as_deref(), Some("Did you mean 'keyword'?"));

    let err = compile_entry(&entry(
        "{ field: keyword, operator: included, type: list, list: { id: '', type: keyword } }",
    ))
    .unwrap_err();
    assert_eq!(err.errors[0].path, "list.id");
}

#[test]
fn list_entry_compiles() {
    let ok = compile_entry(&entry(
        "{ field: source.ip, operator: excluded, type: list, list: { id: blocked, type: ip } }",
    ))
    .unwrap();
    assert_eq!(
        ok,
        ExceptionEntry::in_list("source.ip", Operator::Excluded, "blocked", ListType::Ip)
    );
}

#[test]
fn errors_collected_across_items() {
    let defs: Vec<ItemDefinition> = serde_yaml::from_str(
        r#"
- entries:
    - { field: "", operator: included, type: exists }
- entries:
    - { field: a, operator: maybe, type: exists }
    - { field: b, operator: included, type: list }
"#,
    )
    .unwrap();
    let err = compile_exceptions(&defs).unwrap_err();
    let paths: Vec<&str> = err.errors.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "exceptions[0].entries[0].field",
            "exceptions[1].entries[0].operator",
            "exceptions[1].entries[1].list",
        ]
    );
    assert!(err.to_string().starts_with("invalid rule configuration: "));
}

#[test]
fn validate_yaml_reports_parse_errors() {
    let result = validate_yaml("apiVersion: v1\nkind: [");
    assert!(!result.valid);
    assert!(result.errors[0].message.starts_with("YAML parse error"));
}

#[test]
fn unquoted_number_compiles_to_match() {
    let compiled = compile_entry(&entry(
        "{ field: destination.port, operator: included, type: match, value: 443 }",
    ))
    .unwrap();
    assert_eq!(
        compiled,
        ExceptionEntry::matches_value("destination.port", Operator::Included, "443")
    );
}
