//! Rule header checks: apiVersion, kind, metadata, index patterns.

use super::fuzzy::{fuzzy_match, is_kebab_case};
use super::ValidationResult;
use crate::schema::{DetectionRule, RuleKind, RULE_KINDS};

const SUPPORTED_API_VERSIONS: &[&str] = &["v1"];

pub(super) fn validate_header(rule: &DetectionRule, result: &mut ValidationResult) {
    if !SUPPORTED_API_VERSIONS.contains(&rule.api_version.as_str()) {
        result.error(
            "apiVersion",
            format!("Unsupported apiVersion '{}', expected 'v1'", rule.api_version),
        );
    }

    if rule.kind.parse::<RuleKind>().is_err() {
        let message = format!("Unknown kind '{}'", rule.kind);
        match fuzzy_match(&rule.kind, RULE_KINDS) {
            Some(s) => result.error_with_suggestion("kind", message, format!("Did you mean '{s}'?")),
            None => result.error("kind", message),
        }
    }

    let id = &rule.metadata.id;
    if id.is_empty() {
        result.error("metadata.id", "id must not be empty");
    } else if !is_kebab_case(id) {
        result.warn(
            "metadata.id",
            format!("id '{id}' is not kebab-case (e.g. 'keyword-array')"),
        );
    }

    if rule.metadata.name.trim().is_empty() {
        result.error("metadata.name", "name must not be empty");
    }

    if rule.index.is_empty() {
        result.warn("index", "no index patterns; the rule can only run on documents passed to it directly");
    }
    for (i, pattern) in rule.index.iter().enumerate() {
        if pattern.trim().is_empty() {
            result.error(format!("index[{i}]"), "index pattern must not be empty");
        }
    }
}
