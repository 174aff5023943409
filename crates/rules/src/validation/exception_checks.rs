//! Exception item and entry validation: operator/type combinations, values, list references.

use std::collections::HashSet;

use sift_lists::{list_type::LIST_TYPES, ListType};

use super::fuzzy::fuzzy_match;
use super::ValidationResult;
use crate::schema::*;

fn child(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

/// Report an unknown enumerated value, with a suggestion when one is close.
fn unknown_choice(
    result: &mut ValidationResult,
    path: &str,
    what: &str,
    got: &str,
    candidates: &[&str],
) {
    let message = format!("Unknown {what} '{got}', expected one of: {}", candidates.join(", "));
    match fuzzy_match(got, candidates) {
        Some(s) => result.error_with_suggestion(path, message, format!("Did you mean '{s}'?")),
        None => result.error(path, message),
    }
}

// ── Items ───────────────────────────────────────────────────────────

/// Check every item and return the ones that validated cleanly.
pub(super) fn check_items(
    definitions: &[ItemDefinition],
    path: &str,
    result: &mut ValidationResult,
) -> Vec<ExceptionItem> {
    let mut items = Vec::with_capacity(definitions.len());
    let mut seen_ids = HashSet::new();

    for (i, def) in definitions.iter().enumerate() {
        let item_path = format!("{path}[{i}]");

        if let Some(id) = &def.item_id {
            if id.trim().is_empty() {
                result.error(child(&item_path, "item_id"), "item_id must not be empty");
            } else if !seen_ids.insert(id.as_str()) {
                result.error(
                    child(&item_path, "item_id"),
                    format!("duplicate item_id '{id}'"),
                );
            }
        }

        if def.entries.is_empty() {
            result.error(
                child(&item_path, "entries"),
                "an exception item needs at least one entry",
            );
            continue;
        }

        let mut entries = Vec::with_capacity(def.entries.len());
        for (j, entry) in def.entries.iter().enumerate() {
            let entry_path = format!("{}[{j}]", child(&item_path, "entries"));
            if let Some(entry) = check_entry(entry, &entry_path, result) {
                entries.push(entry);
            }
        }

        if entries.len() == def.entries.len() {
            items.push(ExceptionItem::from_parts(
                def.item_id.clone(),
                def.name.clone(),
                entries,
            ));
        }
    }

    items
}

// ── Entries ─────────────────────────────────────────────────────────

/// Convert one wire entry into its typed form, recording every problem found.
pub(super) fn check_entry(
    def: &EntryDefinition,
    path: &str,
    result: &mut ValidationResult,
) -> Option<ExceptionEntry> {
    let mut valid = true;

    if def.field.trim().is_empty() {
        result.error(child(path, "field"), "field must not be empty");
        valid = false;
    }

    let operator = match def.operator.parse::<Operator>() {
        Ok(op) => Some(op),
        Err(_) => {
            unknown_choice(result, &child(path, "operator"), "operator", &def.operator, OPERATORS);
            None
        }
    };

    let condition = match def.entry_type.as_str() {
        "match" => check_match(def, path, result),
        "match_any" => check_match_any(def, path, result),
        "exists" => check_exists(def, path, result),
        "list" => check_list(def, path, result),
        other => {
            unknown_choice(result, &child(path, "type"), "type", other, ENTRY_TYPES);
            None
        }
    };

    match (valid, operator, condition) {
        (true, Some(operator), Some(condition)) => Some(ExceptionEntry {
            field: def.field.clone(),
            operator,
            condition,
        }),
        _ => None,
    }
}

fn reject_list(def: &EntryDefinition, path: &str, result: &mut ValidationResult) -> bool {
    if def.list.is_some() {
        result.error(
            child(path, "list"),
            format!("type '{}' does not take a list reference", def.entry_type),
        );
        return false;
    }
    true
}

fn check_match(def: &EntryDefinition, path: &str, result: &mut ValidationResult) -> Option<EntryMatch> {
    let list_ok = reject_list(def, path, result);
    let value = match &def.value {
        Some(EntryValue::Single(value)) => {
            if value.is_empty() {
                result.warn(child(path, "value"), "empty value only matches empty strings");
            }
            Some(value.clone())
        }
        Some(EntryValue::Many(_)) => {
            result.error_with_suggestion(
                child(path, "value"),
                "type 'match' takes a single string value",
                "Use type 'match_any' for a list of values",
            );
            None
        }
        None => {
            result.error(child(path, "value"), "type 'match' requires a value");
            None
        }
    };
    value.filter(|_| list_ok).map(|value| EntryMatch::Match { value })
}

fn check_match_any(
    def: &EntryDefinition,
    path: &str,
    result: &mut ValidationResult,
) -> Option<EntryMatch> {
    let list_ok = reject_list(def, path, result);
    let values = match &def.value {
        Some(EntryValue::Many(values)) if values.is_empty() => {
            result.error(child(path, "value"), "type 'match_any' requires at least one value");
            None
        }
        Some(EntryValue::Many(values)) => {
            let unique: HashSet<&String> = values.iter().collect();
            if unique.len() != values.len() {
                result.warn(child(path, "value"), "value list contains duplicates");
            }
            Some(values.clone())
        }
        Some(EntryValue::Single(_)) => {
            result.error_with_suggestion(
                child(path, "value"),
                "type 'match_any' takes a list of values",
                "Use type 'match' for a single value",
            );
            None
        }
        None => {
            result.error(child(path, "value"), "type 'match_any' requires a list of values");
            None
        }
    };
    values.filter(|_| list_ok).map(|values| EntryMatch::MatchAny { values })
}

fn check_exists(def: &EntryDefinition, path: &str, result: &mut ValidationResult) -> Option<EntryMatch> {
    let mut ok = reject_list(def, path, result);
    if def.value.is_some() {
        result.error(child(path, "value"), "type 'exists' does not take a value");
        ok = false;
    }
    ok.then_some(EntryMatch::Exists)
}

fn check_list(def: &EntryDefinition, path: &str, result: &mut ValidationResult) -> Option<EntryMatch> {
    let mut ok = true;
    if def.value.is_some() {
        result.error(child(path, "value"), "type 'list' does not take a value");
        ok = false;
    }

    let Some(list) = &def.list else {
        result.error(child(path, "list"), "type 'list' requires a list reference { id, type }");
        return None;
    };

    let list_path = child(path, "list");
    if list.id.trim().is_empty() {
        result.error(child(&list_path, "id"), "list id must not be empty");
        ok = false;
    }

    let list_type = match list.list_type.parse::<ListType>() {
        Ok(t) => Some(t),
        Err(_) => {
            unknown_choice(result, &child(&list_path, "type"), "list type", &list.list_type, LIST_TYPES);
            None
        }
    };

    match (ok, list_type) {
        (true, Some(list_type)) => Some(EntryMatch::List {
            list: ListReference {
                id: list.id.clone(),
                list_type,
            },
        }),
        _ => None,
    }
}
