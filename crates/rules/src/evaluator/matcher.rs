//! Single-entry matching against a document.

use sift_core::{Document, FieldLookup};

use crate::schema::{EntryMatch, ExceptionEntry, Operator};

use super::EvaluationContext;

/// Whether one entry holds for a document.
///
/// `excluded` is the exact negation of `included` for every entry type, so
/// a missing field satisfies `is not`, `is not one of` and `is not in list`.
pub fn matches(entry: &ExceptionEntry, document: &Document, ctx: &EvaluationContext) -> bool {
    let lookup = document.extract(&entry.field);
    let holds = condition_holds(&entry.condition, &lookup, ctx);
    match entry.operator {
        Operator::Included => holds,
        Operator::Excluded => !holds,
    }
}

fn condition_holds(condition: &EntryMatch, lookup: &FieldLookup, ctx: &EvaluationContext) -> bool {
    let values = lookup.values();
    match condition {
        EntryMatch::Match { value } => values.iter().any(|v| v.equals_str(value)),
        EntryMatch::MatchAny { values: wanted } => values
            .iter()
            .any(|v| wanted.iter().any(|w| v.equals_str(w))),
        EntryMatch::Exists => lookup.is_present(ctx.presence),
        EntryMatch::List { list } => match ctx.list(&list.id) {
            Some(resolved) => values.iter().any(|v| resolved.contains(v)),
            // Unreachable through `ExceptionEvaluator`, which resolves every
            // reference up front. A bare context with a gap matches nothing.
            None => false,
        },
    }
}

/// Non-null values at `field`, for debug output.
pub(crate) fn describe_values(document: &Document, field: &str) -> String {
    let values: Vec<String> = document
        .extract(field)
        .values()
        .iter()
        .filter(|v| !v.is_null())
        .map(ToString::to_string)
        .collect();
    format!("[{}]", values.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sift_core::FieldPresence;
    use sift_lists::{ListType, ValueList};

    fn doc(value: serde_json::Value) -> Document {
        Document::from_value(value).unwrap()
    }

    fn ctx() -> EvaluationContext {
        EvaluationContext::new(FieldPresence::Key)
    }

    #[test]
    fn match_any_element_of_array() {
        let d = doc(json!({"keyword": ["word one", "word two"]}));
        let is = ExceptionEntry::matches_value("keyword", Operator::Included, "word two");
        let is_not = ExceptionEntry::matches_value("keyword", Operator::Excluded, "word two");
        assert!(matches(&is, &d, &ctx()));
        assert!(!matches(&is_not, &d, &ctx()));
    }

    #[test]
    fn excluded_holds_on_missing_field() {
        let d = doc(json!({"other": 1}));
        let is_not = ExceptionEntry::matches_value("keyword", Operator::Excluded, "x");
        let not_one_of = ExceptionEntry::matches_any("keyword", Operator::Excluded, ["x", "y"]);
        assert!(matches(&is_not, &d, &ctx()));
        assert!(matches(&not_one_of, &d, &ctx()));
    }

    #[test]
    fn nulls_never_match() {
        let d = doc(json!({"keyword": [null]}));
        let is = ExceptionEntry::matches_value("keyword", Operator::Included, "null");
        assert!(!matches(&is, &d, &ctx()));
    }

    #[test]
    fn match_coerces_to_document_type() {
        let d = doc(json!({"port": 443, "ratio": 0.5, "ok": true}));
        let c = ctx();
        assert!(matches(&ExceptionEntry::matches_value("port", Operator::Included, "443"), &d, &c));
        assert!(matches(&ExceptionEntry::matches_value("ratio", Operator::Included, "0.50"), &d, &c));
        assert!(matches(&ExceptionEntry::matches_value("ok", Operator::Included, "true"), &d, &c));
        // Type mismatch is a non-match, not an error.
        assert!(!matches(&ExceptionEntry::matches_value("port", Operator::Included, "https"), &d, &c));
        assert!(matches(&ExceptionEntry::matches_value("port", Operator::Excluded, "https"), &d, &c));
    }

    #[test]
    fn exists_follows_presence_policy() {
        let d = doc(json!({"empty": [], "nulls": [null], "set": ["a"]}));
        let key = EvaluationContext::new(FieldPresence::Key);
        let indexed = EvaluationContext::new(FieldPresence::Indexed);
        for field in ["empty", "nulls"] {
            let entry = ExceptionEntry::exists(field, Operator::Included);
            assert!(matches(&entry, &d, &key), "{field} under key");
            assert!(!matches(&entry, &d, &indexed), "{field} under indexed");
        }
        let set = ExceptionEntry::exists("set", Operator::Included);
        assert!(matches(&set, &d, &indexed));
        let missing = ExceptionEntry::exists("absent", Operator::Excluded);
        assert!(matches(&missing, &d, &key));
    }

    #[test]
    fn list_membership_uses_list_type() {
        let list = ValueList::from_values("hosts", ListType::Ip, ["10.0.0.1", "::1"]).unwrap();
        let c = ctx().with_list(list);
        let in_list = ExceptionEntry::in_list("source.ip", Operator::Included, "hosts", ListType::Ip);

        assert!(matches(&in_list, &doc(json!({"source": {"ip": "0:0:0:0:0:0:0:1"}})), &c));
        assert!(matches(&in_list, &doc(json!({"source.ip": ["1.1.1.1", "10.0.0.1"]})), &c));
        assert!(!matches(&in_list, &doc(json!({"source": {"ip": "not an ip"}})), &c));

        let not_in = ExceptionEntry::in_list("source.ip", Operator::Excluded, "hosts", ListType::Ip);
        assert!(matches(&not_in, &doc(json!({"other": true})), &c));
    }

    #[test]
    fn keyword_list_and_match_agree_on_numbers() {
        let list = ValueList::from_values("codes", ListType::Keyword, ["5"]).unwrap();
        let c = ctx().with_list(list);
        let d = doc(json!({"code": 5}));

        let is = ExceptionEntry::matches_value("code", Operator::Included, "5");
        let in_list = ExceptionEntry::in_list("code", Operator::Included, "codes", ListType::Keyword);
        assert!(matches(&is, &d, &c));
        assert!(matches(&in_list, &d, &c));

        let other = doc(json!({"code": 6}));
        assert_eq!(matches(&is, &other, &c), matches(&in_list, &other, &c));
    }

    #[test]
    fn describe_skips_nulls() {
        let d = doc(json!({"keyword": ["a", null, "b"]}));
        assert_eq!(describe_values(&d, "keyword"), "[a, b]");
    }
}
