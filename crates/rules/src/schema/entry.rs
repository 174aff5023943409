//! Exception entries: the loose wire format and the typed form evaluated at runtime.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use sift_lists::ListType;

// ── Wire format ─────────────────────────────────────────────────────

/// One exception entry exactly as authored in a rule file or API payload.
///
/// `operator` and `type` stay strings here so that typos surface as
/// validation errors with suggestions instead of opaque parse failures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EntryDefinition {
    pub field: String,
    pub operator: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<EntryValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<ListReferenceDefinition>,
}

/// `value` is a string for `match` and a sequence for `match_any`.
///
/// Unquoted numbers and booleans (`value: 443`) are read as their string
/// form; matching coerces them back to the document's type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum EntryValue {
    Single(#[serde(deserialize_with = "scalar_string")] String),
    Many(#[serde(deserialize_with = "scalar_strings")] Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Boolean(bool),
}

impl From<Scalar> for String {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Text(s) => s,
            Scalar::Integer(n) => n.to_string(),
            Scalar::Unsigned(n) => n.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Boolean(b) => b.to_string(),
        }
    }
}

fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Scalar::deserialize(deserializer).map(String::from)
}

fn scalar_strings<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let scalars = Vec::<Scalar>::deserialize(deserializer)?;
    Ok(scalars.into_iter().map(String::from).collect())
}

/// List reference as authored: `{ id, type }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ListReferenceDefinition {
    pub id: String,
    #[serde(rename = "type")]
    pub list_type: String,
}

// ── Typed form ──────────────────────────────────────────────────────

/// Whether an entry matches on the condition (`included`) or its negation (`excluded`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Included,
    Excluded,
}

pub const OPERATORS: &[&str] = &["included", "excluded"];

pub const ENTRY_TYPES: &[&str] = &["match", "match_any", "exists", "list"];

/// A resolved reference to a value list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListReference {
    pub id: String,
    pub list_type: ListType,
}

/// The condition an entry tests, with exactly the data that condition needs.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryMatch {
    Match { value: String },
    MatchAny { values: Vec<String> },
    Exists,
    List { list: ListReference },
}

/// A validated exception entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionEntry {
    pub field: String,
    pub operator: Operator,
    pub condition: EntryMatch,
}

impl ExceptionEntry {
    pub fn new(field: impl Into<String>, operator: Operator, condition: EntryMatch) -> Self {
        Self {
            field: field.into(),
            operator,
            condition,
        }
    }

    /// `field is <value>` / `field is not <value>`.
    pub fn matches_value(field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self::new(field, operator, EntryMatch::Match { value: value.into() })
    }

    /// `field is one of <values>` / `field is not one of <values>`.
    pub fn matches_any<I, S>(field: impl Into<String>, operator: Operator, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            field,
            operator,
            EntryMatch::MatchAny {
                values: values.into_iter().map(Into::into).collect(),
            },
        )
    }

    /// `field exists` / `field does not exist`.
    pub fn exists(field: impl Into<String>, operator: Operator) -> Self {
        Self::new(field, operator, EntryMatch::Exists)
    }

    /// `field is in list` / `field is not in list`.
    pub fn in_list(
        field: impl Into<String>,
        operator: Operator,
        list_id: impl Into<String>,
        list_type: ListType,
    ) -> Self {
        Self::new(
            field,
            operator,
            EntryMatch::List {
                list: ListReference {
                    id: list_id.into(),
                    list_type,
                },
            },
        )
    }

    /// Human-facing operator label, e.g. `is not one of`.
    pub fn label(&self) -> &'static str {
        match (&self.condition, self.operator) {
            (EntryMatch::Match { .. }, Operator::Included) => "is",
            (EntryMatch::Match { .. }, Operator::Excluded) => "is not",
            (EntryMatch::MatchAny { .. }, Operator::Included) => "is one of",
            (EntryMatch::MatchAny { .. }, Operator::Excluded) => "is not one of",
            (EntryMatch::Exists, Operator::Included) => "exists",
            (EntryMatch::Exists, Operator::Excluded) => "does not exist",
            (EntryMatch::List { .. }, Operator::Included) => "is in list",
            (EntryMatch::List { .. }, Operator::Excluded) => "is not in list",
        }
    }

    /// Convert back to the wire format.
    pub fn to_definition(&self) -> EntryDefinition {
        let (entry_type, value, list) = match &self.condition {
            EntryMatch::Match { value } => ("match", Some(EntryValue::Single(value.clone())), None),
            EntryMatch::MatchAny { values } => {
                ("match_any", Some(EntryValue::Many(values.clone())), None)
            }
            EntryMatch::Exists => ("exists", None, None),
            EntryMatch::List { list } => (
                "list",
                None,
                Some(ListReferenceDefinition {
                    id: list.id.clone(),
                    list_type: list.list_type.to_string(),
                }),
            ),
        };
        EntryDefinition {
            field: self.field.clone(),
            operator: self.operator.to_string(),
            entry_type: entry_type.to_string(),
            value,
            list,
        }
    }
}

impl fmt::Display for ExceptionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.condition {
            EntryMatch::Match { value } => write!(f, "{} {} \"{}\"", self.field, self.label(), value),
            EntryMatch::MatchAny { values } => {
                write!(f, "{} {} [{}]", self.field, self.label(), values.join(", "))
            }
            EntryMatch::Exists => write!(f, "{} {}", self.field, self.label()),
            EntryMatch::List { list } => {
                write!(f, "{} {} {} ({})", self.field, self.label(), list.id, list.list_type)
            }
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Included => write!(f, "included"),
            Operator::Excluded => write!(f, "excluded"),
        }
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "included" => Ok(Operator::Included),
            "excluded" => Ok(Operator::Excluded),
            other => Err(format!("unknown operator: '{}'", other)),
        }
    }
}
