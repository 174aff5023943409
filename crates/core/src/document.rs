use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Result, SiftError};

/// Unique document identifier (the source index's `_id`, or a generated UUID).
pub type DocId = String;

/// A candidate document: an id plus its JSON source.
///
/// Field paths are dot-addressable. `host.name` resolves both the nested
/// form `{"host": {"name": ..}}` and the flattened form `{"host.name": ..}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: DocId,
    pub source: Map<String, Value>,
}

/// Typed field values as they appear in a document source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

/// Result of resolving a field path against a document.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldLookup {
    /// No key along the path resolved.
    Missing,
    /// The key resolved; holds every value found, in source order.
    /// An empty array at the key yields `Present(vec![])`.
    Present(Vec<FieldValue>),
}

/// How `exists` decides whether a field is present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldPresence {
    /// Present when the key exists, whatever it holds (`[]` and `null` included).
    #[default]
    Key,
    /// Present only when at least one non-null value exists, the way a
    /// search index sees the field.
    Indexed,
}

impl Document {
    /// Create a document with a freshly generated id.
    pub fn new(source: Map<String, Value>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source,
        }
    }

    pub fn with_id(id: impl Into<DocId>, source: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            source,
        }
    }

    /// Build a document from a JSON object.
    ///
    /// Accepts either a search hit (`{"_id": .., "_source": {..}}`) or a bare
    /// source object, in which case an optional top-level `_id` is lifted out.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(SiftError::Document(format!(
                "expected a JSON object, got {}",
                json_kind(&value)
            )));
        };

        let id = map.remove("_id").and_then(|v| match v {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        let source = match map.remove("_source") {
            Some(Value::Object(source)) => source,
            Some(other) => {
                return Err(SiftError::Document(format!(
                    "`_source` must be an object, got {}",
                    json_kind(&other)
                )))
            }
            None => map,
        };

        Ok(match id {
            Some(id) => Self::with_id(id, source),
            None => Self::new(source),
        })
    }

    /// Read and parse an NDJSON file.
    pub fn read_ndjson(path: &Path) -> Result<Vec<Document>> {
        let raw = fs::read_to_string(path)?;
        Self::parse_ndjson(&raw)
    }

    /// Parse newline-delimited JSON. Blank lines are skipped.
    pub fn parse_ndjson(input: &str) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        for (idx, line) in input.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(line).map_err(|e| SiftError::Line {
                line: idx + 1,
                message: e.to_string(),
            })?;
            let doc = Self::from_value(value).map_err(|e| SiftError::Line {
                line: idx + 1,
                message: e.to_string(),
            })?;
            documents.push(doc);
        }
        Ok(documents)
    }

    /// Resolve a dot-separated field path.
    ///
    /// Scalars yield one value, arrays yield all elements in order (nulls kept,
    /// nested arrays flattened). Arrays of objects along the path are walked
    /// element-wise.
    pub fn extract(&self, path: &str) -> FieldLookup {
        let mut values = Vec::new();
        if resolve_in_object(&self.source, path, &mut values) {
            FieldLookup::Present(values)
        } else {
            FieldLookup::Missing
        }
    }
}

fn resolve_in_object(map: &Map<String, Value>, path: &str, out: &mut Vec<FieldValue>) -> bool {
    let mut found = false;

    if let Some(value) = map.get(path) {
        collect_leaf(value, out);
        found = true;
    }

    // Any dotted prefix may itself be a key holding the rest of the path.
    for (idx, _) in path.match_indices('.') {
        if let Some(child) = map.get(&path[..idx]) {
            found |= resolve_in_value(child, &path[idx + 1..], out);
        }
    }

    found
}

fn resolve_in_value(value: &Value, path: &str, out: &mut Vec<FieldValue>) -> bool {
    match value {
        Value::Object(map) => resolve_in_object(map, path, out),
        Value::Array(items) => {
            let mut found = false;
            for item in items {
                found |= resolve_in_value(item, path, out);
            }
            found
        }
        _ => false,
    }
}

fn collect_leaf(value: &Value, out: &mut Vec<FieldValue>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_leaf(item, out);
            }
        }
        // An object is not a matchable value.
        Value::Object(_) => {}
        scalar => out.push(FieldValue::from_json(scalar)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl FieldValue {
    /// Convert a scalar JSON value. Containers map to `Null`.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Bool(b) => FieldValue::Boolean(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            _ => FieldValue::Null,
        }
    }

    /// Extract as string, returning None for non-text values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Compare against a string literal, coercing the literal to this value's type.
    ///
    /// A literal that does not parse as the value's type never matches, and
    /// `Null` matches nothing.
    pub fn equals_str(&self, literal: &str) -> bool {
        match self {
            FieldValue::Text(s) => s == literal,
            FieldValue::Integer(i) => {
                let literal = literal.trim();
                match literal.parse::<i64>() {
                    Ok(v) => v == *i,
                    Err(_) => literal.parse::<f64>().map(|v| v == *i as f64).unwrap_or(false),
                }
            }
            FieldValue::Float(f) => literal.trim().parse::<f64>().map(|v| v == *f).unwrap_or(false),
            FieldValue::Boolean(b) => match literal.trim() {
                "true" => *b,
                "false" => !*b,
                _ => false,
            },
            FieldValue::Null => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Boolean(b) => write!(f, "{b}"),
            FieldValue::Null => write!(f, "null"),
        }
    }
}

impl FieldLookup {
    /// Values found at the path; empty when missing.
    pub fn values(&self) -> &[FieldValue] {
        match self {
            FieldLookup::Missing => &[],
            FieldLookup::Present(values) => values,
        }
    }

    pub fn is_present(&self, presence: FieldPresence) -> bool {
        match (self, presence) {
            (FieldLookup::Missing, _) => false,
            (FieldLookup::Present(_), FieldPresence::Key) => true,
            (FieldLookup::Present(values), FieldPresence::Indexed) => {
                values.iter().any(|v| !v.is_null())
            }
        }
    }
}

impl fmt::Display for FieldPresence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPresence::Key => write!(f, "key"),
            FieldPresence::Indexed => write!(f, "indexed"),
        }
    }
}

impl FromStr for FieldPresence {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "key" => Ok(FieldPresence::Key),
            "indexed" => Ok(FieldPresence::Indexed),
            other => Err(format!("unknown field presence mode: '{other}' (expected key or indexed)")),
        }
    }
}
