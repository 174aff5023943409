//! Declared value types of a list and their canonical membership keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use sift_core::FieldValue;

use crate::error::ListError;

/// Supported list value types.
///
/// Every list item and every document value is reduced to a canonical string
/// key for its type, so `10.0.0.01`-style spellings or `1.0` vs `1` compare
/// the way the type says they should.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListType {
    Keyword,
    Text,
    Ip,
    Long,
    Integer,
    Short,
    Byte,
    Double,
    Float,
    HalfFloat,
    Boolean,
}

/// All list types, in declaration order.
pub const LIST_TYPES: &[&str] = &[
    "keyword",
    "text",
    "ip",
    "long",
    "integer",
    "short",
    "byte",
    "double",
    "float",
    "half_float",
    "boolean",
];

impl ListType {
    /// Canonical key for a raw list item, or `None` if it does not parse.
    pub fn canonicalize(&self, raw: &str) -> Option<String> {
        match self {
            ListType::Keyword | ListType::Text => Some(raw.to_string()),
            ListType::Ip => raw.trim().parse::<IpAddr>().ok().map(|ip| ip.to_string()),
            ListType::Long | ListType::Integer | ListType::Short | ListType::Byte => {
                let n = raw.trim().parse::<i64>().ok()?;
                self.integer_in_range(n).then(|| n.to_string())
            }
            ListType::Double | ListType::Float | ListType::HalfFloat => {
                let f = raw.trim().parse::<f64>().ok()?;
                canonical_float(f)
            }
            ListType::Boolean => match raw.trim() {
                "true" => Some("true".to_string()),
                "false" => Some("false".to_string()),
                _ => None,
            },
        }
    }

    /// Canonical key for a document value, or `None` on a type mismatch.
    ///
    /// Non-text values against `keyword`/`text` lists have no key here;
    /// [`ValueList::contains`](crate::ValueList::contains) compares those
    /// with the coercion `match` entries use.
    pub fn canonicalize_value(&self, value: &FieldValue) -> Option<String> {
        match (self, value) {
            (_, FieldValue::Null) => None,
            (ListType::Keyword | ListType::Text, FieldValue::Text(s)) => Some(s.clone()),
            (ListType::Ip, FieldValue::Text(s)) => self.canonicalize(s),
            (
                ListType::Long | ListType::Integer | ListType::Short | ListType::Byte,
                FieldValue::Integer(n),
            ) => self.integer_in_range(*n).then(|| n.to_string()),
            (ListType::Double | ListType::Float | ListType::HalfFloat, FieldValue::Float(f)) => {
                canonical_float(*f)
            }
            (ListType::Double | ListType::Float | ListType::HalfFloat, FieldValue::Integer(n)) => {
                canonical_float(*n as f64)
            }
            (ListType::Boolean, FieldValue::Boolean(b)) => Some(b.to_string()),
            _ => None,
        }
    }

    fn integer_in_range(&self, n: i64) -> bool {
        match self {
            ListType::Integer => i32::try_from(n).is_ok(),
            ListType::Short => i16::try_from(n).is_ok(),
            ListType::Byte => i8::try_from(n).is_ok(),
            _ => true,
        }
    }
}

fn canonical_float(f: f64) -> Option<String> {
    if f.is_nan() {
        return None;
    }
    // -0.0 and 0.0 are the same list member.
    let f = if f == 0.0 { 0.0 } else { f };
    Some(f.to_string())
}

impl fmt::Display for ListType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ListType::Keyword => "keyword",
            ListType::Text => "text",
            ListType::Ip => "ip",
            ListType::Long => "long",
            ListType::Integer => "integer",
            ListType::Short => "short",
            ListType::Byte => "byte",
            ListType::Double => "double",
            ListType::Float => "float",
            ListType::HalfFloat => "half_float",
            ListType::Boolean => "boolean",
        };
        write!(f, "{name}")
    }
}

impl FromStr for ListType {
    type Err = ListError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "keyword" => Ok(ListType::Keyword),
            "text" => Ok(ListType::Text),
            "ip" => Ok(ListType::Ip),
            "long" => Ok(ListType::Long),
            "integer" => Ok(ListType::Integer),
            "short" => Ok(ListType::Short),
            "byte" => Ok(ListType::Byte),
            "double" => Ok(ListType::Double),
            "float" => Ok(ListType::Float),
            "half_float" => Ok(ListType::HalfFloat),
            "boolean" => Ok(ListType::Boolean),
            other => Err(ListError::UnknownType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for name in LIST_TYPES {
            let t: ListType = name.parse().unwrap();
            assert_eq!(&t.to_string(), name);
        }
        assert!(matches!(
            "geo_point".parse::<ListType>(),
            Err(ListError::UnknownType(name)) if name == "geo_point"
        ));
    }

    #[test]
    fn keyword_is_verbatim() {
        assert_eq!(ListType::Keyword.canonicalize(" word one"), Some(" word one".to_string()));
        assert_eq!(
            ListType::Keyword.canonicalize_value(&FieldValue::Text("word one".into())),
            Some("word one".to_string())
        );
        assert_eq!(ListType::Keyword.canonicalize_value(&FieldValue::Integer(1)), None);
        assert_eq!(ListType::Keyword.canonicalize_value(&FieldValue::Null), None);
    }

    #[test]
    fn ip_normalizes() {
        assert_eq!(ListType::Ip.canonicalize("::0001"), Some("::1".to_string()));
        assert_eq!(ListType::Ip.canonicalize("127.0.0.1"), Some("127.0.0.1".to_string()));
        assert_eq!(ListType::Ip.canonicalize("not an ip"), None);
    }

    #[test]
    fn integer_ranges() {
        assert_eq!(ListType::Long.canonicalize("70000"), Some("70000".to_string()));
        assert_eq!(ListType::Short.canonicalize("70000"), None);
        assert_eq!(ListType::Byte.canonicalize("-128"), Some("-128".to_string()));
        assert_eq!(ListType::Byte.canonicalize("128"), None);
        assert_eq!(ListType::Integer.canonicalize_value(&FieldValue::Integer(i64::MAX)), None);
        assert_eq!(ListType::Long.canonicalize_value(&FieldValue::Text("5".into())), None);
    }

    #[test]
    fn floats_compare_numerically() {
        assert_eq!(ListType::Double.canonicalize("1.0"), ListType::Double.canonicalize("1"));
        assert_eq!(
            ListType::Double.canonicalize("1"),
            ListType::Double.canonicalize_value(&FieldValue::Integer(1))
        );
        assert_eq!(ListType::Float.canonicalize("-0.0"), ListType::Float.canonicalize("0"));
        assert_eq!(ListType::Double.canonicalize("NaN"), None);
    }

    #[test]
    fn booleans() {
        assert_eq!(ListType::Boolean.canonicalize("true"), Some("true".to_string()));
        assert_eq!(ListType::Boolean.canonicalize("yes"), None);
        assert_eq!(
            ListType::Boolean.canonicalize_value(&FieldValue::Boolean(false)),
            Some("false".to_string())
        );
    }
}
