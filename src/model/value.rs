//! Tagged scalar values and composite key components

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// A predicate value: the closed set of types WHERE terms may carry.
///
/// Comparison is defined within one tag only. Cross-tag `PartialEq` is
/// always false and cross-tag `partial_cmp` is `None`; compile paths never
/// produce a cross-tag comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Str(String),
    U64(u64),
    Dbl(f64),
}

impl Value {
    /// Builds a value from a raw JSON scalar (provisional typing).
    ///
    /// Signed integers are folded into the unsigned tag the way the store
    /// keys them; anything non-scalar yields `None`.
    pub fn from_json(raw: &serde_json::Value) -> Option<Value> {
        match raw {
            serde_json::Value::String(s) => Some(Value::Str(s.clone())),
            serde_json::Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Some(Value::U64(u))
                } else if let Some(i) = n.as_i64() {
                    Some(Value::U64(i as u64))
                } else {
                    n.as_f64().map(Value::Dbl)
                }
            }
            _ => None,
        }
    }

    /// Coerces a stringified scalar to a schema-declared type.
    ///
    /// This is the authoritative typing step for stats terms; unparseable
    /// numerics fall back to zero, matching the store's tolerant key
    /// encoding. `Blank` and `Uuid` columns are not filterable.
    pub fn coerce(raw: &str, datatype: DataType) -> Option<Value> {
        match datatype {
            DataType::Str => Some(Value::Str(raw.to_string())),
            DataType::U64 => Some(Value::U64(raw.parse().unwrap_or(0))),
            DataType::Dbl => Some(Value::Dbl(raw.parse().unwrap_or(0.0))),
            DataType::Blank | DataType::Uuid => None,
        }
    }

    /// Tag name, for diagnostics.
    pub fn tag(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::U64(_) => "u64",
            Value::Dbl(_) => "double",
        }
    }

    pub fn is_str(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    pub fn same_tag(&self, other: &Value) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::Dbl(a), Value::Dbl(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::U64(a), Value::U64(b)) => Some(a.cmp(b)),
            (Value::Dbl(a), Value::Dbl(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// One component of a composite row key or column range.
///
/// Superset of `Value`: leaf scans additionally key on narrow integers
/// (flow direction, protocol, ports) and IP addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KeyPart {
    Str(String),
    U8(u8),
    U16(u16),
    U64(u64),
    Dbl(f64),
    Ip(IpAddr),
}

impl From<Value> for KeyPart {
    fn from(v: Value) -> KeyPart {
        match v {
            Value::Str(s) => KeyPart::Str(s),
            Value::U64(u) => KeyPart::U64(u),
            Value::Dbl(d) => KeyPart::Dbl(d),
        }
    }
}

/// Schema-declared column data types.
///
/// `Blank` marks an unknown or unset column and always rejects filtering.
/// `Uuid` columns exist in schemas but are not index-filterable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Blank,
    Str,
    U64,
    Dbl,
    Uuid,
}

impl DataType {
    /// Maps a schema datatype string to a type tag; unknown strings are Blank.
    pub fn from_schema_str(s: &str) -> DataType {
        match s {
            "string" => DataType::Str,
            "int" => DataType::U64,
            "double" => DataType::Dbl,
            "uuid" => DataType::Uuid,
            _ => DataType::Blank,
        }
    }
}

/// Stringifies a JSON scalar the way term values are round-tripped before
/// schema coercion. Non-scalars yield an empty string.
pub(crate) fn json_scalar_to_string(raw: &serde_json::Value) -> String {
    match raw {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

// Suffix sets are kept ordered so null-suffix synthesis is deterministic.
pub type SuffixSet = BTreeSet<String>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(
            Value::from_json(&json!("vrouter1")),
            Some(Value::Str("vrouter1".into()))
        );
        assert_eq!(Value::from_json(&json!(42)), Some(Value::U64(42)));
        assert_eq!(Value::from_json(&json!(-5)), Some(Value::U64(-5i64 as u64)));
        assert_eq!(Value::from_json(&json!(1.5)), Some(Value::Dbl(1.5)));
        assert_eq!(Value::from_json(&json!(null)), None);
        assert_eq!(Value::from_json(&json!([1])), None);
    }

    #[test]
    fn test_coerce_to_declared_type() {
        assert_eq!(Value::coerce("7", DataType::U64), Some(Value::U64(7)));
        assert_eq!(
            Value::coerce("7", DataType::Str),
            Some(Value::Str("7".into()))
        );
        assert_eq!(Value::coerce("1.25", DataType::Dbl), Some(Value::Dbl(1.25)));
        // Unparseable numerics fall back to zero
        assert_eq!(Value::coerce("abc", DataType::U64), Some(Value::U64(0)));
        // Blank and Uuid columns are never filterable
        assert_eq!(Value::coerce("x", DataType::Blank), None);
        assert_eq!(Value::coerce("x", DataType::Uuid), None);
    }

    #[test]
    fn test_cross_tag_comparison_is_undefined() {
        let s = Value::Str("7".into());
        let u = Value::U64(7);
        assert_ne!(s, u);
        assert_eq!(s.partial_cmp(&u), None);
    }

    #[test]
    fn test_same_tag_ordering() {
        assert!(Value::Str("a".into()) < Value::Str("b".into()));
        assert!(Value::U64(1) < Value::U64(2));
        assert!(Value::Dbl(1.0) < Value::Dbl(1.5));
    }

    #[test]
    fn test_datatype_from_schema_str() {
        assert_eq!(DataType::from_schema_str("string"), DataType::Str);
        assert_eq!(DataType::from_schema_str("int"), DataType::U64);
        assert_eq!(DataType::from_schema_str("double"), DataType::Dbl);
        assert_eq!(DataType::from_schema_str("uuid"), DataType::Uuid);
        assert_eq!(DataType::from_schema_str("bogus"), DataType::Blank);
    }

    #[test]
    fn test_keypart_from_value() {
        assert_eq!(
            KeyPart::from(Value::Str("x".into())),
            KeyPart::Str("x".into())
        );
        assert_eq!(KeyPart::from(Value::U64(9)), KeyPart::U64(9));
    }

    #[test]
    fn test_json_scalar_to_string() {
        assert_eq!(json_scalar_to_string(&json!("s")), "s");
        assert_eq!(json_scalar_to_string(&json!(17)), "17");
        assert_eq!(json_scalar_to_string(&json!(null)), "");
    }
}
