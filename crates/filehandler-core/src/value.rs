//! Structured data values.
//!
//! [`Value`] mirrors a JSON document but has native temporal variants. The
//! conversions to and from [`serde_json::Value`] apply the datetime codec:
//! full ISO-8601 datetime strings become [`Value::DateTime`] /
//! [`Value::DateTimeTz`] on the way in and canonical strings on the way out.
//! Object keys are never converted and keep their insertion order.

use crate::datetime::{format_naive, format_offset, parse_datetime, ParsedDateTime};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use indexmap::IndexMap;
use serde_json::Number;

/// A structured (JSON-like) value with native datetimes.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Integer that fits in `i64`
    Int(i64),
    /// Any other number
    Float(f64),
    /// Text that is not a datetime
    String(String),
    /// Datetime without offset
    DateTime(NaiveDateTime),
    /// Datetime with a UTC offset
    DateTimeTz(DateTime<FixedOffset>),
    /// Ordered sequence
    List(Vec<Value>),
    /// Object with insertion-ordered keys
    Map(IndexMap<String, Value>),
}

impl Value {
    /// Convert a parsed JSON document, turning datetime strings into datetimes.
    #[must_use]
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .unwrap_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN))),
            serde_json::Value::String(s) => match parse_datetime(&s) {
                Some(ParsedDateTime::Naive(dt)) => Self::DateTime(dt),
                Some(ParsedDateTime::Offset(dt)) => Self::DateTimeTz(dt),
                None => Self::String(s),
            },
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to a JSON document, turning datetimes into canonical strings.
    ///
    /// Non-finite floats have no JSON form and become `null`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::Number((*i).into()),
            Self::Float(f) => {
                Number::from_f64(*f).map_or(serde_json::Value::Null, serde_json::Value::Number)
            }
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::DateTime(dt) => serde_json::Value::String(format_naive(dt)),
            Self::DateTimeTz(dt) => serde_json::Value::String(format_offset(dt)),
            Self::List(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    /// Look up a key in a map value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Returns the string slice if this is a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short type name used in summaries.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::DateTime(_) | Self::DateTimeTz(_) => "datetime",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Self::DateTime(dt)
    }
}

impl<V: Into<Value>> FromIterator<(String, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        Self::Map(iter.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_timestamp_becomes_datetime() {
        let value = Value::from_json(json!({"name": "Test", "timestamp": "2024-01-01T12:00:00"}));
        let expected = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(value.get("name").and_then(Value::as_str), Some("Test"));
        assert_eq!(value.get("timestamp"), Some(&Value::DateTime(expected)));
        assert_eq!(
            value.to_json(),
            json!({"name": "Test", "timestamp": "2024-01-01T12:00:00"})
        );
    }

    #[test]
    fn test_nested_conversion_and_key_order() {
        let value = Value::from_json(json!({
            "z": [{"at": "2023-05-06 07:08:09"}, 1, 2.5, null],
            "2024-01-01T00:00:00": true,
            "a": "2024-01-01"
        }));
        let Value::Map(map) = &value else {
            panic!("expected map");
        };
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["z", "2024-01-01T00:00:00", "a"]);
        assert_eq!(map["a"], Value::String("2024-01-01".into()));
        let Value::List(items) = &map["z"] else {
            panic!("expected list");
        };
        assert!(matches!(items[0].get("at"), Some(Value::DateTime(_))));
        assert_eq!(items[1], Value::Int(1));
        assert_eq!(items[2], Value::Float(2.5));
        assert_eq!(items[3], Value::Null);
        // Space separator is normalised to the canonical `T` form on output.
        assert_eq!(value.to_json()["z"][0]["at"], json!("2023-05-06T07:08:09"));
    }

    #[test]
    fn test_non_finite_float_serialises_as_null() {
        assert_eq!(Value::Float(f64::NAN).to_json(), serde_json::Value::Null);
    }

    #[test]
    fn test_from_iterator_builds_map() {
        let value: Value = vec![("a".to_string(), 1i64), ("b".to_string(), 2)]
            .into_iter()
            .collect();
        assert_eq!(value.get("b"), Some(&Value::Int(2)));
        assert_eq!(value.kind(), "map");
    }
}
