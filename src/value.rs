//! Value kinds accepted and produced by the preference store.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use url::Url;

use crate::codec;

/// A preference value.
///
/// The first nine variants are the kinds the store knows how to persist.
/// `Array` and `Map` exist so that registered defaults can hold structured
/// values; writing them through [`PreferenceStore::set_object`] is a no-op.
///
/// [`PreferenceStore::set_object`]: crate::PreferenceStore::set_object
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 32-bit integer, persisted in the backend's int slot.
    Int(i32),
    /// 64-bit integer, persisted in the backend's long slot.
    Long(i64),
    /// Floating-point number, persisted in the backend's float slot.
    Float(f64),
    Bool(bool),
    /// Numeric value of unspecified width. Persisted as its text.
    Number(serde_json::Number),
    String(String),
    /// Locator, persisted as its serialized text.
    Url(Url),
    /// Binary blob, persisted as a prefixed base64 string.
    Data(Vec<u8>),
    /// Timestamp, persisted as a prefixed ISO-8601 string.
    Date(DateTime<Utc>),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

/// A value in one of the slots a backend stores natively.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Int(i32),
    Long(i64),
    Float(f64),
    Bool(bool),
    String(String),
}

impl Value {
    /// Short name of the variant, used in logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Url(_) => "url",
            Self::Data(_) => "data",
            Self::Date(_) => "date",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }

    /// Returns the value as `f64` if it is one of the numeric kinds.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(f64::from(*v)),
            Self::Long(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Returns the value as `i64` if it is one of the numeric kinds.
    ///
    /// Floats truncate toward zero and saturate at the `i64` bounds; NaN is 0.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            Self::Float(v) => Some(*v as i64),
            Self::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            _ => None,
        }
    }

    /// Textual representation of a numeric value.
    ///
    /// Floats always carry a fractional part (`1.0`, not `1`).
    pub fn numeric_text(&self) -> Option<String> {
        match self {
            Self::Int(v) => Some(v.to_string()),
            Self::Long(v) => Some(v.to_string()),
            Self::Float(v) => Some(format!("{v:?}")),
            Self::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Converts to JSON for display and export.
    ///
    /// Blobs become base64 strings and timestamps ISO-8601 strings; non-finite
    /// floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Self::Int(v) => Json::from(*v),
            Self::Long(v) => Json::from(*v),
            Self::Float(v) => serde_json::Number::from_f64(*v)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Self::Bool(v) => Json::Bool(*v),
            Self::Number(n) => Json::Number(n.clone()),
            Self::String(s) => Json::String(s.clone()),
            Self::Url(u) => Json::String(u.as_str().to_string()),
            Self::Data(bytes) => Json::String(codec::encode_base64(bytes)),
            Self::Date(d) => Json::String(codec::format_date(d)),
            Self::Array(items) => Json::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Converts from JSON. Numbers become [`Value::Number`]; `null` and
    /// `null` array/object members are dropped.
    pub fn from_json(json: serde_json::Value) -> Option<Self> {
        use serde_json::Value as Json;

        match json {
            Json::Null => None,
            Json::Bool(b) => Some(Self::Bool(b)),
            Json::Number(n) => Some(Self::Number(n)),
            Json::String(s) => Some(Self::String(s)),
            Json::Array(items) => Some(Self::Array(
                items.into_iter().filter_map(Self::from_json).collect(),
            )),
            Json::Object(entries) => Some(Self::Map(
                entries
                    .into_iter()
                    .filter_map(|(k, v)| Self::from_json(v).map(|v| (k, v)))
                    .collect(),
            )),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Bool(b) => f.write_str(if *b { "YES" } else { "NO" }),
            other => match other.numeric_text() {
                Some(text) => f.write_str(&text),
                None => write!(f, "{}", other.to_json()),
            },
        }
    }
}

impl From<Primitive> for Value {
    fn from(p: Primitive) -> Self {
        match p {
            Primitive::Int(v) => Self::Int(v),
            Primitive::Long(v) => Self::Long(v),
            Primitive::Float(v) => Self::Float(v),
            Primitive::Bool(v) => Self::Bool(v),
            Primitive::String(v) => Self::String(v),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Url> for Value {
    fn from(v: Url) -> Self {
        Self::Url(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Data(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Date(v)
    }
}
