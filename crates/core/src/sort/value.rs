//! A single scalar emitted by a search engine sort key

use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Longest raw fragment quoted back in a decode error
const MAX_RAW_EXCERPT: usize = 128;

/// One position of a sort tuple
///
/// Nested arrays and objects are kept as an opaque JSON value so they can be
/// sent back unchanged in a `search_after` cursor.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
    Nested(Value),
}

/// Discriminant of a [`SortValue`], handy for comparing decoded shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortValueKind {
    Int,
    Float,
    Str,
    Bool,
    Null,
    Nested,
}

impl SortValue {
    pub fn kind(&self) -> SortValueKind {
        match self {
            Self::Int(_) => SortValueKind::Int,
            Self::Float(_) => SortValueKind::Float,
            Self::Str(_) => SortValueKind::Str,
            Self::Bool(_) => SortValueKind::Bool,
            Self::Null => SortValueKind::Null,
            Self::Nested(_) => SortValueKind::Nested,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// NaN and infinities are refused rather than written as `null`, the same
/// values the decoder rejects.
impl Serialize for SortValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) if !f.is_finite() => Err(S::Error::custom(format!(
                "sort value {f} is not a finite number"
            ))),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Str(s) => serializer.serialize_str(s),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Null => serializer.serialize_unit(),
            Self::Nested(v) => v.serialize(serializer),
        }
    }
}

impl fmt::Display for SortValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Null => f.write_str("null"),
            Self::Nested(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for SortValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for SortValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for SortValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

/// Non-finite values are accepted here but fail to serialize
impl From<f64> for SortValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for SortValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<String> for SortValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&str> for SortValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl<T: Into<SortValue>> From<Option<T>> for SortValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Converts an already-parsed JSON value
///
/// Numbers that fit `i64` become [`SortValue::Int`]; every other number
/// (fractional, or an unsigned value above `i64::MAX`) becomes a float.
impl From<Value> for SortValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::String(s) => Self::Str(s),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map_or(Self::Null, Self::Float),
            },
            nested @ (Value::Array(_) | Value::Object(_)) => Self::Nested(nested),
        }
    }
}

/// Why a raw fragment could not become a [`SortValue`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Rejection(pub(crate) String);

impl Rejection {
    fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Shortens a raw fragment for inclusion in an error message
pub(crate) fn excerpt(raw: &str) -> String {
    if raw.len() <= MAX_RAW_EXCERPT {
        return raw.to_string();
    }
    let mut end = MAX_RAW_EXCERPT;
    while !raw.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &raw[..end])
}

/// Classifies one raw JSON fragment by its leading byte
///
/// Numeric literals never pass through a float-first decoder: the literal
/// text itself decides between integer and float.
pub(crate) fn classify(raw: &str) -> Result<SortValue, Rejection> {
    let raw = raw.trim();
    match raw.as_bytes().first() {
        Some(b'"') => decode_string(raw).map(SortValue::Str),
        Some(b't' | b'f') => serde_json::from_str::<bool>(raw)
            .map(SortValue::Bool)
            .map_err(|e| Rejection::new(format!("is not a boolean: {e}"))),
        Some(b'n') if raw == "null" => Ok(SortValue::Null),
        Some(b'[' | b'{') => serde_json::from_str::<Value>(raw)
            .map(SortValue::Nested)
            .map_err(|e| Rejection::new(format!("is not valid JSON: {e}"))),
        Some(b'-' | b'0'..=b'9') => parse_number(raw),
        Some(_) => Err(Rejection::new("is not a JSON value")),
        None => Err(Rejection::new("is empty")),
    }
}

/// Decodes a numeric literal
///
/// A literal with a decimal point or exponent marker is a float. Anything else
/// is an integer, falling back to float only when it overflows `i64`.
pub(crate) fn parse_number(literal: &str) -> Result<SortValue, Rejection> {
    if literal.contains(['.', 'e', 'E']) {
        return parse_float(literal).map(SortValue::Float);
    }
    match literal.parse::<i64>() {
        Ok(i) => Ok(SortValue::Int(i)),
        Err(int_err) => parse_float(literal).map(SortValue::Float).map_err(|float_err| {
            Rejection::new(format!(
                "converts to neither int64 ({int_err}) nor float64 ({})",
                float_err.0
            ))
        }),
    }
}

pub(crate) fn parse_int(literal: &str) -> Result<i64, Rejection> {
    literal
        .parse::<i64>()
        .map_err(|e| Rejection::new(format!("convert to int64 failed: {e}")))
}

pub(crate) fn parse_float(literal: &str) -> Result<f64, Rejection> {
    let value = literal
        .parse::<f64>()
        .map_err(|e| Rejection::new(format!("convert to float64 failed: {e}")))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Rejection::new("convert to float64 failed: value out of range"))
    }
}

pub(crate) fn decode_string(raw: &str) -> Result<String, Rejection> {
    if !raw.starts_with('"') {
        return Err(Rejection::new("is not a string"));
    }
    serde_json::from_str::<String>(raw)
        .map_err(|e| Rejection::new(format!("is not a valid string: {e}")))
}
