//! Typed cell values and per-cell read results.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::types::IsoDuration;

/// A cell value, either raw (string or JSON-native) or cast to a field type.
///
/// Raw input and cast output share this type so an already-typed value can
/// be passed through a caster again and come back unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Number(BigDecimal),
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Duration(IsoDuration),
    Year(i32),
    YearMonth { year: i32, month: u32 },
    GeoPoint { lon: Decimal, lat: Decimal },
    Array(Vec<JsonValue>),
    Object(JsonMap<String, JsonValue>),
}

impl Value {
    /// Returns true for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the inner string of a `String` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::DateTime(_) => "datetime",
            Value::Duration(_) => "duration",
            Value::Year(_) => "year",
            Value::YearMonth { .. } => "yearmonth",
            Value::GeoPoint { .. } => "geopoint",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Length of sequence-like values (characters, items or keys).
    pub fn length(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::Array(items) => Some(items.len()),
            Value::Object(map) => Some(map.len()),
            _ => None,
        }
    }

    /// Canonical text used to compare values for uniqueness.
    pub fn canonical(&self) -> String {
        match self {
            Value::Number(d) => format!("number:{}", d.normalized()),
            Value::GeoPoint { lon, lat } => {
                format!("geopoint:{},{}", lon.normalize(), lat.normalize())
            }
            other => format!("{}:{}", other.kind(), other.to_json()),
        }
    }

    /// Equality that tolerates numeric widening and textual references.
    ///
    /// Used when matching cast cells against caller-supplied reference rows,
    /// which may still hold raw strings.
    pub fn matches(&self, other: &Value) -> bool {
        if self == other {
            return true;
        }
        match (self, other) {
            (Value::Integer(a), Value::Number(b)) | (Value::Number(b), Value::Integer(a)) => {
                BigDecimal::from(*a) == *b
            }
            (Value::String(s), v) | (v, Value::String(s)) if !v.is_null() => *s == v.to_string(),
            _ => false,
        }
    }

    /// Convert to a JSON value.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Boolean(b) => JsonValue::Bool(*b),
            Value::Integer(n) => JsonValue::from(*n),
            Value::Number(d) => number_to_json(d),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Date(_) | Value::Time(_) | Value::DateTime(_) | Value::Duration(_) => {
                JsonValue::String(self.to_string())
            }
            Value::Year(y) => JsonValue::from(*y),
            Value::YearMonth { .. } => JsonValue::String(self.to_string()),
            Value::GeoPoint { lon, lat } => {
                let mut map = JsonMap::new();
                map.insert("lon".to_string(), decimal_to_json(lon));
                map.insert("lat".to_string(), decimal_to_json(lat));
                JsonValue::Object(map)
            }
            Value::Array(items) => JsonValue::Array(items.clone()),
            Value::Object(map) => JsonValue::Object(map.clone()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Number(b)) => BigDecimal::from(*a).partial_cmp(b),
            (Value::Number(a), Value::Integer(b)) => a.partial_cmp(&BigDecimal::from(*b)),
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.partial_cmp(b),
            (Value::Date(a), Value::Date(b)) => a.partial_cmp(b),
            (Value::Time(a), Value::Time(b)) => a.partial_cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.partial_cmp(b),
            (Value::Duration(a), Value::Duration(b)) => a.partial_cmp(b),
            (Value::Year(a), Value::Year(b)) => a.partial_cmp(b),
            (
                Value::YearMonth { year: y1, month: m1 },
                Value::YearMonth { year: y2, month: m2 },
            ) => (y1, m1).partial_cmp(&(y2, m2)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Number(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "{}", s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.fZ")),
            Value::Duration(d) => write!(f, "{}", d),
            Value::Year(y) => write!(f, "{}", y),
            Value::YearMonth { year, month } => write!(f, "{:04}-{:02}", year, month),
            Value::GeoPoint { lon, lat } => write!(f, "{},{}", lon, lat),
            Value::Array(_) | Value::Object(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<BigDecimal> for Value {
    fn from(d: BigDecimal) -> Self {
        Value::Number(d)
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Boolean(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => parse_number_text(&n.to_string())
                    .map(Value::Number)
                    .unwrap_or_else(|| Value::String(n.to_string())),
            },
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::Array(items),
            JsonValue::Object(map) => Value::Object(map),
        }
    }
}

impl From<&JsonValue> for Value {
    fn from(json: &JsonValue) -> Self {
        Value::from(json.clone())
    }
}

/// Largest decimal exponent accepted for a `number`, in either direction.
const MAX_NUMBER_EXPONENT: i64 = 4096;

/// Parse plain or scientific notation into an unbounded decimal.
pub(crate) fn parse_number_text(text: &str) -> Option<BigDecimal> {
    let leading = |c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.');
    if text.contains('_') || !text.starts_with(leading) {
        return None;
    }
    let number = BigDecimal::from_str(text).ok()?;
    let (digits, scale) = number.as_bigint_and_exponent();
    let exponent = digits.to_string().trim_start_matches('-').len() as i64 - scale;
    (exponent.abs() <= MAX_NUMBER_EXPONENT).then_some(number)
}

/// Parse plain or scientific decimal notation into a bounded decimal.
pub(crate) fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Read a decimal out of a JSON number or numeric string.
pub(crate) fn decimal_from_json(json: &JsonValue) -> Option<Decimal> {
    match json {
        JsonValue::Number(n) => parse_decimal(&n.to_string()),
        JsonValue::String(s) => parse_decimal(s.trim()),
        _ => None,
    }
}

fn number_to_json(d: &BigDecimal) -> JsonValue {
    let normalized = d.normalized();
    let (_, scale) = normalized.as_bigint_and_exponent();
    if (-18..=0).contains(&scale) {
        if let Some(n) = normalized.to_i64() {
            return JsonValue::from(n);
        }
    }
    let text = normalized.to_string();
    // Digits a float cannot carry are kept by emitting the exact text.
    match serde_json::from_str::<serde_json::Number>(&text) {
        Ok(n) if parse_number_text(&n.to_string()).is_some_and(|back| back == normalized) => {
            JsonValue::Number(n)
        }
        _ => JsonValue::String(text),
    }
}

fn decimal_to_json(d: &Decimal) -> JsonValue {
    let normalized = d.normalize();
    if normalized.scale() == 0 {
        if let Ok(n) = i64::try_from(normalized.mantissa()) {
            return JsonValue::from(n);
        }
    }
    serde_json::from_str::<serde_json::Number>(&normalized.to_string())
        .map(JsonValue::Number)
        .unwrap_or_else(|_| JsonValue::String(normalized.to_string()))
}

/// Marker for a cell that could not be cast, keeping the unparsed input.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedCast {
    pub raw: Value,
}

impl FailedCast {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }
}

/// One cell of an emitted table row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Successfully cast scalar.
    Value(Value),
    /// Foreign key resolved to the matching reference row.
    Reference(IndexMap<String, Value>),
    /// Foreign key value with no match; keeps the cast value.
    Unresolved(Value),
    /// Cast failure recorded in continuation mode.
    Failed(FailedCast),
}

impl Cell {
    /// The cast value, if this cell holds a plain value.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Cell::Value(v) | Cell::Unresolved(v) => Some(v),
            _ => None,
        }
    }

    /// The resolved reference row, if any.
    pub fn as_reference(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Cell::Reference(row) => Some(row),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Cell::Failed(_))
    }

    /// Convert to a JSON value; failed cells emit their raw input.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Cell::Value(v) | Cell::Unresolved(v) => v.to_json(),
            Cell::Reference(row) => JsonValue::Object(
                row.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Cell::Failed(failed) => failed.raw.to_json(),
        }
    }
}

impl From<Value> for Cell {
    fn from(value: Value) -> Self {
        Cell::Value(value)
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
