//! Cast function table: one pure caster per (type, format) pair.
//!
//! Every caster has the signature [`CastFn`] and returns
//! `Err(CastFailure)` instead of panicking or raising, so casting is total
//! over its input domain. [`caster`] resolves a field's declared type and
//! format against the finite [`CAST_TABLE`]; combinations missing from the
//! table are rejected when a field is built.

mod numeric;
mod scalar;
mod structured;
mod temporal;

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{
    DEFAULT_BARE_NUMBER, DEFAULT_DECIMAL_CHAR, DEFAULT_FALSE_VALUES, DEFAULT_GROUP_CHAR,
    DEFAULT_TRUE_VALUES,
};
use crate::value::Value;

pub use temporal::IsoDuration;

/// Declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Any,
    Array,
    Boolean,
    Date,
    Datetime,
    Duration,
    Geojson,
    Geopoint,
    Integer,
    Number,
    Object,
    String,
    Time,
    Year,
    Yearmonth,
}

impl FieldType {
    /// All declarable types.
    pub const ALL: [FieldType; 15] = [
        FieldType::Any,
        FieldType::Array,
        FieldType::Boolean,
        FieldType::Date,
        FieldType::Datetime,
        FieldType::Duration,
        FieldType::Geojson,
        FieldType::Geopoint,
        FieldType::Integer,
        FieldType::Number,
        FieldType::Object,
        FieldType::String,
        FieldType::Time,
        FieldType::Year,
        FieldType::Yearmonth,
    ];

    /// Descriptor name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Any => "any",
            FieldType::Array => "array",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Duration => "duration",
            FieldType::Geojson => "geojson",
            FieldType::Geopoint => "geopoint",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Object => "object",
            FieldType::String => "string",
            FieldType::Time => "time",
            FieldType::Year => "year",
            FieldType::Yearmonth => "yearmonth",
        }
    }

    /// Returns true if this type is temporal.
    pub fn is_temporal(&self) -> bool {
        matches!(self, FieldType::Date | FieldType::Time | FieldType::Datetime)
    }
}

impl Default for FieldType {
    fn default() -> Self {
        FieldType::String
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown field type \"{}\"", s))
    }
}

/// Resolved field format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Format {
    Default,
    Any,
    Email,
    Uri,
    Uuid,
    Binary,
    Array,
    Object,
    Topojson,
    /// `strptime`-style pattern for temporal types.
    Pattern(String),
}

/// Variant tag of a [`Format`], used as the dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatTag {
    Default,
    Any,
    Email,
    Uri,
    Uuid,
    Binary,
    Array,
    Object,
    Topojson,
    Pattern,
}

impl Format {
    pub fn tag(&self) -> FormatTag {
        match self {
            Format::Default => FormatTag::Default,
            Format::Any => FormatTag::Any,
            Format::Email => FormatTag::Email,
            Format::Uri => FormatTag::Uri,
            Format::Uuid => FormatTag::Uuid,
            Format::Binary => FormatTag::Binary,
            Format::Array => FormatTag::Array,
            Format::Object => FormatTag::Object,
            Format::Topojson => FormatTag::Topojson,
            Format::Pattern(_) => FormatTag::Pattern,
        }
    }

    /// Descriptor spelling of the format.
    pub fn as_str(&self) -> Cow<'_, str> {
        match self {
            Format::Default => "default".into(),
            Format::Any => "any".into(),
            Format::Email => "email".into(),
            Format::Uri => "uri".into(),
            Format::Uuid => "uuid".into(),
            Format::Binary => "binary".into(),
            Format::Array => "array".into(),
            Format::Object => "object".into(),
            Format::Topojson => "topojson".into(),
            Format::Pattern(p) => Cow::Borrowed(p.as_str()),
        }
    }

    /// Resolve a descriptor format string for the given type.
    ///
    /// Returns `None` when the type does not support the format.
    pub fn resolve(field_type: FieldType, raw: &str) -> Option<Format> {
        let format = match raw {
            "default" => Format::Default,
            "any" => Format::Any,
            "email" => Format::Email,
            "uri" => Format::Uri,
            "uuid" => Format::Uuid,
            "binary" => Format::Binary,
            "array" => Format::Array,
            "object" => Format::Object,
            "topojson" => Format::Topojson,
            pattern if field_type.is_temporal() => {
                // Legacy descriptors spell patterns as `fmt:<pattern>`.
                let pattern = pattern.strip_prefix("fmt:").unwrap_or(pattern);
                Format::Pattern(pattern.to_string())
            }
            _ => return None,
        };
        caster(field_type, &format).map(|_| format)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

/// Sentinel returned by casters for values outside the type's domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastFailure;

impl fmt::Display for CastFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("value can't be cast")
    }
}

pub type CastResult = Result<Value, CastFailure>;

/// Signature shared by every caster.
pub type CastFn = fn(&Format, &Value, &CastOptions) -> CastResult;

/// Type-specific options read from a field descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct CastOptions {
    /// Decimal separator for numbers.
    pub decimal_char: String,
    /// Thousands separator for numbers (empty = none).
    pub group_char: String,
    /// When false, non-numeric wrappers such as `$` or `EUR` are stripped.
    pub bare_number: bool,
    /// Strip Unicode currency symbols from numbers.
    pub currency: bool,
    pub true_values: Vec<String>,
    pub false_values: Vec<String>,
}

impl Default for CastOptions {
    fn default() -> Self {
        Self {
            decimal_char: DEFAULT_DECIMAL_CHAR.to_string(),
            group_char: DEFAULT_GROUP_CHAR.to_string(),
            bare_number: DEFAULT_BARE_NUMBER,
            currency: false,
            true_values: DEFAULT_TRUE_VALUES.iter().map(|s| s.to_string()).collect(),
            false_values: DEFAULT_FALSE_VALUES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CastOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_decimal_char(mut self, decimal_char: impl Into<String>) -> Self {
        self.decimal_char = decimal_char.into();
        self
    }

    pub fn with_group_char(mut self, group_char: impl Into<String>) -> Self {
        self.group_char = group_char.into();
        self
    }

    pub fn with_bare_number(mut self, bare_number: bool) -> Self {
        self.bare_number = bare_number;
        self
    }

    pub fn with_currency(mut self, currency: bool) -> Self {
        self.currency = currency;
        self
    }

    pub fn with_true_values(mut self, values: Vec<String>) -> Self {
        self.true_values = values;
        self
    }

    pub fn with_false_values(mut self, values: Vec<String>) -> Self {
        self.false_values = values;
        self
    }
}

/// Every valid (type, formats, caster) combination.
pub static CAST_TABLE: &[(FieldType, &[FormatTag], CastFn)] = &[
    (FieldType::Any, &[FormatTag::Default], scalar::cast_any),
    (FieldType::Array, &[FormatTag::Default], structured::cast_array),
    (FieldType::Boolean, &[FormatTag::Default], scalar::cast_boolean),
    (
        FieldType::Date,
        &[FormatTag::Default, FormatTag::Any, FormatTag::Pattern],
        temporal::cast_date,
    ),
    (
        FieldType::Datetime,
        &[FormatTag::Default, FormatTag::Any, FormatTag::Pattern],
        temporal::cast_datetime,
    ),
    (FieldType::Duration, &[FormatTag::Default], temporal::cast_duration),
    (
        FieldType::Geojson,
        &[FormatTag::Default, FormatTag::Topojson],
        structured::cast_geojson,
    ),
    (
        FieldType::Geopoint,
        &[FormatTag::Default, FormatTag::Array, FormatTag::Object],
        structured::cast_geopoint,
    ),
    (FieldType::Integer, &[FormatTag::Default], numeric::cast_integer),
    (FieldType::Number, &[FormatTag::Default], numeric::cast_number),
    (FieldType::Object, &[FormatTag::Default], structured::cast_object),
    (
        FieldType::String,
        &[
            FormatTag::Default,
            FormatTag::Email,
            FormatTag::Uri,
            FormatTag::Uuid,
            FormatTag::Binary,
        ],
        scalar::cast_string,
    ),
    (
        FieldType::Time,
        &[FormatTag::Default, FormatTag::Any, FormatTag::Pattern],
        temporal::cast_time,
    ),
    (FieldType::Year, &[FormatTag::Default], numeric::cast_year),
    (FieldType::Yearmonth, &[FormatTag::Default], numeric::cast_yearmonth),
];

/// Formats accepted by a type.
pub fn supported_formats(field_type: FieldType) -> &'static [FormatTag] {
    CAST_TABLE
        .iter()
        .find(|(t, _, _)| *t == field_type)
        .map(|(_, formats, _)| *formats)
        .unwrap_or(&[])
}

/// Look up the caster for a (type, format) pair.
pub fn caster(field_type: FieldType, format: &Format) -> Option<CastFn> {
    let tag = format.tag();
    CAST_TABLE
        .iter()
        .find(|(t, formats, _)| *t == field_type && formats.contains(&tag))
        .map(|(_, _, cast)| *cast)
}

/// Cast a value, treating unknown (type, format) pairs as failures.
pub fn cast(
    field_type: FieldType,
    format: &Format,
    value: &Value,
    options: &CastOptions,
) -> CastResult {
    match caster(field_type, format) {
        Some(cast_fn) => cast_fn(format, value, options),
        None => Err(CastFailure),
    }
}
