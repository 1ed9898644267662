//! Constraint predicates over cast values.

use std::cmp::Ordering;

use regex::Regex;

use super::ConstraintKind;
use crate::value::Value;

/// A compiled constraint, ready to check cast values.
#[derive(Debug, Clone)]
pub enum Check {
    Required,
    /// Enforced across rows by the table reader; always passes per value.
    Unique,
    Pattern(Regex),
    Enum(Vec<Value>),
    Minimum(Value),
    Maximum(Value),
    MinLength(usize),
    MaxLength(usize),
}

impl Check {
    /// Compile a pattern so it must match the whole value.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(&format!("^(?:{})$", pattern)).map(Check::Pattern)
    }

    pub fn kind(&self) -> ConstraintKind {
        match self {
            Check::Required => ConstraintKind::Required,
            Check::Unique => ConstraintKind::Unique,
            Check::Pattern(_) => ConstraintKind::Pattern,
            Check::Enum(_) => ConstraintKind::Enum,
            Check::Minimum(_) => ConstraintKind::Minimum,
            Check::Maximum(_) => ConstraintKind::Maximum,
            Check::MinLength(_) => ConstraintKind::MinLength,
            Check::MaxLength(_) => ConstraintKind::MaxLength,
        }
    }

    /// Check a cast value; `raw` is the value before casting.
    ///
    /// Null values only fail `required`.
    pub fn passes(&self, value: &Value, raw: &Value) -> bool {
        if value.is_null() {
            return !matches!(self, Check::Required);
        }
        match self {
            Check::Required | Check::Unique => true,
            Check::Pattern(regex) => check_pattern(regex, raw),
            Check::Enum(members) => check_enum(members, value),
            Check::Minimum(bound) => check_minimum(bound, value),
            Check::Maximum(bound) => check_maximum(bound, value),
            Check::MinLength(min) => check_min_length(*min, value),
            Check::MaxLength(max) => check_max_length(*max, value),
        }
    }
}

pub fn check_required(value: &Value) -> bool {
    !value.is_null()
}

pub fn check_pattern(regex: &Regex, raw: &Value) -> bool {
    match raw.as_str() {
        Some(text) => regex.is_match(text),
        None => regex.is_match(&raw.to_string()),
    }
}

pub fn check_enum(members: &[Value], value: &Value) -> bool {
    members.iter().any(|member| member == value)
}

// Incomparable pairs pass; bounds are cast with the field's own caster so
// this only happens for durations of equal approximate length.
pub fn check_minimum(bound: &Value, value: &Value) -> bool {
    value.partial_cmp(bound) != Some(Ordering::Less)
}

pub fn check_maximum(bound: &Value, value: &Value) -> bool {
    value.partial_cmp(bound) != Some(Ordering::Greater)
}

/// Values without a length pass.
pub fn check_min_length(min: usize, value: &Value) -> bool {
    value.length().is_none_or(|len| len >= min)
}

pub fn check_max_length(max: usize, value: &Value) -> bool {
    value.length().is_none_or(|len| len <= max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use serde_json::json;

    #[test]
    fn test_required() {
        assert!(check_required(&Value::from("x")));
        assert!(!check_required(&Value::Null));
        assert!(!Check::Required.passes(&Value::Null, &Value::from("")));
    }

    #[test]
    fn test_null_skips_everything_but_required() {
        let checks = [
            Check::Unique,
            Check::pattern("a+").unwrap(),
            Check::Enum(vec![Value::from("a")]),
            Check::Minimum(Value::Integer(1)),
            Check::MinLength(3),
        ];
        for check in checks {
            assert!(check.passes(&Value::Null, &Value::from("")), "{:?}", check.kind());
        }
    }

    #[test]
    fn test_pattern_is_anchored() {
        let check = Check::pattern("[a-c]+").unwrap();
        assert!(check.passes(&Value::from("abc"), &Value::from("abc")));
        assert!(!check.passes(&Value::from("abcd"), &Value::from("abcd")));
        assert!(!check.passes(&Value::from("xabc"), &Value::from("xabc")));
        assert!(Check::pattern("(").is_err());
    }

    #[test]
    fn test_enum() {
        let members = vec![Value::Integer(1), Value::Integer(2)];
        assert!(check_enum(&members, &Value::Integer(2)));
        assert!(!check_enum(&members, &Value::Integer(3)));
        let decimals = vec![Value::Number("1.0".parse::<BigDecimal>().unwrap())];
        assert!(check_enum(&decimals, &Value::Number(BigDecimal::from(1))));
    }

    #[test]
    fn test_bounds() {
        let min = Value::Integer(10);
        assert!(check_minimum(&min, &Value::Integer(10)));
        assert!(!check_minimum(&min, &Value::Integer(9)));
        assert!(check_maximum(&min, &Value::Integer(10)));
        assert!(!check_maximum(&min, &Value::Integer(11)));
    }

    #[test]
    fn test_lengths() {
        assert!(check_min_length(2, &Value::from("ab")));
        assert!(!check_min_length(3, &Value::from("ab")));
        assert!(check_max_length(1, &Value::from(json!([1]))));
        assert!(!check_max_length(0, &Value::from(json!({"a": 1}))));
        assert!(check_max_length(0, &Value::Integer(100)));
    }
}
