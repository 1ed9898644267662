//! Boolean, string and any casters.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use super::{CastFailure, CastOptions, CastResult, Format};
use crate::value::Value;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@]+@[^@]+\.[^@]+$").unwrap());

// RFC 3986 scheme followed by a non-blank remainder.
static URI_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:[^\s]+$").unwrap());

pub(super) fn cast_boolean(_format: &Format, value: &Value, options: &CastOptions) -> CastResult {
    match value {
        Value::Boolean(b) => Ok(Value::Boolean(*b)),
        Value::String(s) => {
            let text = s.trim();
            if options.true_values.iter().any(|v| v.eq_ignore_ascii_case(text)) {
                Ok(Value::Boolean(true))
            } else if options.false_values.iter().any(|v| v.eq_ignore_ascii_case(text)) {
                Ok(Value::Boolean(false))
            } else {
                Err(CastFailure)
            }
        }
        _ => Err(CastFailure),
    }
}

pub(super) fn cast_string(format: &Format, value: &Value, _options: &CastOptions) -> CastResult {
    let Value::String(text) = value else {
        return Err(CastFailure);
    };
    let valid = match format {
        Format::Default => true,
        Format::Email => EMAIL_PATTERN.is_match(text),
        Format::Uri => URI_PATTERN.is_match(text),
        Format::Uuid => Uuid::parse_str(text).is_ok(),
        Format::Binary => BASE64.decode(text).is_ok(),
        _ => false,
    };
    if valid {
        Ok(Value::String(text.clone()))
    } else {
        Err(CastFailure)
    }
}

pub(super) fn cast_any(_format: &Format, value: &Value, _options: &CastOptions) -> CastResult {
    Ok(value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string(format: Format, text: &str) -> CastResult {
        cast_string(&format, &Value::from(text), &CastOptions::default())
    }

    #[test]
    fn test_boolean_defaults() {
        let opts = CastOptions::default();
        let f = Format::Default;
        for text in ["yes", "Y", "TRUE", "t", "1", " true "] {
            assert_eq!(cast_boolean(&f, &Value::from(text), &opts), Ok(Value::Boolean(true)));
        }
        for text in ["no", "N", "False", "f", "0"] {
            assert_eq!(cast_boolean(&f, &Value::from(text), &opts), Ok(Value::Boolean(false)));
        }
        assert_eq!(cast_boolean(&f, &Value::from("maybe"), &opts), Err(CastFailure));
        assert_eq!(cast_boolean(&f, &Value::Integer(1), &opts), Err(CastFailure));
        assert_eq!(cast_boolean(&f, &Value::Boolean(false), &opts), Ok(Value::Boolean(false)));
    }

    #[test]
    fn test_boolean_custom_values() {
        let opts = CastOptions::default()
            .with_true_values(vec!["oui".to_string()])
            .with_false_values(vec!["non".to_string()]);
        let f = Format::Default;
        assert_eq!(cast_boolean(&f, &Value::from("OUI"), &opts), Ok(Value::Boolean(true)));
        assert_eq!(cast_boolean(&f, &Value::from("yes"), &opts), Err(CastFailure));
    }

    #[test]
    fn test_string_formats() {
        assert!(string(Format::Default, "anything").is_ok());
        assert!(string(Format::Email, "name@example.com").is_ok());
        assert!(string(Format::Email, "name@example").is_err());
        assert!(string(Format::Uri, "http://example.com/path").is_ok());
        assert!(string(Format::Uri, "example.com").is_err());
        assert!(string(Format::Uuid, "95ecc380-afe9-11e4-9b6c-751b66dd541e").is_ok());
        assert!(string(Format::Uuid, "95ecc380-afe9-11e4").is_err());
        assert!(string(Format::Binary, "dGVzdA==").is_ok());
        assert!(string(Format::Binary, "not base64!").is_err());
    }

    #[test]
    fn test_string_rejects_non_strings() {
        let opts = CastOptions::default();
        assert_eq!(cast_string(&Format::Default, &Value::Integer(1), &opts), Err(CastFailure));
    }

    #[test]
    fn test_any_is_identity() {
        let opts = CastOptions::default();
        let value = Value::Integer(5);
        assert_eq!(cast_any(&Format::Default, &value, &opts), Ok(value));
    }
}
