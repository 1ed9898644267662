//! Integer, number, year and yearmonth casters.

use bigdecimal::{BigDecimal, ToPrimitive};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;

use super::{CastFailure, CastOptions, CastResult, Format};
use crate::value::{Value, parse_number_text};

static CURRENCY_SYMBOLS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{Sc}").unwrap());

pub(super) fn cast_integer(_format: &Format, value: &Value, options: &CastOptions) -> CastResult {
    match value {
        Value::Integer(n) => Ok(Value::Integer(*n)),
        Value::Number(d) if d.is_integer() => d.to_i64().map(Value::Integer).ok_or(CastFailure),
        Value::String(s) => {
            let text = if options.bare_number {
                s.trim()
            } else {
                strip_non_numeric(s)
            };
            text.parse::<i64>().map(Value::Integer).map_err(|_| CastFailure)
        }
        _ => Err(CastFailure),
    }
}

pub(super) fn cast_number(_format: &Format, value: &Value, options: &CastOptions) -> CastResult {
    match value {
        Value::Number(d) => Ok(Value::Number(d.clone())),
        Value::Integer(n) => Ok(Value::Number(BigDecimal::from(*n))),
        Value::String(s) => parse_number(s, options)
            .map(Value::Number)
            .ok_or(CastFailure),
        _ => Err(CastFailure),
    }
}

fn parse_number(text: &str, options: &CastOptions) -> Option<BigDecimal> {
    let mut text: String = text.chars().filter(|c| !c.is_whitespace()).collect();

    if options.currency {
        text = CURRENCY_SYMBOLS.replace_all(&text, "").into_owned();
    }

    // Percent-like glyphs divide by a power of ten, applied as a scale shift.
    let shift: Option<i64> = match text.chars().last() {
        Some('%' | '％' | '﹪' | '٪') => Some(2),
        Some('‰' | '؉') => Some(3),
        Some('‱') => Some(4),
        _ => None,
    };
    if shift.is_some() {
        text.pop();
    }

    // The decimal separator is parked on a placeholder so a group separator
    // equal to "." cannot swallow it.
    if !options.decimal_char.is_empty() {
        text = text.replace(options.decimal_char.as_str(), "\u{0}");
    }
    if !options.group_char.is_empty() {
        text = text.replace(options.group_char.as_str(), "");
    }
    let mut text = text.replace('\u{0}', ".");

    if !options.bare_number {
        text = strip_non_numeric(&text).to_string();
    }

    let number = parse_number_text(&text)?;
    match shift {
        Some(shift) => {
            let (digits, scale) = number.into_bigint_and_exponent();
            Some(BigDecimal::new(digits, scale + shift))
        }
        None => Some(number),
    }
}

/// Trim a non-numeric prefix and suffix, keeping a sign or leading point.
fn strip_non_numeric(text: &str) -> &str {
    let Some(first) = text.find(|c: char| c.is_ascii_digit()) else {
        return "";
    };
    let last = text
        .rfind(|c: char| c.is_ascii_digit())
        .map(|i| i + 1)
        .unwrap_or(text.len());

    let mut start = first;
    if text[..start].ends_with('.') {
        start -= 1;
    }
    if text[..start].ends_with('-') || text[..start].ends_with('+') {
        start -= 1;
    }
    &text[start..last]
}

pub(super) fn cast_year(_format: &Format, value: &Value, _options: &CastOptions) -> CastResult {
    let year = match value {
        Value::Year(y) => *y,
        Value::Integer(n) => i32::try_from(*n).map_err(|_| CastFailure)?,
        Value::String(s) => s.trim().parse::<i32>().map_err(|_| CastFailure)?,
        _ => return Err(CastFailure),
    };
    if (0..=9999).contains(&year) {
        Ok(Value::Year(year))
    } else {
        Err(CastFailure)
    }
}

pub(super) fn cast_yearmonth(
    _format: &Format,
    value: &Value,
    _options: &CastOptions,
) -> CastResult {
    let (year, month) = match value {
        Value::YearMonth { year, month } => (*year, *month),
        Value::Array(items) if items.len() == 2 => {
            let year = json_int(&items[0]).ok_or(CastFailure)?;
            let month = json_int(&items[1]).ok_or(CastFailure)?;
            (
                i32::try_from(year).map_err(|_| CastFailure)?,
                u32::try_from(month).map_err(|_| CastFailure)?,
            )
        }
        Value::String(s) => {
            let (year, month) = s.trim().split_once('-').ok_or(CastFailure)?;
            (
                year.parse::<i32>().map_err(|_| CastFailure)?,
                month.parse::<u32>().map_err(|_| CastFailure)?,
            )
        }
        _ => return Err(CastFailure),
    };
    if (1..=12).contains(&month) {
        Ok(Value::YearMonth { year, month })
    } else {
        Err(CastFailure)
    }
}

fn json_int(json: &JsonValue) -> Option<i64> {
    match json {
        JsonValue::Number(n) => n.as_i64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options() -> CastOptions {
        CastOptions::default()
    }

    fn number(s: &str) -> Value {
        Value::Number(s.parse().unwrap())
    }

    #[test]
    fn test_integer() {
        let f = Format::Default;
        assert_eq!(cast_integer(&f, &Value::from("42"), &options()), Ok(Value::Integer(42)));
        assert_eq!(cast_integer(&f, &Value::from(" -7 "), &options()), Ok(Value::Integer(-7)));
        assert_eq!(cast_integer(&f, &Value::Integer(1), &options()), Ok(Value::Integer(1)));
        assert_eq!(cast_integer(&f, &number("3.0"), &options()), Ok(Value::Integer(3)));
        assert_eq!(cast_integer(&f, &Value::from("3.14"), &options()), Err(CastFailure));
        assert_eq!(cast_integer(&f, &Value::from("$42"), &options()), Err(CastFailure));
        assert_eq!(cast_integer(&f, &Value::Boolean(true), &options()), Err(CastFailure));
        assert_eq!(cast_integer(&f, &Value::from(""), &options()), Err(CastFailure));
    }

    #[test]
    fn test_integer_range_is_i64() {
        let f = Format::Default;
        let max = i64::MAX.to_string();
        assert_eq!(
            cast_integer(&f, &Value::from(max.as_str()), &options()),
            Ok(Value::Integer(i64::MAX))
        );
        let wide = "99999999999999999999";
        assert_eq!(cast_integer(&f, &Value::from(wide), &options()), Err(CastFailure));
        assert_eq!(cast_number(&f, &Value::from(wide), &options()), Ok(number(wide)));
        assert_eq!(cast_integer(&f, &number(wide), &options()), Err(CastFailure));
    }

    #[test]
    fn test_integer_without_bare_number() {
        let opts = options().with_bare_number(false);
        let f = Format::Default;
        assert_eq!(cast_integer(&f, &Value::from("$42"), &opts), Ok(Value::Integer(42)));
        assert_eq!(cast_integer(&f, &Value::from("42 EUR"), &opts), Ok(Value::Integer(42)));
        assert_eq!(cast_integer(&f, &Value::from("-12 units"), &opts), Ok(Value::Integer(-12)));
        assert_eq!(cast_integer(&f, &Value::from("none"), &opts), Err(CastFailure));
    }

    #[test]
    fn test_number() {
        let f = Format::Default;
        assert_eq!(cast_number(&f, &Value::from("1.5"), &options()), Ok(number("1.5")));
        assert_eq!(cast_number(&f, &Value::from(" 1 000 "), &options()), Ok(number("1000")));
        assert_eq!(cast_number(&f, &Value::Integer(3), &options()), Ok(number("3")));
        assert_eq!(cast_number(&f, &Value::from("1e3"), &options()), Ok(number("1000")));
        assert_eq!(cast_number(&f, &Value::from("10,000.00"), &options()), Err(CastFailure));
        assert_eq!(cast_number(&f, &Value::from("abc"), &options()), Err(CastFailure));
        assert_eq!(cast_number(&f, &Value::Boolean(false), &options()), Err(CastFailure));
        assert_eq!(cast_number(&f, &Value::from("1_000"), &options()), Err(CastFailure));
    }

    #[test]
    fn test_number_keeps_every_digit() {
        let f = Format::Default;
        let wide = "123456789012345678901234567890";
        assert_eq!(cast_number(&f, &Value::from(wide), &options()), Ok(number(wide)));

        let long_fraction = "0.1234567890123456789012345678901";
        let cast = cast_number(&f, &Value::from(long_fraction), &options()).unwrap();
        assert_eq!(cast, number(long_fraction));
        assert_eq!(cast.to_string(), long_fraction);

        assert_eq!(
            cast_number(&f, &Value::from("1e100"), &options()),
            Ok(number(&format!("1{}", "0".repeat(100))))
        );
        assert_eq!(cast_number(&f, &Value::from("1e99999"), &options()), Err(CastFailure));
        assert_eq!(
            cast_number(&f, &Value::from("0.1234567890123456789012345678901%"), &options()),
            Ok(number("0.001234567890123456789012345678901"))
        );
    }

    #[test]
    fn test_number_separators() {
        let f = Format::Default;
        let opts = options().with_group_char(",");
        assert_eq!(cast_number(&f, &Value::from("10,000.00"), &opts), Ok(number("10000")));

        let opts = options().with_group_char(".").with_decimal_char(",");
        assert_eq!(cast_number(&f, &Value::from("1.234,5"), &opts), Ok(number("1234.5")));
    }

    #[test]
    fn test_number_percent_and_currency() {
        let f = Format::Default;
        assert_eq!(cast_number(&f, &Value::from("50%"), &options()), Ok(number("0.5")));
        assert_eq!(cast_number(&f, &Value::from("5‰"), &options()), Ok(number("0.005")));
        assert_eq!(cast_number(&f, &Value::from("$5"), &options()), Err(CastFailure));

        let opts = options().with_currency(true);
        assert_eq!(cast_number(&f, &Value::from("$5.50"), &opts), Ok(number("5.5")));
        assert_eq!(cast_number(&f, &Value::from("€-3"), &opts), Ok(number("-3")));
    }

    #[test]
    fn test_number_without_bare_number() {
        let f = Format::Default;
        let opts = options().with_bare_number(false);
        assert_eq!(cast_number(&f, &Value::from("EUR 12.5"), &opts), Ok(number("12.5")));
        assert_eq!(cast_number(&f, &Value::from("about 0.5 kg"), &opts), Ok(number("0.5")));
    }

    #[test]
    fn test_year() {
        let f = Format::Default;
        assert_eq!(cast_year(&f, &Value::from("2000"), &options()), Ok(Value::Year(2000)));
        assert_eq!(cast_year(&f, &Value::Integer(0), &options()), Ok(Value::Year(0)));
        assert_eq!(cast_year(&f, &Value::from("10000"), &options()), Err(CastFailure));
        assert_eq!(cast_year(&f, &Value::from("-1"), &options()), Err(CastFailure));
        assert_eq!(cast_year(&f, &Value::from("20x0"), &options()), Err(CastFailure));
    }

    #[test]
    fn test_yearmonth() {
        let f = Format::Default;
        let expected = Ok(Value::YearMonth {
            year: 2000,
            month: 10,
        });
        assert_eq!(cast_yearmonth(&f, &Value::from("2000-10"), &options()), expected);
        assert_eq!(cast_yearmonth(&f, &Value::from(json!([2000, 10])), &options()), expected);
        assert_eq!(cast_yearmonth(&f, &Value::from("2000-13"), &options()), Err(CastFailure));
        assert_eq!(cast_yearmonth(&f, &Value::from("2000-0"), &options()), Err(CastFailure));
        assert_eq!(cast_yearmonth(&f, &Value::from("2000"), &options()), Err(CastFailure));
    }
}
