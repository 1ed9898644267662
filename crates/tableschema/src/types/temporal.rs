//! Date, time, datetime and duration casters.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use super::{CastFailure, CastOptions, CastResult, Format};
use crate::value::{Value, parse_decimal};

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
// `%.f` also accepts an absent fraction.
const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S%.f";
const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

static ORDINAL_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").unwrap());

/// Datetime layouts tried by the `any` format, most specific first.
const FLEXIBLE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M",
];

// Month-first layouts win over day-first ones on ambiguous input.
const FLEXIBLE_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const FLEXIBLE_TIME_FORMATS: &[&str] = &[
    "%H:%M:%S",
    "%H:%M:%S%.f",
    "%H:%M",
    "%H:%M:%SZ",
    "%I:%M:%S %p",
    "%I:%M %p",
    "%I%p",
];

pub(super) fn cast_date(format: &Format, value: &Value, _options: &CastOptions) -> CastResult {
    match value {
        Value::Date(d) => Ok(Value::Date(*d)),
        Value::DateTime(dt) if dt.time() == NaiveTime::MIN => Ok(Value::Date(dt.date())),
        Value::String(s) => {
            let text = s.trim();
            let date = match format {
                Format::Default => NaiveDate::parse_from_str(text, DEFAULT_DATE_FORMAT).ok(),
                Format::Any => parse_flexible_date(text),
                Format::Pattern(pattern) => NaiveDate::parse_from_str(text, pattern).ok(),
                _ => None,
            };
            date.map(Value::Date).ok_or(CastFailure)
        }
        _ => Err(CastFailure),
    }
}

pub(super) fn cast_time(format: &Format, value: &Value, _options: &CastOptions) -> CastResult {
    match value {
        Value::Time(t) => Ok(Value::Time(*t)),
        Value::String(s) => {
            let text = s.trim();
            let time = match format {
                Format::Default => NaiveTime::parse_from_str(text, DEFAULT_TIME_FORMAT).ok(),
                Format::Any => parse_flexible_time(text),
                Format::Pattern(pattern) => NaiveTime::parse_from_str(text, pattern).ok(),
                _ => None,
            };
            time.map(Value::Time).ok_or(CastFailure)
        }
        _ => Err(CastFailure),
    }
}

pub(super) fn cast_datetime(
    format: &Format,
    value: &Value,
    _options: &CastOptions,
) -> CastResult {
    match value {
        Value::DateTime(dt) => Ok(Value::DateTime(*dt)),
        Value::Date(d) => Ok(Value::DateTime(d.and_time(NaiveTime::MIN))),
        Value::String(s) => {
            let text = s.trim();
            let datetime = match format {
                Format::Default => {
                    NaiveDateTime::parse_from_str(text, DEFAULT_DATETIME_FORMAT).ok()
                }
                Format::Any => parse_flexible_datetime(text),
                Format::Pattern(pattern) => parse_datetime_pattern(text, pattern),
                _ => None,
            };
            datetime.map(Value::DateTime).ok_or(CastFailure)
        }
        _ => Err(CastFailure),
    }
}

pub(super) fn cast_duration(
    _format: &Format,
    value: &Value,
    _options: &CastOptions,
) -> CastResult {
    match value {
        Value::Duration(d) => Ok(Value::Duration(d.clone())),
        Value::String(s) => IsoDuration::parse(s.trim())
            .map(Value::Duration)
            .ok_or(CastFailure),
        _ => Err(CastFailure),
    }
}

/// Pattern parse that tolerates an offset directive, normalising to UTC.
fn parse_datetime_pattern(text: &str, pattern: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_str(text, pattern) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, pattern) {
        return Some(dt);
    }
    NaiveDate::parse_from_str(text, pattern)
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Drop day ordinals so "10th Jan 1969" reads as "10 Jan 1969".
fn strip_ordinals(text: &str) -> std::borrow::Cow<'_, str> {
    ORDINAL_SUFFIX.replace_all(text, "$1")
}

fn parse_flexible_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = strip_ordinals(text);
    let text = text.as_ref();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.naive_utc());
    }
    let text = text.strip_suffix('Z').unwrap_or(text);
    FLEXIBLE_DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
        .or_else(|| {
            FLEXIBLE_DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

fn parse_flexible_date(text: &str) -> Option<NaiveDate> {
    let text = strip_ordinals(text);
    let text = text.as_ref();
    FLEXIBLE_DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
        .or_else(|| parse_flexible_datetime(text).map(|dt| dt.date()))
}

fn parse_flexible_time(text: &str) -> Option<NaiveTime> {
    FLEXIBLE_TIME_FORMATS
        .iter()
        .find_map(|f| NaiveTime::parse_from_str(text, f).ok())
        .or_else(|| parse_flexible_datetime(text).map(|dt| dt.time()))
}

static DURATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let n = r"(\d+(?:[.,]\d+)?)";
    Regex::new(&format!(
        r"^(-)?P(?:{n}Y)?(?:{n}M)?(?:{n}W)?(?:{n}D)?(?:(T)(?:{n}H)?(?:{n}M)?(?:{n}S)?)?$"
    ))
    .unwrap()
});

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_DAY: i64 = 86_400;
const DAYS_PER_MONTH: i64 = 30;
const DAYS_PER_YEAR: i64 = 365;

/// An ISO 8601 duration with calendar components kept separate.
///
/// Years and months have no fixed length, so the components are stored as
/// written (weeks are folded into days). Ordering compares an approximate
/// length in seconds using 30-day months and 365-day years; durations that
/// differ but approximate to the same length are unordered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct IsoDuration {
    pub negative: bool,
    pub years: Decimal,
    pub months: Decimal,
    pub days: Decimal,
    pub hours: Decimal,
    pub minutes: Decimal,
    pub seconds: Decimal,
}

impl IsoDuration {
    /// Parse `[-]PnYnMnWnDTnHnMnS`; at least one component is required.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = DURATION_PATTERN.captures(text)?;
        let component = |i: usize| -> Option<Option<Decimal>> {
            match caps.get(i) {
                Some(m) => parse_decimal(&m.as_str().replace(',', ".")).map(Some),
                None => Some(None),
            }
        };

        let years = component(2)?;
        let months = component(3)?;
        let weeks = component(4)?;
        let days = component(5)?;
        let has_time = caps.get(6).is_some();
        let hours = component(7)?;
        let minutes = component(8)?;
        let seconds = component(9)?;

        let date_parts = [years, months, weeks, days];
        let time_parts = [hours, minutes, seconds];
        let has_time_part = time_parts.iter().any(Option::is_some);
        if has_time && !has_time_part {
            return None;
        }
        if !has_time_part && date_parts.iter().all(Option::is_none) {
            return None;
        }

        let weeks_as_days = weeks.unwrap_or_default().checked_mul(Decimal::from(7))?;
        Some(Self {
            negative: caps.get(1).is_some(),
            years: years.unwrap_or_default(),
            months: months.unwrap_or_default(),
            days: days.unwrap_or_default().checked_add(weeks_as_days)?,
            hours: hours.unwrap_or_default(),
            minutes: minutes.unwrap_or_default(),
            seconds: seconds.unwrap_or_default(),
        })
    }

    pub fn is_zero(&self) -> bool {
        [
            self.years,
            self.months,
            self.days,
            self.hours,
            self.minutes,
            self.seconds,
        ]
        .iter()
        .all(Decimal::is_zero)
    }

    /// Approximate signed length in seconds, `None` on overflow.
    pub fn approximate_seconds(&self) -> Option<Decimal> {
        let scaled = [
            (self.years, DAYS_PER_YEAR * SECONDS_PER_DAY),
            (self.months, DAYS_PER_MONTH * SECONDS_PER_DAY),
            (self.days, SECONDS_PER_DAY),
            (self.hours, SECONDS_PER_HOUR),
            (self.minutes, SECONDS_PER_MINUTE),
            (self.seconds, 1),
        ];
        let mut total = Decimal::ZERO;
        for (amount, factor) in scaled {
            total = total.checked_add(amount.checked_mul(Decimal::from(factor))?)?;
        }
        Some(if self.negative { -total } else { total })
    }
}

impl PartialOrd for IsoDuration {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            return Some(Ordering::Equal);
        }
        match self.approximate_seconds()?.cmp(&other.approximate_seconds()?) {
            Ordering::Equal => None,
            ordering => Some(ordering),
        }
    }
}

impl FromStr for IsoDuration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IsoDuration::parse(s).ok_or_else(|| format!("invalid ISO 8601 duration \"{}\"", s))
    }
}

impl fmt::Display for IsoDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("PT0S");
        }
        if self.negative {
            f.write_str("-")?;
        }
        f.write_str("P")?;
        for (amount, unit) in [(self.years, 'Y'), (self.months, 'M'), (self.days, 'D')] {
            if !amount.is_zero() {
                write!(f, "{}{}", amount.normalize(), unit)?;
            }
        }
        let time = [(self.hours, 'H'), (self.minutes, 'M'), (self.seconds, 'S')];
        if time.iter().any(|(amount, _)| !amount.is_zero()) {
            f.write_str("T")?;
            for (amount, unit) in time {
                if !amount.is_zero() {
                    write!(f, "{}{}", amount.normalize(), unit)?;
                }
            }
        }
        Ok(())
    }
}
