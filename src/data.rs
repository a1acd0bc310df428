//! Cell values and the coercion rules shared by every dataset.
//!
//! Raw CSV cells arrive as strings; the schema normalizer turns designated
//! columns into numbers, join keys, or calendar dates using the helpers in
//! this module. Ratio helpers ([`safe_ratio()`], [`round2()`]) implement the
//! zero-substitution policy used by all derived metrics.

use std::{cmp::Ordering, fmt};

use anyhow::{Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
}

impl Eq for Value {}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    /// Numeric view of the cell. Strings are parsed leniently; dates are not numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::String(s) => parse_numeric(s),
            Value::Date(_) => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            Value::String(s) => parse_date_value(s),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Integer(_) | Value::Float(_) => 0,
            Value::Date(_) => 1,
            Value::String(_) => 2,
        }
    }
}

// Numbers sort before dates, dates before text. Mixed integer/float compare numerically.
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (left, right) if left.rank() == 0 && right.rank() == 0 => {
                let l = left.as_f64().unwrap_or_default();
                let r = right.as_f64().unwrap_or_default();
                l.total_cmp(&r)
            }
            (left, right) => left.rank().cmp(&right.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Label used to match a cell against a filter selection; null cells match `""`.
pub fn cell_label(value: Option<&Value>) -> String {
    value.map(Value::as_display).unwrap_or_default()
}

/// Key used to match rows across datasets. Normalized keys `1` and `1.0` share a key.
pub fn join_key(value: Option<&Value>) -> Option<String> {
    value.map(|v| v.as_display())
}

pub fn parse_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Join keys keep integers as integers so `"007"` and `7` do not collide.
/// Integral float spellings such as `1.0` or `1e3` become integers.
pub fn coerce_key(value: Option<Value>) -> Option<Value> {
    match value {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else if let Some(parsed) = integral_key(trimmed) {
                Some(Value::Integer(parsed))
            } else {
                Some(Value::String(trimmed.to_string()))
            }
        }
        other => other,
    }
}

// Largest magnitude an f64 holds without losing integer precision.
const MAX_EXACT_FLOAT_INTEGER: f64 = 9_007_199_254_740_992.0;

fn integral_key(text: &str) -> Option<i64> {
    if let Ok(parsed) = text.parse::<i64>() {
        return (parsed.to_string() == text).then_some(parsed);
    }
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    if unsigned.len() > 1 && unsigned.starts_with('0') && !unsigned.starts_with("0.") {
        return None;
    }
    let parsed = text.parse::<f64>().ok()?;
    (parsed.is_finite() && parsed.fract() == 0.0 && parsed.abs() <= MAX_EXACT_FLOAT_INTEGER)
        .then_some(parsed as i64)
}

/// Numeric coercion keeping unparseable cells as null.
pub fn coerce_nullable_number(value: Option<Value>) -> Option<Value> {
    value
        .as_ref()
        .and_then(Value::as_f64)
        .map(Value::Float)
}

/// Numeric coercion substituting `0` for unparseable or missing cells.
pub fn coerce_zero_filled_number(value: Option<Value>) -> Option<Value> {
    Some(Value::Float(
        value.as_ref().and_then(Value::as_f64).unwrap_or(0.0),
    ))
}

pub fn coerce_date(value: Option<Value>) -> Option<Value> {
    value.as_ref().and_then(Value::as_date).map(Value::Date)
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as datetime"))
}

/// Calendar date of a raw cell; datetimes keep only their date component.
pub fn parse_date_value(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    parse_naive_date(trimmed)
        .or_else(|_| parse_naive_datetime(trimmed).map(|dt| dt.date()))
        .ok()
}

/// `numerator / denominator`, or `0` when the quotient is not a finite number.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let ratio = numerator / denominator;
    if ratio.is_finite() { ratio } else { 0.0 }
}

pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_naive_date_supports_multiple_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        assert_eq!(parse_naive_date("2024-05-06").unwrap(), expected);
        assert_eq!(parse_naive_date("06/05/2024").unwrap(), expected);
        assert_eq!(parse_naive_date("2024/05/06").unwrap(), expected);
    }

    #[test]
    fn parse_date_value_truncates_datetimes() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        assert_eq!(parse_date_value("2024-05-06T14:30:00"), Some(expected));
        assert_eq!(parse_date_value(" 2024-05-06 "), Some(expected));
        assert_eq!(parse_date_value("not a date"), None);
        assert_eq!(parse_date_value(""), None);
    }

    #[test]
    fn coerce_key_unifies_integer_spellings() {
        assert_eq!(
            coerce_key(Some(Value::String(" 42 ".into()))),
            Some(Value::Integer(42))
        );
        assert_eq!(
            coerce_key(Some(Value::String("007".into()))),
            Some(Value::String("007".into()))
        );
        assert_eq!(coerce_key(Some(Value::String("  ".into()))), None);
        assert_eq!(
            join_key(Some(&Value::Float(3.0))),
            join_key(Some(&Value::Integer(3)))
        );
    }

    #[test]
    fn coerce_key_treats_integral_floats_as_integers() {
        for raw in ["1.0", " 1.00 ", "1e0"] {
            assert_eq!(
                coerce_key(Some(Value::String(raw.into()))),
                Some(Value::Integer(1)),
                "{raw}"
            );
        }
        assert_eq!(
            coerce_key(Some(Value::String("-12.0".into()))),
            Some(Value::Integer(-12))
        );
        for raw in ["1.5", "007.0", "NaN", "inf", "A-17"] {
            assert_eq!(
                coerce_key(Some(Value::String(raw.into()))),
                Some(Value::String(raw.into())),
                "{raw}"
            );
        }
    }

    #[test]
    fn numeric_coercion_policies_differ_on_garbage() {
        let garbage = Some(Value::String("n/a".into()));
        assert_eq!(coerce_nullable_number(garbage.clone()), None);
        assert_eq!(coerce_zero_filled_number(garbage), Some(Value::Float(0.0)));
        assert_eq!(coerce_zero_filled_number(None), Some(Value::Float(0.0)));
        assert_eq!(
            coerce_nullable_number(Some(Value::String("1500".into()))),
            Some(Value::Float(1500.0))
        );
    }

    #[test]
    fn safe_ratio_never_returns_non_finite_values() {
        assert_eq!(safe_ratio(1000.0, 500.0), 2.0);
        assert_eq!(safe_ratio(100.0, 0.0), 0.0);
        assert_eq!(safe_ratio(0.0, 0.0), 0.0);
        assert_eq!(safe_ratio(f64::MAX, f64::MIN_POSITIVE), 0.0);
    }

    #[test]
    fn round2_rounds_to_two_places() {
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(2.0 / 3.0), 0.67);
        assert_eq!(round2(-1.005_1), -1.01);
        assert_eq!(round2(f64::NAN), 0.0);
    }

    #[test]
    fn value_ordering_is_total_across_variants() {
        let mut values = vec![
            Value::String("b".into()),
            Value::Float(2.5),
            Value::Integer(3),
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            Value::Integer(1),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                Value::Integer(1),
                Value::Float(2.5),
                Value::Integer(3),
                Value::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
                Value::String("b".into()),
            ]
        );
    }

    #[test]
    fn float_display_drops_integral_fraction() {
        assert_eq!(Value::Float(1500.0).as_display(), "1500");
        assert_eq!(Value::Float(12.5).as_display(), "12.5");
    }
}
