use std::fmt;
use std::mem;

use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// A single non-null cell. Missing cells are represented as `None` in an
/// `Option<Value>` slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Boolean(bool),
    Date(NaiveDateTime),
}

/// Hashable identity of a value, used for distinct counts and frequency
/// tables. Numbers compare by bit pattern after folding `-0.0` into `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DistinctKey<'a> {
    Number(u64),
    Text(&'a str),
    Boolean(bool),
    Date(NaiveDateTime),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Number(f) => format_number(*f),
            Value::Boolean(b) => b.to_string(),
            Value::Date(dt) => {
                if dt.time() == NaiveTime::MIN {
                    dt.format("%Y-%m-%d").to_string()
                } else {
                    dt.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
        }
    }

    /// A `NaN` number stands for a missing cell, the way dataframe sources
    /// encode blanks in float columns.
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Number(f) if f.is_nan())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(f) => Some(*f),
            _ => None,
        }
    }

    /// True for `0`, `1`, native booleans and the literals `true`/`false` in
    /// any letter case.
    pub fn is_boolean_like(&self) -> bool {
        match self {
            Value::Boolean(_) => true,
            Value::Number(f) => *f == 0.0 || *f == 1.0,
            Value::Text(s) => s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false"),
            Value::Date(_) => false,
        }
    }

    /// Length in characters of the display form.
    pub fn char_len(&self) -> usize {
        match self {
            Value::Text(s) => s.chars().count(),
            other => other.as_display().chars().count(),
        }
    }

    pub fn distinct_key(&self) -> DistinctKey<'_> {
        match self {
            Value::Number(f) => {
                let folded = if *f == 0.0 { 0.0 } else { *f };
                DistinctKey::Number(folded.to_bits())
            }
            Value::Text(s) => DistinctKey::Text(s),
            Value::Boolean(b) => DistinctKey::Boolean(*b),
            Value::Date(dt) => DistinctKey::Date(*dt),
        }
    }

    /// Best-effort conversion to a timestamp: native dates pass through,
    /// text goes through the lenient date parser.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(dt) => Some(*dt),
            Value::Text(s) => parse_datetime_lenient(s),
            _ => None,
        }
    }

    /// Approximate in-memory footprint of one cell, heap included.
    pub fn estimated_size(&self) -> usize {
        let inline = mem::size_of::<Option<Value>>();
        match self {
            Value::Text(s) => inline + s.len(),
            _ => inline,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value.and_time(NaiveTime::MIN))
    }
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    const DATE_FORMATS: &[&str] = &[
        "%Y-%m-%d",
        "%d/%m/%Y",
        "%m/%d/%Y",
        "%Y/%m/%d",
        "%d-%m-%Y",
        "%d.%m.%Y",
        "%b %d, %Y",
        "%B %d, %Y",
        "%d %b %Y",
        "%d %B %Y",
    ];
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%m/%d/%Y %H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as datetime"))
}

/// Lenient date parser: RFC 3339 with offset, then the datetime formats, then
/// bare dates at midnight.
pub fn parse_datetime_lenient(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.naive_utc());
    }
    if let Ok(parsed) = parse_naive_datetime(trimmed) {
        return Some(parsed);
    }
    parse_naive_date(trimmed)
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}
