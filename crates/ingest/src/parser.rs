use std::io::BufRead;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

use crate::types::{IngestError, Result};

/// One decoded JSON-lines object. Keys are whatever the source file provides.
pub type Record = Map<String, Value>;

/// Lazy decoder over newline-delimited JSON.
///
/// Blank lines and non-object values are skipped. Invalid UTF-8 and
/// unparsable JSON end the stream with an error; the iterator yields
/// nothing after the first error.
pub struct RecordLines<R> {
    reader: R,
    source_name: String,
    line: u64,
    buf: Vec<u8>,
    done: bool,
}

pub fn decode_lines<R: BufRead>(reader: R) -> RecordLines<R> {
    RecordLines {
        reader,
        source_name: "<stream>".to_string(),
        line: 0,
        buf: Vec::new(),
        done: false,
    }
}

impl<R> RecordLines<R> {
    /// Names the stream in error messages.
    pub fn with_source(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }

    pub fn lines_read(&self) -> u64 {
        self.line
    }
}

impl<R: BufRead> Iterator for RecordLines<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {}
                Err(err) => {
                    self.done = true;
                    return Some(Err(IngestError::from(err)));
                }
            }
            self.line += 1;
            let Ok(text) = std::str::from_utf8(&self.buf) else {
                self.done = true;
                return Some(Err(IngestError::Encoding {
                    source_name: self.source_name.clone(),
                    line: self.line,
                }));
            };
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(record)) => return Some(Ok(record)),
                Ok(_) => continue,
                Err(error) => {
                    self.done = true;
                    return Some(Err(IngestError::MalformedRecord {
                        source_name: self.source_name.clone(),
                        line: self.line,
                        error,
                    }));
                }
            }
        }
    }
}

/// Trimmed text of a scalar field. Missing, null, arrays and objects give `""`.
pub fn field_str(record: &Record, key: &str) -> String {
    match record.get(key) {
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => String::new(),
    }
}

/// The trimmed `business_id` string, absent when missing, blank or not a string.
pub fn business_id(record: &Record) -> Option<&str> {
    let id = record.get("business_id")?.as_str()?.trim();
    (!id.is_empty()).then_some(id)
}

fn value_to_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// Finite float from a number or numeric string; anything else is absent.
pub fn field_f64(record: &Record, key: &str) -> Option<f64> {
    record.get(key).and_then(value_to_f64)
}

/// Non-negative count. Missing, non-numeric and negative values give 0;
/// fractions are truncated and huge values saturate.
pub fn field_count(record: &Record, key: &str) -> u32 {
    match field_f64(record, key) {
        Some(value) if value > 0.0 => value.min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

/// Optional integer: booleans, blanks and non-numeric text are absent.
pub fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Bool(_) => None,
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|v| v.is_finite()).map(|v| v.trunc() as i64)),
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            text.parse::<i64>().ok().or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(|v| v.trunc() as i64)
            })
        }
        _ => None,
    }
}

/// Category tokens from either a comma-separated string or an array of strings.
pub fn categories(record: &Record) -> Vec<String> {
    match record.get("categories") {
        Some(Value::String(text)) => text
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text.trim().to_string()),
                Value::Number(number) => Some(number.to_string()),
                _ => None,
            })
            .filter(|token| !token.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// Lower-cased categories flattened into one string for substring matching.
pub fn categories_text(record: &Record) -> String {
    match record.get("categories") {
        Some(Value::Array(_)) => categories(record).join(", ").to_lowercase(),
        _ => field_str(record, "categories").to_lowercase(),
    }
}

/// The `attributes` sub-mapping, kept opaque.
pub fn attributes(record: &Record) -> Option<&Map<String, Value>> {
    record.get("attributes").and_then(Value::as_object)
}

/// Local ISO-8601 date or datetime. Offsets are dropped, keeping local wall time.
pub fn parse_iso_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for format in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_local());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
