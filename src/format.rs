//! Type-aware value formatting for labels, tooltips and tick labels.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::settings::ColumnType;

/// Formats a raw cell value according to its column type.
///
/// Returns `None` for null cells (and for values that cannot be read as the
/// column's type), which callers treat as "nothing to draw".
pub fn to_value(column_type: ColumnType, value: &Value) -> Option<String> {
    if value.is_null() {
        return None;
    }

    match column_type {
        ColumnType::Date => parse_instant(value).map(|dt| dt.format("%Y-%m-%d").to_string()),
        ColumnType::Datetime => {
            parse_instant(value).map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        }
        ColumnType::Integer => as_f64(value).map(|v| format_number(v, 0)),
        ColumnType::Float => as_f64(value).map(|v| format_number(v, 2)),
        ColumnType::Boolean | ColumnType::String => Some(value_to_string(value)),
    }
}

/// Plain string form of a JSON value, as used for keys and comparisons
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Reads a date-like cell: epoch milliseconds or one of the common ISO layouts.
pub fn parse_instant(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .and_then(|ms| DateTime::<Utc>::from_timestamp_millis(ms as i64))
            .map(|dt| dt.naive_utc()),
        Value::String(s) => parse_instant_str(s),
        _ => None,
    }
}

fn parse_instant_str(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for layout in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(dt);
        }
    }
    for layout in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, layout) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    s.parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.naive_utc())
}

/// Milliseconds since the epoch for a date-like cell
pub fn instant_millis(value: &Value) -> Option<f64> {
    parse_instant(value).map(|dt| dt.and_utc().timestamp_millis() as f64)
}

/// Fixed decimals with `,` thousands separators
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let negative = value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Tick label for a millisecond timestamp; the layout depends on the visible span.
pub fn format_time_tick(ms: f64, span_ms: f64) -> String {
    const DAY_MS: f64 = 86_400_000.0;
    match DateTime::<Utc>::from_timestamp_millis(ms as i64) {
        Some(dt) if span_ms >= 2.0 * DAY_MS => dt.format("%Y-%m-%d").to_string(),
        Some(dt) => dt.format("%m-%d %H:%M").to_string(),
        None => String::new(),
    }
}

/// Tick label for a linear axis; decimals follow the tick step
pub fn format_linear_tick(value: f64, step: f64) -> String {
    let decimals = if step > 0.0 && step < 1.0 {
        (-step.log10()).ceil().max(0.0) as usize
    } else {
        0
    };
    format_number(value, decimals)
}
