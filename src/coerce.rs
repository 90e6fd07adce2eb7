//! Scalar coercion from raw JSON values into typed, nullable columns.
//!
//! Every function here returns `None` for input it cannot type: JSON null, strings that
//! don't parse, non-finite floats, fractional values where an integer is required, and
//! values outside `i64`. None of them fail.

use crate::models::Tenths;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Largest magnitude that still converts exactly between f64 and i64
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

pub fn to_int(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral_float)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| parse_finite(s).and_then(integral_float))
        }
        _ => None,
    }
}

pub fn to_float(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => parse_finite(s.trim()),
        _ => None,
    }
}

/// Fixed-point value with one fractional digit, rounded half-up
pub fn to_float_rounded1(raw: &Value) -> Option<Tenths> {
    to_float(raw)
        .map(|f| round_half_up(f * 10.0))
        .and_then(float_to_i64)
        .map(Tenths::from_tenths)
}

/// Integer from a float parse, rounded half-up (`"2.5"` becomes 3)
pub fn to_rounded_int(raw: &Value) -> Option<i64> {
    to_float(raw).map(round_half_up).and_then(float_to_i64)
}

/// Calendar date of an ISO-8601 timestamp or date. Offsets are kept, so the date is
/// the one local to the timestamp.
pub fn to_date(raw: &Value) -> Option<NaiveDate> {
    let s = raw.as_str()?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Trimmed non-empty string
pub fn to_text(raw: &Value) -> Option<String> {
    raw.as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `url` of a nested image object, or `None` when the image is absent or has no URL
pub fn to_image_url(raw: &Value) -> Option<String> {
    raw.as_object()
        .and_then(|image| image.get("url"))
        .and_then(to_text)
}

fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn round_half_up(f: f64) -> f64 {
    (f + 0.5).floor()
}

fn integral_float(f: f64) -> Option<i64> {
    if f.fract() != 0.0 {
        return None;
    }
    float_to_i64(f)
}

fn float_to_i64(f: f64) -> Option<i64> {
    if f.is_finite() && f.abs() <= MAX_EXACT_FLOAT {
        Some(f as i64)
    } else {
        None
    }
}
