//! JSON path resolution and lenient value coercion.
//!
//! Resolves dot-notation paths like "sensors.pm25" to values in a raw row,
//! and coerces whatever a source delivered into floats and timestamps.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// Resolve a dot-notation path to a value in JSON.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use airsense_core::extraction::resolve_json_path;
///
/// let data = json!({"sensors": {"pm25": 12.5}});
/// let value = resolve_json_path(&data, "sensors.pm25");
/// assert_eq!(value, Some(&json!(12.5)));
/// ```
pub fn resolve_json_path<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(data);
    }

    let mut current = data;
    for part in path.split('.') {
        match current {
            Value::Object(obj) => {
                current = obj.get(part)?;
            }
            Value::Array(arr) => {
                // Support array indexing like "values.0"
                let index: usize = part.parse().ok()?;
                current = arr.get(index)?;
            }
            _ => return None,
        }
    }
    Some(current)
}

/// Look up a source field in a row.
///
/// Header names such as "PM2.5" contain dots, so the literal key is tried
/// before the path is split.
pub fn lookup_field<'a>(row: &'a Value, field: &str) -> Option<&'a Value> {
    row.get(field).or_else(|| resolve_json_path(row, field))
}

/// Convert a JSON value to a finite float if possible.
///
/// Strings are trimmed first; empty strings, non-numeric text, NaN and
/// infinities all yield `None`.
pub fn value_to_float(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

/// Epoch values above this are taken to be milliseconds.
const EPOCH_MILLIS_THRESHOLD: f64 = 100_000_000_000.0;

/// Convert a JSON value to a UTC timestamp if possible.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`,
/// `YYYY-MM-DD` (all naive forms read as UTC) and epoch seconds or
/// milliseconds.
pub fn value_to_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp_str(s.trim()),
        Value::Number(n) => {
            let raw = n.as_f64()?;
            if !raw.is_finite() || raw < 0.0 {
                return None;
            }
            let millis = if raw >= EPOCH_MILLIS_THRESHOLD {
                raw as i64
            } else {
                (raw * 1000.0) as i64
            };
            Utc.timestamp_millis_opt(millis).single()
        }
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
    }

    match s.parse::<f64>() {
        Ok(epoch) => value_to_timestamp(&Value::from(epoch)),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_path() {
        let data = json!({"pm25": 4.0});
        assert_eq!(resolve_json_path(&data, "pm25"), Some(&json!(4.0)));
    }

    #[test]
    fn test_nested_path() {
        let data = json!({
            "sensors": {
                "pm25": 12.5,
                "pm10": 20.0
            }
        });
        assert_eq!(
            resolve_json_path(&data, "sensors.pm25"),
            Some(&json!(12.5))
        );
    }

    #[test]
    fn test_array_index() {
        let data = json!({"values": [1.0, 2.0]});
        assert_eq!(resolve_json_path(&data, "values.1"), Some(&json!(2.0)));
    }

    #[test]
    fn test_missing_path() {
        let data = json!({"pm25": 1});
        assert_eq!(resolve_json_path(&data, "missing"), None);
        assert_eq!(resolve_json_path(&data, "pm25.nested"), None);
    }

    #[test]
    fn test_lookup_prefers_literal_dotted_key() {
        let data = json!({"PM2.5": "7.5", "PM2": {"5": "nope"}});
        assert_eq!(lookup_field(&data, "PM2.5"), Some(&json!("7.5")));
    }

    #[test]
    fn test_value_to_float() {
        assert_eq!(value_to_float(&json!(1.5)), Some(1.5));
        assert_eq!(value_to_float(&json!(" 2.5 ")), Some(2.5));
        assert_eq!(value_to_float(&json!("")), None);
        assert_eq!(value_to_float(&json!("n/a")), None);
        assert_eq!(value_to_float(&json!("NaN")), None);
        assert_eq!(value_to_float(&json!(true)), None);
        assert_eq!(value_to_float(&Value::Null), None);
    }

    #[test]
    fn test_value_to_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2026, 1, 29, 10, 30, 0).unwrap();

        assert_eq!(value_to_timestamp(&json!("2026-01-29T10:30:00Z")), Some(expected));
        assert_eq!(value_to_timestamp(&json!("2026-01-29 10:30:00")), Some(expected));
        assert_eq!(value_to_timestamp(&json!("2026-01-29T10:30:00")), Some(expected));
        assert_eq!(
            value_to_timestamp(&json!(expected.timestamp())),
            Some(expected)
        );
        assert_eq!(
            value_to_timestamp(&json!(expected.timestamp_millis())),
            Some(expected)
        );
        assert_eq!(
            value_to_timestamp(&json!("2026-01-29")),
            Some(Utc.with_ymd_and_hms(2026, 1, 29, 0, 0, 0).unwrap())
        );
        assert_eq!(value_to_timestamp(&json!("yesterday")), None);
    }
}
