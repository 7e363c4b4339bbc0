//! Source normalization.
//!
//! Turns raw key-value rows from any source into canonical `Reading`s:
//! - Canonically-named keys in a row are used directly
//! - Everything else is looked up through the `FieldMapping`
//! - Values that do not coerce to a finite float become `None`
//! - Rows without a usable timestamp get one synthesized backwards from
//!   `now` at the configured sampling interval
//!
//! Rows are never dropped. The only failure is an empty row set.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::extraction::field_mapping::FieldMapping;
use crate::extraction::json_path::{lookup_field, value_to_float, value_to_timestamp};
use crate::logging::structured::LogContext;
use crate::models::{Metric, Reading, SourceKind};
use crate::{log_debug, log_info, log_warn};

/// Canonical key for a row that already carries its own timestamp.
pub const TIMESTAMP_KEY: &str = "timestamp";

/// Default implicit sampling interval for rows without timestamps.
pub const DEFAULT_SAMPLE_INTERVAL_SECS: u64 = 60;

/// Largest accepted sampling interval (one day).
pub const MAX_SAMPLE_INTERVAL_SECS: u64 = 86_400;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub sample_interval_secs: u64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            sample_interval_secs: DEFAULT_SAMPLE_INTERVAL_SECS,
        }
    }
}

/// Normalize raw rows into an ordered sequence of readings.
///
/// The output has exactly one reading per input row. Readings are stably
/// ordered by timestamp and `entry_id` is assigned 1..=n in that order.
pub fn normalize_rows(
    rows: &[Value],
    mapping: &FieldMapping,
    kind: SourceKind,
    now: DateTime<Utc>,
    config: &NormalizerConfig,
    ctx: &LogContext,
) -> CoreResult<Vec<Reading>> {
    if rows.is_empty() {
        log_warn!(ctx, "NORMALIZE_EMPTY_SOURCE", source = kind.as_str());
        return Err(CoreError::EmptySource { kind });
    }

    let total = rows.len();
    let interval = i64::try_from(config.sample_interval_secs).unwrap_or(i64::MAX);
    let mut synthesized = 0usize;
    let mut coerced_nulls = 0usize;

    let mut readings: Vec<Reading> = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let timestamp = row_timestamp(row, mapping).unwrap_or_else(|| {
                synthesized += 1;
                let steps_back = (total - 1 - index) as i64;
                synthesized_timestamp(now, steps_back, interval)
            });

            let mut reading = Reading::new(timestamp, 0);
            for metric in Metric::ALL {
                let raw = row_value(row, metric, mapping);
                let value = raw.and_then(value_to_float);
                if value.is_none() && raw.is_some_and(|v| !v.is_null()) {
                    coerced_nulls += 1;
                }
                reading.set(metric, value);
            }
            reading
        })
        .collect();

    readings.sort_by_key(|r| r.timestamp);
    for (position, reading) in readings.iter_mut().enumerate() {
        reading.entry_id = position as u64 + 1;
    }

    if coerced_nulls > 0 {
        log_debug!(ctx, "NORMALIZE_COERCED_NULLS", count = coerced_nulls);
    }

    log_info!(
        ctx,
        "NORMALIZE_COMPLETE",
        source = kind.as_str(),
        rows = total,
        synthesized_timestamps = synthesized
    );

    Ok(readings)
}

/// `now - steps_back * interval`, or `now` when that is out of range.
fn synthesized_timestamp(now: DateTime<Utc>, steps_back: i64, interval: i64) -> DateTime<Utc> {
    steps_back
        .checked_mul(interval)
        .and_then(Duration::try_seconds)
        .and_then(|offset| now.checked_sub_signed(offset))
        .unwrap_or(now)
}

/// Direct canonical key first, mapped source field second.
fn row_value<'a>(row: &'a Value, metric: Metric, mapping: &FieldMapping) -> Option<&'a Value> {
    row.get(metric.as_str()).or_else(|| {
        mapping
            .field_for(metric)
            .and_then(|mapped| lookup_field(row, &mapped.field))
    })
}

fn row_timestamp(row: &Value, mapping: &FieldMapping) -> Option<DateTime<Utc>> {
    row.get(TIMESTAMP_KEY)
        .and_then(value_to_timestamp)
        .or_else(|| {
            mapping
                .timestamp_field()
                .and_then(|mapped| lookup_field(row, &mapped.field))
                .and_then(value_to_timestamp)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::field_mapping::{resolve_field_mapping, FieldDescriptor};
    use chrono::TimeZone;
    use proptest::prelude::*;
    use serde_json::json;

    fn ctx() -> LogContext {
        LogContext::new("test-request")
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 29, 12, 0, 0).unwrap()
    }

    fn normalize(rows: &[Value], mapping: &FieldMapping) -> CoreResult<Vec<Reading>> {
        normalize_rows(
            rows,
            mapping,
            SourceKind::Spreadsheet,
            now(),
            &NormalizerConfig::default(),
            &ctx(),
        )
    }

    #[test]
    fn test_empty_rows_is_empty_source_error() {
        let result = normalize(&[], &FieldMapping::default());
        assert!(matches!(
            result,
            Err(CoreError::EmptySource {
                kind: SourceKind::Spreadsheet
            })
        ));
    }

    #[test]
    fn test_mapped_fields_and_coercion() {
        let mapping = resolve_field_mapping(
            &[
                FieldDescriptor::new("field1", "PM2.5"),
                FieldDescriptor::new("field2", "Temperature"),
            ],
            &ctx(),
        );
        let rows = vec![
            json!({"created": "x", "field1": "12.5", "field2": "21"}),
            json!({"field1": "", "field2": "n/a"}),
        ];

        let readings = normalize(&rows, &mapping).unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].pm25, Some(12.5));
        assert_eq!(readings[0].temperature, Some(21.0));
        assert_eq!(readings[1].pm25, None);
        assert_eq!(readings[1].temperature, None);
    }

    #[test]
    fn test_canonical_keys_take_precedence() {
        let mapping = resolve_field_mapping(&[FieldDescriptor::named("dust")], &ctx());
        let rows = vec![json!({"pm25": 3.0, "dust": 99.0})];

        let readings = normalize(&rows, &mapping).unwrap();
        assert_eq!(readings[0].pm25, Some(3.0));
    }

    #[test]
    fn test_synthesized_timestamps_step_back_from_now() {
        let rows = vec![json!({"pm25": 1}), json!({"pm25": 2}), json!({"pm25": 3})];
        let readings = normalize(&rows, &FieldMapping::default()).unwrap();

        assert_eq!(readings[2].timestamp, now());
        assert_eq!(readings[1].timestamp, now() - Duration::seconds(60));
        assert_eq!(readings[0].timestamp, now() - Duration::seconds(120));
        assert_eq!(
            readings.iter().map(|r| r.entry_id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(readings[0].pm25, Some(1.0));
    }

    #[test]
    fn test_out_of_range_interval_does_not_panic() {
        let rows = vec![json!({"pm25": 1}), json!({"pm25": 2})];
        let config = NormalizerConfig {
            sample_interval_secs: 10_000_000_000_000_000,
        };
        let readings = normalize_rows(
            &rows,
            &FieldMapping::default(),
            SourceKind::Spreadsheet,
            now(),
            &config,
            &ctx(),
        )
        .unwrap();

        assert_eq!(readings.len(), 2);
        assert!(readings.iter().all(|r| r.timestamp == now()));

        let config = NormalizerConfig {
            sample_interval_secs: u64::MAX,
        };
        let readings = normalize_rows(
            &rows,
            &FieldMapping::default(),
            SourceKind::Spreadsheet,
            now(),
            &config,
            &ctx(),
        )
        .unwrap();
        assert_eq!(readings.len(), 2);
    }

    #[test]
    fn test_rows_are_ordered_by_timestamp() {
        let rows = vec![
            json!({"timestamp": "2026-01-29T10:00:00Z", "pm25": 2}),
            json!({"timestamp": "2026-01-29T09:00:00Z", "pm25": 1}),
        ];
        let readings = normalize(&rows, &FieldMapping::default()).unwrap();

        assert_eq!(readings[0].pm25, Some(1.0));
        assert_eq!(readings[0].entry_id, 1);
        assert_eq!(readings[1].pm25, Some(2.0));
        assert_eq!(readings[1].entry_id, 2);
    }

    #[test]
    fn test_mapped_timestamp_field() {
        let mapping = resolve_field_mapping(&[FieldDescriptor::named("Date Time")], &ctx());
        let rows = vec![json!({"Date Time": "2026-01-28 08:15:00"})];
        let readings = normalize(&rows, &mapping).unwrap();

        assert_eq!(
            readings[0].timestamp,
            Utc.with_ymd_and_hms(2026, 1, 28, 8, 15, 0).unwrap()
        );
    }

    fn cell() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<f64>().prop_map(|f| json!(f)),
            "[a-z0-9. ]{0,6}".prop_map(Value::String),
            Just(Value::Null),
            Just(json!(true)),
        ]
    }

    proptest! {
        #[test]
        fn prop_rows_are_never_dropped(cells in prop::collection::vec((cell(), cell()), 1..40)) {
            let rows: Vec<Value> = cells
                .into_iter()
                .map(|(a, b)| json!({"pm25": a, "timestamp": b}))
                .collect();
            let readings = normalize(&rows, &FieldMapping::default()).unwrap();

            prop_assert_eq!(readings.len(), rows.len());
            for (i, pair) in readings.windows(2).enumerate() {
                prop_assert!(pair[0].timestamp <= pair[1].timestamp);
                prop_assert_eq!(pair[0].entry_id, i as u64 + 1);
                prop_assert!(pair[0].entry_id < pair[1].entry_id);
            }
        }
    }
}
