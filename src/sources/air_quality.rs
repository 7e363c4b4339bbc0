//! Public air-quality API payloads.
//!
//! The API returns monitoring locations, each with its latest measurement
//! per parameter. Locations are grouped by name and flattened into one row
//! keyed by canonical metric names, stamped with the most recent update.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::extraction::json_path::value_to_timestamp;
use crate::extraction::normalizer::TIMESTAMP_KEY;
use crate::models::{Metric, SourceKind};

use super::SourceRows;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirQualityLocation {
    #[serde(default, alias = "name")]
    pub location: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub measurements: Vec<Measurement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measurement {
    pub parameter: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, rename = "lastUpdated")]
    pub last_updated: Option<String>,
}

/// The list is served either bare or wrapped in `results`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AirQualityPayload {
    Wrapped { results: Vec<AirQualityLocation> },
    Bare(Vec<AirQualityLocation>),
}

impl AirQualityPayload {
    pub fn into_locations(self) -> Vec<AirQualityLocation> {
        match self {
            AirQualityPayload::Wrapped { results } => results,
            AirQualityPayload::Bare(locations) => locations,
        }
    }
}

/// Map an API parameter name onto a canonical metric.
pub fn parameter_metric(parameter: &str) -> Option<Metric> {
    match parameter.to_lowercase().replace(&['.', '_', ' '][..], "").as_str() {
        "pm25" => Some(Metric::Pm25),
        "pm10" => Some(Metric::Pm10),
        "o3" => Some(Metric::O3),
        "no2" => Some(Metric::No2),
        "so2" => Some(Metric::So2),
        "co" => Some(Metric::Co),
        "temperature" => Some(Metric::Temperature),
        "relativehumidity" | "humidity" => Some(Metric::Humidity),
        _ => None,
    }
}

struct LocationRow {
    values: Map<String, Value>,
    // Per-metric update time, so a later measurement replaces an earlier one
    updated: HashMap<Metric, Option<DateTime<Utc>>>,
    latest: Option<DateTime<Utc>>,
}

pub fn locations_to_source_rows(name: &str, locations: Vec<AirQualityLocation>) -> SourceRows {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, LocationRow> = HashMap::new();

    for location in locations {
        let entry = grouped.entry(location.location.clone()).or_insert_with(|| {
            order.push(location.location.clone());
            LocationRow {
                values: Map::new(),
                updated: HashMap::new(),
                latest: None,
            }
        });

        for measurement in location.measurements {
            let Some(metric) = parameter_metric(&measurement.parameter) else {
                continue;
            };
            let updated = measurement
                .last_updated
                .as_deref()
                .and_then(|s| value_to_timestamp(&Value::String(s.to_string())));

            let newer = match entry.updated.get(&metric) {
                Some(previous) => updated > *previous,
                None => true,
            };
            if newer {
                entry
                    .values
                    .insert(metric.as_str().to_string(), measurement.value.clone());
                entry.updated.insert(metric, updated);
            }
            entry.latest = entry.latest.max(updated);
        }
    }

    let rows = order
        .into_iter()
        .filter_map(|key| grouped.remove(&key))
        .map(|mut location| {
            if let Some(latest) = location.latest {
                location
                    .values
                    .insert(TIMESTAMP_KEY.to_string(), Value::String(latest.to_rfc3339()));
            }
            Value::Object(location.values)
        })
        .collect();

    SourceRows {
        kind: SourceKind::AirQuality,
        name: name.to_string(),
        fields: Vec::new(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn locations() -> Vec<AirQualityLocation> {
        let payload: AirQualityPayload = serde_json::from_value(json!({
            "results": [
                {
                    "location": "Central",
                    "city": "Lisbon",
                    "measurements": [
                        {"parameter": "pm25", "value": 11.0, "unit": "µg/m³", "lastUpdated": "2026-01-29T09:00:00Z"},
                        {"parameter": "pm10", "value": 20.0, "unit": "µg/m³", "lastUpdated": "2026-01-29T10:00:00Z"},
                        {"parameter": "bc", "value": 1.0, "unit": "µg/m³", "lastUpdated": "2026-01-29T11:00:00Z"}
                    ]
                },
                {
                    "location": "Harbour",
                    "measurements": [
                        {"parameter": "relativehumidity", "value": 70, "unit": "%", "lastUpdated": "2026-01-29T08:00:00Z"}
                    ]
                },
                {
                    "location": "Central",
                    "measurements": [
                        {"parameter": "pm25", "value": 14.0, "unit": "µg/m³", "lastUpdated": "2026-01-29T09:30:00Z"}
                    ]
                }
            ]
        }))
        .unwrap();
        payload.into_locations()
    }

    #[test]
    fn test_bare_list_payload() {
        let payload: AirQualityPayload =
            serde_json::from_value(json!([{"location": "A", "measurements": []}])).unwrap();
        assert_eq!(payload.into_locations().len(), 1);
    }

    #[test]
    fn test_parameter_names() {
        assert_eq!(parameter_metric("PM2.5"), Some(Metric::Pm25));
        assert_eq!(parameter_metric("relativehumidity"), Some(Metric::Humidity));
        assert_eq!(parameter_metric("bc"), None);
    }

    #[test]
    fn test_grouped_by_location_and_flattened() {
        let source = locations_to_source_rows("Lisbon", locations());
        assert_eq!(source.kind, SourceKind::AirQuality);
        assert_eq!(source.rows.len(), 2);

        let central = &source.rows[0];
        // The later duplicate measurement wins
        assert_eq!(central["pm25"], json!(14.0));
        assert_eq!(central["pm10"], json!(20.0));
        assert!(central.get("bc").is_none());
        // Ignored parameters do not move the row timestamp
        assert_eq!(central["timestamp"], json!("2026-01-29T10:00:00+00:00"));

        assert_eq!(source.rows[1]["humidity"], json!(70));
    }
}
