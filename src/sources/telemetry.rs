//! IoT telemetry channel payloads.
//!
//! A channel declares up to eight numbered slots (`field1`..`field8`) with
//! free-text labels; each feed entry carries a value per slot plus a
//! `created_at` time. Labels become field descriptors for the resolver.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::extraction::field_mapping::FieldDescriptor;
use crate::extraction::normalizer::TIMESTAMP_KEY;
use crate::models::SourceKind;

use super::SourceRows;

pub const TELEMETRY_FIELD_SLOTS: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryFeed {
    pub channel: TelemetryChannel,
    #[serde(default)]
    pub feeds: Vec<TelemetryEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryChannel {
    #[serde(default)]
    pub name: Option<String>,
    /// `fieldN` labels and any other channel metadata.
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEntry {
    #[serde(default)]
    pub created_at: Option<String>,
    /// `fieldN` values and the source's own `entry_id`.
    #[serde(flatten)]
    pub values: BTreeMap<String, Value>,
}

fn slot_key(slot: usize) -> String {
    format!("field{}", slot)
}

impl TelemetryChannel {
    /// Labelled slots in slot order. Unlabelled slots are not offered.
    pub fn field_descriptors(&self) -> Vec<FieldDescriptor> {
        (1..=TELEMETRY_FIELD_SLOTS)
            .filter_map(|slot| {
                let key = slot_key(slot);
                let label = self.attributes.get(&key)?.as_str()?.trim();
                if label.is_empty() {
                    None
                } else {
                    Some(FieldDescriptor::new(&key, label))
                }
            })
            .collect()
    }
}

impl TelemetryFeed {
    pub fn into_source_rows(self) -> SourceRows {
        let fields = self.channel.field_descriptors();

        let rows = self
            .feeds
            .into_iter()
            .map(|entry| {
                let mut row = Map::new();
                for slot in 1..=TELEMETRY_FIELD_SLOTS {
                    let key = slot_key(slot);
                    if let Some(value) = entry.values.get(&key) {
                        row.insert(key, value.clone());
                    }
                }
                if let Some(created_at) = entry.created_at {
                    row.insert(TIMESTAMP_KEY.to_string(), Value::String(created_at));
                }
                Value::Object(row)
            })
            .collect();

        SourceRows {
            kind: SourceKind::Telemetry,
            name: self
                .channel
                .name
                .unwrap_or_else(|| "telemetry channel".to_string()),
            fields,
            rows,
        }
    }
}
