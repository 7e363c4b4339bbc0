//! Field mapping resolution.
//!
//! Infers which source field carries each canonical metric. Resolution runs
//! in two phases:
//!
//! 1. **Lexicon** - case-insensitive match of each field label against a
//!    fixed vocabulary. The first matching field wins a slot; later fields
//!    matching the same slot are ignored.
//! 2. **Positional** - the five core slots (pm25, pm10, temperature,
//!    humidity, noise) still unmapped take the next unassigned fields in
//!    declaration order.
//!
//! The positional phase is a best-effort default, not a guarantee: a
//! channel whose first free field is really temperature will have it
//! mapped as pm25. Every such guess is tagged `Confidence::Positional` and
//! logged as `FIELD_MAPPING_GUESSED` so callers can surface or reject it.
//! Timestamps are never guessed; rows without one get a synthesized time
//! during normalization.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::logging::structured::LogContext;
use crate::models::Metric;
use crate::{log_debug, log_warn};

/// A field offered by a source: its identifier within the row and the
/// human-readable label the lexicon is matched against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub id: String,
    pub label: String,
}

impl FieldDescriptor {
    pub fn new(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
        }
    }

    /// A field whose identifier doubles as its label (spreadsheet headers).
    pub fn named(name: &str) -> Self {
        Self::new(name, name)
    }
}

/// How a mapped field was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Lexicon,
    Positional,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappedField {
    pub field: String,
    pub confidence: Confidence,
}

/// Canonical metric -> source field identifier.
///
/// Built once per ingestion and read-only afterwards. Every entry refers to
/// a field that was offered by the source; unresolvable slots are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldMapping {
    metrics: BTreeMap<Metric, MappedField>,
    timestamp: Option<MappedField>,
}

impl FieldMapping {
    pub fn field_for(&self, metric: Metric) -> Option<&MappedField> {
        self.metrics.get(&metric)
    }

    pub fn timestamp_field(&self) -> Option<&MappedField> {
        self.timestamp.as_ref()
    }

    pub fn metrics(&self) -> impl Iterator<Item = (&Metric, &MappedField)> {
        self.metrics.iter()
    }

    /// Metrics whose field was only guessed positionally.
    pub fn guessed(&self) -> Vec<Metric> {
        self.metrics
            .iter()
            .filter(|(_, m)| m.confidence == Confidence::Positional)
            .map(|(metric, _)| *metric)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.timestamp.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Metric(Metric),
    Timestamp,
}

struct LexiconEntry {
    slot: Slot,
    /// Substrings matched against the lowercased label or its
    /// alphanumeric-only compaction.
    contains: &'static [&'static str],
    /// Whole tokens of the lowercased label.
    tokens: &'static [&'static str],
    positional: bool,
}

const LEXICON: &[LexiconEntry] = &[
    LexiconEntry {
        slot: Slot::Metric(Metric::Pm25),
        contains: &["pm2.5", "pm25"],
        tokens: &[],
        positional: true,
    },
    LexiconEntry {
        slot: Slot::Metric(Metric::Pm10),
        contains: &["pm10"],
        tokens: &[],
        positional: true,
    },
    LexiconEntry {
        slot: Slot::Metric(Metric::Temperature),
        contains: &["temp"],
        tokens: &[],
        positional: true,
    },
    LexiconEntry {
        slot: Slot::Metric(Metric::Humidity),
        contains: &["humid"],
        tokens: &[],
        positional: true,
    },
    LexiconEntry {
        slot: Slot::Metric(Metric::Noise),
        contains: &["noise", "sound", "db"],
        tokens: &[],
        positional: true,
    },
    LexiconEntry {
        slot: Slot::Timestamp,
        contains: &["time", "date"],
        tokens: &[],
        positional: false,
    },
    LexiconEntry {
        slot: Slot::Metric(Metric::O3),
        contains: &["ozone"],
        tokens: &["o3"],
        positional: false,
    },
    LexiconEntry {
        slot: Slot::Metric(Metric::No2),
        contains: &["nitrogen dioxide"],
        tokens: &["no2"],
        positional: false,
    },
    LexiconEntry {
        slot: Slot::Metric(Metric::So2),
        contains: &["sulfur dioxide", "sulphur dioxide"],
        tokens: &["so2"],
        positional: false,
    },
    LexiconEntry {
        slot: Slot::Metric(Metric::Co),
        contains: &["carbon monoxide"],
        tokens: &["co"],
        positional: false,
    },
];

fn compact(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

impl LexiconEntry {
    fn matches(&self, label: &str) -> bool {
        let lower = label.to_lowercase();
        let compacted = compact(&lower);

        let by_substring = self.contains.iter().any(|pattern| {
            lower.contains(pattern) || {
                let pattern = compact(pattern);
                !pattern.is_empty() && compacted.contains(&pattern)
            }
        });

        by_substring
            || lower
                .split(|c: char| !c.is_ascii_alphanumeric())
                .any(|token| self.tokens.contains(&token))
    }
}

/// Resolve a field mapping for the fields a source offers.
///
/// Never fails; at worst the mapping contains positional guesses or is
/// empty.
pub fn resolve_field_mapping(fields: &[FieldDescriptor], ctx: &LogContext) -> FieldMapping {
    let mut mapping = FieldMapping::default();
    let mut used: HashSet<usize> = HashSet::new();

    // Phase 1: lexicon
    for entry in LEXICON {
        let hit = fields
            .iter()
            .enumerate()
            .find(|(i, field)| !used.contains(i) && entry.matches(&field.label));

        if let Some((index, field)) = hit {
            used.insert(index);
            assign(&mut mapping, entry.slot, &field.id, Confidence::Lexicon);
        }
    }

    // Phase 2: positional fallback for the core slots
    let mut next_free = 0;
    for entry in LEXICON.iter().filter(|e| e.positional) {
        let Slot::Metric(metric) = entry.slot else {
            continue;
        };
        if mapping.metrics.contains_key(&metric) {
            continue;
        }

        while next_free < fields.len() && used.contains(&next_free) {
            next_free += 1;
        }
        let Some(field) = fields.get(next_free) else {
            break;
        };

        used.insert(next_free);
        log_warn!(
            ctx,
            "FIELD_MAPPING_GUESSED",
            metric = metric.as_str(),
            field = &field.id,
            label = &field.label
        );
        assign(&mut mapping, entry.slot, &field.id, Confidence::Positional);
    }

    log_debug!(
        ctx,
        "FIELD_MAPPING_RESOLVED",
        offered = fields.len(),
        mapped = mapping.metrics.len(),
        guessed = mapping.guessed(),
        timestamp = mapping.timestamp.as_ref().map(|t| t.field.as_str())
    );

    mapping
}

fn assign(mapping: &mut FieldMapping, slot: Slot, field: &str, confidence: Confidence) {
    let mapped = MappedField {
        field: field.to_string(),
        confidence,
    };
    match slot {
        Slot::Metric(metric) => {
            mapping.metrics.insert(metric, mapped);
        }
        Slot::Timestamp => mapping.timestamp = Some(mapped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> LogContext {
        LogContext::new("test-request")
    }

    fn field(mapping: &FieldMapping, metric: Metric) -> Option<(&str, Confidence)> {
        mapping
            .field_for(metric)
            .map(|m| (m.field.as_str(), m.confidence))
    }

    #[test]
    fn test_telemetry_label_resolves_temperature() {
        let fields = vec![
            FieldDescriptor::new("field1", "PM2.5"),
            FieldDescriptor::new("field2", "PM10"),
            FieldDescriptor::new("field3", "Temp (C)"),
            FieldDescriptor::new("field4", "Humidity %"),
            FieldDescriptor::new("field5", "Sound level dB"),
        ];
        let mapping = resolve_field_mapping(&fields, &ctx());

        assert_eq!(
            field(&mapping, Metric::Temperature),
            Some(("field3", Confidence::Lexicon))
        );
        assert_eq!(field(&mapping, Metric::Pm25), Some(("field1", Confidence::Lexicon)));
        assert_eq!(field(&mapping, Metric::Pm10), Some(("field2", Confidence::Lexicon)));
        assert_eq!(field(&mapping, Metric::Humidity), Some(("field4", Confidence::Lexicon)));
        assert_eq!(field(&mapping, Metric::Noise), Some(("field5", Confidence::Lexicon)));
        assert!(mapping.guessed().is_empty());
    }

    #[test]
    fn test_pm25_spellings() {
        for label in ["PM2.5", "pm25", "PM_2_5 (ug/m3)", "Pm 2.5"] {
            let mapping = resolve_field_mapping(&[FieldDescriptor::named(label)], &ctx());
            assert_eq!(
                field(&mapping, Metric::Pm25),
                Some((label, Confidence::Lexicon)),
                "label {label}"
            );
        }
    }

    #[test]
    fn test_first_match_wins() {
        let fields = vec![
            FieldDescriptor::named("temp_indoor"),
            FieldDescriptor::named("temp_outdoor"),
        ];
        let mapping = resolve_field_mapping(&fields, &ctx());

        assert_eq!(
            field(&mapping, Metric::Temperature),
            Some(("temp_indoor", Confidence::Lexicon))
        );
        // The duplicate is not reused for temperature but is free for a
        // positional guess.
        assert_eq!(
            field(&mapping, Metric::Pm25),
            Some(("temp_outdoor", Confidence::Positional))
        );
    }

    #[test]
    fn test_positional_fallback_in_lexicon_order() {
        let fields = vec![
            FieldDescriptor::new("field1", "Sensor A"),
            FieldDescriptor::new("field2", "Humidity"),
            FieldDescriptor::new("field3", "Sensor B"),
        ];
        let mapping = resolve_field_mapping(&fields, &ctx());

        assert_eq!(field(&mapping, Metric::Humidity), Some(("field2", Confidence::Lexicon)));
        assert_eq!(field(&mapping, Metric::Pm25), Some(("field1", Confidence::Positional)));
        assert_eq!(field(&mapping, Metric::Pm10), Some(("field3", Confidence::Positional)));
        assert_eq!(field(&mapping, Metric::Temperature), None);
        assert_eq!(mapping.guessed(), vec![Metric::Pm25, Metric::Pm10]);
    }

    #[test]
    fn test_timestamp_matched_but_never_guessed() {
        let mapping = resolve_field_mapping(
            &[FieldDescriptor::named("Date"), FieldDescriptor::named("pm10")],
            &ctx(),
        );
        assert_eq!(
            mapping.timestamp_field().map(|t| t.field.as_str()),
            Some("Date")
        );

        let mapping = resolve_field_mapping(&[FieldDescriptor::named("reading")], &ctx());
        assert!(mapping.timestamp_field().is_none());
        assert_eq!(field(&mapping, Metric::Pm25), Some(("reading", Confidence::Positional)));
    }

    #[test]
    fn test_gases_match_whole_tokens_only() {
        let fields = vec![
            FieldDescriptor::named("location"),
            FieldDescriptor::named("CO (ppm)"),
            FieldDescriptor::named("Ozone"),
        ];
        let mapping = resolve_field_mapping(&fields, &ctx());

        assert_eq!(field(&mapping, Metric::Co), Some(("CO (ppm)", Confidence::Lexicon)));
        assert_eq!(field(&mapping, Metric::O3), Some(("Ozone", Confidence::Lexicon)));
        // "location" is only ever a positional guess
        assert_eq!(field(&mapping, Metric::Pm25), Some(("location", Confidence::Positional)));
    }

    #[test]
    fn test_no_fields_gives_empty_mapping() {
        let mapping = resolve_field_mapping(&[], &ctx());
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_every_mapped_field_was_offered() {
        let fields = vec![
            FieldDescriptor::named("a"),
            FieldDescriptor::named("humidity"),
            FieldDescriptor::named("time"),
        ];
        let offered: HashSet<&str> = fields.iter().map(|f| f.id.as_str()).collect();
        let mapping = resolve_field_mapping(&fields, &ctx());

        for (_, mapped) in mapping.metrics() {
            assert!(offered.contains(mapped.field.as_str()));
        }
    }
}
