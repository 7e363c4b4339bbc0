//! Source adapters.
//!
//! Each supported source is reduced to the same shape before mapping:
//! - Telemetry channel (labelled `fieldN` slots)
//! - Public air-quality API (locations with measurement lists)
//! - Spreadsheet upload (header row + data rows)

pub mod air_quality;
pub mod client;
pub mod spreadsheet;
pub mod telemetry;

pub use air_quality::*;
pub use client::*;
pub use spreadsheet::*;
pub use telemetry::*;

use serde_json::Value;

use crate::extraction::field_mapping::FieldDescriptor;
use crate::models::SourceKind;

/// A source reduced to flat rows plus the fields it offers for mapping.
#[derive(Debug, Clone)]
pub struct SourceRows {
    pub kind: SourceKind,
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
    pub rows: Vec<Value>,
}

/// Raw payload of one source ingestion.
#[derive(Debug, Clone)]
pub enum SourcePayload {
    Telemetry(TelemetryFeed),
    AirQuality {
        name: String,
        locations: Vec<AirQualityLocation>,
    },
    Spreadsheet {
        name: String,
        grid: SpreadsheetGrid,
    },
}

impl SourcePayload {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourcePayload::Telemetry(_) => SourceKind::Telemetry,
            SourcePayload::AirQuality { .. } => SourceKind::AirQuality,
            SourcePayload::Spreadsheet { .. } => SourceKind::Spreadsheet,
        }
    }

    pub fn into_source_rows(self) -> SourceRows {
        match self {
            SourcePayload::Telemetry(feed) => feed.into_source_rows(),
            SourcePayload::AirQuality { name, locations } => {
                locations_to_source_rows(&name, locations)
            }
            SourcePayload::Spreadsheet { name, grid } => grid.into_source_rows(&name),
        }
    }
}
