//! Canonical sensor reading.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A measured quantity in the canonical schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Pm25,
    Pm10,
    Temperature,
    Humidity,
    Noise,
    O3,
    No2,
    So2,
    Co,
}

impl Metric {
    pub const ALL: [Metric; 9] = [
        Metric::Pm25,
        Metric::Pm10,
        Metric::Temperature,
        Metric::Humidity,
        Metric::Noise,
        Metric::O3,
        Metric::No2,
        Metric::So2,
        Metric::Co,
    ];

    /// Canonical key, also accepted verbatim in pre-normalized rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Pm25 => "pm25",
            Metric::Pm10 => "pm10",
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::Noise => "noise",
            Metric::O3 => "o3",
            Metric::No2 => "no2",
            Metric::So2 => "so2",
            Metric::Co => "co",
        }
    }

    /// Human-readable name used in prompts and findings.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Pm25 => "PM2.5",
            Metric::Pm10 => "PM10",
            Metric::Temperature => "Temperature",
            Metric::Humidity => "Humidity",
            Metric::Noise => "Noise",
            Metric::O3 => "O3",
            Metric::No2 => "NO2",
            Metric::So2 => "SO2",
            Metric::Co => "CO",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Pm25 | Metric::Pm10 => "µg/m³",
            Metric::Temperature => "°C",
            Metric::Humidity => "%",
            Metric::Noise => "dB",
            Metric::O3 | Metric::No2 | Metric::So2 | Metric::Co => "ppm",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a batch of rows came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Telemetry,
    AirQuality,
    Spreadsheet,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Telemetry => "telemetry",
            SourceKind::AirQuality => "air_quality",
            SourceKind::Spreadsheet => "spreadsheet",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timestamped sample expressed in the canonical schema.
///
/// `entry_id` is the 1-based position within the source after ordering;
/// timestamps are non-decreasing along it. Any measurement may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub entry_id: u64,
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub noise: Option<f64>,
    pub o3: Option<f64>,
    pub no2: Option<f64>,
    pub so2: Option<f64>,
    pub co: Option<f64>,
}

impl Reading {
    /// An empty reading with every measurement absent.
    pub fn new(timestamp: DateTime<Utc>, entry_id: u64) -> Self {
        Self {
            timestamp,
            entry_id,
            pm25: None,
            pm10: None,
            temperature: None,
            humidity: None,
            noise: None,
            o3: None,
            no2: None,
            so2: None,
            co: None,
        }
    }

    pub fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Pm25 => self.pm25,
            Metric::Pm10 => self.pm10,
            Metric::Temperature => self.temperature,
            Metric::Humidity => self.humidity,
            Metric::Noise => self.noise,
            Metric::O3 => self.o3,
            Metric::No2 => self.no2,
            Metric::So2 => self.so2,
            Metric::Co => self.co,
        }
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        let slot = match metric {
            Metric::Pm25 => &mut self.pm25,
            Metric::Pm10 => &mut self.pm10,
            Metric::Temperature => &mut self.temperature,
            Metric::Humidity => &mut self.humidity,
            Metric::Noise => &mut self.noise,
            Metric::O3 => &mut self.o3,
            Metric::No2 => &mut self.no2,
            Metric::So2 => &mut self.so2,
            Metric::Co => &mut self.co,
        };
        *slot = value;
    }

    /// Builder-style setter, mostly for tests and fixtures.
    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.set(metric, Some(value));
        self
    }
}
