//! Per-metric statistics.
//!
//! Nulls are skipped: `current` is the last non-null value, not necessarily
//! the value of the last reading. An empty series summarizes to zeros with
//! `samples == 0`.

use serde::{Deserialize, Serialize};

use crate::models::{Metric, Reading};

/// Fewer non-null points than this always yield `Trend::Stable`.
pub const MIN_TREND_SAMPLES: usize = 3;

/// Slope threshold as a fraction of the series mean.
pub const TREND_THRESHOLD_RATIO: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSummary {
    pub current: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub trend: Trend,
    /// Number of non-null values the statistics were computed over.
    pub samples: usize,
}

impl MetricSummary {
    pub fn empty() -> Self {
        Self {
            current: 0.0,
            mean: 0.0,
            min: 0.0,
            max: 0.0,
            trend: Trend::Stable,
            samples: 0,
        }
    }

    pub fn has_data(&self) -> bool {
        self.samples > 0
    }
}

/// Summarize one metric over a reading sequence.
pub fn summarize_metric(readings: &[Reading], metric: Metric) -> MetricSummary {
    let values: Vec<f64> = readings.iter().filter_map(|r| r.value(metric)).collect();
    summarize_values(&values)
}

pub fn summarize_values(values: &[f64]) -> MetricSummary {
    let Some(&current) = values.last() else {
        return MetricSummary::empty();
    };

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // Summation error can push the mean of a flat series a hair past its
    // bounds.
    let mean = (values.iter().sum::<f64>() / values.len() as f64).clamp(min, max);

    MetricSummary {
        current,
        mean,
        min,
        max,
        trend: compute_trend(values),
        samples: values.len(),
    }
}

/// Classify a series by its least-squares slope against sample index.
///
/// The slope is compared against 5% of the absolute series mean.
pub fn compute_trend(values: &[f64]) -> Trend {
    if values.len() < MIN_TREND_SAMPLES {
        return Trend::Stable;
    }

    let n = values.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / n;

    let (covariance, variance) = values.iter().enumerate().fold(
        (0.0, 0.0),
        |(cov, var), (i, y)| {
            let dx = i as f64 - x_mean;
            (cov + dx * (y - y_mean), var + dx * dx)
        },
    );

    let slope = covariance / variance;
    let threshold = y_mean.abs() * TREND_THRESHOLD_RATIO;

    if slope > threshold {
        Trend::Increasing
    } else if slope < -threshold {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}
