//! Metrics engine entry point.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Metric, Reading};

use super::health::{health_score, HealthBreakpoints, HealthScore};
use super::summary::{summarize_metric, MetricSummary, Trend};

/// Everything derived from one reading sequence.
///
/// Recomputed wholesale whenever the readings change; never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    pub summaries: BTreeMap<Metric, MetricSummary>,
    pub health_score: HealthScore,
    pub sample_count: usize,
    pub latest_timestamp: Option<DateTime<Utc>>,
}

impl MetricsReport {
    pub fn summary(&self, metric: Metric) -> Option<&MetricSummary> {
        self.summaries.get(&metric)
    }

    /// Summaries that saw at least one value.
    pub fn reported(&self) -> impl Iterator<Item = (&Metric, &MetricSummary)> {
        self.summaries.iter().filter(|(_, s)| s.has_data())
    }

    /// The PM2.5 trend, which stands in for the overall trend.
    pub fn headline_trend(&self) -> Trend {
        self.summary(Metric::Pm25)
            .map(|s| s.trend)
            .unwrap_or(Trend::Stable)
    }
}

/// Summarize every metric and score the latest reading.
///
/// Pure; an empty sequence yields zeroed summaries and a full score.
pub fn compute_metrics(readings: &[Reading], breakpoints: &HealthBreakpoints) -> MetricsReport {
    let summaries = Metric::ALL
        .iter()
        .map(|metric| (*metric, summarize_metric(readings, *metric)))
        .collect();

    MetricsReport {
        summaries,
        health_score: health_score(readings.last(), breakpoints),
        sample_count: readings.len(),
        latest_timestamp: readings.last().map(|r| r.timestamp),
    }
}
