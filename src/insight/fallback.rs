//! Deterministic local analyzer.
//!
//! Rule-based stand-in for a provider response when every candidate has
//! failed. Offline and infallible; the result passes the same schema
//! validator as provider output.

use super::model::{Finding, Insight, Priority, Recommendation, LOCAL_FALLBACK_PROVIDER};
use super::prompt::InsightContext;
use crate::metrics::summary::Trend;
use crate::metrics::MetricsReport;
use crate::models::Metric;

pub const PM25_GOOD_MAX: f64 = 12.0;
pub const PM25_MODERATE_MAX: f64 = 35.0;
pub const HUMIDITY_OPTIMAL: (f64, f64) = (30.0, 60.0);
pub const TEMPERATURE_OPTIMAL: (f64, f64) = (20.0, 26.0);

struct Assessment {
    findings: Vec<Finding>,
    recommendations: Vec<Recommendation>,
}

impl Assessment {
    fn pm25(&mut self, current: f64) {
        if current <= PM25_GOOD_MAX {
            self.findings.push(Finding::good(format!(
                "PM2.5 at {:.1} µg/m³ is within the healthy range",
                current
            )));
        } else if current <= PM25_MODERATE_MAX {
            self.findings.push(Finding::warning(format!(
                "PM2.5 at {:.1} µg/m³ is moderate; sensitive groups may be affected",
                current
            )));
            self.recommendations.push(Recommendation::new(
                Priority::Medium,
                "Limit prolonged outdoor activity and consider running an air purifier",
                "Reduces fine particle exposure for sensitive groups",
            ));
        } else {
            self.findings.push(Finding::warning(format!(
                "PM2.5 at {:.1} µg/m³ is unhealthy",
                current
            )));
            self.recommendations.push(Recommendation::new(
                Priority::High,
                "Stay indoors with windows closed and use HEPA filtration",
                "Significantly lowers exposure to harmful fine particles",
            ));
        }
    }

    fn humidity(&mut self, current: f64) {
        let (low, high) = HUMIDITY_OPTIMAL;
        if (low..=high).contains(&current) {
            self.findings.push(Finding::good(format!(
                "Humidity at {:.0}% is in the optimal range",
                current
            )));
        } else if current < low {
            self.findings.push(Finding::warning(format!(
                "Humidity at {:.0}% is too dry",
                current
            )));
            self.recommendations.push(Recommendation::new(
                Priority::Low,
                "Use a humidifier to raise indoor humidity",
                "Eases dry skin and respiratory irritation",
            ));
        } else {
            self.findings.push(Finding::warning(format!(
                "Humidity at {:.0}% is too humid",
                current
            )));
            self.recommendations.push(Recommendation::new(
                Priority::Medium,
                "Ventilate or run a dehumidifier",
                "Limits mold growth and dust mites",
            ));
        }
    }

    fn temperature(&mut self, current: f64) {
        let (low, high) = TEMPERATURE_OPTIMAL;
        if (low..=high).contains(&current) {
            self.findings.push(Finding::good(format!(
                "Temperature at {:.1} °C is comfortable",
                current
            )));
        } else {
            let state = if current < low { "cold" } else { "warm" };
            self.findings.push(Finding::warning(format!(
                "Temperature at {:.1} °C is {}",
                current, state
            )));
            self.recommendations.push(Recommendation::new(
                Priority::Low,
                "Adjust heating or cooling toward 20-26 °C",
                "Improves thermal comfort",
            ));
        }
    }

    fn pm25_trend(&mut self, trend: Trend) {
        match trend {
            Trend::Increasing => self
                .findings
                .push(Finding::warning("PM2.5 levels are trending upward")),
            Trend::Decreasing => self
                .findings
                .push(Finding::good("PM2.5 levels are trending downward")),
            Trend::Stable => {}
        }
    }
}

/// Synthesize an insight from the metrics alone.
pub fn analyze_locally(report: &MetricsReport, context: &InsightContext) -> Insight {
    let mut assessment = Assessment {
        findings: Vec::new(),
        recommendations: Vec::new(),
    };

    if let Some(pm25) = report.summary(Metric::Pm25).filter(|s| s.has_data()) {
        assessment.pm25(pm25.current);
        assessment.pm25_trend(pm25.trend);
    }
    if let Some(humidity) = report.summary(Metric::Humidity).filter(|s| s.has_data()) {
        assessment.humidity(humidity.current);
    }
    if let Some(temperature) = report.summary(Metric::Temperature).filter(|s| s.has_data()) {
        assessment.temperature(temperature.current);
    }

    if assessment.findings.is_empty() {
        assessment.findings.push(Finding::warning(
            "No PM2.5, humidity or temperature data available to assess",
        ));
    }

    let score = report.health_score;
    let trend = report.headline_trend();
    let summary = format!(
        "{} shows {} air quality (score {}/100) across {} samples; PM2.5 trend is {}.",
        context.source_name,
        score.category().as_str().to_lowercase(),
        score.value(),
        context.sample_count,
        trend.as_str()
    );

    Insight {
        summary,
        score: score.value(),
        category: score.category(),
        findings: assessment.findings,
        recommendations: assessment.recommendations,
        trend,
        provider_used: LOCAL_FALLBACK_PROVIDER.to_string(),
    }
}
