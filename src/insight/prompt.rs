//! Metrics to natural-language prompt.

use std::fmt::Write;

use crate::metrics::MetricsReport;

/// Small natural-language context sent along with the metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightContext {
    pub source_name: String,
    pub sample_count: usize,
}

impl InsightContext {
    pub fn new(source_name: impl Into<String>, sample_count: usize) -> Self {
        Self {
            source_name: source_name.into(),
            sample_count,
        }
    }

    pub fn from_report(source_name: impl Into<String>, report: &MetricsReport) -> Self {
        Self::new(source_name, report.sample_count)
    }
}

const RESPONSE_SHAPE: &str = r#"{
  "summary": "one or two sentences",
  "score": 0-100,
  "category": "Excellent|Good|Moderate|Poor|Hazardous",
  "findings": [{"type": "good|warning", "text": "..."}],
  "recommendations": [{"priority": "high|medium|low", "action": "...", "impact": "..."}],
  "trend": "increasing|decreasing|stable"
}"#;

/// Render the prompt for one analysis request.
pub fn build_prompt(report: &MetricsReport, context: &InsightContext) -> String {
    let mut prompt = String::new();

    // Writes into a String cannot fail.
    let _ = writeln!(
        prompt,
        "You are an environmental health analyst. Analyze these air quality readings from \"{}\" ({} samples).",
        context.source_name, context.sample_count
    );
    let _ = writeln!(prompt);

    let mut any = false;
    for (metric, summary) in report.reported() {
        any = true;
        let _ = writeln!(
            prompt,
            "- {}: current {:.1} {}, mean {:.1}, min {:.1}, max {:.1}, trend {}",
            metric.label(),
            summary.current,
            metric.unit(),
            summary.mean,
            summary.min,
            summary.max,
            summary.trend.as_str()
        );
    }
    if !any {
        let _ = writeln!(prompt, "- no measurements were reported");
    }

    let _ = writeln!(prompt);
    let _ = writeln!(
        prompt,
        "Computed health score: {}/100 ({}).",
        report.health_score.value(),
        report.health_score.category().as_str()
    );
    let _ = writeln!(prompt);
    let _ = writeln!(
        prompt,
        "Respond with a single JSON object only, no prose, in exactly this shape:"
    );
    prompt.push_str(RESPONSE_SHAPE);
    prompt.push('\n');

    prompt
}
