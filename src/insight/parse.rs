//! Provider response text to `Insight`.
//!
//! Providers return a JSON object embedded in natural-language text,
//! sometimes wrapped in a markdown code fence. Parsing is lenient about
//! field spellings but strict about the schema minimum (summary + findings).

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::model::{parse_trend, Finding, FindingKind, Insight, Priority, Recommendation};
use super::schema::{validate_insight, validate_insight_value};
use crate::metrics::health::{Category, HealthScore};
use crate::metrics::MetricsReport;

lazy_static! {
    /// Fenced block, optional language tag
    static ref CODE_FENCE: Regex = Regex::new(
        r"(?s)```(?:[A-Za-z0-9_-]+)?\s*(.*?)\s*```"
    ).unwrap();
}

#[derive(Debug, Error, PartialEq)]
pub enum InsightParseError {
    #[error("response contains no JSON object")]
    NoJsonObject,

    #[error("malformed JSON: {0}")]
    Malformed(String),

    #[error("schema violation: {0}")]
    Schema(String),
}

/// Remove a markdown code fence, if present. Unfenced text is returned trimmed.
pub fn strip_code_fences(text: &str) -> &str {
    match CODE_FENCE.captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => text.trim(),
    }
}

/// Slice from the first `{` to the last `}`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

#[derive(Debug, Deserialize)]
struct RemoteInsight {
    summary: String,
    #[serde(default)]
    score: Option<Value>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    findings: Vec<RemoteFinding>,
    #[serde(default)]
    recommendations: Option<Vec<RemoteRecommendation>>,
    #[serde(default)]
    trend: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RemoteFinding {
    Text(String),
    Detailed(RemoteFindingFields),
    Other(Value),
}

#[derive(Debug, Deserialize)]
struct RemoteFindingFields {
    #[serde(default, rename = "type", alias = "kind", alias = "status")]
    kind: Option<String>,
    #[serde(alias = "message", alias = "description")]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RemoteRecommendation {
    Detailed(RemoteRecommendationFields),
    Text(String),
    Other(Value),
}

#[derive(Debug, Deserialize)]
struct RemoteRecommendationFields {
    #[serde(default)]
    priority: Option<String>,
    #[serde(alias = "text", alias = "title")]
    action: String,
    #[serde(default)]
    impact: Option<String>,
}

impl RemoteFinding {
    fn into_finding(self) -> Option<Finding> {
        let finding = match self {
            RemoteFinding::Text(text) => Finding::warning(text),
            RemoteFinding::Detailed(fields) => Finding {
                kind: fields
                    .kind
                    .as_deref()
                    .map(FindingKind::parse)
                    .unwrap_or(FindingKind::Warning),
                text: fields.text,
            },
            RemoteFinding::Other(_) => return None,
        };
        (!finding.text.trim().is_empty()).then_some(finding)
    }
}

impl RemoteRecommendation {
    fn into_recommendation(self) -> Option<Recommendation> {
        let recommendation = match self {
            RemoteRecommendation::Detailed(fields) => Recommendation {
                priority: fields
                    .priority
                    .as_deref()
                    .map(Priority::parse)
                    .unwrap_or(Priority::Medium),
                action: fields.action,
                impact: fields.impact.unwrap_or_default(),
            },
            RemoteRecommendation::Text(action) => {
                Recommendation::new(Priority::Medium, action, String::new())
            }
            RemoteRecommendation::Other(_) => return None,
        };
        (!recommendation.action.trim().is_empty()).then_some(recommendation)
    }
}

fn score_from_value(value: &Value) -> Option<HealthScore> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches("/100").trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    Some(HealthScore::new(raw.round().max(0.0) as u32))
}

/// Parse one provider response into a tagged `Insight`.
///
/// Gaps are filled from the metrics report: a missing score falls back to
/// the computed health score, an unknown category is derived from the
/// score, and an unknown trend falls back to the PM2.5 trend.
pub fn parse_insight_response(
    text: &str,
    report: &MetricsReport,
    provider_used: &str,
) -> Result<Insight, InsightParseError> {
    let unfenced = strip_code_fences(text);
    let object = extract_json_object(unfenced).ok_or(InsightParseError::NoJsonObject)?;

    let value: Value =
        serde_json::from_str(object).map_err(|e| InsightParseError::Malformed(e.to_string()))?;

    let check = validate_insight_value(&value);
    if !check.valid {
        return Err(InsightParseError::Schema(check.reason.unwrap_or_default()));
    }

    let remote: RemoteInsight =
        serde_json::from_value(value).map_err(|e| InsightParseError::Malformed(e.to_string()))?;

    let score = remote
        .score
        .as_ref()
        .and_then(score_from_value)
        .unwrap_or(report.health_score);
    let category = remote
        .category
        .as_deref()
        .and_then(Category::parse)
        .unwrap_or_else(|| score.category());
    let trend = remote
        .trend
        .as_deref()
        .and_then(parse_trend)
        .unwrap_or_else(|| report.headline_trend());

    let insight = Insight {
        summary: remote.summary.trim().to_string(),
        score: score.value(),
        category,
        findings: remote
            .findings
            .into_iter()
            .filter_map(RemoteFinding::into_finding)
            .collect(),
        recommendations: remote
            .recommendations
            .unwrap_or_default()
            .into_iter()
            .filter_map(RemoteRecommendation::into_recommendation)
            .collect(),
        trend,
        provider_used: provider_used.to_string(),
    };

    let check = validate_insight(&insight);
    if !check.valid {
        return Err(InsightParseError::Schema(check.reason.unwrap_or_default()));
    }

    Ok(insight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::summary::Trend;
    use crate::metrics::{compute_metrics, HealthBreakpoints};
    use crate::models::{Metric, Reading};
    use chrono::Utc;

    fn report() -> MetricsReport {
        let readings = vec![
            Reading::new(Utc::now(), 1).with(Metric::Pm25, 8.0),
            Reading::new(Utc::now(), 2).with(Metric::Pm25, 9.0),
            Reading::new(Utc::now(), 3).with(Metric::Pm25, 10.0),
        ];
        compute_metrics(&readings, &HealthBreakpoints::default())
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_json_object() {
        assert_eq!(
            extract_json_object("Here you go: {\"a\": {\"b\": 1}} thanks"),
            Some("{\"a\": {\"b\": 1}}")
        );
        assert_eq!(extract_json_object("no json"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn test_full_fenced_response() {
        let text = r#"Sure!
```json
{
  "summary": "Air quality is good but PM2.5 is rising.",
  "score": 88,
  "category": "Excellent",
  "findings": [
    {"type": "good", "text": "PM2.5 within WHO guideline"},
    {"type": "warning", "text": "PM2.5 increasing"}
  ],
  "recommendations": [
    {"priority": "low", "action": "Keep monitoring", "impact": "Early warning"}
  ],
  "trend": "increasing"
}
```"#;
        let insight = parse_insight_response(text, &report(), "gemini:key1:flash").unwrap();

        assert_eq!(insight.score, 88);
        assert_eq!(insight.category, Category::Excellent);
        assert_eq!(insight.findings.len(), 2);
        assert_eq!(insight.findings[0].kind, FindingKind::Good);
        assert_eq!(insight.recommendations[0].priority, Priority::Low);
        assert_eq!(insight.trend, Trend::Increasing);
        assert_eq!(insight.provider_used, "gemini:key1:flash");
    }

    #[test]
    fn test_lenient_shapes_and_defaults() {
        let text = r#"{
            "summary": "Mostly fine",
            "findings": ["Humidity unknown", {"status": "positive", "message": "Low PM"}, 42],
            "recommendations": [{"title": "Ventilate", "priority": "HIGH"}, "Check filters"],
            "category": "splendid",
            "trend": "sideways"
        }"#;
        let report = report();
        let insight = parse_insight_response(text, &report, "groq:key1:llama").unwrap();

        assert_eq!(insight.score, report.health_score.value());
        assert_eq!(insight.category, report.health_score.category());
        assert_eq!(insight.trend, report.headline_trend());
        assert_eq!(
            insight.findings,
            vec![Finding::warning("Humidity unknown"), Finding::good("Low PM")]
        );
        assert_eq!(insight.recommendations.len(), 2);
        assert_eq!(insight.recommendations[0].action, "Ventilate");
        assert_eq!(insight.recommendations[0].priority, Priority::High);
        assert_eq!(insight.recommendations[1].priority, Priority::Medium);
    }

    #[test]
    fn test_string_score_is_clamped() {
        let text = r#"{"summary": "x", "findings": [], "score": "140/100"}"#;
        let insight = parse_insight_response(text, &report(), "p:key1:m").unwrap();
        assert_eq!(insight.score, 100);
    }

    #[test]
    fn test_missing_summary_is_schema_error() {
        let err = parse_insight_response(r#"{"findings": []}"#, &report(), "p:key1:m").unwrap_err();
        assert_eq!(err, InsightParseError::Schema("missing summary".to_string()));
    }

    #[test]
    fn test_unparseable_text() {
        assert_eq!(
            parse_insight_response("I cannot help with that.", &report(), "p:key1:m").unwrap_err(),
            InsightParseError::NoJsonObject
        );
        assert!(matches!(
            parse_insight_response("{summary: nope}", &report(), "p:key1:m").unwrap_err(),
            InsightParseError::Malformed(_)
        ));
    }
}
