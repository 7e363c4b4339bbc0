//! Insight schema validation.
//!
//! One validator for both the provider path and the local fallback path.
//! A provider payload must at minimum carry a non-empty `summary` and a
//! `findings` list; a finished `Insight` must additionally have a score in
//! range and a provider tag.

use serde_json::Value;

use super::model::Insight;

/// Schema validation result.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightValidationResult {
    pub valid: bool,
    pub reason: Option<String>,
}

impl InsightValidationResult {
    pub fn valid() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn invalid(reason: &str) -> Self {
        Self {
            valid: false,
            reason: Some(reason.to_string()),
        }
    }
}

/// Validate an insight-shaped JSON value.
pub fn validate_insight_value(value: &Value) -> InsightValidationResult {
    let Some(obj) = value.as_object() else {
        return InsightValidationResult::invalid("insight is not a JSON object");
    };

    match obj.get("summary") {
        Some(Value::String(s)) if !s.trim().is_empty() => {}
        Some(Value::String(_)) => return InsightValidationResult::invalid("summary is empty"),
        Some(_) => return InsightValidationResult::invalid("summary is not a string"),
        None => return InsightValidationResult::invalid("missing summary"),
    }

    match obj.get("findings") {
        Some(Value::Array(_)) => {}
        Some(_) => return InsightValidationResult::invalid("findings is not a list"),
        None => return InsightValidationResult::invalid("missing findings"),
    }

    if let Some(recommendations) = obj.get("recommendations") {
        if !recommendations.is_array() && !recommendations.is_null() {
            return InsightValidationResult::invalid("recommendations is not a list");
        }
    }

    InsightValidationResult::valid()
}

/// Validate a finished insight against the same schema as provider payloads.
pub fn validate_insight(insight: &Insight) -> InsightValidationResult {
    let value = match serde_json::to_value(insight) {
        Ok(v) => v,
        Err(e) => return InsightValidationResult::invalid(&format!("not serializable: {}", e)),
    };

    let result = validate_insight_value(&value);
    if !result.valid {
        return result;
    }

    if insight.score > 100 {
        return InsightValidationResult::invalid("score out of range");
    }
    if insight.provider_used.trim().is_empty() {
        return InsightValidationResult::invalid("missing provider tag");
    }
    if insight.findings.iter().any(|f| f.text.trim().is_empty()) {
        return InsightValidationResult::invalid("finding without text");
    }
    if insight
        .recommendations
        .iter()
        .any(|r| r.action.trim().is_empty())
    {
        return InsightValidationResult::invalid("recommendation without action");
    }

    InsightValidationResult::valid()
}
