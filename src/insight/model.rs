//! Insight result types.
//!
//! An `Insight` is built fresh for every analysis request, either from a
//! provider response or by the local fallback analyzer, and both paths
//! produce exactly this shape.

use serde::{Deserialize, Serialize};

use crate::metrics::health::Category;
use crate::metrics::summary::Trend;

/// `provider_used` value for insights synthesized offline.
pub const LOCAL_FALLBACK_PROVIDER: &str = "local-fallback";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    Good,
    Warning,
}

impl FindingKind {
    /// Anything not recognisably positive is treated as a warning.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "good" | "positive" | "ok" | "success" | "info" => FindingKind::Good,
            _ => FindingKind::Warning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub kind: FindingKind,
    pub text: String,
}

impl Finding {
    pub fn good(text: impl Into<String>) -> Self {
        Self {
            kind: FindingKind::Good,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            kind: FindingKind::Warning,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "high" | "critical" | "urgent" => Priority::High,
            "low" | "minor" => Priority::Low,
            _ => Priority::Medium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub action: String,
    pub impact: String,
}

impl Recommendation {
    pub fn new(priority: Priority, action: impl Into<String>, impact: impl Into<String>) -> Self {
        Self {
            priority,
            action: action.into(),
            impact: impact.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub summary: String,
    pub score: u8,
    pub category: Category,
    pub findings: Vec<Finding>,
    pub recommendations: Vec<Recommendation>,
    pub trend: Trend,
    /// `provider:keyN:model`, or `local-fallback`.
    pub provider_used: String,
}

impl Insight {
    pub fn is_fallback(&self) -> bool {
        self.provider_used == LOCAL_FALLBACK_PROVIDER
    }
}

/// Read a trend word as produced by a provider.
pub fn parse_trend(s: &str) -> Option<Trend> {
    match s.trim().to_lowercase().as_str() {
        "increasing" | "rising" | "worsening" | "up" => Some(Trend::Increasing),
        "decreasing" | "falling" | "improving" | "down" => Some(Trend::Decreasing),
        "stable" | "steady" | "flat" => Some(Trend::Stable),
        _ => None,
    }
}
