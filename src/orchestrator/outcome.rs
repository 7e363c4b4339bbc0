//! Attempt outcomes.

use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use super::transport::TransportError;

lazy_static! {
    /// Rate-limit-shaped provider messages
    static ref RATE_LIMIT_PATTERN: Regex = Regex::new(
        r"(?i)quota|rate[ _-]?limit|resource_exhausted|too many requests"
    ).unwrap();
}

/// Result of one candidate attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    /// HTTP 429 or a rate-limit message. Skips the credential's other models.
    QuotaExceeded,
    /// Any other transport failure, including timeouts. Advances one model.
    TransientError,
    /// Reply arrived but did not parse or validate.
    InvalidResponse,
}

impl AttemptOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Success => "success",
            AttemptOutcome::QuotaExceeded => "quota_exceeded",
            AttemptOutcome::TransientError => "transient_error",
            AttemptOutcome::InvalidResponse => "invalid_response",
        }
    }
}

/// Record of one attempt, kept for logging and tests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderAttempt {
    pub candidate: String,
    pub outcome: AttemptOutcome,
    pub elapsed: Duration,
    pub detail: Option<String>,
}

pub fn is_rate_limit_message(message: &str) -> bool {
    RATE_LIMIT_PATTERN.is_match(message)
}

pub fn classify_transport_error(error: &TransportError) -> AttemptOutcome {
    match error {
        TransportError::Status { status: 429, .. } => AttemptOutcome::QuotaExceeded,
        TransportError::Status { body, .. } if is_rate_limit_message(body) => {
            AttemptOutcome::QuotaExceeded
        }
        TransportError::Network(message) if is_rate_limit_message(message) => {
            AttemptOutcome::QuotaExceeded
        }
        TransportError::MalformedBody(_) => AttemptOutcome::InvalidResponse,
        _ => AttemptOutcome::TransientError,
    }
}
