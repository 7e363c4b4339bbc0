//! Pipeline context management.
//!
//! Provides the per-request context used for logging and timestamp
//! synthesis.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::logging::structured::LogContext;
use crate::models::SourceKind;

/// Context for one analysis request.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub request_id: String,
    /// Reference "now" for synthesized timestamps.
    pub received_at: DateTime<Utc>,
}

impl AnalysisContext {
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Context with a fixed reference time.
    pub fn at(received_at: DateTime<Utc>) -> Self {
        Self {
            request_id: format!("req-{}", &Uuid::new_v4().simple().to_string()[..8]),
            received_at,
        }
    }

    pub fn log_context(&self) -> LogContext {
        LogContext::new(&self.request_id)
    }

    pub fn source_log_context(&self, kind: SourceKind) -> LogContext {
        self.log_context().with_source(kind.as_str())
    }
}

impl Default for AnalysisContext {
    fn default() -> Self {
        Self::new()
    }
}
