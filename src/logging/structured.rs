//! Structured logging utilities.
//!
//! Provides context-aware logging with request_id, source and the current
//! provider candidate included in every log message.

use std::fmt;

/// Logging context for one analysis request.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub request_id: String,
    pub source: Option<String>,
    pub candidate: Option<String>,
}

impl LogContext {
    pub fn new(request_id: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            source: None,
            candidate: None,
        }
    }

    pub fn with_source(&self, source: &str) -> Self {
        Self {
            source: Some(source.to_string()),
            ..self.clone()
        }
    }

    pub fn with_candidate(&self, candidate: &str) -> Self {
        Self {
            candidate: Some(candidate.to_string()),
            ..self.clone()
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[request={}]", self.request_id)?;
        if let Some(source) = &self.source {
            write!(f, " [source={}]", source)?;
        }
        if let Some(candidate) = &self.candidate {
            write!(f, " [candidate={}]", candidate)?;
        }
        Ok(())
    }
}

/// Log an info message with context.
#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        log::info!(
            concat!("{} {}", $(" ", stringify!($key), "={:?}"),*),
            $ctx,
            $event,
            $($value),*
        );
    };
}

/// Log a warning message with context.
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        log::warn!(
            concat!("{} {}", $(" ", stringify!($key), "={:?}"),*),
            $ctx,
            $event,
            $($value),*
        );
    };
}

/// Log a debug message with context.
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        log::debug!(
            concat!("{} {}", $(" ", stringify!($key), "={:?}"),*),
            $ctx,
            $event,
            $($value),*
        );
    };
}
