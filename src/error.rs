//! Crate error type.
//!
//! Only `EmptySource` is a hard failure of the analysis path. Everything
//! else that can go wrong while mapping fields or calling providers is
//! absorbed and logged; see `orchestrator::outcome` for those outcomes.

use thiserror::Error;

use crate::models::SourceKind;

#[derive(Debug, Error)]
pub enum CoreError {
    /// The source produced no rows to normalize.
    #[error("source {kind} produced no rows")]
    EmptySource { kind: SourceKind },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The caller cancelled the analysis request.
    #[error("analysis cancelled")]
    Cancelled,

    #[error("source fetch failed: {0}")]
    Fetch(String),

    #[error("source payload could not be decoded: {0}")]
    PayloadDecode(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
