//! Pipeline orchestration module.
//!
//! Analysis pipeline that coordinates:
//! - Source reduction
//! - Field mapping
//! - Normalization
//! - Metrics
//! - Insight generation

pub mod analysis;
pub mod context;

pub use analysis::*;
pub use context::*;
