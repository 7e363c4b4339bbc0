//! Metrics engine.
//!
//! Derives per-metric statistics and the composite health score from
//! canonical readings. Pure and synchronous.

pub mod engine;
pub mod health;
pub mod summary;

pub use engine::*;
pub use health::*;
pub use summary::*;
