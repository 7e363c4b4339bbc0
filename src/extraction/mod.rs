//! Field extraction module.
//!
//! Resolves which source field holds which canonical metric and normalizes
//! raw rows into canonical readings.

pub mod field_mapping;
pub mod json_path;
pub mod normalizer;

pub use field_mapping::*;
pub use json_path::*;
pub use normalizer::*;
