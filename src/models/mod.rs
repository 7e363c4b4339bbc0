//! Canonical data model.
//!
//! These are the plain, serializable structures every source is reconciled
//! into. UI and export layers consume them as-is.

pub mod reading;

pub use reading::*;
