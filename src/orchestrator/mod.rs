//! Provider orchestration.
//!
//! Enumerates `(provider, credential, model)` candidates, attempts them in
//! order through an `InsightTransport`, and falls back to the local
//! analyzer when none succeeds.

pub mod candidates;
pub mod engine;
pub mod outcome;
pub mod transport;

pub use candidates::*;
pub use engine::*;
pub use outcome::*;
pub use transport::*;
