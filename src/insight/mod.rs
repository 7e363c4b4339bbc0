//! Insight model, prompt, response parsing and local fallback.

pub mod fallback;
pub mod model;
pub mod parse;
pub mod prompt;
pub mod schema;

pub use fallback::*;
pub use model::*;
pub use parse::*;
pub use prompt::*;
pub use schema::*;
