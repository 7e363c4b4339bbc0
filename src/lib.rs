//! AirSense Core - sensor reconciliation, health metrics and resilient insights
//!
//! This crate turns heterogeneous environmental sensor sources into one
//! canonical reading sequence, derives per-metric statistics and a health
//! score, and produces an analytical insight through a sequential chain of
//! AI provider candidates with a deterministic offline fallback. The
//! implementation prioritizes:
//!
//! 1. **Availability** - Only an empty source fails a request; everything
//!    else degrades to a best-effort result
//! 2. **Logging** - Every decision point logged with request context
//! 3. **Determinism** - Mapping, normalization, metrics and the fallback
//!    analyzer are pure functions
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `pipeline` - Request context and the end-to-end analysis flow
//! - `sources` - Telemetry, public air-quality and spreadsheet adapters
//! - `extraction` - Field mapping resolution and row normalization
//! - `metrics` - Per-metric summaries, trend and health score
//! - `insight` - Insight model, prompt, response parsing, local fallback
//! - `orchestrator` - Provider candidates, transport seam, attempt loop
//! - `config` - JSON configuration with validation
//! - `logging` - Structured logging with request context

pub mod config;
pub mod error;
pub mod extraction;
pub mod insight;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod orchestrator;
pub mod pipeline;
pub mod sources;

pub use config::{load_config, CoreConfig};
pub use error::{CoreError, CoreResult};
pub use insight::{Insight, InsightContext};
pub use metrics::{compute_metrics, HealthScore, MetricSummary, MetricsReport, Trend};
pub use models::{Metric, Reading, SourceKind};
pub use orchestrator::{HttpTransport, InsightOrchestrator, InsightTransport};
pub use pipeline::{ingest, run_analysis, AnalysisContext, AnalysisReport};
pub use sources::SourcePayload;

/// Initialize the process logger.
///
/// Safe to call more than once; only the first call installs a logger.
/// `RUST_LOG` overrides the default info level.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
