//! Analysis pipeline.
//!
//! Coordinates one analysis request end to end:
//! 1. Source payload reduced to rows + field descriptors
//! 2. Field mapping (lexicon, then positional guesses)
//! 3. Normalization into ordered canonical readings
//! 4. Metrics and health score
//! 5. Insight via provider orchestration, or the local fallback
//!
//! Only an empty source fails the request; every other problem degrades to
//! a best-effort result.

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::CoreConfig;
use crate::error::CoreResult;
use crate::extraction::field_mapping::{resolve_field_mapping, FieldMapping};
use crate::extraction::normalizer::{normalize_rows, NormalizerConfig};
use crate::insight::{Insight, InsightContext};
use crate::log_info;
use crate::metrics::{compute_metrics, MetricsReport};
use crate::models::{Reading, SourceKind};
use crate::orchestrator::{InsightOrchestrator, InsightTransport};
use crate::sources::SourcePayload;

use super::context::AnalysisContext;

/// A source after mapping and normalization.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestedSource {
    pub kind: SourceKind,
    pub name: String,
    pub mapping: FieldMapping,
    pub readings: Vec<Reading>,
}

/// Outbound bundle for presentation and export layers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub request_id: String,
    pub source: SourceKind,
    pub source_name: String,
    pub mapping: FieldMapping,
    pub readings: Vec<Reading>,
    pub metrics: MetricsReport,
    pub insight: Insight,
}

/// Map and normalize one source payload.
pub fn ingest(
    ctx: &AnalysisContext,
    payload: SourcePayload,
    config: &NormalizerConfig,
) -> CoreResult<IngestedSource> {
    let source = payload.into_source_rows();
    let log_ctx = ctx.source_log_context(source.kind);

    let mapping = resolve_field_mapping(&source.fields, &log_ctx);
    let readings = normalize_rows(
        &source.rows,
        &mapping,
        source.kind,
        ctx.received_at,
        config,
        &log_ctx,
    )?;

    log_info!(
        log_ctx,
        "SOURCE_INGESTED",
        name = source.name,
        readings = readings.len(),
        guessed = mapping.guessed().len()
    );

    Ok(IngestedSource {
        kind: source.kind,
        name: source.name,
        mapping,
        readings,
    })
}

/// Run the full pipeline for one payload.
pub async fn run_analysis<T: InsightTransport>(
    ctx: &AnalysisContext,
    payload: SourcePayload,
    config: &CoreConfig,
    orchestrator: &InsightOrchestrator<T>,
    cancel: &CancellationToken,
) -> CoreResult<AnalysisReport> {
    let ingested = ingest(ctx, payload, &config.normalizer)?;
    let log_ctx = ctx.source_log_context(ingested.kind);

    let metrics = compute_metrics(&ingested.readings, &config.health);
    log_info!(
        log_ctx,
        "METRICS_COMPUTED",
        samples = metrics.sample_count,
        health_score = metrics.health_score.value(),
        trend = metrics.headline_trend().as_str()
    );

    let context = InsightContext::new(ingested.name.clone(), metrics.sample_count);
    let insight = orchestrator
        .analyze(&metrics, &context, &log_ctx, cancel)
        .await?;

    log_info!(
        log_ctx,
        "ANALYSIS_COMPLETE",
        provider = insight.provider_used,
        score = insight.score
    );

    Ok(AnalysisReport {
        request_id: ctx.request_id.clone(),
        source: ingested.kind,
        source_name: ingested.name,
        mapping: ingested.mapping,
        readings: ingested.readings,
        metrics,
        insight,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::sources::SpreadsheetGrid;

    fn grid(records: &[&[&str]]) -> SpreadsheetGrid {
        SpreadsheetGrid::from_records(
            records
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_ingest_spreadsheet() {
        let payload = SourcePayload::Spreadsheet {
            name: "upload.csv".to_string(),
            grid: grid(&[
                &["Time", "PM2.5", "Humidity %"],
                &["2026-01-29 10:01:00", "9", "41"],
                &["2026-01-29 10:00:00", "8", "40"],
            ]),
        };
        let ingested = ingest(&AnalysisContext::new(), payload, &NormalizerConfig::default()).unwrap();

        assert_eq!(ingested.readings.len(), 2);
        assert_eq!(ingested.readings[0].pm25, Some(8.0));
        assert_eq!(ingested.readings[1].entry_id, 2);
        assert!(ingested.mapping.guessed().is_empty());
    }

    #[test]
    fn test_ingest_empty_source_fails() {
        let payload = SourcePayload::Spreadsheet {
            name: "empty.csv".to_string(),
            grid: grid(&[&["PM2.5"]]),
        };
        let err = ingest(&AnalysisContext::new(), payload, &NormalizerConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::EmptySource {
                kind: SourceKind::Spreadsheet
            }
        ));
    }
}
