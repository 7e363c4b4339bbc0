//! Sequential candidate state machine.
//!
//! Candidates are attempted strictly one at a time. The first success ends
//! the run; a quota outcome retires the candidate's credential so its
//! remaining models are skipped; every other failure moves on to the next
//! candidate. When the list runs out the local analyzer produces the
//! insight, so a run only fails when it is cancelled.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use super::candidates::{enumerate_candidates, Candidate, OrchestratorConfig};
use super::outcome::{classify_transport_error, AttemptOutcome, ProviderAttempt};
use super::transport::{AttemptRequest, InsightTransport};
use crate::error::{CoreError, CoreResult};
use crate::insight::{analyze_locally, build_prompt, parse_insight_response, Insight, InsightContext};
use crate::logging::LogContext;
use crate::metrics::MetricsReport;
use crate::{log_debug, log_info, log_warn};

const MAX_LOGGED_DETAIL: usize = 200;

/// Insight plus the attempt trail that produced it.
#[derive(Debug, Clone)]
pub struct OrchestrationRun {
    pub insight: Insight,
    pub attempts: Vec<ProviderAttempt>,
}

pub struct InsightOrchestrator<T: InsightTransport> {
    transport: T,
    candidates: Vec<Candidate>,
    attempt_timeout: Duration,
}

impl<T: InsightTransport> InsightOrchestrator<T> {
    pub fn new(config: &OrchestratorConfig, transport: T) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            transport,
            candidates: enumerate_candidates(config),
            attempt_timeout: Duration::from_secs(config.attempt_timeout_secs),
        })
    }

    /// Override the per-attempt timeout.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Produce an insight for `report`.
    ///
    /// Returns `CoreError::Cancelled` if `cancel` fires; otherwise always
    /// returns a complete insight.
    pub async fn analyze(
        &self,
        report: &MetricsReport,
        context: &InsightContext,
        ctx: &LogContext,
        cancel: &CancellationToken,
    ) -> CoreResult<Insight> {
        self.run(report, context, ctx, cancel)
            .await
            .map(|run| run.insight)
    }

    /// Like `analyze`, also returning every attempt made.
    pub async fn run(
        &self,
        report: &MetricsReport,
        context: &InsightContext,
        ctx: &LogContext,
        cancel: &CancellationToken,
    ) -> CoreResult<OrchestrationRun> {
        if cancel.is_cancelled() {
            log_warn!(ctx, "ANALYSIS_CANCELLED", attempts = 0usize);
            return Err(CoreError::Cancelled);
        }

        let prompt = build_prompt(report, context);
        let mut exhausted: HashSet<(String, usize)> = HashSet::new();
        let mut attempts: Vec<ProviderAttempt> = Vec::new();

        log_info!(
            ctx,
            "ORCHESTRATION_START",
            candidates = self.candidates.len(),
            timeout_secs = self.attempt_timeout.as_secs()
        );

        for candidate in &self.candidates {
            let label = candidate.label();
            let attempt_ctx = ctx.with_candidate(&label);

            if exhausted.contains(&candidate.credential_key()) {
                log_debug!(attempt_ctx, "ATTEMPT_SKIPPED", reason = "credential_quota_exhausted");
                continue;
            }

            log_debug!(attempt_ctx, "ATTEMPT_START", model = candidate.model);
            let started = Instant::now();
            let request = AttemptRequest {
                candidate,
                prompt: &prompt,
            };

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    log_warn!(attempt_ctx, "ANALYSIS_CANCELLED", attempts = attempts.len());
                    return Err(CoreError::Cancelled);
                }
                result = tokio::time::timeout(self.attempt_timeout, self.transport.attempt(request)) => result,
            };
            let elapsed = started.elapsed();

            let (outcome, detail) = match result {
                Ok(Ok(text)) => match parse_insight_response(&text, report, &label) {
                    Ok(insight) => {
                        attempts.push(ProviderAttempt {
                            candidate: label,
                            outcome: AttemptOutcome::Success,
                            elapsed,
                            detail: None,
                        });
                        log_info!(
                            attempt_ctx,
                            "ATTEMPT_SUCCEEDED",
                            attempt = attempts.len(),
                            elapsed_ms = elapsed.as_millis()
                        );
                        return Ok(OrchestrationRun { insight, attempts });
                    }
                    Err(e) => (AttemptOutcome::InvalidResponse, e.to_string()),
                },
                Ok(Err(e)) => (classify_transport_error(&e), e.to_string()),
                Err(_) => (AttemptOutcome::TransientError, "attempt timed out".to_string()),
            };

            if outcome == AttemptOutcome::QuotaExceeded {
                exhausted.insert(candidate.credential_key());
            }

            log_warn!(
                attempt_ctx,
                "ATTEMPT_FAILED",
                outcome = outcome.as_str(),
                elapsed_ms = elapsed.as_millis(),
                detail = truncate(&detail, MAX_LOGGED_DETAIL)
            );

            attempts.push(ProviderAttempt {
                candidate: label,
                outcome,
                elapsed,
                detail: Some(detail),
            });
        }

        log_warn!(ctx, "ALL_PROVIDERS_EXHAUSTED", attempts = attempts.len());

        Ok(OrchestrationRun {
            insight: analyze_locally(report, context),
            attempts,
        })
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
