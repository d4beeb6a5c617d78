//! Result types for verification runs

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{FetchError, RunTimeout};
use crate::models::document::Document;
use crate::models::expectation::ExpectationResult;
use crate::models::identity::ResourceIdentity;

/// How a case ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaseOutcome {
    /// The descriptor was fetched and every expectation evaluated
    Checked {
        #[serde(skip)]
        document: Document,
        checks: Vec<ExpectationResult>,
    },
    /// The descriptor could not be fetched; no expectation was evaluated
    FetchFailed { error: FetchError },
    /// The run deadline expired before the case resolved
    TimedOut { error: RunTimeout },
    /// The run was cancelled before the case resolved
    Cancelled,
}

/// Result of verifying one case
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseResult {
    pub label: String,
    pub identity: ResourceIdentity,
    /// Fetch attempts made; 0 when the case never started
    pub attempts: u32,
    #[serde(flatten)]
    pub outcome: CaseOutcome,
}

impl CaseResult {
    /// Fetched, and every expectation matched
    pub fn passed(&self) -> bool {
        match &self.outcome {
            CaseOutcome::Checked { checks, .. } => checks.iter().all(|c| c.matched),
            _ => false,
        }
    }

    pub fn checks(&self) -> &[ExpectationResult] {
        match &self.outcome {
            CaseOutcome::Checked { checks, .. } => checks,
            _ => &[],
        }
    }

    pub fn mismatches(&self) -> impl Iterator<Item = &ExpectationResult> {
        self.checks().iter().filter(|c| !c.matched)
    }

    pub fn fetch_error(&self) -> Option<&FetchError> {
        match &self.outcome {
            CaseOutcome::FetchFailed { error } => Some(error),
            _ => None,
        }
    }

    /// Why the case never got to evaluate its expectations
    pub fn failure_cause(&self) -> Option<String> {
        match &self.outcome {
            CaseOutcome::Checked { .. } => None,
            CaseOutcome::FetchFailed { error } => Some(format!(
                "fetch failed after {} attempt(s): {error}",
                self.attempts
            )),
            CaseOutcome::TimedOut { error } => Some(error.to_string()),
            CaseOutcome::Cancelled => Some("run cancelled before the case resolved".to_string()),
        }
    }

    /// One diagnostic line per problem: case label, expectation label,
    /// expected matcher and actual value (or the failure cause).
    pub fn diagnostics(&self) -> Vec<String> {
        if let Some(cause) = self.failure_cause() {
            return vec![format!("[{}] {cause}", self.label)];
        }
        self.mismatches()
            .map(|check| {
                format!(
                    "[{}] {}: expected {} {}, actual {}",
                    self.label,
                    check.expectation.label,
                    check.expectation.path,
                    check.expectation.matcher,
                    check.actual_display()
                )
            })
            .collect()
    }
}

/// Aggregated result of a verification run; results keep input order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub results: Vec<CaseResult>,
}

impl RunReport {
    /// True iff every case fetched successfully and matched every expectation
    pub fn passed(&self) -> bool {
        self.results.iter().all(CaseResult::passed)
    }

    pub fn results(&self) -> &[CaseResult] {
        &self.results
    }

    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.passed_count()
    }

    pub fn mismatch_count(&self) -> usize {
        self.results.iter().map(|r| r.mismatches().count()).sum()
    }

    pub fn fetch_failure_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, CaseOutcome::FetchFailed { .. }))
            .count()
    }

    /// Cases left unresolved by a deadline or cancellation
    pub fn unresolved_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| {
                matches!(
                    r.outcome,
                    CaseOutcome::TimedOut { .. } | CaseOutcome::Cancelled
                )
            })
            .count()
    }

    pub fn diagnostics(&self) -> Vec<String> {
        self.results.iter().flat_map(CaseResult::diagnostics).collect()
    }

    pub fn summary(&self) -> String {
        let status = if self.passed() { "PASSED" } else { "FAILED" };
        format!(
            "{status} - {}/{} cases passed, {} mismatch(es), {} fetch failure(s), {} unresolved ({}ms)",
            self.passed_count(),
            self.results.len(),
            self.mismatch_count(),
            self.fetch_failure_count(),
            self.unresolved_count(),
            self.elapsed.as_millis()
        )
    }
}
