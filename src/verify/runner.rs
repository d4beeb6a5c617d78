//! Verification run
//!
//! Cases are verified concurrently by a bounded pool of worker threads. The
//! collector waits for results until every case resolves, the run deadline
//! expires, or the run is cancelled; whatever is still outstanding at that
//! point is reported as timed out or cancelled. Results always come back in
//! input order, one per case.

use chrono::Utc;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use super::config::{RetryPolicy, RunConfig};
use super::result::{CaseOutcome, CaseResult, RunReport};
use super::retry::{fetch_with_retry, RetryOutcome};
use super::signal::{CancelFlag, StopReason, StopSignal};
use crate::error::{FetchError, FetchErrorKind, RunTimeout};
use crate::fetch::DescriptorFetcher;
use crate::models::case::VerificationCase;

/// How often the collector wakes to check for cancellation
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Runs verification cases against a descriptor fetcher.
pub struct Verifier {
    fetcher: Arc<dyn DescriptorFetcher>,
    config: RunConfig,
    cancel: CancelFlag,
}

impl Verifier {
    pub fn new(fetcher: Arc<dyn DescriptorFetcher>, config: RunConfig) -> Self {
        Self {
            fetcher,
            config,
            cancel: CancelFlag::new(),
        }
    }

    /// Use an externally owned cancel flag (e.g. one set by a signal handler)
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Verify every case and aggregate the results.
    ///
    /// A failing case never prevents its siblings from being verified.
    pub fn run(&self, cases: &[VerificationCase]) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();
        let span = info_span!("run", %run_id, cases = cases.len());
        let _enter = span.enter();

        let stop = StopSignal::new(self.config.deadline, self.cancel.clone());
        let cases: Arc<Vec<VerificationCase>> = Arc::new(cases.to_vec());
        let total = cases.len();

        let queue = Arc::new(Mutex::new((0..total).collect::<VecDeque<usize>>()));
        let (tx, rx) = mpsc::channel::<(usize, CaseResult)>();
        let worker_count = self.config.max_parallel.max(1).min(total);
        info!(workers = worker_count, "starting verification run");

        let mut handles = Vec::with_capacity(worker_count);
        for worker in 0..worker_count {
            let cases = Arc::clone(&cases);
            let queue = Arc::clone(&queue);
            let fetcher = Arc::clone(&self.fetcher);
            let tx = tx.clone();
            let retry = self.config.retry;
            let stop = stop.clone();

            let spawned = thread::Builder::new()
                .name(format!("verify-worker-{worker}"))
                .spawn(move || {
                    while let Some(idx) = next_case(&queue) {
                        if stop.should_stop() {
                            break;
                        }
                        let result = verify_case_guarded(fetcher.as_ref(), &cases[idx], &retry, &stop);
                        if tx.send((idx, result)).is_err() {
                            break;
                        }
                    }
                });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => warn!(worker, error = %e, "failed to spawn verification worker"),
            }
        }
        drop(tx);

        let mut slots: Vec<Option<CaseResult>> = vec![None; total];
        let mut resolved = 0;

        let stop_reason = loop {
            if resolved == total {
                break None;
            }
            if let Some(reason) = stop.reason() {
                break Some(reason);
            }
            let wait = stop
                .remaining()
                .map_or(POLL_INTERVAL, |remaining| remaining.min(POLL_INTERVAL));
            match rx.recv_timeout(wait) {
                Ok((idx, result)) => {
                    if slots[idx].replace(result).is_none() {
                        resolved += 1;
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break None,
            }
        };

        // Keep results that were already delivered when the run stopped
        while let Ok((idx, result)) = rx.try_recv() {
            if slots[idx].replace(result).is_none() {
                resolved += 1;
            }
        }

        match stop_reason {
            None => {
                for handle in handles {
                    if handle.join().is_err() {
                        warn!("verification worker panicked");
                    }
                }
            }
            Some(reason) => {
                // Workers still inside a fetch are left to finish on their own;
                // they see the stop signal before taking another case.
                warn!(
                    ?reason,
                    unresolved = total - resolved,
                    "verification run stopped early"
                );
            }
        }

        let results = slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| match slot {
                Some(result) => result,
                None => self.unresolved_result(&cases[idx], stop_reason, &stop),
            })
            .collect();

        let report = RunReport {
            run_id,
            started_at,
            elapsed: start.elapsed(),
            results,
        };
        info!(
            passed = report.passed(),
            failed = report.failed_count(),
            "verification run finished"
        );
        report
    }

    fn unresolved_result(
        &self,
        case: &VerificationCase,
        reason: Option<StopReason>,
        stop: &StopSignal,
    ) -> CaseResult {
        let outcome = match reason {
            Some(StopReason::DeadlineExpired) => CaseOutcome::TimedOut {
                error: RunTimeout {
                    deadline: self.config.deadline.unwrap_or_default(),
                },
            },
            Some(StopReason::Cancelled) => CaseOutcome::Cancelled,
            None => {
                // No worker delivered this case; verify it on the calling thread
                debug!(case = %case.label, "verifying case inline");
                return verify_case_guarded(self.fetcher.as_ref(), case, &self.config.retry, stop);
            }
        };
        CaseResult {
            label: case.label.clone(),
            identity: case.identity.clone(),
            attempts: 0,
            outcome,
        }
    }
}

/// Verify `cases` with a fresh [`Verifier`].
pub fn run(
    cases: &[VerificationCase],
    fetcher: Arc<dyn DescriptorFetcher>,
    config: RunConfig,
) -> RunReport {
    Verifier::new(fetcher, config).run(cases)
}

fn next_case(queue: &Mutex<VecDeque<usize>>) -> Option<usize> {
    let mut queue = queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    queue.pop_front()
}

/// Fetch the case's descriptor (with retries) and evaluate every expectation.
///
/// Expectations are never short-circuited: a mismatch on one does not skip
/// the rest.
pub fn verify_case(
    fetcher: &dyn DescriptorFetcher,
    case: &VerificationCase,
    policy: &RetryPolicy,
    stop: &StopSignal,
) -> CaseResult {
    let span = info_span!("case", label = %case.label, identity = %case.identity);
    let _enter = span.enter();

    let RetryOutcome {
        result,
        attempts,
        interrupted,
    } = fetch_with_retry(fetcher, &case.identity, policy, stop);

    let outcome = match (result, interrupted) {
        (Ok(document), _) => {
            let checks: Vec<_> = case
                .expectations
                .iter()
                .map(|expectation| expectation.evaluate(&document))
                .collect();
            let mismatches = checks.iter().filter(|c| !c.matched).count();
            if mismatches == 0 {
                info!(checks = checks.len(), "case passed");
            } else {
                warn!(checks = checks.len(), mismatches, "case failed");
            }
            CaseOutcome::Checked { document, checks }
        }
        (Err(error), Some(StopReason::DeadlineExpired)) => {
            warn!(attempts, kind = %error.kind, "deadline expired while retrying");
            CaseOutcome::TimedOut {
                error: RunTimeout {
                    deadline: stop.deadline().unwrap_or_default(),
                },
            }
        }
        (Err(error), Some(StopReason::Cancelled)) => {
            warn!(attempts, kind = %error.kind, "run cancelled while retrying");
            CaseOutcome::Cancelled
        }
        (Err(error), None) => {
            warn!(attempts, kind = %error.kind, cause = %error.cause, "fetch failed");
            CaseOutcome::FetchFailed { error }
        }
    };

    CaseResult {
        label: case.label.clone(),
        identity: case.identity.clone(),
        attempts,
        outcome,
    }
}

/// [`verify_case`], with a panicking fetcher reported as a fetch failure.
fn verify_case_guarded(
    fetcher: &dyn DescriptorFetcher,
    case: &VerificationCase,
    policy: &RetryPolicy,
    stop: &StopSignal,
) -> CaseResult {
    match panic::catch_unwind(AssertUnwindSafe(|| verify_case(fetcher, case, policy, stop))) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            warn!(case = %case.label, %message, "fetcher panicked");
            CaseResult {
                label: case.label.clone(),
                identity: case.identity.clone(),
                attempts: 1,
                outcome: CaseOutcome::FetchFailed {
                    error: FetchError::new(
                        &case.identity,
                        FetchErrorKind::Internal,
                        format!("fetcher panicked: {message}"),
                    ),
                },
            }
        }
    }
}
