//! Consistency retrier
//!
//! Newly created cloud resources are not always visible to describe calls
//! right away. Transient failures are retried with backoff; permanent ones
//! end the loop after a single attempt.

use tracing::{debug, info, warn};

use super::config::RetryPolicy;
use super::signal::{StopReason, StopSignal};
use crate::error::FetchError;
use crate::fetch::DescriptorFetcher;
use crate::models::document::Document;
use crate::models::identity::ResourceIdentity;

/// Final fetch result and how many attempts it took
#[derive(Debug)]
pub struct RetryOutcome {
    pub result: Result<Document, FetchError>,
    pub attempts: u32,
    /// Set when a retry was still due but the run stopped during backoff;
    /// `result` then holds the last transient error.
    pub interrupted: Option<StopReason>,
}

/// Whether a failed attempt should be followed by another.
///
/// Only transient failures are retried, and only while attempts remain.
pub fn should_retry(error: &FetchError, attempt: u32, max_attempts: u32) -> bool {
    attempt < max_attempts && error.is_transient()
}

/// Fetch `identity`, retrying transient failures per `policy`.
///
/// Backoff sleeps end early when `stop` fires; the outcome then carries the
/// stop reason alongside the last error.
pub fn fetch_with_retry(
    fetcher: &dyn DescriptorFetcher,
    identity: &ResourceIdentity,
    policy: &RetryPolicy,
    stop: &StopSignal,
) -> RetryOutcome {
    let max_attempts = policy.attempts();
    let mut attempt = 0;

    loop {
        attempt += 1;
        debug!(%identity, attempt, max_attempts, "describing resource");

        let error = match fetcher.fetch(identity) {
            Ok(doc) => {
                return RetryOutcome {
                    result: Ok(doc),
                    attempts: attempt,
                    interrupted: None,
                }
            }
            Err(error) => error,
        };

        if !should_retry(&error, attempt, max_attempts) {
            if error.is_transient() {
                warn!(%identity, attempts = attempt, kind = %error.kind, "retries exhausted");
            } else {
                debug!(%identity, kind = %error.kind, "permanent failure, not retrying");
            }
            return RetryOutcome {
                result: Err(error),
                attempts: attempt,
                interrupted: None,
            };
        }

        let delay = policy.backoff.delay(attempt);
        info!(
            %identity,
            attempt,
            kind = %error.kind,
            delay_ms = delay.as_millis() as u64,
            "transient failure, retrying"
        );

        if let Err(reason) = stop.sleep(delay) {
            warn!(%identity, attempts = attempt, ?reason, "run interrupted during backoff");
            return RetryOutcome {
                result: Err(error),
                attempts: attempt,
                interrupted: Some(reason),
            };
        }
    }
}
