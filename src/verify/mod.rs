//! Verification runs
//!
//! A run takes a list of [`VerificationCase`]s, fetches each case's live
//! descriptor through a [`DescriptorFetcher`](crate::fetch::DescriptorFetcher),
//! evaluates every expectation and aggregates the outcome into a
//! [`RunReport`].
//!
//! # Retries
//!
//! Descriptor reads are eventually consistent, so transient failures
//! (not-found, rate limiting, unavailability, command timeouts) are retried
//! with backoff up to [`RetryPolicy::max_attempts`]. Permanent failures are
//! reported after the first attempt.
//!
//! [`VerificationCase`]: crate::models::VerificationCase

mod config;
mod report;
mod result;
mod retry;
mod runner;
mod signal;


pub use config::{
    Backoff, RetryPolicy, RunConfig, DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_MAX,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_PARALLEL,
};
pub use report::{render_json, render_text};
pub use result::{CaseOutcome, CaseResult, RunReport};
pub use retry::{fetch_with_retry, should_retry, RetryOutcome};
pub use runner::{run, verify_case, Verifier};
pub use signal::{CancelFlag, StopReason, StopSignal};
