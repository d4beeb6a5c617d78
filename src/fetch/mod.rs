//! Descriptor fetching
//!
//! A [`DescriptorFetcher`] turns a [`ResourceIdentity`] into a parsed
//! [`Document`]. The command-backed fetcher shells out to the descriptor
//! program (gcloud by default) and is read-only; the fixture fetcher answers
//! from documents loaded up front.
//!
//! # Error classification
//!
//! Every failure carries a [`FetchErrorKind`] whose class decides whether
//! the consistency retrier tries again. Newly created resources frequently
//! report `NOT_FOUND` for a while, so not-found is transient.

mod classify;
mod command;
mod executor;
mod fixture;
mod query;

pub use classify::classify_failure;
pub use command::{CommandFetcher, CommandFetcherConfig, DEFAULT_COMMAND_TIMEOUT};
pub use executor::{run_command, CommandOutput};
pub use fixture::FixtureFetcher;
pub use query::{QueryCatalog, QueryError};

use serde_json::Value;

use crate::error::{FetchError, FetchErrorKind};
use crate::models::document::{Document, DocumentFormat};
use crate::models::identity::ResourceIdentity;

/// Source of live resource descriptions.
///
/// Implementations are shared across worker threads.
pub trait DescriptorFetcher: Send + Sync {
    fn fetch(&self, identity: &ResourceIdentity) -> Result<Document, FetchError>;
}

impl<F> DescriptorFetcher for F
where
    F: Fn(&ResourceIdentity) -> Result<Document, FetchError> + Send + Sync,
{
    fn fetch(&self, identity: &ResourceIdentity) -> Result<Document, FetchError> {
        self(identity)
    }
}

/// Parse descriptor output, requiring an object or array at the root.
pub fn parse_descriptor(
    identity: &ResourceIdentity,
    text: &str,
    format: DocumentFormat,
) -> Result<Document, FetchError> {
    let doc = Document::parse(text, format)
        .map_err(|e| FetchError::new(identity, FetchErrorKind::Unparseable, e.to_string()))?;

    match doc.root() {
        Value::Object(_) | Value::Array(_) => Ok(doc),
        other => Err(FetchError::new(
            identity,
            FetchErrorKind::Unparseable,
            format!("expected a structured document, got {}", preview(&other.to_string())),
        )),
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 80;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
