//! Fetch and print a single resource descriptor

use anyhow::{Context, Result};
use std::path::PathBuf;

use super::common;
use crate::fetch::{CommandFetcher, CommandFetcherConfig, DescriptorFetcher, FixtureFetcher, QueryCatalog};
use crate::models::identity::ResourceIdentity;
use crate::verify::{fetch_with_retry, RetryPolicy, StopSignal};

/// Execute the describe command
///
/// Prints the fetched document as pretty JSON, which is handy when writing
/// expectation paths.
pub fn execute(
    kind: String,
    params: Vec<(String, String)>,
    fixtures: Option<PathBuf>,
    program: Option<String>,
) -> Result<()> {
    let mut identity = ResourceIdentity::new(kind);
    for (key, value) in params {
        identity = identity.with_param(key, value);
    }

    let fetcher: Box<dyn DescriptorFetcher> = match fixtures {
        Some(dir) => {
            common::require_dir(&dir, "Fixture")?;
            Box::new(FixtureFetcher::load_dir(&dir)?)
        }
        None => {
            let mut config = CommandFetcherConfig::default();
            if let Some(program) = program {
                config.program = program;
            }
            common::require_program(&config.program)?;
            Box::new(CommandFetcher::new(QueryCatalog::builtin(), config))
        }
    };

    let outcome = fetch_with_retry(
        fetcher.as_ref(),
        &identity,
        &RetryPolicy::default(),
        &StopSignal::never(),
    );
    let document = outcome
        .result
        .with_context(|| format!("Gave up after {} attempt(s)", outcome.attempts))?;

    println!("{}", document.to_pretty_json());
    Ok(())
}
