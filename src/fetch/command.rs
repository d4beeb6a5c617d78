//! Descriptor fetcher backed by an external describe command

use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use super::classify::{classify_failure, EXIT_COMMAND_NOT_FOUND};
use super::executor::run_command;
use super::query::QueryCatalog;
use super::{parse_descriptor, DescriptorFetcher};
use crate::error::{FetchError, FetchErrorKind};
use crate::models::document::{Document, DocumentFormat};
use crate::models::identity::ResourceIdentity;

/// Default timeout for one describe command (2 minutes)
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// How the describe command is invoked
#[derive(Debug, Clone, PartialEq)]
pub struct CommandFetcherConfig {
    /// Program prefixed to every query
    pub program: String,
    /// Flag appended to every query to select structured output
    pub format_flag: String,
    /// Format the program writes with `format_flag`
    pub format: DocumentFormat,
    /// Maximum time to wait for a single describe command
    pub command_timeout: Duration,
    pub working_dir: Option<PathBuf>,
}

impl Default for CommandFetcherConfig {
    fn default() -> Self {
        Self {
            program: "gcloud".to_string(),
            format_flag: "--format=json".to_string(),
            format: DocumentFormat::Json,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            working_dir: None,
        }
    }
}

/// Describes resources by running `<program> <query> <format_flag>`.
#[derive(Debug, Clone)]
pub struct CommandFetcher {
    catalog: QueryCatalog,
    config: CommandFetcherConfig,
}

impl CommandFetcher {
    pub fn new(catalog: QueryCatalog, config: CommandFetcherConfig) -> Self {
        Self { catalog, config }
    }

    /// Full command line for `identity`, without running it.
    pub fn command_line(&self, identity: &ResourceIdentity) -> Result<String, FetchError> {
        let query = self.catalog.render(identity).map_err(|e| {
            FetchError::new(identity, FetchErrorKind::MalformedIdentity, e.to_string())
        })?;

        let parts = [
            self.config.program.as_str(),
            query.as_str(),
            self.config.format_flag.as_str(),
        ];
        Ok(parts
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" "))
    }
}

impl DescriptorFetcher for CommandFetcher {
    fn fetch(&self, identity: &ResourceIdentity) -> Result<Document, FetchError> {
        let command = self.command_line(identity)?;
        debug!(%identity, %command, "running describe command");

        let output = run_command(
            &command,
            self.config.working_dir.as_deref(),
            self.config.command_timeout,
        )
        .map_err(|e| FetchError::new(identity, FetchErrorKind::CommandFailed, format!("{e:#}")))?;

        debug!(%identity, "{}", output.summary());

        if output.timed_out {
            return Err(FetchError::new(
                identity,
                FetchErrorKind::TimedOut,
                format!(
                    "describe command killed after {}s",
                    self.config.command_timeout.as_secs_f64()
                ),
            ));
        }

        if !output.success {
            let kind = if output.exit_code == Some(EXIT_COMMAND_NOT_FOUND) {
                FetchErrorKind::CommandFailed
            } else {
                classify_failure(&output.stderr)
            };
            let stderr = output.stderr.trim();
            let cause = if stderr.is_empty() {
                format!("exit code {:?}", output.exit_code)
            } else {
                stderr.to_string()
            };
            return Err(FetchError::new(identity, kind, cause));
        }

        parse_descriptor(identity, &output.stdout, self.config.format)
    }
}
