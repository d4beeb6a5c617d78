//! Common utility functions shared across command implementations.
//!
//! This module provides utilities for:
//! - Logging setup
//! - `KEY=VALUE` argument parsing
//! - Provisioning output loading
//! - Cancellation on Ctrl-C

use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::SetupError;
use crate::suite::{ChainedOutputs, StaticOutputs, TerraformOutputs};
use crate::verify::CancelFlag;

/// Timeout for `terraform output -json`
const TERRAFORM_OUTPUT_TIMEOUT: Duration = Duration::from_secs(120);

/// Where `${NAME}` variables not defined by the suite come from
#[derive(Args, Debug, Clone, Default)]
pub struct OutputOptions {
    /// File produced by `terraform output -json` (a flat string map also works)
    #[arg(long, value_name = "FILE")]
    pub outputs: Option<PathBuf>,

    /// Terraform root module to read outputs from with `terraform output -json`
    #[arg(long, value_name = "DIR")]
    pub terraform_dir: Option<PathBuf>,

    /// Set a variable, overriding provisioning outputs (repeatable)
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub vars: Vec<(String, String)>,
}

/// Install the stderr tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` switches this crate to
/// debug level.
pub fn init_logging(verbose: bool) {
    let default = if verbose {
        "info,infracheck=debug"
    } else {
        "warn,infracheck=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Clap value parser for `KEY=VALUE` arguments. The value may contain `=`.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Combine `--var` values, an outputs file and live Terraform outputs, in
/// that order of precedence.
pub fn load_outputs(options: &OutputOptions) -> Result<ChainedOutputs> {
    let mut chained = ChainedOutputs::new();
    chained.push(options.vars.iter().cloned().collect::<StaticOutputs>());

    if let Some(path) = &options.outputs {
        chained.push(TerraformOutputs::from_file(path)?);
    }
    if let Some(dir) = &options.terraform_dir {
        let outputs = TerraformOutputs::from_command(dir, TERRAFORM_OUTPUT_TIMEOUT)
            .with_context(|| format!("Failed to read terraform outputs in {}", dir.display()))?;
        debug!(count = outputs.names().count(), "loaded terraform outputs");
        chained.push(outputs);
    }
    Ok(chained)
}

/// Fail early when the descriptor program is not installed.
pub fn require_program(program: &str) -> Result<PathBuf> {
    match which::which(program) {
        Ok(path) => Ok(path),
        Err(_) => Err(SetupError::ProgramNotFound {
            program: program.to_string(),
        }
        .into()),
    }
}

/// Cancel `flag` on Ctrl-C.
///
/// Only one handler can be installed per process; later calls keep the
/// first handler and log a warning.
pub fn cancel_on_interrupt(flag: &CancelFlag) {
    let flag = flag.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("Interrupted, cancelling remaining cases...");
        flag.cancel();
    }) {
        warn!(error = %e, "Failed to set Ctrl+C handler");
    }
}

/// Ensure a user-supplied directory exists before using it.
pub fn require_dir(path: &Path, what: &str) -> Result<()> {
    if !path.is_dir() {
        bail!("{what} directory not found: {}", path.display());
    }
    Ok(())
}
