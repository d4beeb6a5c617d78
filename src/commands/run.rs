//! Run a verification suite against live resources or fixtures

use anyhow::{bail, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::common::{self, OutputOptions};
use crate::fetch::{CommandFetcher, DescriptorFetcher, FixtureFetcher};
use crate::suite::{build_suite, load_suite};
use crate::verify::{render_json, render_text, CancelFlag, Verifier};

/// Options for `infracheck run`
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub suite: PathBuf,
    pub outputs: OutputOptions,
    /// Answer from fixture files instead of the descriptor program
    pub fixtures: Option<PathBuf>,
    pub max_parallel: Option<usize>,
    pub deadline_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    pub json: bool,
    pub verbose: bool,
}

/// Execute the run command
pub fn execute(options: RunOptions) -> Result<()> {
    let file = load_suite(&options.suite)?;
    let outputs = common::load_outputs(&options.outputs)?;
    let suite = build_suite(&file, &outputs)?;

    let mut config = suite.run_config;
    if let Some(max_parallel) = options.max_parallel {
        config.max_parallel = max_parallel;
    }
    if let Some(secs) = options.deadline_secs {
        config.deadline = Some(Duration::from_secs(secs));
    }
    if let Some(max_attempts) = options.max_attempts {
        config.retry.max_attempts = max_attempts;
    }

    let fetcher: Arc<dyn DescriptorFetcher> = match &options.fixtures {
        Some(dir) => {
            common::require_dir(dir, "Fixture")?;
            Arc::new(FixtureFetcher::load_dir(dir)?)
        }
        None => {
            let program = common::require_program(&suite.fetcher_config.program)?;
            info!(program = %program.display(), "using descriptor program");
            Arc::new(CommandFetcher::new(suite.catalog, suite.fetcher_config))
        }
    };

    if !options.json {
        println!(
            "{} Verifying {} case(s) from {}...\n",
            "→".cyan().bold(),
            suite.cases.len(),
            options.suite.display()
        );
    }

    let cancel = CancelFlag::new();
    common::cancel_on_interrupt(&cancel);

    let report = Verifier::new(fetcher, config)
        .with_cancel(cancel)
        .run(&suite.cases);

    if options.json {
        println!("{}", render_json(&report)?);
    } else {
        print!("{}", render_text(&report, options.verbose));
    }

    if !report.passed() {
        bail!(
            "{} of {} case(s) failed",
            report.failed_count(),
            report.results.len()
        );
    }
    Ok(())
}
