//! Validate a suite without fetching anything

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use super::common::{self, OutputOptions};
use crate::suite::{build_suite, load_suite};

/// Execute the validate command
///
/// Loads the suite, expands templates and variables, and prints the
/// resulting case list. Any setup error fails the command.
pub fn execute(suite_path: &Path, outputs: &OutputOptions) -> Result<()> {
    let file = load_suite(suite_path)?;
    let outputs = common::load_outputs(outputs)?;
    let suite = build_suite(&file, &outputs)?;

    for case in &suite.cases {
        println!("{} {}", "•".cyan(), case.label.bold());
        println!("    {}", case.identity.to_string().dimmed());
        for expectation in &case.expectations {
            println!("    - {}", expectation.label);
        }
    }

    let expectations: usize = suite.cases.iter().map(|c| c.expectations.len()).sum();
    println!(
        "\n{} {} case(s), {} expectation(s) valid",
        "✓".green().bold(),
        suite.cases.len(),
        expectations
    );
    Ok(())
}
