//! Report rendering for terminals and machines

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;

use super::result::{CaseOutcome, CaseResult, RunReport};

/// Render a run report for a terminal.
///
/// Passing checks are listed only when `verbose` is set; failures always
/// show the expected matcher next to the actual value.
pub fn render_text(report: &RunReport, verbose: bool) -> String {
    let mut out = String::new();

    for result in &report.results {
        render_case(&mut out, result, verbose);
    }

    let _ = writeln!(out);
    let summary = report.summary();
    if report.passed() {
        let _ = writeln!(out, "{} {}", "✓".green().bold(), summary.green());
    } else {
        let _ = writeln!(out, "{} {}", "✗".red().bold(), summary.red());
    }
    out
}

fn render_case(out: &mut String, result: &CaseResult, verbose: bool) {
    let icon = if result.passed() {
        "✓".green()
    } else {
        "✗".red()
    };
    let _ = writeln!(
        out,
        "{} {} {}",
        icon,
        result.label.bold(),
        format!("({})", result.identity).dimmed()
    );

    match &result.outcome {
        CaseOutcome::Checked { checks, .. } => {
            for check in checks {
                if check.matched {
                    if verbose {
                        let _ = writeln!(
                            out,
                            "    {} {} = {}",
                            "✓".green(),
                            check.expectation.label,
                            check.actual_display()
                        );
                    }
                } else {
                    let _ = writeln!(
                        out,
                        "    {} {}: expected {} {}, actual {}",
                        "✗".red(),
                        check.expectation.label,
                        check.expectation.path,
                        check.expectation.matcher,
                        check.actual_display().yellow()
                    );
                }
            }
        }
        _ => {
            if let Some(cause) = result.failure_cause() {
                let _ = writeln!(out, "    {} {}", "!".red().bold(), cause);
            }
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    passed: bool,
    passed_count: usize,
    failed_count: usize,
    #[serde(flatten)]
    report: &'a RunReport,
}

/// Render a run report as pretty-printed JSON.
pub fn render_json(report: &RunReport) -> Result<String> {
    let json = JsonReport {
        passed: report.passed(),
        passed_count: report.passed_count(),
        failed_count: report.failed_count(),
        report,
    };
    serde_json::to_string_pretty(&json).context("Failed to serialize run report")
}
