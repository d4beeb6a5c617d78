//! Integration tests for infracheck
//!
//! These tests drive whole suites through the public API and the command
//! layer: fixture-backed runs of the secure CI/CD suite, and live-path runs
//! against a fake descriptor program.

pub mod app_cicd;
#[cfg(unix)]
pub mod command_fetcher;
pub mod helpers;
