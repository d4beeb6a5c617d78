//! Suite file loading

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::schema::SuiteFile;

/// Suite file syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteFormat {
    Yaml,
    Toml,
}

impl SuiteFormat {
    /// `.toml` files are TOML; everything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => SuiteFormat::Toml,
            _ => SuiteFormat::Yaml,
        }
    }
}

pub fn parse_suite(text: &str, format: SuiteFormat) -> Result<SuiteFile> {
    match format {
        SuiteFormat::Yaml => serde_yaml::from_str(text).context("Failed to parse suite YAML"),
        SuiteFormat::Toml => toml::from_str(text).context("Failed to parse suite TOML"),
    }
}

pub fn load_suite(path: &Path) -> Result<SuiteFile> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read suite file {}", path.display()))?;
    parse_suite(&text, SuiteFormat::from_path(path))
        .with_context(|| format!("Invalid suite file {}", path.display()))
}
