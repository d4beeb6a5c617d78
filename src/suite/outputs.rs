//! Provisioning outputs
//!
//! Suites reference values produced by the provisioning run (project ids,
//! repository names) as `${name}` variables. An [`OutputSource`] answers
//! those lookups; it is read-only.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::fetch::run_command;

/// Read-only lookup of provisioning output values by name
pub trait OutputSource {
    fn get_output(&self, name: &str) -> Option<String>;
}

/// Fixed values, e.g. from `--var name=value`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticOutputs {
    values: BTreeMap<String, String>,
}

impl StaticOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, String)> for StaticOutputs {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl OutputSource for StaticOutputs {
    fn get_output(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

/// Outputs of a Terraform root module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerraformOutputs {
    values: BTreeMap<String, String>,
}

impl TerraformOutputs {
    /// Parse `terraform output -json` text.
    ///
    /// Each entry is either `{"value": ..., "type": ..., "sensitive": ...}`
    /// or a bare value. Strings are used as-is; other values are rendered
    /// as compact JSON.
    pub fn from_json(text: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(text).context("Failed to parse outputs JSON")?;
        let Value::Object(entries) = root else {
            bail!("Outputs JSON must be an object of name to value");
        };

        let values = entries
            .into_iter()
            .map(|(name, entry)| {
                let value = match entry {
                    Value::Object(mut map) if map.contains_key("value") => {
                        map.remove("value").unwrap_or(Value::Null)
                    }
                    other => other,
                };
                (name, render_output(value))
            })
            .collect();

        Ok(Self { values })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read outputs file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid outputs file {}", path.display()))
    }

    /// Run `terraform -chdir=<dir> output -json` and parse its output.
    pub fn from_command(dir: &Path, timeout: Duration) -> Result<Self> {
        let dir_arg = format!("-chdir={}", dir.display());
        let command = format!(
            "terraform {} output -json",
            shell_escape::escape(dir_arg.into())
        );
        debug!(%command, "reading terraform outputs");

        let output = run_command(&command, None, timeout)?;
        if output.timed_out {
            bail!("terraform output timed out after {}s", timeout.as_secs());
        }
        if !output.success {
            bail!("terraform output failed: {}", output.stderr.trim());
        }
        Self::from_json(&output.stdout)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl OutputSource for TerraformOutputs {
    fn get_output(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

fn render_output(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Several sources consulted in order; the first answer wins.
#[derive(Default)]
pub struct ChainedOutputs {
    sources: Vec<Box<dyn OutputSource>>,
}

impl ChainedOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source: impl OutputSource + 'static) {
        self.sources.push(Box::new(source));
    }

    pub fn with(mut self, source: impl OutputSource + 'static) -> Self {
        self.push(source);
        self
    }
}

impl OutputSource for ChainedOutputs {
    fn get_output(&self, name: &str) -> Option<String> {
        self.sources.iter().find_map(|source| source.get_output(name))
    }
}
