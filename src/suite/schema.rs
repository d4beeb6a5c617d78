//! Suite file type definitions

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::fetch::CommandFetcherConfig;
use crate::models::document::DocumentFormat;
use crate::verify::{Backoff, RetryPolicy, RunConfig};

/// Root of a suite file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteFile {
    #[serde(default)]
    pub settings: Settings,
    /// Suite-level variables, consulted after template parameters and
    /// before provisioning outputs
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
    /// Extra query templates, keyed by kind; these override built-in kinds
    #[serde(default)]
    pub kinds: BTreeMap<String, String>,
    #[serde(default)]
    pub cases: Vec<CaseDef>,
}

/// Run and fetcher settings; command-line flags take precedence
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub max_parallel: Option<usize>,
    #[serde(default)]
    pub deadline_secs: Option<u64>,
    #[serde(default)]
    pub retry: Option<RetrySettings>,
    #[serde(default)]
    pub fetcher: Option<FetcherSettings>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySettings {
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub backoff: Option<BackoffSettings>,
}

/// Either `fixed_ms` or `exponential`, not both
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackoffSettings {
    #[serde(default)]
    pub fixed_ms: Option<u64>,
    #[serde(default)]
    pub exponential: Option<ExponentialSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExponentialSettings {
    pub base_ms: u64,
    pub max_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetcherSettings {
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub format_flag: Option<String>,
    #[serde(default)]
    pub output: Option<DocumentFormat>,
    #[serde(default)]
    pub command_timeout_secs: Option<u64>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

/// One case, or a family of cases when `for_each` is set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseDef {
    pub label: String,
    pub kind: String,
    #[serde(default)]
    pub identity: BTreeMap<String, String>,
    #[serde(default)]
    pub expect: Vec<ExpectationDef>,
    #[serde(default)]
    pub for_each: Option<ForEachDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForEachDef {
    pub name: String,
    pub values: Vec<String>,
}

/// One expectation; exactly one of `equals`, `contains` or `absent`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectationDef {
    pub path: String,
    /// `equals: null` is kept as an explicit null rather than "not set"
    #[serde(default, deserialize_with = "present")]
    pub equals: Option<Value>,
    #[serde(default)]
    pub contains: Option<String>,
    #[serde(default)]
    pub absent: bool,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub allow_absent: bool,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl Settings {
    pub fn run_config(&self) -> RunConfig {
        let mut config = RunConfig::default();
        if let Some(max_parallel) = self.max_parallel {
            config.max_parallel = max_parallel;
        }
        config.deadline = self.deadline_secs.map(Duration::from_secs);
        if let Some(retry) = &self.retry {
            config.retry = retry.policy();
        }
        config
    }

    pub fn fetcher_config(&self) -> CommandFetcherConfig {
        let mut config = CommandFetcherConfig::default();
        let Some(fetcher) = &self.fetcher else {
            return config;
        };
        if let Some(program) = &fetcher.program {
            config.program = program.clone();
        }
        if let Some(flag) = &fetcher.format_flag {
            config.format_flag = flag.clone();
        }
        if let Some(format) = fetcher.output {
            config.format = format;
        }
        if let Some(secs) = fetcher.command_timeout_secs {
            config.command_timeout = Duration::from_secs(secs);
        }
        config.working_dir = fetcher.working_dir.clone();
        config
    }
}

impl RetrySettings {
    /// Resolve against defaults; `fixed_ms` wins if both backoffs are set
    pub fn policy(&self) -> RetryPolicy {
        let mut policy = RetryPolicy::default();
        if let Some(max_attempts) = self.max_attempts {
            policy.max_attempts = max_attempts;
        }
        if let Some(backoff) = &self.backoff {
            if let Some(ms) = backoff.fixed_ms {
                policy.backoff = Backoff::Fixed(Duration::from_millis(ms));
            } else if let Some(exp) = &backoff.exponential {
                policy.backoff = Backoff::Exponential {
                    base: Duration::from_millis(exp.base_ms),
                    max: Duration::from_millis(exp.max_ms),
                };
            }
        }
        policy
    }
}

impl BackoffSettings {
    pub fn is_conflicting(&self) -> bool {
        self.fixed_ms.is_some() && self.exponential.is_some()
    }
}
