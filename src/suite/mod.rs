//! Verification suites
//!
//! A suite file declares cases in YAML (or TOML), with `${NAME}` variables
//! filled from suite vars and provisioning outputs. Loading parses the file;
//! building expands templates and validates everything up front.

mod build;
mod loader;
mod outputs;
mod schema;


pub use build::{build_suite, Suite};
pub use loader::{load_suite, parse_suite, SuiteFormat};
pub use outputs::{ChainedOutputs, OutputSource, StaticOutputs, TerraformOutputs};
pub use schema::{
    BackoffSettings, CaseDef, ExpectationDef, ExponentialSettings, FetcherSettings, ForEachDef,
    RetrySettings, Settings, SuiteFile,
};
