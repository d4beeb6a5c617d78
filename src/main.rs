use anyhow::Result;
use clap::{Parser, Subcommand};
use infracheck::commands::common::{init_logging, parse_key_val, OutputOptions};
use infracheck::commands::run::RunOptions;
use infracheck::commands::{describe, kinds, run, validate};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "infracheck")]
#[command(about = "Verify provisioned cloud resources against declared expectations", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a verification suite
    Run {
        /// Path to the suite file (.yaml, .yml or .toml)
        suite: PathBuf,

        #[command(flatten)]
        outputs: OutputOptions,

        /// Read descriptors from fixture files instead of the descriptor program
        #[arg(long, value_name = "DIR")]
        fixtures: Option<PathBuf>,

        /// Maximum number of cases verified concurrently (default: 4)
        #[arg(short = 'p', long)]
        max_parallel: Option<usize>,

        /// Overall deadline for the run, in seconds
        #[arg(long, value_name = "SECS")]
        deadline: Option<u64>,

        /// Fetch attempts per case, including the first (default: 3)
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch one resource descriptor and print it as JSON
    Describe {
        /// Resource kind (see `infracheck kinds`)
        kind: String,

        /// Query parameter, e.g. name=app-source or project=my-project (repeatable)
        #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        params: Vec<(String, String)>,

        /// Read the descriptor from fixture files instead of the descriptor program
        #[arg(long, value_name = "DIR")]
        fixtures: Option<PathBuf>,

        /// Descriptor program (default: gcloud)
        #[arg(long)]
        program: Option<String>,
    },

    /// Load and validate a suite without fetching anything
    Validate {
        /// Path to the suite file
        suite: PathBuf,

        #[command(flatten)]
        outputs: OutputOptions,
    },

    /// List built-in resource kinds and their queries
    Kinds,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            suite,
            outputs,
            fixtures,
            max_parallel,
            deadline,
            max_attempts,
            json,
        } => run::execute(RunOptions {
            suite,
            outputs,
            fixtures,
            max_parallel,
            deadline_secs: deadline,
            max_attempts,
            json,
            verbose: cli.verbose,
        }),
        Commands::Describe {
            kind,
            params,
            fixtures,
            program,
        } => describe::execute(kind, params, fixtures, program),
        Commands::Validate { suite, outputs } => validate::execute(&suite, &outputs),
        Commands::Kinds => kinds::execute(),
    }
}
