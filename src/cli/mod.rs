//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parallel feature-unit test runner
#[derive(Parser, Debug)]
#[command(name = "featrun")]
#[command(version = "0.1.0")]
#[command(about = "Run feature units in parallel with a serialized report stream")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run feature units
    Run(RunArgs),

    /// List available console formats
    Formats(FormatsArgs),

    /// View saved run records
    Results(ResultsArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Feature unit files to run
    #[arg(required = true)]
    pub units: Vec<PathBuf>,

    /// Number of units run concurrently
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Whole-run deadline in seconds
    #[arg(short, long)]
    pub deadline: Option<u64>,

    /// Console format (pretty, progress, quiet)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Write a JSON report to this path
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Parse units without executing steps
    #[arg(long)]
    pub dry_run: bool,

    /// Save the run record for later inspection
    #[arg(short, long)]
    pub save: bool,

    /// Configuration file to use
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Arguments for formats command
#[derive(Parser, Debug)]
pub struct FormatsArgs {
    /// Show format descriptions
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for results command
#[derive(Parser, Debug)]
pub struct ResultsArgs {
    /// Show a specific run by id
    #[arg(short, long)]
    pub run: Option<String>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table")]
    pub format: String,

    /// Export a run to CSV
    #[arg(short, long)]
    pub export: Option<PathBuf>,

    /// Delete a stored run by id
    #[arg(long)]
    pub delete: Option<String>,

    /// Directory holding saved runs
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show effective configuration
    Show {
        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Write a starter configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "./featrun.yaml")]
        output: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the configuration file in use
    Path,

    /// Describe FEATRUN_* environment variables
    Env,
}
