//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};

/// Assignment grading test runner
#[derive(Parser, Debug)]
#[command(name = "grader")]
#[command(author = "hephaex@gmail.com")]
#[command(version)]
#[command(about = "Run test specifications against student source files")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Output format (table, json, json-pretty, csv, summary)
    #[arg(short, long, global = true)]
    pub format: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the tests associated with a source file
    Test(TestArgs),

    /// Run the tests for every file of a module
    Module(ModuleArgs),

    /// List registered test specifications
    List(ListArgs),

    /// Manage configuration
    Config(ConfigArgs),

    /// Run a test specification in this process (used by the grader itself)
    #[command(hide = true)]
    Worker(WorkerArgs),
}

/// Arguments for test command
#[derive(Parser, Debug)]
pub struct TestArgs {
    /// Source file to grade (extension optional)
    pub file: String,

    /// Only consider specifications under this module
    #[arg(short, long, default_value = "")]
    pub module: String,
}

/// Arguments for module command
#[derive(Parser, Debug)]
pub struct ModuleArgs {
    /// Module whose specifications to run; files are looked up in the
    /// current directory
    pub module: String,

    /// Save the batch summary to file
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Arguments for list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Show the tests of each specification
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for configuration management
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a configuration file with default values
    Init {
        /// Output path
        #[arg(short, long, default_value = "grader.yaml")]
        output: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Show environment variable overrides instead
        #[arg(long)]
        env: bool,
    },
}

/// Arguments for the worker process
#[derive(Parser, Debug)]
pub struct WorkerArgs {
    /// Specification key, `module/name`
    #[arg(long)]
    pub spec: String,

    /// Absolute path of the graded file
    #[arg(long)]
    pub file: String,

    /// Timeout for tests that declare none, in milliseconds
    #[arg(long, default_value = "10000")]
    pub default_timeout_ms: u64,
}
