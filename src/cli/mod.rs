//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};

/// Multi-environment external API test harness
#[derive(Parser, Debug)]
#[command(name = "api-harness")]
#[command(version)]
#[command(about = "Run declarative API test cases against configured environments")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the environments file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run test cases against an environment
    Run(RunArgs),

    /// List test cases for an environment
    List(ListArgs),

    /// List configured environments
    Envs(EnvsArgs),

    /// Refresh and inspect OAuth2 tokens
    Token(TokenArgs),

    /// View stored run results
    Results(ResultsArgs),

    /// Manage the environments file
    Config(ConfigArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Environment to run against; falls back to API_HARNESS_ENV
    #[arg(short, long)]
    pub environment: Option<String>,

    /// Specific test id to run; omit to run the whole suite
    #[arg(short, long)]
    pub test: Option<String>,

    /// Output format (table, json, json-pretty, csv, summary)
    #[arg(short, long, default_value = "table")]
    pub format: String,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Export the summary to a file (.json or .csv)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Persist the summary under the data directory
    #[arg(long)]
    pub save: bool,
}

/// Arguments for list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Environment whose suite to list
    #[arg(short, long)]
    pub environment: String,

    /// Show method, endpoint, and auth details
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for envs command
#[derive(Parser, Debug)]
pub struct EnvsArgs {
    /// Show base URLs and production flags
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for token command
#[derive(Parser, Debug)]
pub struct TokenArgs {
    /// Refresh only this environment; omit to warm all
    #[arg(short, long)]
    pub environment: Option<String>,
}

/// Arguments for results command
#[derive(Parser, Debug)]
pub struct ResultsArgs {
    /// Environment whose stored runs to show
    #[arg(short, long)]
    pub environment: Option<String>,

    /// Export the latest stored run to a file (.json or .csv)
    #[arg(long)]
    pub export: Option<String>,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write an example environments file
    Init {
        /// Destination path
        #[arg(default_value = "environments.yaml")]
        path: String,
    },

    /// Show the resolved environments file
    Show,
}
