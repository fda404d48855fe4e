//! API Harness - Multi-Environment External API Test Tool
//!
//! A CLI tool for running declarative API test cases against multiple
//! configured environments, each with its own OAuth2 client-credentials
//! lifecycle and a production safety gate for customer identifiers.
//!
//! ## Usage
//!
//! ```bash
//! # Run a whole suite against an environment
//! api-harness run --environment rapid-stage
//!
//! # Run a single test
//! api-harness run --environment rapid-prod --test balance-check
//!
//! # List environments and test cases
//! api-harness envs --detailed
//! api-harness list --environment rapid-stage
//!
//! # Warm OAuth2 tokens ahead of a run
//! api-harness token
//!
//! # Bootstrap a config file
//! api-harness config init
//! ```
//!
//! Credentials are read from `{PREFIX}_TOKEN_URL`, `{PREFIX}_CLIENT_ID`,
//! `{PREFIX}_CLIENT_SECRET` (plus optional `{PREFIX}_OAUTH_SCOPE` and
//! `{PREFIX}_API_KEY`) environment variables, one prefix per environment.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::info;

mod auth;
mod cli;
mod config;
mod executor;
mod http;
mod models;
mod output;
mod results;
mod safety;
mod utils;

use cli::{Args, ConfigAction};
use config::{EnvConfig, EnvironmentsFile, DEFAULT_TIMEOUT_SECS};
use executor::Harness;
use output::{OutputFormat, ResultFormatter};
use results::{ExportFormat, ResultsStorage, StoredRun};
use utils::logger::{init_logger, LogLevel};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let env_overrides = EnvConfig::load();

    let verbose = args.verbose || env_overrides.verbose.unwrap_or(false);
    init_logger(if verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    });

    match &args.command {
        cli::Command::Run(run_args) => {
            run_tests(&args, run_args, &env_overrides).await?;
        }
        cli::Command::List(list_args) => {
            list_tests(&args, list_args, &env_overrides)?;
        }
        cli::Command::Envs(envs_args) => {
            list_environments(&args, envs_args, &env_overrides)?;
        }
        cli::Command::Token(token_args) => {
            manage_tokens(&args, token_args, &env_overrides).await?;
        }
        cli::Command::Results(results_args) => {
            show_results(results_args)?;
        }
        cli::Command::Config(config_args) => {
            manage_config(&args, config_args, &env_overrides)?;
        }
    }

    Ok(())
}

/// Resolve the environments file: --config flag, then API_HARNESS_CONFIG,
/// then the standard search locations.
fn load_environments_file(
    args: &Args,
    env_overrides: &EnvConfig,
) -> Result<(EnvironmentsFile, PathBuf)> {
    let explicit = args
        .config
        .clone()
        .or_else(|| env_overrides.config_file.clone());

    match explicit {
        Some(path) => {
            let path = PathBuf::from(path);
            let file = EnvironmentsFile::load(&path)?;
            Ok((file, path))
        }
        None => EnvironmentsFile::load_default(),
    }
}

fn build_harness(args: &Args, env_overrides: &EnvConfig, timeout: Option<u64>) -> Result<Harness> {
    let (file, path) = load_environments_file(args, env_overrides)?;
    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let (registry, errors) = config::build_registry(&file, base_dir);
    if registry.is_empty() {
        anyhow::bail!(
            "No usable environments in {} ({} rejected for missing credentials)",
            path.display(),
            errors.len()
        );
    }

    let timeout_secs = timeout.unwrap_or_else(|| env_overrides.timeout_or(DEFAULT_TIMEOUT_SECS));
    Harness::new(registry, timeout_secs)
}

async fn run_tests(args: &Args, run_args: &cli::RunArgs, env_overrides: &EnvConfig) -> Result<()> {
    let environment = run_args
        .environment
        .clone()
        .or_else(|| env_overrides.environment.clone())
        .context("No environment given; pass --environment or set API_HARNESS_ENV")?;

    let harness = build_harness(args, env_overrides, run_args.timeout)?;

    let format = OutputFormat::from_str(&run_args.format)
        .or_else(|| env_overrides.format.as_deref().and_then(OutputFormat::from_str))
        .unwrap_or(OutputFormat::Table);
    let formatter = ResultFormatter::new(format);

    if let Some(test_id) = &run_args.test {
        let result = harness.run_test(&environment, test_id).await?;
        println!("{}", formatter.format_result(&result));
        return Ok(());
    }

    let summary = harness.run_all(&environment).await?;
    println!("{}", formatter.format_summary(&summary));

    if run_args.save || run_args.output.is_some() {
        let run = StoredRun::new(summary);
        let storage = ResultsStorage::default_dir();

        if run_args.save {
            storage.save(&run)?;
        }

        if let Some(output) = &run_args.output {
            let path = PathBuf::from(output);
            let export_format = ExportFormat::from_extension(&path)
                .context("Export path must end in .json or .csv")?;
            storage.export(&run, &path, export_format)?;
        }
    }

    Ok(())
}

fn list_tests(args: &Args, list_args: &cli::ListArgs, env_overrides: &EnvConfig) -> Result<()> {
    let harness = build_harness(args, env_overrides, None)?;
    let suite = harness
        .suite(&list_args.environment)
        .with_context(|| format!("No test suite loaded for {}", list_args.environment))?;

    println!("\nTest cases for {} ({} total)\n", list_args.environment, suite.len());

    let mut current_category = "";
    for test in &suite.test_cases {
        if test.category != current_category {
            println!("\n{} Tests:", test.category);
            println!("──────────────────────────────────────────────────────────────────────");
            current_category = &test.category;
        }

        if list_args.detailed {
            println!(
                "  {:24} {:6} {:32} auth={}",
                test.id, test.method, test.endpoint, test.requires_auth
            );
        } else {
            println!("  {:24} {}", test.id, test.name);
        }
    }
    println!();

    Ok(())
}

fn list_environments(
    args: &Args,
    envs_args: &cli::EnvsArgs,
    env_overrides: &EnvConfig,
) -> Result<()> {
    let harness = build_harness(args, env_overrides, None)?;

    println!("\nConfigured environments:\n");
    for info in harness.list_environments() {
        let marker = if info.production { " [PRODUCTION]" } else { "" };
        if envs_args.detailed {
            println!("  {:16} {:28} {}{}", info.id, info.name, info.base_url, marker);
        } else {
            println!("  {:16} {}{}", info.id, info.name, marker);
        }
    }
    println!();

    Ok(())
}

async fn manage_tokens(
    args: &Args,
    token_args: &cli::TokenArgs,
    env_overrides: &EnvConfig,
) -> Result<()> {
    let harness = build_harness(args, env_overrides, None)?;

    match &token_args.environment {
        Some(environment_id) => {
            let state = harness.refresh_token(environment_id).await?;
            print_token_status(environment_id, &state);
        }
        None => {
            info!("Warming tokens for all environments");
            for (environment_id, result) in harness.warm_tokens().await {
                match result {
                    Ok(state) => print_token_status(&environment_id, &state),
                    Err(e) => println!("  {environment_id:16} refresh failed: {e}"),
                }
            }
        }
    }

    Ok(())
}

fn print_token_status(environment_id: &str, state: &auth::TokenState) {
    let remaining = state
        .expires_in()
        .map(|d| format!("{}s", d.as_secs()))
        .unwrap_or_else(|| "unknown".to_string());
    println!("  {environment_id:16} token valid, expires in {remaining}");
}

fn show_results(results_args: &cli::ResultsArgs) -> Result<()> {
    let storage = ResultsStorage::default_dir();

    let Some(environment_id) = &results_args.environment else {
        let environments = storage.list_environments()?;
        if environments.is_empty() {
            println!("No stored results.");
        } else {
            println!("\nEnvironments with stored results:\n");
            for env in environments {
                println!("  {env}");
            }
            println!();
        }
        return Ok(());
    };

    if let Some(export) = &results_args.export {
        let run = storage
            .latest(environment_id)?
            .with_context(|| format!("No stored runs for {environment_id}"))?;
        let path = PathBuf::from(export);
        let export_format = ExportFormat::from_extension(&path)
            .context("Export path must end in .json or .csv")?;
        storage.export(&run, &path, export_format)?;
        return Ok(());
    }

    let runs = storage.load_environment(environment_id)?;
    if runs.is_empty() {
        println!("No stored runs for {environment_id}.");
        return Ok(());
    }

    println!("\nStored runs for {environment_id}:\n");
    for run in runs {
        println!(
            "  {:22} {}  pass {}/{}  blocked {}",
            run.id,
            run.saved_at.format("%Y-%m-%d %H:%M:%S"),
            run.summary.passed,
            run.summary.total,
            run.summary.blocked
        );
    }
    println!();

    Ok(())
}

fn manage_config(
    args: &Args,
    config_args: &cli::ConfigArgs,
    env_overrides: &EnvConfig,
) -> Result<()> {
    match &config_args.action {
        ConfigAction::Init { path } => {
            let path = PathBuf::from(path);
            if path.exists() {
                anyhow::bail!("Refusing to overwrite existing file: {}", path.display());
            }
            EnvironmentsFile::example().save(&path)?;
            println!("Wrote example environments file to {}", path.display());
            println!("Export {{PREFIX}}_TOKEN_URL / _CLIENT_ID / _CLIENT_SECRET for each environment.");
        }
        ConfigAction::Show => {
            let (file, path) = load_environments_file(args, env_overrides)?;
            println!("# {}", path.display());
            println!("{}", serde_yaml::to_string(&file)?);
        }
    }

    Ok(())
}
