//! ServeRest Suite - black-box REST test driver
//!
//! Exercises the user-management and login API of a running ServeRest
//! service over HTTP and reports one result per test case.
//!
//! ## Features
//!
//! - Users, login, contract and security suites
//! - Every created fixture is deleted after its case, pass or fail
//! - Sequential or per-suite parallel execution, repeated rounds
//! - Multiple output formats (Table, JSON, CSV)
//!
//! ## Usage
//!
//! ```bash
//! # Run every suite against the configured service
//! serverest-suite run
//!
//! # Run one suite against a local instance
//! serverest-suite run --base-uri http://localhost:3000 --suite users
//!
//! # Run one case ten times
//! serverest-suite run --test login_success --rounds 10
//!
//! # List available cases
//! serverest-suite list --detailed
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::{debug, info};

mod assertions;
mod cli;
mod config;
mod data;
mod executor;
mod fixtures;
mod http;
mod models;
mod output;
mod service;
mod suites;
#[cfg(test)]
mod testing;
mod utils;

use cli::Args;
use config::{ConfigFormat, EnvConfig, SuiteConfig};
use executor::{AggregateResult, ParallelExecutor, TestRunner};
use models::{Suite, TestRoundSummary};
use output::{write_results_to_file, OutputFormat, ResultFormatter};
use suites::Case;
use utils::{init_logger, LogLevel};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        LogLevel::Debug
    } else {
        LogLevel::from_str(&args.log_level).unwrap_or(LogLevel::Info)
    };
    init_logger(level);

    match args.command {
        cli::Command::Run(run_args) => {
            let all_passed = run_tests(run_args).await?;
            if !all_passed {
                std::process::exit(1);
            }
        }
        cli::Command::List(list_args) => {
            list_tests(list_args)?;
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args)?;
        }
        cli::Command::Env => {
            config::print_env_help();
        }
    }

    Ok(())
}

/// Resolve configuration: explicit path, then `SERVEREST_CONFIG`, then the
/// standard locations. Environment overrides are applied on top.
fn resolve_config(explicit: Option<&str>) -> Result<SuiteConfig> {
    let env = EnvConfig::load();

    let mut config = match explicit.or(env.config_file.as_deref()) {
        Some(path) => config::load_config(path)?,
        None => config::load_default()?,
    };

    if env.has_any() {
        debug!("Applying SERVEREST_* environment overrides");
        env.apply(&mut config);
    }

    Ok(config)
}

/// Cases selected by `--test` or `--suite`, all cases otherwise
fn select_cases(args: &cli::RunArgs) -> Result<Vec<Case>> {
    if let Some(name) = &args.test {
        let case =
            suites::find_case(name).ok_or_else(|| anyhow::anyhow!("Unknown test case: {name}"))?;
        return Ok(vec![case]);
    }

    if args.suite.is_empty() {
        return Ok(suites::all_cases());
    }

    let mut selected = Vec::new();
    for name in &args.suite {
        let suite =
            Suite::from_str(name).ok_or_else(|| anyhow::anyhow!("Unknown suite: {name}"))?;
        selected.extend(suites::cases_for(suite));
    }
    Ok(selected)
}

/// Run the selected cases; returns whether every case passed or was skipped
async fn run_tests(args: cli::RunArgs) -> Result<bool> {
    let mut config = resolve_config(args.config.as_deref())?;

    if let Some(base_uri) = &args.base_uri {
        config.base_uri = base_uri.clone();
    }
    if let Some(concurrent) = args.concurrent {
        config.max_concurrent = concurrent;
    }
    config.skip_tests.extend(args.skip_list());
    config.validate()?;

    let format = OutputFormat::from_str(&args.format)
        .ok_or_else(|| anyhow::anyhow!("Unknown output format: {}", args.format))?;
    let cases = select_cases(&args)?;
    let rounds = args.rounds.max(1);

    let runner = TestRunner::new(config)?;
    info!(
        "Running {} case(s) against {} ({} round(s))",
        cases.len(),
        runner.target(),
        rounds
    );

    let summaries = if args.parallel {
        let executor = ParallelExecutor::new(runner.config().max_concurrent);
        executor.run_rounds(&runner, &cases, rounds).await
    } else {
        runner.run_rounds(&cases, rounds).await
    };

    let formatter = ResultFormatter::new(format);
    for summary in &summaries {
        println!("{}", formatter.format_summary(summary));
    }

    if summaries.len() > 1 {
        let aggregate = AggregateResult::from_rounds(&summaries);
        println!("{}", formatter.format_aggregate(&aggregate, runner.target()));
    }

    if let Some(path) = &args.output {
        let file_format = output_file_format(Path::new(path), format);
        write_results_to_file(path, &summaries, file_format)?;
        info!("Results saved to {}", path);
    }

    Ok(summaries.iter().all(TestRoundSummary::is_all_passed))
}

/// Pick the file format from the extension, falling back to `format`
fn output_file_format(path: &Path, format: OutputFormat) -> OutputFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => OutputFormat::JsonPretty,
        Some("csv") => OutputFormat::Csv,
        _ => format,
    }
}

fn list_tests(args: cli::ListArgs) -> Result<()> {
    let suites = match &args.suite {
        Some(name) => vec![
            Suite::from_str(name).ok_or_else(|| anyhow::anyhow!("Unknown suite: {name}"))?
        ],
        None => Suite::all(),
    };

    let total: usize = suites.iter().map(|s| suites::cases_for(*s).len()).sum();
    println!("\nServeRest Test Cases ({total} total)\n");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for suite in suites {
        println!("\n{} Tests ({}):", suite.name(), suite.id());
        println!("──────────────────────────────────────────────────────────────────────");

        for case in suites::cases_for(suite) {
            if args.detailed {
                println!("  {:40} {}", case.info.name, case.info.title);
            } else {
                println!("  {}", case.info.name);
            }
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    Ok(())
}

fn manage_config(args: cli::ConfigArgs) -> Result<()> {
    match args.action {
        cli::ConfigAction::Init { path, force } => {
            let target = Path::new(&path);
            if target.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {path}. Use --force to overwrite."
                );
            }

            let example = SuiteConfig::new("http://localhost:3000");
            config::save_config(&example, target)?;
            println!("✓ Configuration file created: {path}");
            println!("\nEdit the file to point base.uri at your service.");
        }

        cli::ConfigAction::Show { config, format } => {
            let format = ConfigFormat::from_str(&format)
                .with_context(|| format!("Unknown config format: {format}"))?;
            let effective = resolve_config(config.as_deref())?;
            println!("{}", config::render_config(&effective, format)?);
        }
    }

    Ok(())
}
