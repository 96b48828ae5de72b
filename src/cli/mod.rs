//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};

/// Black-box REST test suite for the ServeRest user and login API
#[derive(Parser, Debug)]
#[command(name = "serverest-suite")]
#[command(version)]
#[command(about = "Run the ServeRest users/login test suites against a live service")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run test suites
    Run(RunArgs),

    /// List available suites and test cases
    List(ListArgs),

    /// Show or create configuration
    Config(ConfigArgs),

    /// Print supported environment variables
    Env,
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Configuration file (defaults to the standard locations)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the service address
    #[arg(long)]
    pub base_uri: Option<String>,

    /// Suite to run (users, login, contract, security); repeatable
    #[arg(short, long)]
    pub suite: Vec<String>,

    /// Single test case to run, by name
    #[arg(short, long)]
    pub test: Option<String>,

    /// Number of test rounds
    #[arg(short, long, default_value = "1")]
    pub rounds: u32,

    /// Run suites in parallel
    #[arg(short, long)]
    pub parallel: bool,

    /// Number of concurrent suites (when parallel)
    #[arg(long)]
    pub concurrent: Option<usize>,

    /// Output format (table, json, json-pretty, csv, summary)
    #[arg(short, long, default_value = "table")]
    pub format: String,

    /// Skip specific tests (comma-separated case names)
    #[arg(long)]
    pub skip: Option<String>,

    /// Save results to file
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Arguments for list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Show detailed test information
    #[arg(short, long)]
    pub detailed: bool,

    /// Only list one suite
    #[arg(short, long)]
    pub suite: Option<String>,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show {
        /// Configuration file (defaults to the standard locations)
        #[arg(short, long)]
        config: Option<String>,

        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Write an example configuration file
    Init {
        /// Where to write it
        #[arg(long, default_value = "config.properties")]
        path: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl RunArgs {
    /// Case names from `--skip`
    pub fn skip_list(&self) -> Vec<String> {
        self.skip
            .as_deref()
            .map(|s| {
                s.split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}
