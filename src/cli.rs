// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `pipedag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pipedag",
    version,
    about = "Run data pipeline tasks in dependency order with retries and resource pools.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Pipedag.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Pipedag.toml")]
    pub config: String,

    /// Task to run, including its transitive dependencies. May be repeated.
    ///
    /// With no `--select` (and no `--job`), every task in the config runs.
    #[arg(long, value_name = "NAME")]
    pub select: Vec<String>,

    /// Named selection from `[selection.<name>]` to run as a job.
    #[arg(long, value_name = "NAME", conflicts_with = "select")]
    pub job: Option<String>,

    /// Parse + validate, print the resolved plan, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PIPEDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
