// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `runjob`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "runjob",
    version,
    about = "Run jobs in Docker containers and report how they ended.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the job file (TOML).
    ///
    /// Default: `Runjob.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Runjob.toml")]
    pub config: String,

    /// Run only the named job. May be repeated; default is every job.
    #[arg(long = "job", value_name = "NAME")]
    pub jobs: Vec<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RUNJOB_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate and print the jobs, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
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
