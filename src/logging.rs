// src/logging.rs

//! Logging setup for `runjob` using `tracing` + `tracing-subscriber`.
//!
//! The filter is chosen in this order:
//! 1. `--log-level` on the command line
//! 2. `RUNJOB_LOG`, in `EnvFilter` syntax (`debug`, `runjob=trace,bollard=debug`, ...)
//! 3. `info`
//!
//! The Docker client's transport crates are chatty at debug level, so they
//! stay at `warn` unless a directive names them. Logs go to stderr; stdout
//! only carries the run summary.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "RUNJOB_LOG";

const QUIET_DEPENDENCIES: [&str; 3] = ["hyper=warn", "hyper_util=warn", "bollard=warn"];

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let directives = match cli_level {
        Some(level) => level.as_str().to_string(),
        None => std::env::var(LOG_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "info".to_string()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(build_filter(&directives)?)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

/// Parse `directives`, then add the dependency defaults it does not override.
pub fn build_filter(directives: &str) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_new(directives)
        .map_err(|e| anyhow!("invalid log filter {directives:?}: {e}"))?;

    for quiet in QUIET_DEPENDENCIES {
        let target = quiet.split('=').next().unwrap_or(quiet);
        if !directives.contains(target) {
            filter = filter.add_directive(quiet.parse()?);
        }
    }
    Ok(filter)
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
