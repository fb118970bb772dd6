// src/errors.rs

//! Crate-wide error type.
//!
//! Every variant names the operation that failed and the image, container or
//! network it was acting on, so a caller can diagnose a failed run from the
//! error alone.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::container::EngineError;

#[derive(Error, Debug)]
pub enum RunJobError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("error parsing {kind} '{entry}' - required format is {expected}")]
    SpecParse {
        kind: &'static str,
        entry: String,
        expected: &'static str,
    },

    #[error("error reading env file {path:?}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("error pulling image {image:?}: {source}")]
    ImagePull {
        image: String,
        #[source]
        source: EngineError,
    },

    #[error("error creating container from image {image:?}: {source}")]
    ContainerCreate {
        image: String,
        #[source]
        source: EngineError,
    },

    #[error("error connecting container {container} to network {network:?}: {source}")]
    NetworkConnect {
        network: String,
        container: String,
        #[source]
        source: EngineError,
    },

    #[error("error looking up container {container:?}: {source}")]
    ContainerLookup {
        container: String,
        #[source]
        source: EngineError,
    },

    #[error("error starting container {container}: {source}")]
    Start {
        container: String,
        #[source]
        source: EngineError,
    },

    #[error("error inspecting container {container} while waiting for it: {source}")]
    PollInfra {
        container: String,
        #[source]
        source: EngineError,
    },

    #[error("error removing container {container}: {source}")]
    Remove {
        container: String,
        #[source]
        source: EngineError,
    },

    #[error("container {container} exceeded the maximum running time of {ceiling:?}")]
    TimedOut { container: String, ceiling: Duration },

    #[error("container {container} was killed or stopped unexpectedly")]
    KilledOrUnexpected { container: String },

    #[error("container {container} exited with non-zero code: {code}")]
    NonZeroExit { container: String, code: i64 },

    #[error("supervision of container {container} was cancelled")]
    Cancelled { container: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RunJobError {
    /// True for errors that describe what the job's container did, as
    /// opposed to a failure talking to the engine or reading configuration.
    pub fn is_job_failure(&self) -> bool {
        matches!(
            self,
            RunJobError::TimedOut { .. }
                | RunJobError::KilledOrUnexpected { .. }
                | RunJobError::NonZeroExit { .. }
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RunJobError>;
