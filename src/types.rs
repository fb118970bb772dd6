// src/types.rs

use std::fmt;
use std::time::Duration;

use crate::errors::{Result, RunJobError};

/// The container a single run operates on.
///
/// `owned` is true only when this run created the container. Containers
/// supplied by id belong to someone else and are never removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle {
    pub id: String,
    pub owned: bool,
}

impl ContainerHandle {
    /// A container this run created.
    pub fn created(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owned: true,
        }
    }

    /// A pre-existing container supplied by the caller.
    pub fn existing(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owned: false,
        }
    }
}

/// How a supervised container run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Succeeded,
    TimedOut,
    /// The engine had no usable exit code (`-1`), e.g. the process was
    /// killed by a signal.
    KilledOrUnexpected,
    FailedWithCode(i64),
}

impl ExecutionOutcome {
    pub fn from_exit_code(code: i64) -> Self {
        match code {
            0 => ExecutionOutcome::Succeeded,
            -1 => ExecutionOutcome::KilledOrUnexpected,
            n => ExecutionOutcome::FailedWithCode(n),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Succeeded)
    }

    /// Turn the outcome into the run's terminal result.
    pub fn into_result(self, container: &str, ceiling: Duration) -> Result<()> {
        let container = container.to_string();
        match self {
            ExecutionOutcome::Succeeded => Ok(()),
            ExecutionOutcome::TimedOut => Err(RunJobError::TimedOut { container, ceiling }),
            ExecutionOutcome::KilledOrUnexpected => {
                Err(RunJobError::KilledOrUnexpected { container })
            }
            ExecutionOutcome::FailedWithCode(code) => {
                Err(RunJobError::NonZeroExit { container, code })
            }
        }
    }
}

impl fmt::Display for ExecutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionOutcome::Succeeded => write!(f, "succeeded"),
            ExecutionOutcome::TimedOut => write!(f, "timed out"),
            ExecutionOutcome::KilledOrUnexpected => write!(f, "killed or unexpected"),
            ExecutionOutcome::FailedWithCode(code) => write!(f, "failed with code {code}"),
        }
    }
}
