// src/exec/supervisor.rs

//! Start a container and wait for it to stop.
//!
//! ```text
//! Starting -> Running -> Succeeded | KilledOrUnexpected | FailedWithCode(n) | TimedOut
//! ```
//!
//! Waiting is a poll loop: sleep one interval, add it to the elapsed total,
//! give up with `TimedOut` once the total exceeds the ceiling, otherwise
//! inspect the container. Sleeping goes through tokio's timer, so tests can
//! drive the loop under paused time.
//!
//! The ceiling is a hard safety bound against runaway containers, not a
//! per-job timeout. Inspect failures are never retried: they abort
//! supervision as `PollInfra` errors.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::container::ContainerEngine;
use crate::errors::{Result, RunJobError};
use crate::types::{ContainerHandle, ExecutionOutcome};

/// Time between two inspections of a running container.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Longest a supervised container may run before it is reported as timed out.
pub const MAX_RUNNING_TIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Poll interval and ceiling used by the supervisor.
///
/// Job definitions cannot change these. `Default` is the fixed production
/// pair; tests substitute a shorter one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorSettings {
    pub poll_interval: Duration,
    pub ceiling: Duration,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            ceiling: MAX_RUNNING_TIME,
        }
    }
}

pub struct Supervisor<'a> {
    engine: &'a dyn ContainerEngine,
    settings: SupervisorSettings,
}

impl<'a> Supervisor<'a> {
    pub fn new(engine: &'a dyn ContainerEngine, settings: SupervisorSettings) -> Self {
        Self { engine, settings }
    }

    /// Start the container and wait for its terminal outcome.
    ///
    /// A start failure leaves the container in place for inspection.
    pub async fn supervise(
        &self,
        handle: &ContainerHandle,
        cancel: &CancellationToken,
    ) -> Result<ExecutionOutcome> {
        self.start(handle).await?;
        self.watch(handle, cancel).await
    }

    pub async fn start(&self, handle: &ContainerHandle) -> Result<()> {
        self.engine
            .start_container(&handle.id)
            .await
            .map_err(|source| RunJobError::Start {
                container: handle.id.clone(),
                source,
            })?;

        info!(container = %handle.id, "container started");
        Ok(())
    }

    /// Poll until the container stops, the ceiling passes, or `cancel` fires.
    pub async fn watch(
        &self,
        handle: &ContainerHandle,
        cancel: &CancellationToken,
    ) -> Result<ExecutionOutcome> {
        let mut elapsed = Duration::ZERO;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(container = %handle.id, ?elapsed, "supervision cancelled");
                    return Err(RunJobError::Cancelled {
                        container: handle.id.clone(),
                    });
                }
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
            }
            elapsed += self.settings.poll_interval;

            if elapsed > self.settings.ceiling {
                info!(
                    container = %handle.id,
                    ceiling = ?self.settings.ceiling,
                    "container exceeded maximum running time"
                );
                return Ok(ExecutionOutcome::TimedOut);
            }

            let status = self
                .engine
                .inspect_container(&handle.id)
                .await
                .map_err(|source| RunJobError::PollInfra {
                    container: handle.id.clone(),
                    source,
                })?;

            if status.running {
                trace!(container = %handle.id, ?elapsed, "container still running");
                continue;
            }

            let outcome = ExecutionOutcome::from_exit_code(status.exit_code);
            debug!(
                container = %handle.id,
                exit_code = status.exit_code,
                ?elapsed,
                %outcome,
                "container stopped"
            );
            return Ok(outcome);
        }
    }
}
