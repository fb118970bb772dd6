// src/exec/reaper.rs

//! Remove finished containers.
//!
//! Ownership is the only authority for destructive action: a container the
//! caller supplied by id is never removed, whatever the delete flag says.

use tracing::{debug, info};

use crate::container::ContainerEngine;
use crate::errors::{Result, RunJobError};
use crate::types::ContainerHandle;

/// What the reaper did with a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaped {
    Removed,
    /// The container was supplied by the caller.
    KeptNotOwned,
    /// The job asked to keep its container.
    KeptDeleteDisabled,
}

/// Decide whether `handle` should be removed, without touching the engine.
pub fn reap_decision(handle: &ContainerHandle, delete_on_finish: bool) -> Reaped {
    match (handle.owned, delete_on_finish) {
        (false, _) => Reaped::KeptNotOwned,
        (true, false) => Reaped::KeptDeleteDisabled,
        (true, true) => Reaped::Removed,
    }
}

pub struct Reaper<'a> {
    engine: &'a dyn ContainerEngine,
}

impl<'a> Reaper<'a> {
    pub fn new(engine: &'a dyn ContainerEngine) -> Self {
        Self { engine }
    }

    /// Force-remove the container if this run owns it and deletion is on.
    pub async fn reap(&self, handle: &ContainerHandle, delete_on_finish: bool) -> Result<Reaped> {
        let decision = reap_decision(handle, delete_on_finish);
        if decision != Reaped::Removed {
            debug!(container = %handle.id, ?decision, "keeping container");
            return Ok(decision);
        }

        self.engine
            .remove_container(&handle.id)
            .await
            .map_err(|source| RunJobError::Remove {
                container: handle.id.clone(),
                source,
            })?;

        info!(container = %handle.id, "removed container");
        Ok(Reaped::Removed)
    }
}
