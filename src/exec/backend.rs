// src/exec/backend.rs

//! Shared services a container run depends on.
//!
//! A `Backend` bundles the engine client, the registry credential table,
//! filesystem access and the supervisor timing. All of it is read-only and
//! cheap to clone, so any number of concurrent runs can share one backend.
//!
//! - Production code builds one with [`Backend::new`] around a
//!   [`DockerEngine`](crate::container::DockerEngine).
//! - Tests swap in a fake engine, a mock filesystem and short supervisor
//!   timings.

use std::fmt;
use std::sync::Arc;

use crate::auth::CredentialTable;
use crate::container::ContainerEngine;
use crate::exec::supervisor::SupervisorSettings;
use crate::fs::{FileSystem, RealFileSystem};

#[derive(Clone)]
pub struct Backend {
    pub engine: Arc<dyn ContainerEngine>,
    pub credentials: Arc<CredentialTable>,
    pub fs: Arc<dyn FileSystem>,
    pub supervisor: SupervisorSettings,
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("credentials", &self.credentials)
            .field("fs", &self.fs)
            .field("supervisor", &self.supervisor)
            .finish_non_exhaustive()
    }
}

impl Backend {
    /// Backend on the real filesystem with the fixed supervisor timing.
    pub fn new(engine: Arc<dyn ContainerEngine>, credentials: Arc<CredentialTable>) -> Self {
        Self {
            engine,
            credentials,
            fs: Arc::new(RealFileSystem),
            supervisor: SupervisorSettings::default(),
        }
    }

    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_supervisor_settings(mut self, settings: SupervisorSettings) -> Self {
        self.supervisor = settings;
        self
    }
}
