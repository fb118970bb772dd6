// src/container/mod.rs

//! Container engine abstraction.
//!
//! The executor talks to a `ContainerEngine` instead of a concrete Docker
//! client. Production code uses [`docker::DockerEngine`]; tests provide a
//! scripted fake that records every call.
//!
//! The trait exposes exactly the engine operations a container run needs:
//! pull, create, list/connect networks, start, inspect and forced remove.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::auth::RegistryCredentials;
use crate::parse::{EnvEntry, ImageReference, VolumeMount};

pub mod docker;

pub use docker::DockerEngine;

/// Failure reported by the container engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("docker API error: {0}")]
    Docker(#[from] bollard::errors::Error),

    #[error("no such container: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Boxed future returned by engine operations.
pub type EngineFuture<'a, T> = Pin<Box<dyn Future<Output = EngineResult<T>> + Send + 'a>>;

/// Everything needed to create a job container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub image: String,
    pub user: String,
    pub tty: bool,
    pub argv: Vec<String>,
    pub env: Vec<EnvEntry>,
    pub mounts: Vec<VolumeMount>,
}

/// A network as listed by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSummary {
    pub id: String,
    pub name: String,
}

/// The part of a container's inspected state the executor cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerStatus {
    pub running: bool,
    pub exit_code: i64,
}

pub trait ContainerEngine: Send + Sync {
    /// Pull `image`, authenticating with `credentials` when given.
    fn pull_image<'a>(
        &'a self,
        image: &'a ImageReference,
        credentials: Option<&'a RegistryCredentials>,
    ) -> EngineFuture<'a, ()>;

    /// Create (but do not start) a container; returns its id.
    fn create_container<'a>(&'a self, spec: &'a ContainerSpec) -> EngineFuture<'a, String>;

    /// List networks whose name matches `name`.
    ///
    /// Engines may treat the filter as a substring match; callers that need
    /// an exact match filter the result themselves.
    fn list_networks<'a>(&'a self, name: &'a str) -> EngineFuture<'a, Vec<NetworkSummary>>;

    fn connect_network<'a>(
        &'a self,
        network_id: &'a str,
        container_id: &'a str,
    ) -> EngineFuture<'a, ()>;

    fn start_container<'a>(&'a self, container_id: &'a str) -> EngineFuture<'a, ()>;

    /// Inspect a container. Unknown ids yield [`EngineError::NotFound`].
    fn inspect_container<'a>(&'a self, container_id: &'a str)
    -> EngineFuture<'a, ContainerStatus>;

    /// Remove a container, forcing removal even if it is still running.
    fn remove_container<'a>(&'a self, container_id: &'a str) -> EngineFuture<'a, ()>;
}
