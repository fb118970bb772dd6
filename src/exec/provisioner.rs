// src/exec/provisioner.rs

//! Resolve the container a job runs in.
//!
//! Either a fresh container is created from the job's image (pull, parse
//! env/volumes, create, optionally attach to a network), or an existing
//! container is looked up by id. Only the first path yields an owned handle.

use tracing::{debug, info, warn};

use crate::config::{ContainerTarget, JobSpec};
use crate::container::{ContainerSpec, EngineError};
use crate::errors::{Result, RunJobError};
use crate::exec::backend::Backend;
use crate::parse::{parse_image_reference, parse_volumes, resolve_env, ImageReference};
use crate::types::ContainerHandle;

pub struct Provisioner<'a> {
    backend: &'a Backend,
}

impl<'a> Provisioner<'a> {
    pub fn new(backend: &'a Backend) -> Self {
        Self { backend }
    }

    /// Produce the container handle for `spec`.
    ///
    /// A spec with neither `image` nor `container` fails before any engine
    /// call is made.
    pub async fn provision(&self, spec: &JobSpec) -> Result<ContainerHandle> {
        match spec.target()? {
            ContainerTarget::Image(image) => self.build_container(spec, image).await,
            ContainerTarget::Existing(container) => self.lookup_container(container).await,
        }
    }

    async fn pull_image(&self, image: &str) -> Result<ImageReference> {
        let reference = parse_image_reference(image)?;
        let credentials = reference.credentials(&self.backend.credentials);

        info!(
            image = %reference,
            registry = %reference.registry,
            authenticated = credentials.is_some(),
            "pulling image"
        );

        self.backend
            .engine
            .pull_image(&reference, credentials)
            .await
            .map_err(|source| RunJobError::ImagePull {
                image: image.to_string(),
                source,
            })?;

        Ok(reference)
    }

    async fn build_container(&self, spec: &JobSpec, image: &str) -> Result<ContainerHandle> {
        self.pull_image(image).await?;

        let env = resolve_env(self.backend.fs.as_ref(), spec.env(), spec.env_files())?;
        let mounts = match spec.volumes() {
            Some(volumes) => parse_volumes(volumes)?,
            None => Vec::new(),
        };
        let argv = shell_words::split(&spec.command).map_err(|e| {
            RunJobError::ConfigError(format!("invalid command {:?}: {}", spec.command, e))
        })?;

        let container_spec = ContainerSpec {
            image: image.to_string(),
            user: spec.user.clone(),
            tty: spec.tty,
            argv,
            env,
            mounts,
        };
        debug!(?container_spec, "creating container");

        let id = self
            .backend
            .engine
            .create_container(&container_spec)
            .await
            .map_err(|source| RunJobError::ContainerCreate {
                image: image.to_string(),
                source,
            })?;

        info!(container = %id, image, "created container");

        if let Some(network) = spec.network() {
            // The container is not rolled back on failure; the error names it
            // so it can still be inspected.
            self.attach_network(network, &id).await?;
        }

        Ok(ContainerHandle::created(id))
    }

    /// Connect the container to every network whose name is exactly `network`.
    async fn attach_network(&self, network: &str, container_id: &str) -> Result<()> {
        let connect_error = |source: EngineError| RunJobError::NetworkConnect {
            network: network.to_string(),
            container: container_id.to_string(),
            source,
        };

        let networks = self
            .backend
            .engine
            .list_networks(network)
            .await
            .map_err(connect_error)?;

        let matching: Vec<_> = networks.into_iter().filter(|n| n.name == network).collect();
        if matching.is_empty() {
            warn!(network, container = %container_id, "no network with this name; not attaching");
            return Ok(());
        }

        for net in matching {
            self.backend
                .engine
                .connect_network(&net.id, container_id)
                .await
                .map_err(connect_error)?;
            info!(network, network_id = %net.id, container = %container_id, "connected container to network");
        }

        Ok(())
    }

    async fn lookup_container(&self, container: &str) -> Result<ContainerHandle> {
        let status = self
            .backend
            .engine
            .inspect_container(container)
            .await
            .map_err(|source| RunJobError::ContainerLookup {
                container: container.to_string(),
                source,
            })?;

        debug!(container, running = status.running, "found existing container");
        Ok(ContainerHandle::existing(container))
    }
}
