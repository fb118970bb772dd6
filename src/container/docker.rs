// src/container/docker.rs

//! `ContainerEngine` backed by the Docker Engine API via `bollard`.

use std::collections::HashMap;

use bollard::Docker;
use bollard::auth::DockerCredentials;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, RemoveContainerOptions,
    StartContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::image::CreateImageOptions;
use bollard::models::HostConfig;
use bollard::network::{ConnectNetworkOptions, ListNetworksOptions};
use futures_util::TryStreamExt;
use tracing::{debug, info};

use super::{
    ContainerEngine, ContainerSpec, ContainerStatus, EngineError, EngineFuture, NetworkSummary,
};
use crate::auth::RegistryCredentials;
use crate::parse::ImageReference;

/// Docker engine client.
///
/// Cloning is cheap and clones share the underlying connection pool, so one
/// engine can serve any number of concurrent job runs.
#[derive(Debug, Clone)]
pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    /// Connect using the local defaults (unix socket or named pipe, or
    /// whatever `DOCKER_HOST` points at).
    pub fn connect() -> Result<Self, EngineError> {
        let docker = Docker::connect_with_local_defaults()?;
        info!("connected to docker engine");
        Ok(Self { docker })
    }
}

impl ContainerEngine for DockerEngine {
    fn pull_image<'a>(
        &'a self,
        image: &'a ImageReference,
        credentials: Option<&'a RegistryCredentials>,
    ) -> EngineFuture<'a, ()> {
        Box::pin(async move {
            let options = CreateImageOptions {
                from_image: image.repository.clone(),
                tag: image.tag.clone(),
                ..Default::default()
            };

            let mut stream = std::pin::pin!(self.docker.create_image(
                Some(options),
                None,
                credentials.map(docker_credentials),
            ));

            while let Some(progress) = stream.try_next().await? {
                if let Some(status) = progress.status {
                    debug!(image = %image, %status, "pull progress");
                }
            }

            Ok(())
        })
    }

    fn create_container<'a>(&'a self, spec: &'a ContainerSpec) -> EngineFuture<'a, String> {
        Box::pin(async move {
            let binds: Vec<String> = spec.mounts.iter().map(|m| m.to_bind()).collect();

            let config = Config {
                image: Some(spec.image.clone()),
                user: Some(spec.user.clone()),
                tty: Some(spec.tty),
                cmd: (!spec.argv.is_empty()).then(|| spec.argv.clone()),
                env: Some(spec.env.iter().map(|e| e.as_str().to_string()).collect()),
                attach_stdin: Some(false),
                attach_stdout: Some(true),
                attach_stderr: Some(true),
                host_config: Some(HostConfig {
                    binds: (!binds.is_empty()).then_some(binds),
                    ..Default::default()
                }),
                ..Default::default()
            };

            let response = self
                .docker
                .create_container(None::<CreateContainerOptions<String>>, config)
                .await?;

            Ok(response.id)
        })
    }

    fn list_networks<'a>(&'a self, name: &'a str) -> EngineFuture<'a, Vec<NetworkSummary>> {
        Box::pin(async move {
            let mut filters = HashMap::new();
            filters.insert("name".to_string(), vec![name.to_string()]);

            let networks = self
                .docker
                .list_networks(Some(ListNetworksOptions { filters }))
                .await?;

            Ok(networks
                .into_iter()
                .filter_map(|n| {
                    Some(NetworkSummary {
                        id: n.id?,
                        name: n.name.unwrap_or_default(),
                    })
                })
                .collect())
        })
    }

    fn connect_network<'a>(
        &'a self,
        network_id: &'a str,
        container_id: &'a str,
    ) -> EngineFuture<'a, ()> {
        Box::pin(async move {
            let options = ConnectNetworkOptions {
                container: container_id.to_string(),
                endpoint_config: Default::default(),
            };
            self.docker.connect_network(network_id, options).await?;
            Ok(())
        })
    }

    fn start_container<'a>(&'a self, container_id: &'a str) -> EngineFuture<'a, ()> {
        Box::pin(async move {
            self.docker
                .start_container(container_id, None::<StartContainerOptions<String>>)
                .await?;
            Ok(())
        })
    }

    fn inspect_container<'a>(
        &'a self,
        container_id: &'a str,
    ) -> EngineFuture<'a, ContainerStatus> {
        Box::pin(async move {
            let response = self
                .docker
                .inspect_container(container_id, None::<InspectContainerOptions>)
                .await
                .map_err(|e| match e {
                    BollardError::DockerResponseServerError {
                        status_code: 404, ..
                    } => EngineError::NotFound(container_id.to_string()),
                    other => EngineError::Docker(other),
                })?;

            let state = response.state.unwrap_or_default();
            Ok(ContainerStatus {
                running: state.running.unwrap_or(false),
                // No recorded exit code is reported the same way the engine
                // reports a killed process.
                exit_code: state.exit_code.unwrap_or(-1),
            })
        })
    }

    fn remove_container<'a>(&'a self, container_id: &'a str) -> EngineFuture<'a, ()> {
        Box::pin(async move {
            self.docker
                .remove_container(
                    container_id,
                    Some(RemoveContainerOptions {
                        force: true,
                        ..Default::default()
                    }),
                )
                .await?;
            Ok(())
        })
    }
}

fn docker_credentials(credentials: &RegistryCredentials) -> DockerCredentials {
    DockerCredentials {
        username: Some(credentials.username.clone()),
        password: Some(credentials.password.clone()),
        email: credentials.email.clone(),
        serveraddress: Some(credentials.server_address.clone()),
        identitytoken: credentials.identity_token.clone(),
        ..Default::default()
    }
}
