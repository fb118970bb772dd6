#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use runjob::config::{ConfigFile, ConfigSection, JobSpec, RawConfigFile};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                job: BTreeMap::new(),
            },
        }
    }

    pub fn with_job(mut self, name: &str, job: JobSpec) -> Self {
        self.config.job.insert(name.to_string(), job);
        self
    }

    pub fn with_docker_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.config.docker_config = Some(path.into());
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobSpec`.
pub struct JobSpecBuilder {
    job: JobSpec,
}

impl JobSpecBuilder {
    /// A job that creates a container from `image` and runs `command` in it.
    pub fn image(image: &str, command: &str) -> Self {
        Self {
            job: JobSpec {
                image: Some(image.to_string()),
                ..JobSpec::new(command)
            },
        }
    }

    /// A job that starts the existing container `container`.
    pub fn container(container: &str) -> Self {
        Self {
            job: JobSpec {
                container: Some(container.to_string()),
                ..JobSpec::default()
            },
        }
    }

    pub fn user(mut self, user: &str) -> Self {
        self.job.user = user.to_string();
        self
    }

    pub fn tty(mut self, tty: bool) -> Self {
        self.job.tty = tty;
        self
    }

    pub fn delete(mut self, delete: bool) -> Self {
        self.job.delete = delete;
        self
    }

    pub fn network(mut self, network: &str) -> Self {
        self.job.network = Some(network.to_string());
        self
    }

    pub fn volumes(mut self, volumes: &str) -> Self {
        self.job.volumes = Some(volumes.to_string());
        self
    }

    pub fn env(mut self, env: &str) -> Self {
        self.job.env = Some(env.to_string());
        self
    }

    pub fn env_files(mut self, files: &str) -> Self {
        self.job.env_files = Some(files.to_string());
        self
    }

    pub fn build(self) -> JobSpec {
        self.job
    }
}
