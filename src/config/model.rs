// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::errors::{Result, RunJobError};

/// Top-level job file as read from TOML.
///
/// ```toml
/// [config]
/// docker-config = "/etc/runjob/docker.json"
///
/// [job.backup]
/// image = "quay.io/acme/backup:1.2"
/// command = "backup --all"
/// volumes = "/data:/data"
/// env = "TARGET=s3"
/// ```
///
/// This is the unvalidated form; use `ConfigFile::try_from` (or
/// [`crate::config::load_and_validate`]) before running anything.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// All jobs from `[job.<name>]`, keyed by job name.
    #[serde(default)]
    pub job: BTreeMap<String, JobSpec>,
}

/// A validated job file.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub job: BTreeMap<String, JobSpec>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(config: ConfigSection, job: BTreeMap<String, JobSpec>) -> Self {
        Self { config, job }
    }

    pub fn job(&self, name: &str) -> Option<&JobSpec> {
        self.job.get(name)
    }

    pub fn job_names(&self) -> impl Iterator<Item = &str> {
        self.job.keys().map(String::as_str)
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigSection {
    /// Docker client config holding registry credentials.
    ///
    /// If `None`, the usual Docker locations are searched.
    #[serde(default)]
    pub docker_config: Option<PathBuf>,
}

/// `[job.<name>]` section: one container run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct JobSpec {
    /// Command line, tokenized shell-style before it reaches the engine.
    #[serde(default)]
    pub command: String,

    /// Image to run a fresh container from.
    #[serde(default)]
    pub image: Option<String>,

    /// Existing container to start instead of creating one.
    #[serde(default)]
    pub container: Option<String>,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default)]
    pub tty: bool,

    /// Remove the container after a successful run. Only ever applies to
    /// containers this job created.
    #[serde(default = "default_delete")]
    pub delete: bool,

    #[serde(default)]
    pub network: Option<String>,

    /// `from:to[,from:to...]`
    #[serde(default)]
    pub volumes: Option<String>,

    /// `KEY=VALUE[,KEY=VALUE...]`
    #[serde(default)]
    pub env: Option<String>,

    /// Comma-separated env file paths (`env-files` in TOML).
    #[serde(default)]
    pub env_files: Option<String>,
}

fn default_user() -> String {
    "root".to_string()
}

fn default_delete() -> bool {
    true
}

impl Default for JobSpec {
    fn default() -> Self {
        Self {
            command: String::new(),
            image: None,
            container: None,
            user: default_user(),
            tty: false,
            delete: default_delete(),
            network: None,
            volumes: None,
            env: None,
            env_files: None,
        }
    }
}

/// Where a job's container comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerTarget<'a> {
    /// Create a new container from this image.
    Image(&'a str),
    /// Use an existing container with this id or name.
    Existing(&'a str),
}

impl JobSpec {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    pub fn image(&self) -> Option<&str> {
        non_empty(&self.image)
    }

    pub fn container(&self) -> Option<&str> {
        non_empty(&self.container)
    }

    pub fn network(&self) -> Option<&str> {
        non_empty(&self.network)
    }

    pub fn volumes(&self) -> Option<&str> {
        non_empty(&self.volumes)
    }

    pub fn env(&self) -> Option<&str> {
        non_empty(&self.env)
    }

    pub fn env_files(&self) -> Option<&str> {
        non_empty(&self.env_files)
    }

    /// Resolve the provisioning path.
    ///
    /// An image without a container creates a new container; a container
    /// reference always wins when both are present. Neither is an error.
    pub fn target(&self) -> Result<ContainerTarget<'_>> {
        match (self.image(), self.container()) {
            (_, Some(container)) => Ok(ContainerTarget::Existing(container)),
            (Some(image), None) => Ok(ContainerTarget::Image(image)),
            (None, None) => Err(RunJobError::ConfigError(
                "job must set either `image` or `container`".to_string(),
            )),
        }
    }
}

/// Trimmed value, or `None` when blank.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
