// src/config/validate.rs

use crate::config::model::{ConfigFile, ContainerTarget, JobSpec, RawConfigFile};
use crate::errors::{Result, RunJobError};
use crate::parse::{parse_image_reference, parse_inline_env, parse_volumes};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::RunJobError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.job))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_jobs(cfg)?;
    for (name, job) in cfg.job.iter() {
        validate_job(job).map_err(|e| match e {
            RunJobError::ConfigError(msg) => {
                RunJobError::ConfigError(format!("job '{}': {}", name, msg))
            }
            other => other,
        })?;
    }
    Ok(())
}

fn ensure_has_jobs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.job.is_empty() {
        return Err(RunJobError::ConfigError(
            "config must contain at least one [job.<name>] section".to_string(),
        ));
    }
    Ok(())
}

/// Check a single job definition without touching the engine or the
/// filesystem.
///
/// Grammar errors in `image`, `volumes` and `env` surface here as
/// `SpecParse` errors. Env files are only read when the job runs.
pub fn validate_job(job: &JobSpec) -> Result<()> {
    if let ContainerTarget::Image(image) = job.target()? {
        if job.command.trim().is_empty() {
            return Err(RunJobError::ConfigError(
                "`command` is required when running from an image".to_string(),
            ));
        }
        shell_words::split(&job.command).map_err(|e| {
            RunJobError::ConfigError(format!("invalid command {:?}: {}", job.command, e))
        })?;
        parse_image_reference(image)?;
    }

    if let Some(volumes) = job.volumes() {
        parse_volumes(volumes)?;
    }
    if let Some(env) = job.env() {
        parse_inline_env(env)?;
    }
    if job.user.trim().is_empty() {
        return Err(RunJobError::ConfigError("`user` must not be empty".to_string()));
    }

    Ok(())
}
