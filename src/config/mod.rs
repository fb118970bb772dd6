// src/config/mod.rs

//! Job file loading and validation.
//!
//! - `model.rs`: the TOML-backed data model, including [`JobSpec`].
//! - `loader.rs`: reading a job file from disk.
//! - `validate.rs`: per-job checks run before anything touches the engine.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{ConfigFile, ConfigSection, ContainerTarget, JobSpec, RawConfigFile};
pub use validate::validate_job;
