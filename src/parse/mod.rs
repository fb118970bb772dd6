// src/parse/mod.rs

//! Parsers for the small string grammars in a job definition:
//! image references, volume mounts and environment entries.

pub mod env;
pub mod image;
pub mod volumes;

pub use env::{parse_env_entries, parse_env_files, parse_inline_env, resolve_env, EnvEntry};
pub use image::{parse_image_reference, ImageReference, DEFAULT_TAG};
pub use volumes::{parse_volumes, VolumeMount};
