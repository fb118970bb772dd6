// src/parse/image.rs

//! Image reference parsing.
//!
//! Accepted forms:
//!
//! ```text
//! repo
//! repo:tag
//! registry[:port]/repo
//! registry[:port]/repo:tag
//! ```
//!
//! A `:tag` suffix only counts when it appears after the last `/`, so the
//! port in `localhost:5000/app` is never mistaken for a tag. The segment
//! before the first `/` is a registry host when it contains a `.` or a `:`.

use std::fmt;
use std::str::FromStr;

use crate::auth::{CredentialTable, RegistryCredentials};
use crate::errors::{Result, RunJobError};

/// Tag used when the reference does not carry one.
pub const DEFAULT_TAG: &str = "latest";

/// A parsed `[registry[:port]/]repo[:tag]` reference.
///
/// `repository` is the name the engine pulls, so it keeps the registry
/// prefix: `quay.io:5000/srcd/rest:qux` has registry `quay.io:5000` and
/// repository `quay.io:5000/srcd/rest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub registry: String,
    pub repository: String,
    pub tag: String,
}

impl ImageReference {
    pub fn has_registry(&self) -> bool {
        !self.registry.is_empty()
    }

    /// Credentials for this reference's registry, if the table has any.
    ///
    /// References without a registry are pulled unauthenticated.
    pub fn credentials<'a>(&self, table: &'a CredentialTable) -> Option<&'a RegistryCredentials> {
        if !self.has_registry() {
            return None;
        }
        table.lookup(&self.registry)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

impl FromStr for ImageReference {
    type Err = RunJobError;

    fn from_str(s: &str) -> Result<Self> {
        parse_image_reference(s)
    }
}

pub fn parse_image_reference(image: &str) -> Result<ImageReference> {
    let image = image.trim();
    let invalid = || RunJobError::SpecParse {
        kind: "image",
        entry: image.to_string(),
        expected: "[registry[:port]/]repo[:tag]",
    };

    let last_slash = image.rfind('/');
    let (repository, tag) = match image.rfind(':') {
        Some(colon) if last_slash.is_none_or(|slash| colon > slash) => {
            (&image[..colon], &image[colon + 1..])
        }
        _ => (image, DEFAULT_TAG),
    };

    if repository.is_empty() || tag.is_empty() {
        return Err(invalid());
    }

    let (registry, path) = match repository.split_once('/') {
        Some((host, rest)) if host.contains('.') || host.contains(':') => (host, rest),
        _ => ("", repository),
    };

    // Only the registry may carry a port; digests are not supported.
    if path.is_empty() || path.contains([':', '@']) {
        return Err(invalid());
    }

    Ok(ImageReference {
        registry: registry.to_string(),
        repository: repository.to_string(),
        tag: tag.to_string(),
    })
}
