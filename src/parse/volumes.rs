// src/parse/volumes.rs

use crate::errors::{Result, RunJobError};

/// A host directory bind-mounted into the job container.
///
/// Mounts are always read-write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMount {
    pub host_path: String,
    pub container_path: String,
}

impl VolumeMount {
    pub fn new(host_path: impl Into<String>, container_path: impl Into<String>) -> Self {
        Self {
            host_path: host_path.into(),
            container_path: container_path.into(),
        }
    }

    /// Engine bind string, e.g. `/data:/data:rw`.
    pub fn to_bind(&self) -> String {
        format!("{}:{}:rw", self.host_path, self.container_path)
    }
}

/// Parse `from:to[,from:to...]` into mounts, preserving input order.
///
/// The first malformed entry fails the whole parse.
pub fn parse_volumes(spec: &str) -> Result<Vec<VolumeMount>> {
    spec.split(',').map(parse_volume_entry).collect()
}

fn parse_volume_entry(entry: &str) -> Result<VolumeMount> {
    let entry = entry.trim();
    let parts: Vec<&str> = entry.split(':').collect();

    match parts.as_slice() {
        [from, to] if !from.is_empty() && !to.is_empty() => Ok(VolumeMount::new(*from, *to)),
        _ => Err(RunJobError::SpecParse {
            kind: "volume spec",
            entry: entry.to_string(),
            expected: "from_path:to_path",
        }),
    }
}
