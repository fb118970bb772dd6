// src/auth.rs

//! Registry credential table.
//!
//! The table is loaded once at startup from a Docker client config file and
//! is read-only afterwards. It is passed explicitly to whoever needs it.
//!
//! Two file layouts are understood:
//!
//! ```json
//! { "auths": { "quay.io": { "auth": "dXNlcjpwYXNz", "email": "me@example.com" } } }
//! ```
//!
//! and the legacy `~/.dockercfg` layout, which is the inner `auths` map on
//! its own.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::{Result, RunJobError};
use crate::fs::FileSystem;

/// Credentials for one registry host.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub identity_token: Option<String>,
    pub server_address: String,
}

// Hand-written so passwords and tokens never end up in logs.
impl std::fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("server_address", &self.server_address)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default, Deserialize)]
struct AuthEntry {
    #[serde(default)]
    auth: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    identitytoken: Option<String>,
}

/// Registry host → credentials.
#[derive(Debug, Clone, Default)]
pub struct CredentialTable {
    entries: HashMap<String, RegistryCredentials>,
}

impl CredentialTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, registry: &str, credentials: RegistryCredentials) {
        self.entries.insert(normalize_registry(registry), credentials);
    }

    pub fn lookup(&self, registry: &str) -> Option<&RegistryCredentials> {
        self.entries.get(&normalize_registry(registry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse the contents of a Docker config file (either layout).
    pub fn from_docker_config(contents: &str) -> Result<Self> {
        let invalid = |e: serde_json::Error| {
            RunJobError::ConfigError(format!("invalid docker config: {e}"))
        };

        let mut value: serde_json::Value = serde_json::from_str(contents).map_err(invalid)?;
        let auths_section = value.as_object_mut().and_then(|obj| obj.remove("auths"));
        let auths: HashMap<String, AuthEntry> = match auths_section {
            Some(auths) => serde_json::from_value(auths).map_err(invalid)?,
            // Legacy layout, or a config that only names a credential store.
            None => serde_json::from_value(value).unwrap_or_default(),
        };

        let mut table = Self::new();
        for (server, entry) in auths {
            if let Some(credentials) = decode_entry(&server, entry)? {
                table.insert(&server, credentials);
            }
        }
        Ok(table)
    }

    /// Load the table from `path`. A missing file yields an empty table.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        if !fs.is_file(path) {
            debug!(path = %path.display(), "no docker config found; pulls are unauthenticated");
            return Ok(Self::new());
        }

        let contents = fs.read_to_string(path)?;
        let table = Self::from_docker_config(&contents)?;
        info!(
            path = %path.display(),
            registries = table.len(),
            "loaded registry credentials"
        );
        Ok(table)
    }

    /// Default location of the Docker client config.
    ///
    /// `$DOCKER_CONFIG/config.json`, then `$HOME/.docker/config.json`, then
    /// the legacy `$HOME/.dockercfg`.
    pub fn default_path(fs: &dyn FileSystem) -> Option<PathBuf> {
        if let Ok(dir) = std::env::var("DOCKER_CONFIG") {
            return Some(PathBuf::from(dir).join("config.json"));
        }

        let home = PathBuf::from(std::env::var("HOME").ok()?);
        let current = home.join(".docker").join("config.json");
        let legacy = home.join(".dockercfg");
        if !fs.is_file(&current) && fs.is_file(&legacy) {
            return Some(legacy);
        }
        Some(current)
    }
}

fn decode_entry(server: &str, entry: AuthEntry) -> Result<Option<RegistryCredentials>> {
    let (username, password) = match (entry.username, entry.password, entry.auth) {
        (Some(user), Some(pass), _) => (user, pass),
        (_, _, Some(auth)) if !auth.is_empty() => {
            let invalid = || RunJobError::ConfigError(format!("invalid auth for registry {server:?}"));
            let decoded = STANDARD.decode(auth.trim()).map_err(|_| invalid())?;
            let decoded = String::from_utf8(decoded).map_err(|_| invalid())?;
            let (user, pass) = decoded.split_once(':').ok_or_else(invalid)?;
            (user.to_string(), pass.to_string())
        }
        // Entries managed by a credential helper carry no inline secret.
        _ if entry.identitytoken.is_none() => return Ok(None),
        _ => (String::new(), String::new()),
    };

    Ok(Some(RegistryCredentials {
        username,
        password,
        email: entry.email.filter(|e| !e.is_empty()),
        identity_token: entry.identitytoken.filter(|t| !t.is_empty()),
        server_address: server.to_string(),
    }))
}

/// `https://quay.io/v1/` and `quay.io` name the same registry.
fn normalize_registry(registry: &str) -> String {
    let host = registry
        .strip_prefix("https://")
        .or_else(|| registry.strip_prefix("http://"))
        .unwrap_or(registry);
    host.split('/').next().unwrap_or(host).to_lowercase()
}
