// src/parse/env.rs

//! Environment variable parsing.
//!
//! Entries keep their input order and are never deduplicated. If the same
//! key appears twice, both entries reach the engine and the engine decides
//! which one wins.

use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::errors::{Result, RunJobError};
use crate::fs::FileSystem;

/// A single `KEY=VALUE` entry.
///
/// Only the first `=` separates key from value, so values may contain `=`.
/// Keys are non-empty and contain no whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvEntry(String);

impl EnvEntry {
    pub fn parse(entry: &str) -> Result<Self> {
        match entry.split_once('=') {
            Some((key, _)) if !key.is_empty() && !key.contains(char::is_whitespace) => {
                Ok(Self(entry.to_string()))
            }
            _ => Err(RunJobError::SpecParse {
                kind: "env",
                entry: entry.to_string(),
                expected: "KEY=value",
            }),
        }
    }

    pub fn key(&self) -> &str {
        self.split().0
    }

    pub fn value(&self) -> &str {
        self.split().1
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn split(&self) -> (&str, &str) {
        // Construction guarantees the separator.
        self.0.split_once('=').unwrap_or((&self.0, ""))
    }
}

impl fmt::Display for EnvEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse each line as an env entry. Any line without `=` fails the parse.
pub fn parse_env_entries<I, S>(lines: I) -> Result<Vec<EnvEntry>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .map(|line| EnvEntry::parse(line.as_ref()))
        .collect()
}

/// Parse the inline `KEY=VALUE[,KEY=VALUE...]` form. Entries are trimmed.
pub fn parse_inline_env(spec: &str) -> Result<Vec<EnvEntry>> {
    parse_env_entries(spec.split(',').map(str::trim))
}

/// Read env entries from a comma-separated list of files.
///
/// Entries are concatenated in file order, then line order. Lines are read
/// the way `docker run --env-file` reads them: leading whitespace is dropped,
/// and blank lines and `#` comments are skipped. A missing or unreadable file
/// fails the whole operation.
pub fn parse_env_files(fs: &dyn FileSystem, paths: &str) -> Result<Vec<EnvEntry>> {
    let mut entries = Vec::new();

    for path in paths.split(',').map(str::trim) {
        let path = Path::new(path);
        let contents = fs
            .read_to_string(path)
            .map_err(|source| RunJobError::EnvFile {
                path: path.to_path_buf(),
                source,
            })?;

        let lines = contents
            .lines()
            .map(str::trim_start)
            .filter(|line| !line.is_empty() && !line.starts_with('#'));

        let parsed = parse_env_entries(lines)?;
        debug!(path = %path.display(), count = parsed.len(), "loaded env file");
        entries.extend(parsed);
    }

    Ok(entries)
}

/// Combined environment for a job: inline entries first, then file entries.
pub fn resolve_env(
    fs: &dyn FileSystem,
    inline: Option<&str>,
    files: Option<&str>,
) -> Result<Vec<EnvEntry>> {
    let mut entries = match inline {
        Some(spec) if !spec.is_empty() => parse_inline_env(spec)?,
        _ => Vec::new(),
    };

    if let Some(paths) = files.filter(|p| !p.is_empty()) {
        entries.extend(parse_env_files(fs, paths)?);
    }

    Ok(entries)
}
