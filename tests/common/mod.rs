#![allow(dead_code, unused_imports)]

use std::io::Write;

use tempfile::NamedTempFile;

pub use runjob_test_utils::{fake_backend, fast_settings, init_tracing, with_timeout};

/// Write `contents` to a temporary job file that lives as long as the
/// returned handle.
pub fn job_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}
