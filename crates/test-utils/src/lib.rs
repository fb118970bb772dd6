pub mod builders;
pub mod fake_engine;

use std::sync::{Arc, Once};
use std::time::Duration;

use runjob::auth::CredentialTable;
use runjob::exec::{Backend, SupervisorSettings};
use runjob::fs::mock::MockFileSystem;
use tracing_subscriber::{fmt, EnvFilter};

use crate::fake_engine::FakeEngine;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
///
/// Don't wrap runs that sleep through long virtual time under
/// `start_paused`; the timeout shares the paused clock.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Poll every 10ms, give up after 1s.
pub fn fast_settings() -> SupervisorSettings {
    SupervisorSettings {
        poll_interval: Duration::from_millis(10),
        ceiling: Duration::from_secs(1),
    }
}

/// Backend around a fake engine, an in-memory filesystem, no credentials
/// and [`fast_settings`].
pub fn fake_backend(engine: &Arc<FakeEngine>, fs: &MockFileSystem) -> Backend {
    Backend::new(engine.clone(), Arc::new(CredentialTable::new()))
        .with_fs(Arc::new(fs.clone()))
        .with_supervisor_settings(fast_settings())
}
