// src/exec/mod.rs

//! Container run pipeline.
//!
//! One run is a single sequential pass:
//!
//! - [`provisioner`] resolves the container (create from image, or look up
//!   an existing one).
//! - [`supervisor`] starts it and polls it to a terminal outcome under a
//!   hard ceiling.
//! - [`reaper`] removes it afterwards, but only if this run created it and
//!   the job allows deletion.
//! - [`backend`] holds the shared read-only services the three stages use.

pub mod backend;
pub mod provisioner;
pub mod reaper;
pub mod supervisor;

pub use backend::Backend;
pub use provisioner::Provisioner;
pub use reaper::{reap_decision, Reaped, Reaper};
pub use supervisor::{Supervisor, SupervisorSettings, MAX_RUNNING_TIME, POLL_INTERVAL};
