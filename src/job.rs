// src/job.rs

//! Runnable jobs.
//!
//! Every job kind implements [`Job`]: given a per-run [`Context`] it performs
//! one run and returns a single terminal result. [`RunJob`] is the
//! container-run kind; other kinds (exec in a running container, local
//! commands) plug in behind the same trait.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::JobSpec;
use crate::errors::Result;
use crate::exec::{Backend, Provisioner, Reaper, Supervisor};
use crate::types::ExecutionOutcome;

pub type JobFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

pub trait Job: Send + Sync {
    fn name(&self) -> &str;

    fn command(&self) -> &str;

    /// Perform one run. `Ok(())` means the run succeeded.
    fn run<'a>(&'a self, ctx: &'a mut Context) -> JobFuture<'a>;
}

/// Per-run state handed to [`Job::run`].
#[derive(Debug)]
pub struct Context {
    pub job: String,
    pub run_id: u64,
    pub execution: Execution,
    /// Fires to abandon supervision early. Nothing in the pipeline cancels
    /// on its own; the CLI wires this to Ctrl-C.
    pub cancel: CancellationToken,
}

impl Context {
    pub fn new(job: impl Into<String>, run_id: u64) -> Self {
        Self {
            job: job.into(),
            run_id,
            execution: Execution::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Record of a single run.
#[derive(Debug, Clone, Default)]
pub struct Execution {
    started_at: Option<Instant>,
    duration: Option<Duration>,
    container: Option<String>,
    outcome: Option<ExecutionOutcome>,
    error: Option<String>,
}

impl Execution {
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
        self.duration = None;
        self.error = None;
    }

    pub fn finish(&mut self, result: &Result<()>) {
        self.duration = self.started_at.map(|start| start.elapsed());
        self.error = result.as_ref().err().map(|e| e.to_string());
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some() && self.duration.is_none()
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Id of the container the run used, once provisioning succeeded.
    pub fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }

    /// Terminal classification, once supervision finished.
    pub fn outcome(&self) -> Option<ExecutionOutcome> {
        self.outcome
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Run a command in a container: provision, supervise, reap.
#[derive(Debug, Clone)]
pub struct RunJob {
    name: String,
    spec: JobSpec,
    backend: Backend,
}

impl RunJob {
    pub fn new(name: impl Into<String>, spec: JobSpec, backend: Backend) -> Self {
        Self {
            name: name.into(),
            spec,
            backend,
        }
    }

    pub fn spec(&self) -> &JobSpec {
        &self.spec
    }

    async fn execute(&self, ctx: &mut Context) -> Result<()> {
        let engine = self.backend.engine.as_ref();

        let handle = Provisioner::new(&self.backend).provision(&self.spec).await?;
        ctx.execution.container = Some(handle.id.clone());

        let outcome = Supervisor::new(engine, self.backend.supervisor)
            .supervise(&handle, &ctx.cancel)
            .await?;
        ctx.execution.outcome = Some(outcome);

        if outcome.is_success() {
            Reaper::new(engine).reap(&handle, self.spec.delete).await?;
        } else {
            warn!(
                job = %ctx.job,
                run_id = ctx.run_id,
                container = %handle.id,
                %outcome,
                "keeping container for inspection"
            );
        }

        outcome.into_result(&handle.id, self.backend.supervisor.ceiling)
    }
}

impl Job for RunJob {
    fn name(&self) -> &str {
        &self.name
    }

    fn command(&self) -> &str {
        &self.spec.command
    }

    fn run<'a>(&'a self, ctx: &'a mut Context) -> JobFuture<'a> {
        Box::pin(async move {
            info!(job = %ctx.job, run_id = ctx.run_id, command = %self.spec.command, "starting job run");
            ctx.execution.start();

            let result = self.execute(ctx).await;
            ctx.execution.finish(&result);

            match &result {
                Ok(()) => info!(
                    job = %ctx.job,
                    run_id = ctx.run_id,
                    duration = ?ctx.execution.duration(),
                    "job run succeeded"
                ),
                Err(err) => error!(
                    job = %ctx.job,
                    run_id = ctx.run_id,
                    duration = ?ctx.execution.duration(),
                    error = %err,
                    "job run failed"
                ),
            }

            result
        })
    }
}
