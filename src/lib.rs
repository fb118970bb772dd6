// src/lib.rs

pub mod auth;
pub mod cli;
pub mod config;
pub mod container;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod job;
pub mod logging;
pub mod parse;
pub mod types;

use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::auth::CredentialTable;
use crate::cli::CliArgs;
use crate::config::{load_and_validate, ConfigFile, ContainerTarget, JobSpec};
use crate::container::DockerEngine;
use crate::exec::Backend;
use crate::fs::{FileSystem, RealFileSystem};
use crate::job::{Context, Execution, Job, RunJob};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - job file loading
/// - registry credentials (loaded once, shared read-only)
/// - the Docker engine client
/// - one independent pipeline per selected job
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)
        .with_context(|| format!("loading job file {}", args.config))?;
    let selected = select_jobs(&cfg, &args.jobs)?;

    if args.dry_run {
        print_dry_run(&selected);
        return Ok(());
    }

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let credentials = load_credentials(&cfg, fs.as_ref())?;
    let engine = DockerEngine::connect().context("connecting to docker engine")?;
    let backend = Backend::new(Arc::new(engine), Arc::new(credentials)).with_fs(fs);

    // Ctrl-C → stop waiting on containers. Containers are left as they are.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            cancel.cancel();
        });
    }

    let jobs: Vec<Arc<dyn Job>> = selected
        .into_iter()
        .map(|(name, spec)| {
            Arc::new(RunJob::new(name, spec.clone(), backend.clone())) as Arc<dyn Job>
        })
        .collect();

    let total = jobs.len();
    let reports = run_jobs(jobs, &cancel).await;
    print_summary(&reports);

    let failed = reports.iter().filter(|r| r.result.is_err()).count() + (total - reports.len());
    if failed > 0 {
        bail!("{failed} of {total} jobs failed");
    }
    Ok(())
}

/// Result of one job run.
#[derive(Debug)]
pub struct RunReport {
    pub job: String,
    pub run_id: u64,
    pub execution: Execution,
    pub result: errors::Result<()>,
}

/// Run every job once, concurrently.
///
/// Each job is its own pipeline on its own Tokio task; they share nothing
/// but what the jobs themselves share (engine client, credentials). Reports
/// come back ordered by run id. A job whose task panicked has no report.
pub async fn run_jobs(jobs: Vec<Arc<dyn Job>>, cancel: &CancellationToken) -> Vec<RunReport> {
    let mut set = JoinSet::new();

    for (index, job) in jobs.into_iter().enumerate() {
        let run_id = index as u64 + 1;
        let cancel = cancel.child_token();

        set.spawn(async move {
            let mut ctx = Context::new(job.name(), run_id).with_cancel(cancel);
            let result = job.run(&mut ctx).await;
            RunReport {
                job: ctx.job,
                run_id: ctx.run_id,
                execution: ctx.execution,
                result,
            }
        });
    }

    let mut reports = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(report) => reports.push(report),
            Err(e) => error!(error = %e, "job task panicked"),
        }
    }

    reports.sort_by_key(|r| r.run_id);
    reports
}

/// Pick the jobs named on the command line, or all jobs.
fn select_jobs<'a>(cfg: &'a ConfigFile, names: &[String]) -> Result<Vec<(&'a str, &'a JobSpec)>> {
    if names.is_empty() {
        return Ok(cfg.job.iter().map(|(n, s)| (n.as_str(), s)).collect());
    }

    names
        .iter()
        .map(|name| match cfg.job.get_key_value(name) {
            Some((n, s)) => Ok((n.as_str(), s)),
            None => bail!("job '{name}' not found in job file"),
        })
        .collect()
}

fn load_credentials(cfg: &ConfigFile, fs: &dyn FileSystem) -> Result<CredentialTable> {
    let path = match cfg.config.docker_config.clone() {
        Some(path) => path,
        None => match CredentialTable::default_path(fs) {
            Some(path) => path,
            None => {
                info!("no docker config location known; pulls are unauthenticated");
                return Ok(CredentialTable::new());
            }
        },
    };

    CredentialTable::load(fs, &path)
        .with_context(|| format!("loading registry credentials from {}", path.display()))
}

fn print_summary(reports: &[RunReport]) {
    for report in reports {
        let duration = report
            .execution
            .duration()
            .map(|d| format!("{:.1}s", d.as_secs_f64()))
            .unwrap_or_else(|| "-".to_string());

        match &report.result {
            Ok(()) => println!("{}: ok ({duration})", report.job),
            Err(e) => println!("{}: FAILED ({duration}): {e}", report.job),
        }
    }
}

/// Simple dry-run output: print jobs and what each would do.
fn print_dry_run(jobs: &[(&str, &JobSpec)]) {
    println!("runjob dry-run");
    println!();

    println!("jobs ({}):", jobs.len());
    for (name, job) in jobs {
        println!("  - {name}");
        match job.target() {
            Ok(ContainerTarget::Image(image)) => {
                println!("      image: {image}");
                println!("      command: {}", job.command);
                println!("      user: {}", job.user);
                if job.tty {
                    println!("      tty: true");
                }
                println!("      delete: {}", job.delete);
            }
            Ok(ContainerTarget::Existing(container)) => {
                println!("      container: {container}");
            }
            Err(e) => println!("      invalid: {e}"),
        }
        if let Some(network) = job.network() {
            println!("      network: {network}");
        }
        if let Some(volumes) = job.volumes() {
            println!("      volumes: {volumes}");
        }
        if let Some(env) = job.env() {
            println!("      env: {env}");
        }
        if let Some(files) = job.env_files() {
            println!("      env-files: {files}");
        }
    }
}
