// tests/run_job.rs

mod common;
use crate::common::{fake_backend, init_tracing};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use runjob::errors::RunJobError;
use runjob::fs::mock::MockFileSystem;
use runjob::job::{Context, Job, RunJob};
use runjob::run_jobs;
use runjob::types::ExecutionOutcome;
use runjob_test_utils::builders::JobSpecBuilder;
use runjob_test_utils::fake_engine::{Behaviour, EngineCall, FakeEngine, Operation};

fn engine_with(behaviour: Behaviour) -> Arc<FakeEngine> {
    Arc::new(FakeEngine::new().with_behaviour(behaviour))
}

#[tokio::test(start_paused = true)]
async fn successful_run_removes_its_container() {
    init_tracing();

    let engine = engine_with(Behaviour::ExitAfter { polls: 3, code: 0 });
    let backend = fake_backend(&engine, &MockFileSystem::new());
    let job = RunJob::new("hello", JobSpecBuilder::image("busybox", "echo hi").build(), backend);

    let mut ctx = Context::new("hello", 1);
    job.run(&mut ctx).await.unwrap();

    assert_eq!(engine.removed(), vec!["fake-1".to_string()]);
    assert_eq!(ctx.execution.container(), Some("fake-1"));
    assert_eq!(ctx.execution.outcome(), Some(ExecutionOutcome::Succeeded));
    assert!(ctx.execution.duration().is_some());
    assert!(!ctx.execution.failed());
    assert!(!ctx.execution.is_running());

    let order: Vec<Operation> = engine
        .calls()
        .iter()
        .map(|c| match c {
            EngineCall::Pull { .. } => Operation::Pull,
            EngineCall::Create(_) => Operation::Create,
            EngineCall::Start(_) => Operation::Start,
            EngineCall::Inspect(_) => Operation::Inspect,
            EngineCall::Remove(_) => Operation::Remove,
            other => panic!("unexpected call {other:?}"),
        })
        .collect();
    assert_eq!(
        order,
        vec![
            Operation::Pull,
            Operation::Create,
            Operation::Start,
            Operation::Inspect,
            Operation::Inspect,
            Operation::Inspect,
            Operation::Inspect,
            Operation::Remove,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn delete_false_keeps_the_container() {
    let engine = engine_with(Behaviour::ExitAfter { polls: 0, code: 0 });
    let backend = fake_backend(&engine, &MockFileSystem::new());
    let spec = JobSpecBuilder::image("busybox", "true").delete(false).build();
    let job = RunJob::new("keep", spec, backend);

    job.run(&mut Context::new("keep", 1)).await.unwrap();

    assert!(engine.removed().is_empty());
    assert!(engine.exists("fake-1"));
}

#[tokio::test(start_paused = true)]
async fn supplied_container_is_started_but_never_removed() {
    let engine = Arc::new(
        FakeEngine::new().with_container("nightly", Behaviour::ExitAfter { polls: 1, code: 0 }),
    );
    let backend = fake_backend(&engine, &MockFileSystem::new());
    let job = RunJob::new("nightly", JobSpecBuilder::container("nightly").build(), backend);

    let mut ctx = Context::new("nightly", 1);
    job.run(&mut ctx).await.unwrap();

    assert_eq!(ctx.execution.container(), Some("nightly"));
    assert_eq!(engine.count(Operation::Pull), 0);
    assert_eq!(engine.count(Operation::Create), 0);
    assert_eq!(engine.count(Operation::Start), 1);
    assert!(engine.removed().is_empty());
}

#[tokio::test(start_paused = true)]
async fn non_zero_exit_fails_and_keeps_the_container() {
    let engine = engine_with(Behaviour::ExitAfter { polls: 1, code: 7 });
    let backend = fake_backend(&engine, &MockFileSystem::new());
    let job = RunJob::new("fails", JobSpecBuilder::image("busybox", "exit 7").build(), backend);

    let mut ctx = Context::new("fails", 1);
    let err = job.run(&mut ctx).await.unwrap_err();

    match &err {
        RunJobError::NonZeroExit { container, code } => {
            assert_eq!(container, "fake-1");
            assert_eq!(*code, 7);
        }
        other => panic!("expected NonZeroExit, got {other:?}"),
    }
    assert!(err.is_job_failure());
    assert_eq!(ctx.execution.outcome(), Some(ExecutionOutcome::FailedWithCode(7)));
    assert!(ctx.execution.failed());
    assert!(engine.exists("fake-1"));
    assert!(engine.removed().is_empty());
}

#[tokio::test(start_paused = true)]
async fn killed_container_is_kept() {
    let engine = engine_with(Behaviour::ExitAfter { polls: 0, code: -1 });
    let backend = fake_backend(&engine, &MockFileSystem::new());
    let job = RunJob::new("killed", JobSpecBuilder::image("busybox", "sleep 5").build(), backend);

    let err = job.run(&mut Context::new("killed", 1)).await.unwrap_err();

    assert!(matches!(err, RunJobError::KilledOrUnexpected { .. }));
    assert!(engine.removed().is_empty());
}

#[tokio::test(start_paused = true)]
async fn timed_out_container_is_kept() {
    let engine = engine_with(Behaviour::NeverExits);
    let backend = fake_backend(&engine, &MockFileSystem::new());
    let job = RunJob::new("hangs", JobSpecBuilder::image("busybox", "sleep inf").build(), backend);

    let mut ctx = Context::new("hangs", 1);
    let err = job.run(&mut ctx).await.unwrap_err();

    assert!(matches!(err, RunJobError::TimedOut { .. }));
    assert_eq!(ctx.execution.outcome(), Some(ExecutionOutcome::TimedOut));
    assert!(engine.exists("fake-1"));
}

#[tokio::test(start_paused = true)]
async fn provisioning_failure_records_no_container() {
    let engine = Arc::new(FakeEngine::new().failing(Operation::Pull));
    let backend = fake_backend(&engine, &MockFileSystem::new());
    let job = RunJob::new("nopull", JobSpecBuilder::image("busybox", "true").build(), backend);

    let mut ctx = Context::new("nopull", 1);
    let err = job.run(&mut ctx).await.unwrap_err();

    assert!(matches!(err, RunJobError::ImagePull { .. }));
    assert!(!err.is_job_failure());
    assert_eq!(ctx.execution.container(), None);
    assert_eq!(ctx.execution.outcome(), None);
    assert!(ctx.execution.error().is_some());
}

#[tokio::test(start_paused = true)]
async fn remove_failure_fails_an_otherwise_successful_run() {
    let engine = Arc::new(FakeEngine::new().failing(Operation::Remove));
    let backend = fake_backend(&engine, &MockFileSystem::new());
    let job = RunJob::new("cleanup", JobSpecBuilder::image("busybox", "true").build(), backend);

    let mut ctx = Context::new("cleanup", 1);
    let err = job.run(&mut ctx).await.unwrap_err();

    assert!(matches!(err, RunJobError::Remove { .. }));
    assert_eq!(ctx.execution.outcome(), Some(ExecutionOutcome::Succeeded));
}

#[test]
fn job_exposes_name_and_command() {
    let engine = Arc::new(FakeEngine::new());
    let backend = fake_backend(&engine, &MockFileSystem::new());
    let job = RunJob::new("report", JobSpecBuilder::image("busybox", "make report").build(), backend);

    let job: &dyn Job = &job;
    assert_eq!(job.name(), "report");
    assert_eq!(job.command(), "make report");
}

#[tokio::test(start_paused = true)]
async fn jobs_run_independently_and_report_in_order() {
    init_tracing();

    let engine = engine_with(Behaviour::ExitAfter { polls: 2, code: 0 });
    let backend = fake_backend(&engine, &MockFileSystem::new());

    let jobs: Vec<Arc<dyn Job>> = vec![
        Arc::new(RunJob::new(
            "first",
            JobSpecBuilder::image("busybox", "true").build(),
            backend.clone(),
        )),
        Arc::new(RunJob::new(
            "broken",
            JobSpecBuilder::container("missing").build(),
            backend.clone(),
        )),
        Arc::new(RunJob::new(
            "third",
            JobSpecBuilder::image("alpine:3.20", "true").build(),
            backend,
        )),
    ];

    let reports = run_jobs(jobs, &CancellationToken::new()).await;

    let summary: Vec<(&str, u64, bool)> = reports
        .iter()
        .map(|r| (r.job.as_str(), r.run_id, r.result.is_ok()))
        .collect();
    assert_eq!(
        summary,
        vec![("first", 1, true), ("broken", 2, false), ("third", 3, true)]
    );
    assert!(matches!(
        reports[1].result,
        Err(RunJobError::ContainerLookup { .. })
    ));
    assert_eq!(engine.removed().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn cancelling_the_run_abandons_supervision() {
    let engine = engine_with(Behaviour::NeverExits);
    let backend = fake_backend(&engine, &MockFileSystem::new());

    let jobs: Vec<Arc<dyn Job>> = vec![Arc::new(RunJob::new(
        "forever",
        JobSpecBuilder::image("busybox", "sleep inf").build(),
        backend,
    ))];

    let cancel = CancellationToken::new();
    cancel.cancel();
    let reports = run_jobs(jobs, &cancel).await;

    assert_eq!(reports.len(), 1);
    assert!(matches!(
        reports[0].result,
        Err(RunJobError::Cancelled { .. })
    ));
    // Cancelled runs leave their container alone.
    assert!(engine.exists("fake-1"));
    assert!(engine.removed().is_empty());
}
