// tests/supervisor.rs

mod common;
use crate::common::{fast_settings, init_tracing};

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use runjob::errors::RunJobError;
use runjob::exec::{Supervisor, SupervisorSettings, MAX_RUNNING_TIME, POLL_INTERVAL};
use runjob::types::{ContainerHandle, ExecutionOutcome};
use runjob_test_utils::fake_engine::{Behaviour, FakeEngine, Operation};

async fn supervise(engine: &FakeEngine, container: &str) -> Result<ExecutionOutcome, RunJobError> {
    Supervisor::new(engine, fast_settings())
        .supervise(&ContainerHandle::created(container), &CancellationToken::new())
        .await
}

#[test]
fn production_timing_is_fixed() {
    let settings = SupervisorSettings::default();
    assert_eq!(settings.poll_interval, POLL_INTERVAL);
    assert_eq!(settings.ceiling, MAX_RUNNING_TIME);
    assert_eq!(POLL_INTERVAL, Duration::from_millis(100));
    assert_eq!(MAX_RUNNING_TIME, Duration::from_secs(24 * 60 * 60));
}

#[test]
fn exit_codes_classify_outcomes() {
    assert_eq!(ExecutionOutcome::from_exit_code(0), ExecutionOutcome::Succeeded);
    assert_eq!(
        ExecutionOutcome::from_exit_code(-1),
        ExecutionOutcome::KilledOrUnexpected
    );
    assert_eq!(
        ExecutionOutcome::from_exit_code(7),
        ExecutionOutcome::FailedWithCode(7)
    );
    assert_eq!(
        ExecutionOutcome::from_exit_code(137),
        ExecutionOutcome::FailedWithCode(137)
    );
}

#[tokio::test(start_paused = true)]
async fn exit_zero_is_success() {
    init_tracing();

    let engine = FakeEngine::new().with_container("c", Behaviour::ExitAfter { polls: 2, code: 0 });
    let outcome = supervise(&engine, "c").await.unwrap();

    assert_eq!(outcome, ExecutionOutcome::Succeeded);
    assert_eq!(engine.count(Operation::Start), 1);
    // Two polls see it running, the third sees it stopped.
    assert_eq!(engine.count(Operation::Inspect), 3);
}

#[tokio::test(start_paused = true)]
async fn exit_minus_one_is_killed_or_unexpected() {
    let engine = FakeEngine::new().with_container("c", Behaviour::ExitAfter { polls: 0, code: -1 });
    assert_eq!(
        supervise(&engine, "c").await.unwrap(),
        ExecutionOutcome::KilledOrUnexpected
    );
}

#[tokio::test(start_paused = true)]
async fn other_exit_codes_are_failures() {
    let engine = FakeEngine::new().with_container("c", Behaviour::ExitAfter { polls: 5, code: 7 });
    assert_eq!(
        supervise(&engine, "c").await.unwrap(),
        ExecutionOutcome::FailedWithCode(7)
    );
}

#[tokio::test(start_paused = true)]
async fn container_past_the_ceiling_times_out() {
    let engine = FakeEngine::new().with_container("c", Behaviour::NeverExits);
    let started = Instant::now();

    let outcome = supervise(&engine, "c").await.unwrap();

    assert_eq!(outcome, ExecutionOutcome::TimedOut);
    assert!(started.elapsed() > fast_settings().ceiling);
    // 10ms polls: inspected at 10ms..=1000ms, gave up at 1010ms.
    assert_eq!(engine.count(Operation::Inspect), 100);
    // Timing out does not touch the container.
    assert!(engine.removed().is_empty());
}

#[tokio::test(start_paused = true)]
async fn container_stopping_just_before_the_ceiling_is_not_timed_out() {
    let engine = FakeEngine::new().with_container("c", Behaviour::ExitAfter { polls: 99, code: 0 });
    assert_eq!(
        supervise(&engine, "c").await.unwrap(),
        ExecutionOutcome::Succeeded
    );
}

#[tokio::test(start_paused = true)]
async fn inspect_failure_aborts_supervision() {
    let engine = FakeEngine::new()
        .with_container("c", Behaviour::NeverExits)
        .failing(Operation::Inspect);

    match supervise(&engine, "c").await {
        Err(RunJobError::PollInfra { container, .. }) => assert_eq!(container, "c"),
        other => panic!("expected PollInfra, got {other:?}"),
    }
    // Never retried.
    assert_eq!(engine.count(Operation::Inspect), 1);
}

#[tokio::test(start_paused = true)]
async fn start_failure_skips_polling() {
    let engine = FakeEngine::new()
        .with_container("c", Behaviour::NeverExits)
        .failing(Operation::Start);

    match supervise(&engine, "c").await {
        Err(RunJobError::Start { container, .. }) => assert_eq!(container, "c"),
        other => panic!("expected Start error, got {other:?}"),
    }
    assert_eq!(engine.count(Operation::Inspect), 0);
    assert!(engine.exists("c"));
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_waiting() {
    let engine = FakeEngine::new().with_container("c", Behaviour::NeverExits);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(55)).await;
        trigger.cancel();
    });

    let result = Supervisor::new(&engine, fast_settings())
        .supervise(&ContainerHandle::created("c"), &cancel)
        .await;

    match result {
        Err(RunJobError::Cancelled { container }) => assert_eq!(container, "c"),
        other => panic!("expected Cancelled, got {other:?}"),
    }
    assert_eq!(engine.count(Operation::Inspect), 5);
}

#[tokio::test(start_paused = true)]
async fn already_cancelled_token_never_polls() {
    let engine = FakeEngine::new().with_container("c", Behaviour::NeverExits);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = Supervisor::new(&engine, fast_settings())
        .supervise(&ContainerHandle::existing("c"), &cancel)
        .await;

    assert!(matches!(result, Err(RunJobError::Cancelled { .. })));
    assert_eq!(engine.count(Operation::Inspect), 0);
}
