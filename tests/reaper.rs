// tests/reaper.rs

use runjob::errors::RunJobError;
use runjob::exec::{reap_decision, Reaped, Reaper};
use runjob::types::ContainerHandle;
use runjob_test_utils::fake_engine::{Behaviour, FakeEngine, Operation};

const STOPPED: Behaviour = Behaviour::ExitAfter { polls: 0, code: 0 };

#[test]
fn only_owned_containers_with_delete_on_are_removed() {
    let owned = ContainerHandle::created("c");
    let supplied = ContainerHandle::existing("c");

    assert_eq!(reap_decision(&owned, true), Reaped::Removed);
    assert_eq!(reap_decision(&owned, false), Reaped::KeptDeleteDisabled);
    assert_eq!(reap_decision(&supplied, true), Reaped::KeptNotOwned);
    assert_eq!(reap_decision(&supplied, false), Reaped::KeptNotOwned);
}

#[tokio::test]
async fn owned_container_is_force_removed() {
    let engine = FakeEngine::new().with_container("c", STOPPED);

    let reaped = Reaper::new(&engine)
        .reap(&ContainerHandle::created("c"), true)
        .await
        .unwrap();

    assert_eq!(reaped, Reaped::Removed);
    assert_eq!(engine.removed(), vec!["c".to_string()]);
    assert!(!engine.exists("c"));
}

#[tokio::test]
async fn supplied_container_is_never_removed() {
    let engine = FakeEngine::new().with_container("c", STOPPED);

    let reaped = Reaper::new(&engine)
        .reap(&ContainerHandle::existing("c"), true)
        .await
        .unwrap();

    assert_eq!(reaped, Reaped::KeptNotOwned);
    assert!(engine.calls().is_empty());
    assert!(engine.exists("c"));
}

#[tokio::test]
async fn delete_disabled_keeps_the_container() {
    let engine = FakeEngine::new().with_container("c", STOPPED);

    let reaped = Reaper::new(&engine)
        .reap(&ContainerHandle::created("c"), false)
        .await
        .unwrap();

    assert_eq!(reaped, Reaped::KeptDeleteDisabled);
    assert_eq!(engine.count(Operation::Remove), 0);
}

#[tokio::test]
async fn remove_failure_is_reported() {
    let engine = FakeEngine::new()
        .with_container("c", STOPPED)
        .failing(Operation::Remove);

    match Reaper::new(&engine).reap(&ContainerHandle::created("c"), true).await {
        Err(RunJobError::Remove { container, .. }) => assert_eq!(container, "c"),
        other => panic!("expected Remove error, got {other:?}"),
    }
}
