// tests/runtime_shutdown.rs

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};

use devloop::engine::{Orchestrator, Runtime, RuntimeEvent};
use devloop::exec::ProcessOutcome;
use devloop::pipeline::StageKind;
use devloop::types::Modes;
use devloop_test_utils::builders::default_pipeline;
use devloop_test_utils::fake_runner::FakeRunner;
use devloop_test_utils::{init_tracing, with_timeout};

#[tokio::test]
async fn ctrl_c_during_the_initial_pass_launches_nothing() {
    init_tracing();
    let gate = Arc::new(Semaphore::new(0));
    let runner = FakeRunner::gated(Arc::clone(&gate));
    let log = runner.log();
    let orchestrator = Orchestrator::new(default_pipeline(Modes::default()), runner);

    let (tx, rx) = mpsc::channel(16);
    tx.send(RuntimeEvent::ShutdownRequested).await.unwrap();

    let mut runtime = Runtime::new(orchestrator, rx);
    let result = with_timeout(runtime.initial_pass()).await;

    assert!(result.is_none());
    assert!(!log.spawned_stages().contains(&StageKind::Run));
    assert!(log.kills().is_empty());
}

#[tokio::test]
async fn ctrl_c_while_waiting_in_once_mode_stops_the_program() {
    init_tracing();
    let runner = FakeRunner::new();
    let log = runner.log();
    let orchestrator = Orchestrator::new(default_pipeline(Modes::default()), runner);

    let (tx, rx) = mpsc::channel(16);
    let mut runtime = Runtime::new(orchestrator, rx);

    let initial = with_timeout(runtime.initial_pass()).await.unwrap();
    assert!(!initial.report().unwrap().has_failures());
    assert_eq!(log.spawned_stages().last(), Some(&StageKind::Run));

    // File triggers are ignored while waiting; only shutdown ends the wait.
    tx.send(RuntimeEvent::FileChanged("src/a.ts".to_string()))
        .await
        .unwrap();
    tx.send(RuntimeEvent::ShutdownRequested).await.unwrap();

    let outcome = with_timeout(runtime.wait_for_program()).await;

    assert_eq!(outcome, None);
    assert_eq!(log.kills(), vec!["run:node".to_string()]);
    let runs = log
        .spawned_stages()
        .iter()
        .filter(|s| **s == StageKind::Run)
        .count();
    assert_eq!(runs, 1);
}

#[tokio::test]
async fn once_mode_returns_the_program_outcome_when_it_exits() {
    init_tracing();
    let runner = FakeRunner::new().with_outcome(StageKind::Run, ProcessOutcome::Success);
    let log = runner.log();
    let orchestrator = Orchestrator::new(default_pipeline(Modes::default()), runner);

    let (_tx, rx) = mpsc::channel(16);
    let mut runtime = Runtime::new(orchestrator, rx);

    with_timeout(runtime.initial_pass()).await.unwrap();
    let outcome = with_timeout(runtime.wait_for_program()).await;

    assert_eq!(outcome, Some(ProcessOutcome::Success));
    assert!(log.kills().is_empty());
}

#[tokio::test]
async fn shutdown_after_the_initial_pass_stops_the_program() {
    init_tracing();
    let runner = FakeRunner::new();
    let log = runner.log();
    let orchestrator = Orchestrator::new(default_pipeline(Modes::default()), runner);

    let (_tx, rx) = mpsc::channel(16);
    let mut runtime = Runtime::new(orchestrator, rx);

    with_timeout(runtime.initial_pass()).await.unwrap();
    assert!(log.kills().is_empty());

    runtime.shutdown().await;
    assert_eq!(log.kills(), vec!["run:node".to_string()]);
}
