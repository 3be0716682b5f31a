//! Stage-3 fan-out: concurrency bound, failure aggregation and failure policies.

use crate::integration::test_utils::{expected_content, Scripted};
use smol_dev::error::PipelineError;
use smol_dev::pipeline::{FailurePolicy, RunConfig};
use smol_dev::types::Intent;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn config(target: &std::path::Path) -> RunConfig {
    RunConfig::new(Intent::new("a static site").unwrap(), target)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn in_flight_tasks_never_exceed_concurrency() {
    let temp = TempDir::new().unwrap();
    let files: Vec<String> = (0..9).map(|i| format!("page{}.html", i)).collect();
    let refs: Vec<&str> = files.iter().map(String::as_str).collect();

    let (orchestrator, stats) = Scripted::new(&refs)
        .with_chunk_delay(Duration::from_millis(15))
        .into_orchestrator();
    let report = orchestrator
        .run(
            &config(temp.path()).with_concurrency(3),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.written.len(), 9);
    assert_eq!(stats.generate_calls(), 9);
    assert!(stats.peak_in_flight() <= 3, "peak was {}", stats.peak_in_flight());
    assert!(stats.peak_in_flight() >= 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrency_of_one_is_sequential() {
    let temp = TempDir::new().unwrap();
    let (orchestrator, stats) = Scripted::new(&["a.rs", "b.rs", "c.rs"])
        .with_chunk_delay(Duration::from_millis(5))
        .into_orchestrator();
    orchestrator
        .run(
            &config(temp.path()).with_concurrency(1),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(stats.peak_in_flight(), 1);
}

#[tokio::test]
async fn middle_failure_is_reported_and_siblings_are_kept() {
    let temp = TempDir::new().unwrap();
    let (orchestrator, _) = Scripted::new(&["one.go", "two.go", "three.go"])
        .failing("two.go")
        .into_orchestrator();
    let result = orchestrator
        .run(
            &config(temp.path())
                .with_concurrency(5)
                .with_failure_policy(FailurePolicy::Continue),
            &CancellationToken::new(),
        )
        .await;

    let failure = match result {
        Err(PipelineError::GenerationFailed(failure)) => failure,
        other => panic!("expected generation failure, got {:?}", other),
    };
    assert_eq!(failure.total, 3);
    assert_eq!(failure.failures.len(), 1);
    assert_eq!(failure.failures[0].index, 1);
    assert_eq!(failure.failures[0].path, temp.path().join("two.go"));
    assert!(failure.not_started.is_empty());
    assert!(failure.to_string().contains("two.go"));

    for name in ["one.go", "three.go"] {
        assert_eq!(
            std::fs::read_to_string(temp.path().join(name)).unwrap(),
            expected_content(name)
        );
    }
    assert!(!temp.path().join("two.go").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn slow_failure_under_default_policy_keeps_started_siblings() {
    let temp = TempDir::new().unwrap();
    let (orchestrator, _) = Scripted::new(&["one.go", "two.go", "three.go"])
        .failing_mid_stream("two.go")
        .with_chunk_delay(Duration::from_millis(30))
        .into_orchestrator();
    let result = orchestrator
        .run(&config(temp.path()), &CancellationToken::new())
        .await;

    match result {
        Err(PipelineError::GenerationFailed(failure)) => {
            assert_eq!(failure.failures.len(), 1);
            assert_eq!(failure.written.len(), 2);
        }
        other => panic!("expected generation failure, got {:?}", other),
    }
    assert!(temp.path().join("one.go").exists());
    assert!(temp.path().join("three.go").exists());
    // The destination stays absent; the streamed head is kept beside it for inspection.
    assert!(!temp.path().join("two.go").exists());
    assert!(!std::fs::read_to_string(temp.path().join("two.go.partial"))
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn stop_submitting_leaves_later_tasks_unstarted() {
    let temp = TempDir::new().unwrap();
    let (orchestrator, stats) = Scripted::new(&["a.rs", "b.rs", "c.rs", "d.rs"])
        .failing("a.rs")
        .into_orchestrator();
    let result = orchestrator
        .run(
            &config(temp.path())
                .with_concurrency(1)
                .with_failure_policy(FailurePolicy::StopSubmitting),
            &CancellationToken::new(),
        )
        .await;

    match result {
        Err(PipelineError::GenerationFailed(failure)) => {
            assert_eq!(failure.failures.len(), 1);
            assert_eq!(failure.not_started.len(), 3);
            assert!(failure.written.is_empty());
        }
        other => panic!("expected generation failure, got {:?}", other),
    }
    assert_eq!(stats.generate_calls(), 1);
}

#[tokio::test]
async fn continue_policy_runs_every_task() {
    let temp = TempDir::new().unwrap();
    let (orchestrator, stats) = Scripted::new(&["a.rs", "b.rs", "c.rs", "d.rs"])
        .failing("a.rs")
        .failing("c.rs")
        .into_orchestrator();
    let result = orchestrator
        .run(
            &config(temp.path())
                .with_concurrency(1)
                .with_failure_policy(FailurePolicy::Continue),
            &CancellationToken::new(),
        )
        .await;

    match result {
        Err(PipelineError::GenerationFailed(failure)) => {
            let indexes: Vec<usize> = failure.failures.iter().map(|f| f.index).collect();
            assert_eq!(indexes, vec![0, 2]);
            assert_eq!(failure.written.len(), 2);
        }
        other => panic!("expected generation failure, got {:?}", other),
    }
    assert_eq!(stats.generate_calls(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancel_in_flight_stops_running_siblings() {
    let temp = TempDir::new().unwrap();
    let (orchestrator, _) = Scripted::new(&["slow.rs", "bad.rs"])
        .hanging("slow.rs")
        .failing_mid_stream("bad.rs")
        .with_chunk_delay(Duration::from_millis(10))
        .into_orchestrator();
    let cancel = CancellationToken::new();
    let result = tokio::time::timeout(
        Duration::from_secs(10),
        orchestrator.run(
            &config(temp.path()).with_failure_policy(FailurePolicy::CancelInFlight),
            &cancel,
        ),
    )
    .await
    .expect("cancel_in_flight must not wait for the hanging task");

    match result {
        Err(PipelineError::GenerationFailed(failure)) => {
            assert_eq!(failure.failures.len(), 2);
            // The real failure is listed first, the cancelled sibling after it.
            assert_eq!(failure.failures[0].path, temp.path().join("bad.rs"));
            assert!(failure.failures[1].error.is_cancelled());
        }
        other => panic!("expected generation failure, got {:?}", other),
    }
    assert!(!cancel.is_cancelled());
    assert!(!temp.path().join("slow.rs").exists());
}
