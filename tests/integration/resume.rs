//! Resume behaviour: existing non-empty files are kept, missing and empty ones regenerated.

use crate::integration::test_utils::{expected_content, RecordingProgress, Scripted};
use smol_dev::pipeline::RunConfig;
use smol_dev::types::Intent;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn config(target: &std::path::Path) -> RunConfig {
    RunConfig::new(Intent::new("a todo api in go").unwrap(), target)
}

#[tokio::test]
async fn rerun_generates_only_missing_files() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("out");
    std::fs::create_dir_all(target.join("src")).unwrap();
    std::fs::write(target.join("main.go"), "package main // hand edited\n").unwrap();
    std::fs::write(target.join("src/store.go"), "package src // kept\n").unwrap();

    let progress = Arc::new(RecordingProgress::default());
    let (orchestrator, stats) = Scripted::new(&["main.go", "src/api.go", "src/store.go", "Makefile"])
        .into_orchestrator();
    let report = orchestrator
        .with_progress(progress.clone())
        .run(&config(&target), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(stats.generate_calls(), 2);
    assert_eq!(stats.generated(), vec!["Makefile", "src/api.go"]);
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(progress.skipped(), 2);
    assert_eq!(
        std::fs::read_to_string(target.join("main.go")).unwrap(),
        "package main // hand edited\n"
    );
    assert_eq!(
        std::fs::read_to_string(target.join("src/store.go")).unwrap(),
        "package src // kept\n"
    );
    assert_eq!(
        std::fs::read_to_string(target.join("src/api.go")).unwrap(),
        expected_content("src/api.go")
    );
}

#[tokio::test]
async fn second_run_is_a_no_op() {
    let temp = TempDir::new().unwrap();
    let files = ["main.go", "Dockerfile"];

    let (first, first_stats) = Scripted::new(&files).into_orchestrator();
    first
        .run(&config(temp.path()), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(first_stats.generate_calls(), 2);

    let (second, second_stats) = Scripted::new(&files).into_orchestrator();
    let report = second
        .run(&config(temp.path()), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(second_stats.generate_calls(), 0);
    assert!(report.written.is_empty());
    assert_eq!(report.skipped.len(), 2);
}

#[tokio::test]
async fn zero_byte_file_is_regenerated() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("main.go"), "").unwrap();

    let (orchestrator, stats) = Scripted::new(&["main.go"]).into_orchestrator();
    let report = orchestrator
        .run(&config(temp.path()), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(stats.generate_calls(), 1);
    assert_eq!(report.written, vec![temp.path().join("main.go")]);
    assert_eq!(
        std::fs::read_to_string(temp.path().join("main.go")).unwrap(),
        expected_content("main.go")
    );
}

#[tokio::test]
async fn nested_path_resolves_under_target_and_creates_directories() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("out");

    let (orchestrator, _) = Scripted::new(&["src/util/helpers.go"]).into_orchestrator();
    let report = orchestrator
        .run(&config(&target), &CancellationToken::new())
        .await
        .unwrap();

    let expected = target.join("src/util/helpers.go");
    assert_eq!(report.written, vec![expected.clone()]);
    assert!(target.join("src/util").is_dir());
    assert_eq!(
        std::fs::read_to_string(expected).unwrap(),
        expected_content("src/util/helpers.go")
    );
}

#[tokio::test]
async fn every_task_sees_the_same_dependency_context() {
    let temp = TempDir::new().unwrap();
    let (orchestrator, stats) =
        Scripted::new(&["a.go", "b.go", "c.go"]).into_orchestrator();
    orchestrator
        .run(&config(temp.path()), &CancellationToken::new())
        .await
        .unwrap();

    let contexts = stats.contexts.lock().clone();
    assert_eq!(contexts.len(), 3);
    assert!(contexts[0].contains("name: Todo"));
    assert!(contexts.iter().all(|c| c == &contexts[0]));
    assert_eq!(stats.plan_calls(), 1);
    assert_eq!(stats.dependency_calls(), 1);
}

#[tokio::test]
async fn equivalent_spellings_are_generated_once() {
    let temp = TempDir::new().unwrap();
    let (orchestrator, stats) =
        Scripted::new(&["a.go", "./a.go", "src//b.go", "src/b.go"]).into_orchestrator();
    let report = orchestrator
        .run(&config(temp.path()), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(stats.generate_calls(), 2);
    assert_eq!(stats.generated(), vec!["a.go", "src/b.go"]);
    assert_eq!(report.manifest.paths(), &["a.go", "src/b.go"]);
    assert_eq!(
        std::fs::read_to_string(temp.path().join("a.go")).unwrap(),
        expected_content("a.go")
    );
}

#[tokio::test]
async fn equivalent_spellings_in_override_file_are_generated_once() {
    let temp = TempDir::new().unwrap();
    let manifest_path = temp.path().join("files.yaml");
    std::fs::write(&manifest_path, "- a.go\n- ./a.go\n").unwrap();

    let (orchestrator, stats) = Scripted::new(&["ignored.go"]).into_orchestrator();
    orchestrator
        .run(
            &config(&temp.path().join("out")).with_manifest_override(&manifest_path),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(stats.generate_calls(), 1);
    assert_eq!(stats.generated(), vec!["a.go"]);
}
