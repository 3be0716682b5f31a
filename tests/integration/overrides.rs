//! Override files: precedence over the stage providers and write-back after computation.

use crate::integration::test_utils::Scripted;
use smol_dev::error::{PipelineError, Stage};
use smol_dev::overrides;
use smol_dev::pipeline::{RunConfig, StageSource};
use smol_dev::types::Intent;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn intent() -> Intent {
    Intent::new("a pong game").unwrap()
}

#[tokio::test]
async fn manifest_override_skips_planning_and_keeps_order() {
    let temp = TempDir::new().unwrap();
    let manifest_path = temp.path().join("files.yaml");
    std::fs::write(&manifest_path, "- index.html\n- styles.css\n- app.js\n").unwrap();

    let (orchestrator, stats) = Scripted::new(&["ignored.txt"]).into_orchestrator();
    let config = RunConfig::new(intent(), temp.path().join("out"))
        .with_manifest_override(&manifest_path);
    let prepared = orchestrator
        .prepare(&config, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(stats.plan_calls(), 0);
    assert_eq!(prepared.manifest_source, StageSource::Override);
    assert_eq!(
        prepared.manifest.paths(),
        &["index.html", "styles.css", "app.js"]
    );
    assert_eq!(stats.dependency_calls(), 1);
}

#[tokio::test]
async fn computed_values_are_written_back() {
    let temp = TempDir::new().unwrap();
    let manifest_path = temp.path().join("plan/files.yaml");
    let deps_path = temp.path().join("plan/shared.yaml");

    let (orchestrator, stats) = Scripted::new(&["main.go", "Makefile"]).into_orchestrator();
    let config = RunConfig::new(intent(), temp.path().join("out"))
        .with_manifest_override(&manifest_path)
        .with_dependencies_override(&deps_path);
    orchestrator
        .run(&config, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(stats.plan_calls(), 1);

    let manifest = overrides::load_manifest(&manifest_path)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(manifest.paths(), &["main.go", "Makefile"]);
    let deps = overrides::load_dependencies(&deps_path)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(deps.shared_dependencies[0].name, "Todo");

    // A second run reads both files back instead of calling the providers.
    let (again, again_stats) = Scripted::new(&["other.go"]).into_orchestrator();
    let prepared = again
        .prepare(&config, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(again_stats.plan_calls(), 0);
    assert_eq!(again_stats.dependency_calls(), 0);
    assert_eq!(prepared.dependencies_source, StageSource::Override);
    assert_eq!(prepared.manifest.paths(), &["main.go", "Makefile"]);
}

#[tokio::test]
async fn hand_edited_dependency_list_is_accepted() {
    let temp = TempDir::new().unwrap();
    let deps_path = temp.path().join("shared.yaml");
    std::fs::write(
        &deps_path,
        "- name: Score\n  description: points per player\n  symbols:\n    score: int\n",
    )
    .unwrap();

    let (orchestrator, stats) = Scripted::new(&["game.js"]).into_orchestrator();
    let config = RunConfig::new(intent(), temp.path().join("out"))
        .with_dependencies_override(&deps_path);
    orchestrator
        .run(&config, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(stats.dependency_calls(), 0);
    let contexts = stats.contexts.lock().clone();
    assert!(contexts[0].contains("Score"));
}

#[tokio::test]
async fn empty_override_file_is_treated_as_absent() {
    let temp = TempDir::new().unwrap();
    let manifest_path = temp.path().join("files.yaml");
    std::fs::write(&manifest_path, "").unwrap();

    let (orchestrator, stats) = Scripted::new(&["main.go"]).into_orchestrator();
    let config =
        RunConfig::new(intent(), temp.path().join("out")).with_manifest_override(&manifest_path);
    let prepared = orchestrator
        .prepare(&config, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(stats.plan_calls(), 1);
    assert_eq!(prepared.manifest_source, StageSource::Computed);
    assert!(std::fs::metadata(&manifest_path).unwrap().len() > 0);
}

#[tokio::test]
async fn override_escaping_target_is_rejected() {
    let temp = TempDir::new().unwrap();
    let manifest_path = temp.path().join("files.yaml");
    std::fs::write(&manifest_path, "- ../outside.sh\n").unwrap();

    let (orchestrator, stats) = Scripted::new(&["main.go"]).into_orchestrator();
    let config =
        RunConfig::new(intent(), temp.path().join("out")).with_manifest_override(&manifest_path);
    let result = orchestrator.run(&config, &CancellationToken::new()).await;

    assert!(matches!(result, Err(PipelineError::Config(_))));
    assert_eq!(stats.generate_calls(), 0);
}

#[tokio::test]
async fn malformed_plan_surfaces_raw_text_and_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let manifest_path = temp.path().join("files.yaml");
    let (orchestrator, stats) = Scripted::new(&["main.go"])
        .with_malformed_plan("Sorry, I can only chat about the weather.")
        .into_orchestrator();
    let config =
        RunConfig::new(intent(), temp.path().join("out")).with_manifest_override(&manifest_path);

    match orchestrator.run(&config, &CancellationToken::new()).await {
        Err(PipelineError::MalformedResponse { stage, raw, .. }) => {
            assert_eq!(stage, Stage::Plan);
            assert_eq!(raw, "Sorry, I can only chat about the weather.");
        }
        other => panic!("expected malformed response, got {:?}", other),
    }
    assert_eq!(stats.dependency_calls(), 0);
    assert!(!manifest_path.exists());
}
