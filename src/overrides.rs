//! Override sources: human-editable YAML files that stand in for the plan and dependency
//! stages. Read when present and non-empty; written back after a stage computes a value.

use crate::error::PipelineError;
use crate::types::{DependencyDescriptor, FileManifest, SharedDependency};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// True when `path` exists and holds at least one byte.
pub async fn exists_and_non_empty(path: &Path) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(meta) => meta.is_file() && meta.len() > 0,
        Err(_) => false,
    }
}

async fn read_if_present(path: &Path) -> Result<Option<String>, PipelineError> {
    if !exists_and_non_empty(path).await {
        return Ok(None);
    }
    tokio::fs::read_to_string(path)
        .await
        .map(Some)
        .map_err(|e| PipelineError::io(path, e))
}

async fn write_yaml<T: serde::Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), PipelineError> {
    let yaml = serde_yaml::to_string(value).map_err(|e| {
        PipelineError::Config(format!("failed to serialize {}: {}", path.display(), e))
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| PipelineError::io(parent, e))?;
    }
    tokio::fs::write(path, yaml)
        .await
        .map_err(|e| PipelineError::io(path, e))
}

/// Load a manifest override. `None` means the plan stage has to run.
pub async fn load_manifest(path: &Path) -> Result<Option<FileManifest>, PipelineError> {
    let Some(raw) = read_if_present(path).await? else {
        return Ok(None);
    };
    let paths: Vec<String> = serde_yaml::from_str(&raw).map_err(|e| {
        PipelineError::Config(format!(
            "invalid files-to-generate file {}: {}",
            path.display(),
            e
        ))
    })?;
    if paths.is_empty() {
        warn!(path = %path.display(), "Manifest override lists no files; planning instead");
        return Ok(None);
    }
    let manifest = FileManifest::from_paths(paths).map_err(|e| {
        PipelineError::Config(format!(
            "invalid files-to-generate file {}: {}",
            path.display(),
            e
        ))
    })?;
    debug!(path = %path.display(), files = manifest.len(), "Loaded manifest override");
    Ok(Some(manifest))
}

pub async fn store_manifest(path: &Path, manifest: &FileManifest) -> Result<(), PipelineError> {
    write_yaml(path, manifest.paths()).await?;
    debug!(path = %path.display(), files = manifest.len(), "Stored manifest override");
    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DependencyOverrideDoc {
    Full(DependencyDescriptor),
    List(Vec<SharedDependency>),
}

/// Load a dependency override. Accepts the full document or a bare list of records.
pub async fn load_dependencies(
    path: &Path,
) -> Result<Option<DependencyDescriptor>, PipelineError> {
    let Some(raw) = read_if_present(path).await? else {
        return Ok(None);
    };
    let doc: DependencyOverrideDoc = serde_yaml::from_str(&raw).map_err(|e| {
        PipelineError::Config(format!(
            "invalid shared-deps file {}: {}",
            path.display(),
            e
        ))
    })?;
    let descriptor = match doc {
        DependencyOverrideDoc::Full(descriptor) => descriptor,
        DependencyOverrideDoc::List(shared_dependencies) => DependencyDescriptor {
            shared_dependencies,
            reasoning: Vec::new(),
        },
    };
    debug!(
        path = %path.display(),
        shared = descriptor.shared_dependencies.len(),
        "Loaded dependency override"
    );
    Ok(Some(descriptor))
}

pub async fn store_dependencies(
    path: &Path,
    descriptor: &DependencyDescriptor,
) -> Result<(), PipelineError> {
    write_yaml(path, descriptor).await?;
    debug!(path = %path.display(), "Stored dependency override");
    Ok(())
}
