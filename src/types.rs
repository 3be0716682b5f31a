//! Core value types threaded through the three pipeline stages.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path};
use thiserror::Error;
use tracing::warn;

/// The user's natural-language request. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent(String);

impl Intent {
    pub fn new(text: impl Into<String>) -> Result<Self, PipelineError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(PipelineError::Config("no prompt specified".to_string()));
        }
        Ok(Self(text))
    }

    /// Treat `arg` as a path when it names an existing file, otherwise as the literal intent.
    pub fn resolve(arg: &str) -> Result<Self, PipelineError> {
        if arg.trim().is_empty() {
            return Err(PipelineError::Config("no prompt specified".to_string()));
        }
        let path = Path::new(arg);
        if path.is_file() {
            let text =
                std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
            return Self::new(text);
        }
        Self::new(arg)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManifestError {
    #[error("manifest contains an empty path")]
    EmptyPath,

    #[error("manifest path must be relative: {0}")]
    AbsolutePath(String),

    #[error("manifest path escapes the target directory: {0}")]
    EscapesTarget(String),
}

/// Rebuild a relative path from its normal components, so `./a.go`, `src//a.go` and `a.go/`
/// collapse to one spelling.
fn normalize(path: &Path) -> Result<String, ManifestError> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir | Component::Prefix(_) => {
                return Err(ManifestError::EscapesTarget(path.display().to_string()))
            }
            Component::RootDir => {
                return Err(ManifestError::AbsolutePath(path.display().to_string()))
            }
        }
    }
    if parts.is_empty() {
        return Err(ManifestError::EmptyPath);
    }
    Ok(parts.join("/"))
}

/// Ordered, duplicate-free list of relative file paths to generate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FileManifest(Vec<String>);

impl FileManifest {
    /// Validate and normalise raw paths. Duplicates keep their first position.
    pub fn from_paths<I, S>(paths: I) -> Result<Self, ManifestError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for raw in paths {
            let raw: String = raw.into();
            let entry = raw.trim();
            if entry.is_empty() {
                return Err(ManifestError::EmptyPath);
            }
            let path = Path::new(entry);
            if path.has_root() || path.is_absolute() {
                return Err(ManifestError::AbsolutePath(entry.to_string()));
            }
            let normalized = normalize(path)?;
            if !seen.insert(normalized.clone()) {
                warn!(path = entry, normalized = %normalized, "Dropping duplicate manifest entry");
                continue;
            }
            entries.push(normalized);
        }
        Ok(Self(entries))
    }

    pub fn paths(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// One shared name/schema/symbol group agreed on before any file is generated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedDependency {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub symbols: BTreeMap<String, String>,
}

/// Cross-file context produced once and passed read-only to every generation task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDescriptor {
    #[serde(default)]
    pub shared_dependencies: Vec<SharedDependency>,
    #[serde(default)]
    pub reasoning: Vec<String>,
}

impl DependencyDescriptor {
    pub fn is_empty(&self) -> bool {
        self.shared_dependencies.is_empty()
    }

    /// YAML rendering of the shared dependencies, as embedded into generation prompts.
    pub fn to_yaml(&self) -> Result<String, PipelineError> {
        serde_yaml::to_string(&self.shared_dependencies).map_err(|e| {
            PipelineError::Config(format!("failed to serialize shared dependencies: {}", e))
        })
    }
}

/// Everything a content generator needs besides the file path. Frozen after stage 2.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub intent: Intent,
    pub manifest: FileManifest,
    pub dependencies: DependencyDescriptor,
    /// Pre-rendered YAML of `dependencies`, computed once for all tasks.
    pub dependencies_yaml: String,
}

impl GenerationContext {
    pub fn new(
        intent: Intent,
        manifest: FileManifest,
        dependencies: DependencyDescriptor,
    ) -> Result<Self, PipelineError> {
        let dependencies_yaml = dependencies.to_yaml()?;
        Ok(Self {
            intent,
            manifest,
            dependencies,
            dependencies_yaml,
        })
    }
}
