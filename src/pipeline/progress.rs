//! Progress reporting for pipeline runs.
//!
//! The orchestrator emits [`ProgressEvent`]s to a [`ProgressSink`]; sinks decide how to render
//! them. Per-file tasks report through a [`ProgressHandle`], which guarantees exactly one
//! terminal event (completed or failed) per started task.

use crate::error::{PipelineError, Stage};
use crate::types::{DependencyDescriptor, FileManifest};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a stage value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageSource {
    Computed,
    Override,
}

#[derive(Debug, Clone)]
pub enum ProgressEvent {
    StageStarted {
        stage: Stage,
    },
    StageFinished {
        stage: Stage,
        source: StageSource,
    },
    ManifestReady(FileManifest),
    DependenciesReady(DependencyDescriptor),
    TaskSkipped {
        index: usize,
        total: usize,
        path: PathBuf,
    },
    TaskStarted {
        index: usize,
        total: usize,
        path: PathBuf,
    },
    TaskAdvanced {
        index: usize,
        bytes: usize,
    },
    TaskCompleted {
        index: usize,
        path: PathBuf,
        bytes: u64,
    },
    TaskFailed {
        index: usize,
        path: PathBuf,
        error: String,
    },
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Logs events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn emit(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::StageStarted { stage } => info!(stage = %stage, "Stage started"),
            ProgressEvent::StageFinished { stage, source } => {
                info!(stage = %stage, source = ?source, "Stage finished")
            }
            ProgressEvent::ManifestReady(manifest) => {
                info!(files = manifest.len(), "Manifest ready")
            }
            ProgressEvent::DependenciesReady(descriptor) => {
                info!(
                    shared = descriptor.shared_dependencies.len(),
                    "Shared dependencies ready"
                )
            }
            ProgressEvent::TaskSkipped { index, total, path } => info!(
                task = index + 1,
                total,
                path = %path.display(),
                "File already exists, skipping"
            ),
            ProgressEvent::TaskStarted { index, total, path } => info!(
                task = index + 1,
                total,
                path = %path.display(),
                "Generating file"
            ),
            ProgressEvent::TaskAdvanced { index, bytes } => {
                debug!(task = index + 1, bytes, "Chunk written")
            }
            ProgressEvent::TaskCompleted { index, path, bytes } => info!(
                task = index + 1,
                path = %path.display(),
                bytes,
                "File generated"
            ),
            ProgressEvent::TaskFailed { index, path, error } => warn!(
                task = index + 1,
                path = %path.display(),
                error = %error,
                "File generation failed"
            ),
        }
    }
}

/// Per-task reporter. Dropping an unfinished handle reports the task as failed.
pub struct ProgressHandle {
    sink: Arc<dyn ProgressSink>,
    index: usize,
    path: PathBuf,
    bytes: u64,
    finished: bool,
}

impl ProgressHandle {
    pub fn start(sink: Arc<dyn ProgressSink>, index: usize, total: usize, path: &Path) -> Self {
        sink.emit(ProgressEvent::TaskStarted {
            index,
            total,
            path: path.to_path_buf(),
        });
        Self {
            sink,
            index,
            path: path.to_path_buf(),
            bytes: 0,
            finished: false,
        }
    }

    pub fn advance(&mut self, bytes: usize) {
        self.bytes += bytes as u64;
        self.sink.emit(ProgressEvent::TaskAdvanced {
            index: self.index,
            bytes,
        });
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn complete(mut self) {
        self.finished = true;
        self.sink.emit(ProgressEvent::TaskCompleted {
            index: self.index,
            path: self.path.clone(),
            bytes: self.bytes,
        });
    }

    pub fn fail(mut self, error: &PipelineError) {
        self.finished = true;
        self.sink.emit(ProgressEvent::TaskFailed {
            index: self.index,
            path: self.path.clone(),
            error: error.to_string(),
        });
    }
}

impl Drop for ProgressHandle {
    fn drop(&mut self) {
        if !self.finished {
            self.sink.emit(ProgressEvent::TaskFailed {
                index: self.index,
                path: self.path.clone(),
                error: PipelineError::Cancelled.to_string(),
            });
        }
    }
}
