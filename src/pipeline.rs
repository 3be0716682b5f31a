//! Pipeline: sequences plan → dependencies → bounded concurrent content generation.

pub mod orchestrator;
pub mod pool;
pub mod progress;
pub mod writer;

use crate::error::PipelineError;
use crate::types::Intent;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use orchestrator::{PipelineOrchestrator, PreparedRun, RunReport};
pub use pool::{FailurePolicy, Submission, TaskPool};
pub use progress::{
    NoopProgress, ProgressEvent, ProgressHandle, ProgressSink, StageSource, TracingProgress,
};
pub use writer::{StreamingFileWriter, WriteMode};

pub const DEFAULT_CONCURRENCY: usize = 5;
pub const DEFAULT_SUBMIT_DELAY: Duration = Duration::from_millis(1);

/// Parameters of one pipeline invocation.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub intent: Intent,
    pub target_dir: PathBuf,
    pub concurrency: usize,
    /// Manifest override (`files-to-generate`); read if present, written after planning.
    pub manifest_override: Option<PathBuf>,
    /// Dependency override (`shared-deps`); read if present, written after stage 2.
    pub dependencies_override: Option<PathBuf>,
    pub failure_policy: FailurePolicy,
    pub write_mode: WriteMode,
    /// Pause before each task submission.
    pub submit_delay: Duration,
}

impl RunConfig {
    pub fn new(intent: Intent, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            intent,
            target_dir: target_dir.into(),
            concurrency: DEFAULT_CONCURRENCY,
            manifest_override: None,
            dependencies_override: None,
            failure_policy: FailurePolicy::default(),
            write_mode: WriteMode::default(),
            submit_delay: DEFAULT_SUBMIT_DELAY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_manifest_override(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_override = Some(path.into());
        self
    }

    pub fn with_dependencies_override(mut self, path: impl Into<PathBuf>) -> Self {
        self.dependencies_override = Some(path.into());
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    /// An empty target directory means the current directory.
    pub fn target_dir(&self) -> &Path {
        if self.target_dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            &self.target_dir
        }
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.concurrency == 0 {
            return Err(PipelineError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
