//! Error types for the generation pipeline.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Plan,
    Dependencies,
    Content,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Plan => "plan",
            Stage::Dependencies => "dependencies",
            Stage::Content => "content",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model provider errors (transport, auth, rate limits, stream decoding).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider request failed: {0}")]
    Request(String),

    #[error("Provider authentication failed: {0}")]
    AuthFailed(String),

    #[error("Provider rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Provider model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider stream error: {0}")]
    Stream(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Provider error: {0}")]
    Other(String),
}

/// Errors surfaced by a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{stage} call failed: {source}")]
    ExternalCall {
        stage: Stage,
        #[source]
        source: ProviderError,
    },

    #[error("Malformed {stage} response: {reason}\nRaw output: {raw}")]
    MalformedResponse {
        stage: Stage,
        reason: String,
        raw: String,
    },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    GenerationFailed(GenerationFailure),

    #[error("Generation task panicked: {0}")]
    TaskPanicked(String),

    #[error("Run cancelled")]
    Cancelled,
}

impl PipelineError {
    pub fn external(stage: Stage, source: ProviderError) -> Self {
        PipelineError::ExternalCall { stage, source }
    }

    pub fn malformed(stage: Stage, reason: impl Into<String>, raw: impl Into<String>) -> Self {
        PipelineError::MalformedResponse {
            stage,
            reason: reason.into(),
            raw: raw.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by cancellation rather than a real failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }
}

impl From<config::ConfigError> for PipelineError {
    fn from(err: config::ConfigError) -> Self {
        PipelineError::Config(err.to_string())
    }
}

/// One failed per-file task.
#[derive(Debug)]
pub struct TaskFailure {
    pub index: usize,
    pub path: PathBuf,
    pub error: PipelineError,
}

/// Aggregate outcome of a stage-3 run where at least one task failed.
#[derive(Debug)]
pub struct GenerationFailure {
    /// Failures ordered by task index.
    pub failures: Vec<TaskFailure>,
    /// Files fully written during this run; they are left on disk.
    pub written: Vec<PathBuf>,
    /// Tasks never started because the pool halted after a failure.
    pub not_started: Vec<PathBuf>,
    pub total: usize,
}

impl GenerationFailure {
    pub fn first(&self) -> Option<&TaskFailure> {
        self.failures.first()
    }
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Generation failed for {} of {} file(s)",
            self.failures.len(),
            self.total
        )?;
        if let Some(first) = self.first() {
            write!(f, "; first failure at {}: {}", first.path.display(), first.error)?;
        }
        if !self.not_started.is_empty() {
            write!(f, " ({} not started)", self.not_started.len())?;
        }
        Ok(())
    }
}
