//! Configuration
//!
//! Layered settings for the provider, the pipeline and logging. See [`ConfigLoader`] for
//! source precedence.

use crate::error::PipelineError;
use crate::logging::LoggingConfig;
use crate::pipeline::{FailurePolicy, WriteMode, DEFAULT_CONCURRENCY};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use crate::provider::{ProviderConfig, ProviderType};

mod loader;
mod merge;
mod sources;

pub use loader::ConfigLoader;
pub use sources::global_file::global_config_path;
pub use sources::workspace_file::workspace_config_paths;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmolDevConfig {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub pipeline: PipelineSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Stage-3 execution settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Maximum number of files generated at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Pause before each task submission, in milliseconds
    #[serde(default = "default_submit_delay_ms")]
    pub submit_delay_ms: u64,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    #[serde(default)]
    pub write_mode: WriteMode,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_submit_delay_ms() -> u64 {
    1
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            submit_delay_ms: default_submit_delay_ms(),
            failure_policy: FailurePolicy::default(),
            write_mode: WriteMode::default(),
        }
    }
}

impl PipelineSettings {
    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.submit_delay_ms)
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Provider(String),
    Pipeline(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(msg) => write!(f, "Provider: {}", msg),
            ValidationError::Pipeline(msg) => write!(f, "Pipeline: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl SmolDevConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.provider.validate() {
            errors.push(ValidationError::Provider(e));
        }
        if self.pipeline.concurrency == 0 {
            errors.push(ValidationError::Pipeline(
                "concurrency must be at least 1".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// [`validate`](Self::validate) folded into a single pipeline error.
    pub fn check(&self) -> Result<(), PipelineError> {
        self.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            PipelineError::Config(messages.join("; "))
        })
    }
}
