//! Stage capabilities: the three opaque external calls the orchestrator sequences.
//! Each is a narrow trait so the orchestrator runs unchanged against real providers or fakes.

pub mod extract;
pub mod llm;

use crate::error::PipelineError;
use crate::types::{DependencyDescriptor, FileManifest, GenerationContext, Intent};
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

pub use extract::{find_json_span, parse_json_payload};
pub use llm::LlmStageAdapter;

/// Incremental file content, chunks in arrival order.
pub type ContentStream = Pin<Box<dyn Stream<Item = Result<String, PipelineError>> + Send>>;

/// Stage 1: intent → file manifest.
#[async_trait]
pub trait PlanProvider: Send + Sync {
    async fn plan(&self, intent: &Intent) -> Result<FileManifest, PipelineError>;
}

/// Stage 2: intent + full manifest → shared dependency descriptor.
#[async_trait]
pub trait DependencyProvider: Send + Sync {
    async fn dependencies(
        &self,
        intent: &Intent,
        manifest: &FileManifest,
    ) -> Result<DependencyDescriptor, PipelineError>;
}

/// Stage 3: one file's content, given the frozen run context.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(
        &self,
        path: &str,
        context: &GenerationContext,
    ) -> Result<ContentStream, PipelineError>;
}
