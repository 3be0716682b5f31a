//! LLM-backed stage adapters: format prompts, call the model provider, parse the result.

use crate::error::{PipelineError, Stage};
use crate::prompts::{
    self, CODE_GENERATION_PROMPT, CODE_GENERATION_SYSTEM_PROMPT, FILE_PATHS_PROMPT,
    SHARED_DEPENDENCIES_PROMPT, SHARED_DEPENDENCIES_REQUEST,
};
use crate::provider::{ChatMessage, CompletionOptions, ModelProviderClient};
use crate::stage::extract::parse_json_payload;
use crate::stage::{ContentGenerator, ContentStream, DependencyProvider, PlanProvider};
use crate::types::{
    DependencyDescriptor, FileManifest, GenerationContext, Intent, SharedDependency,
};
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

const MAX_PROMPT_LOG_CHARS: usize = 400;

#[derive(Debug, Deserialize)]
struct FilePathsResponse {
    filepaths: Vec<String>,
    #[serde(default)]
    reasoning: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SharedDependenciesResponse {
    shared_dependencies: Vec<SharedDependency>,
    #[serde(default)]
    reasoning: Vec<String>,
}

/// Implements all three stage traits on top of one model provider client.
pub struct LlmStageAdapter {
    client: Arc<dyn ModelProviderClient>,
    options: CompletionOptions,
    debug_prompts: bool,
}

impl LlmStageAdapter {
    pub fn new(client: Arc<dyn ModelProviderClient>, options: CompletionOptions) -> Self {
        Self {
            client,
            options,
            debug_prompts: false,
        }
    }

    /// Log every prompt in full at info level.
    pub fn with_debug_prompts(mut self, enabled: bool) -> Self {
        self.debug_prompts = enabled;
        self
    }

    fn log_prompts(&self, stage: Stage, messages: &[ChatMessage]) {
        for message in messages {
            if self.debug_prompts {
                info!(stage = %stage, role = ?message.role, prompt = %message.content, "Prompt");
            } else {
                debug!(
                    stage = %stage,
                    role = ?message.role,
                    prompt = %truncate_for_log(&message.content, MAX_PROMPT_LOG_CHARS),
                    "Prompt"
                );
            }
        }
    }

    async fn complete(&self, stage: Stage, messages: Vec<ChatMessage>) -> Result<String, PipelineError> {
        self.log_prompts(stage, &messages);
        let response = self
            .client
            .complete(messages, self.options.clone())
            .await
            .map_err(|e| PipelineError::external(stage, e))?;
        debug!(
            stage = %stage,
            model = %response.model,
            completion_tokens = response.usage.completion_tokens,
            "Completion received"
        );
        Ok(response.content)
    }
}

fn filepaths_json(manifest: &FileManifest) -> String {
    serde_json::to_string(manifest.paths()).unwrap_or_else(|_| "[]".to_string())
}

fn example_dependencies_json() -> String {
    let example = SharedDependenciesResponse {
        shared_dependencies: vec![SharedDependency {
            name: "example symbol".to_string(),
            description: "example description".to_string(),
            symbols: Default::default(),
        }],
        reasoning: Vec::new(),
    };
    serde_json::to_string(&example).unwrap_or_default()
}

fn truncate_for_log(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

#[async_trait]
impl PlanProvider for LlmStageAdapter {
    async fn plan(&self, intent: &Intent) -> Result<FileManifest, PipelineError> {
        let messages = vec![
            ChatMessage::system(intent.as_str()),
            ChatMessage::user(FILE_PATHS_PROMPT),
        ];
        let raw = self.complete(Stage::Plan, messages).await?;
        let parsed: FilePathsResponse = parse_json_payload(Stage::Plan, &raw)?;
        for step in &parsed.reasoning {
            debug!(reasoning = %step, "Plan reasoning");
        }
        if parsed.filepaths.is_empty() {
            return Err(PipelineError::malformed(Stage::Plan, "empty filepaths list", raw));
        }
        FileManifest::from_paths(parsed.filepaths)
            .map_err(|e| PipelineError::malformed(Stage::Plan, e.to_string(), raw))
    }
}

#[async_trait]
impl DependencyProvider for LlmStageAdapter {
    async fn dependencies(
        &self,
        intent: &Intent,
        manifest: &FileManifest,
    ) -> Result<DependencyDescriptor, PipelineError> {
        let filepaths = filepaths_json(manifest);
        let target_json = example_dependencies_json();
        let system = prompts::render(
            SHARED_DEPENDENCIES_PROMPT,
            &[
                (prompts::KEY_PROMPT, intent.as_str()),
                (prompts::KEY_FILEPATHS, filepaths.as_str()),
                (prompts::KEY_TARGET_JSON, target_json.as_str()),
            ],
        );
        let messages = vec![
            ChatMessage::system(system),
            ChatMessage::user(SHARED_DEPENDENCIES_REQUEST),
        ];
        let raw = self.complete(Stage::Dependencies, messages).await?;
        let parsed: SharedDependenciesResponse = parse_json_payload(Stage::Dependencies, &raw)?;
        Ok(DependencyDescriptor {
            shared_dependencies: parsed.shared_dependencies,
            reasoning: parsed.reasoning,
        })
    }
}

#[async_trait]
impl ContentGenerator for LlmStageAdapter {
    async fn generate(
        &self,
        path: &str,
        context: &GenerationContext,
    ) -> Result<ContentStream, PipelineError> {
        let filepaths = filepaths_json(&context.manifest);
        let vars = [
            (prompts::KEY_PROMPT, context.intent.as_str()),
            (prompts::KEY_FILEPATHS, filepaths.as_str()),
            (
                prompts::KEY_SHARED_DEPENDENCIES,
                context.dependencies_yaml.as_str(),
            ),
            (prompts::KEY_FILENAME, path),
        ];
        let messages = vec![
            ChatMessage::system(prompts::render(CODE_GENERATION_SYSTEM_PROMPT, &vars)),
            ChatMessage::user(prompts::render(CODE_GENERATION_PROMPT, &vars)),
        ];
        self.log_prompts(Stage::Content, &messages);
        let stream = self
            .client
            .stream(messages, self.options.clone())
            .await
            .map_err(|e| PipelineError::external(Stage::Content, e))?;
        Ok(Box::pin(stream.map(|chunk| {
            chunk.map_err(|e| PipelineError::external(Stage::Content, e))
        })))
    }
}
