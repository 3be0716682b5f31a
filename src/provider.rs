//! Model providers
//!
//! Uniform interface over OpenAI-compatible chat completion endpoints (OpenAI itself and
//! self-hosted servers). Stage adapters talk to a `ModelProviderClient`; nothing above this
//! module knows about HTTP or request shapes.

use crate::error::ProviderError;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

pub mod profile;
pub mod sse;

pub use profile::{ProviderConfig, ProviderType};

use sse::{SseDecoder, SseEvent};

/// Resolved provider, ready to build a client from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModelProvider {
    OpenAI {
        model: String,
        api_key: String,
        /// Defaults to the public OpenAI API.
        base_url: Option<String>,
    },
    LocalCustom {
        model: String,
        /// Base URL up to and including the version segment, e.g. `http://localhost:8080/v1`.
        endpoint: String,
        api_key: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Sampling knobs forwarded to the endpoint; `None` fields are omitted from the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,  // 0.0-2.0, default: 1.0
    pub max_tokens: Option<u32>,   // Maximum tokens to generate
    pub top_p: Option<f32>,        // Nucleus sampling
    pub stop: Option<Vec<String>>, // Stop sequences
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: Some(1.0),
            max_tokens: None,
            top_p: None,
            stop: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Non-streaming completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
    pub finish_reason: Option<String>,
}

/// Streaming completion type: text deltas in arrival order.
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>;

/// One chat-completions backend. The plan and dependency stages use `complete`; content
/// generation uses `stream`.
#[async_trait]
pub trait ModelProviderClient: Send + Sync {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Text deltas in arrival order. The stream ends after the first error.
    async fn stream(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionStream, ProviderError>;

    fn provider_name(&self) -> &str;

    fn model_name(&self) -> &str;
}

// Wire types for /chat/completions
#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    model: String,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

fn role_to_string(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

fn map_http_error(error: reqwest::Error) -> ProviderError {
    if let Some(status) = error.status() {
        map_status(status, &error.to_string())
    } else if error.is_timeout() {
        ProviderError::Request(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        ProviderError::Request(format!("Connection error: {}", error))
    } else {
        ProviderError::Other(format!("HTTP error: {}", error))
    }
}

fn map_status(status: StatusCode, detail: &str) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::AuthFailed(format!("Authentication failed: {}", detail)),
        429 => ProviderError::RateLimit(format!("Rate limit exceeded: {}", detail)),
        404 => ProviderError::ModelNotFound(format!("Model not found: {}", detail)),
        _ => ProviderError::Request(format!(
            "Request failed with status {}: {}",
            status, detail
        )),
    }
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// Whole-file generations stream for minutes; only the connect phase is bounded.
fn build_provider_http_client() -> Result<Client, ProviderError> {
    Client::builder()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .build()
        .map_err(|e| ProviderError::Other(format!("Failed to create HTTP client: {}", e)))
}

/// Client for any endpoint speaking the OpenAI chat completions protocol.
pub struct OpenAIClient {
    client: Client,
    model: String,
    api_key: Option<String>,
    base_url: String,
    provider_name: &'static str,
}

impl OpenAIClient {
    pub fn new(model: String, api_key: String, base_url: Option<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_provider_http_client()?,
            model,
            api_key: Some(api_key),
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            provider_name: "openai",
        })
    }

    pub fn local(model: String, endpoint: String, api_key: Option<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_provider_http_client()?,
            model,
            api_key,
            base_url: endpoint,
            provider_name: "local",
        })
    }

    fn build_request(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
        stream: bool,
    ) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages
                .into_iter()
                .map(|msg| OpenAIMessage {
                    role: role_to_string(msg.role).to_string(),
                    content: msg.content,
                })
                .collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            top_p: options.top_p,
            stop: options.stop,
            stream,
        }
    }

    async fn send(&self, request: &ChatCompletionRequest) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let mut builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(request);
        if let Some(api_key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }
        let response = builder.send().await.map_err(map_http_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(map_status(status, &error_text));
        }
        Ok(response)
    }
}

#[async_trait]
impl ModelProviderClient for OpenAIClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError> {
        let request = self.build_request(messages, options, false);
        let response = self.send(&request).await?;

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Other(format!("Failed to parse response: {}", e)))?;

        let choice = completion
            .choices
            .first()
            .ok_or_else(|| ProviderError::Other("No choices in response".to_string()))?;

        let usage = completion.usage.unwrap_or(Usage {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
        });

        Ok(CompletionResponse {
            content: choice.message.content.clone(),
            model: completion.model,
            usage: TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            },
            finish_reason: choice.finish_reason.clone(),
        })
    }

    async fn stream(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionStream, ProviderError> {
        let request = self.build_request(messages, options, true);
        let response = self.send(&request).await?;
        debug!(model = %self.model, "Opened completion stream");
        Ok(decode_event_stream(response.bytes_stream()))
    }

    fn provider_name(&self) -> &str {
        self.provider_name
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Turn a raw server-sent-event byte stream into text deltas. Ends at `[DONE]` or after the
/// first error. A body that closes before `[DONE]` or a `finish_reason` yields a final
/// error, so a cut-off completion is never mistaken for a whole one.
fn decode_event_stream<S, B>(bytes: S) -> CompletionStream
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    struct State<S> {
        bytes: Pin<Box<S>>,
        decoder: SseDecoder,
        pending: VecDeque<Result<String, ProviderError>>,
        completed: bool,
        done: bool,
    }

    let state = State {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        completed: false,
        done: false,
    };

    let stream = futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.done {
                return None;
            }
            let (decoded, at_eof) = match state.bytes.next().await {
                Some(Ok(chunk)) => (state.decoder.push(chunk.as_ref()), false),
                Some(Err(e)) => (vec![Err(ProviderError::Stream(e.to_string()))], false),
                None => (state.decoder.finish(), true),
            };
            for item in decoded {
                match item {
                    Ok(SseEvent::Delta(text)) => state.pending.push_back(Ok(text)),
                    Ok(SseEvent::Finished) => state.completed = true,
                    Ok(SseEvent::Done) => {
                        state.completed = true;
                        state.done = true;
                        break;
                    }
                    Err(err) => {
                        state.pending.push_back(Err(err));
                        state.done = true;
                        break;
                    }
                }
            }
            if at_eof && !state.done {
                state.done = true;
                if !state.completed {
                    state.pending.push_back(Err(ProviderError::Stream(
                        "stream ended before [DONE]".to_string(),
                    )));
                }
            }
        }
    });
    Box::pin(stream)
}

pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_client(
        provider: &ModelProvider,
    ) -> Result<Box<dyn ModelProviderClient>, ProviderError> {
        match provider {
            ModelProvider::OpenAI {
                model,
                api_key,
                base_url,
            } => Ok(Box::new(OpenAIClient::new(
                model.clone(),
                api_key.clone(),
                base_url.clone(),
            )?)),
            ModelProvider::LocalCustom {
                model,
                endpoint,
                api_key,
            } => Ok(Box::new(OpenAIClient::local(
                model.clone(),
                endpoint.clone(),
                api_key.clone(),
            )?)),
        }
    }
}

/// Canned replies, recorded requests. Streams split each reply in two.
#[cfg(test)]
pub struct MockProvider {
    responses: Vec<String>,
    current: std::sync::Arc<std::sync::Mutex<usize>>,
    pub requests: std::sync::Arc<std::sync::Mutex<Vec<Vec<ChatMessage>>>>,
}

#[cfg(test)]
impl MockProvider {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses,
            current: std::sync::Arc::new(std::sync::Mutex::new(0)),
            requests: std::sync::Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    fn next_response(&self, messages: Vec<ChatMessage>) -> String {
        self.requests.lock().unwrap().push(messages);
        let mut idx = self.current.lock().unwrap();
        let response = if *idx < self.responses.len() {
            self.responses[*idx].clone()
        } else {
            "Mock response".to_string()
        };
        *idx += 1;
        response
    }
}

#[cfg(test)]
#[async_trait]
impl ModelProviderClient for MockProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        _options: CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError> {
        Ok(CompletionResponse {
            content: self.next_response(messages),
            model: "mock-model".to_string(),
            usage: TokenUsage::default(),
            finish_reason: Some("stop".to_string()),
        })
    }

    async fn stream(
        &self,
        messages: Vec<ChatMessage>,
        _options: CompletionOptions,
    ) -> Result<CompletionStream, ProviderError> {
        let response = self.next_response(messages);
        // Split into two deltas so callers see more than one chunk.
        let mid = response
            .char_indices()
            .nth(response.chars().count() / 2)
            .map(|(i, _)| i)
            .unwrap_or(0);
        let (head, tail) = response.split_at(mid);
        let chunks = vec![Ok(head.to_string()), Ok(tail.to_string())];
        Ok(Box::pin(futures::stream::iter(chunks)))
    }

    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
