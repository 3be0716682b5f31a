//! Provider profile: the configured shape of a model provider before a client is built.

use crate::error::ProviderError;
use crate::provider::{CompletionOptions, ModelProvider};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderType {
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "local")]
    LocalCustom,
}

pub fn provider_type_slug(provider_type: ProviderType) -> &'static str {
    match provider_type {
        ProviderType::OpenAI => "openai",
        ProviderType::LocalCustom => "local",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_type")]
    pub provider_type: ProviderType,

    #[serde(default = "default_model")]
    pub model: String,

    /// Falls back to `OPENAI_API_KEY` when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL, e.g. `http://localhost:8080/v1`. Required for `local`.
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub default_options: CompletionOptions,
}

fn default_provider_type() -> ProviderType {
    ProviderType::OpenAI
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            model: default_model(),
            api_key: None,
            endpoint: None,
            default_options: CompletionOptions::default(),
        }
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model name cannot be empty".to_string());
        }
        if let Some(endpoint) = &self.endpoint {
            let url = reqwest::Url::parse(endpoint)
                .map_err(|e| format!("Invalid endpoint URL '{}': {}", endpoint, e))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(format!(
                    "Endpoint must use http or https, got '{}'",
                    url.scheme()
                ));
            }
        }
        if self.provider_type == ProviderType::LocalCustom && self.endpoint.is_none() {
            return Err("Local provider requires an endpoint".to_string());
        }
        if let Some(temperature) = self.default_options.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(format!(
                    "Temperature must be between 0.0 and 2.0, got {}",
                    temperature
                ));
            }
        }
        Ok(())
    }

    fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|key| !key.trim().is_empty()))
    }

    pub fn to_model_provider(&self) -> Result<ModelProvider, ProviderError> {
        self.validate().map_err(ProviderError::NotConfigured)?;
        match self.provider_type {
            ProviderType::OpenAI => {
                let api_key = self.resolved_api_key().ok_or_else(|| {
                    ProviderError::NotConfigured(format!(
                        "No API key configured. Set provider.api_key or {}.",
                        API_KEY_ENV
                    ))
                })?;
                Ok(ModelProvider::OpenAI {
                    model: self.model.clone(),
                    api_key,
                    base_url: self.endpoint.clone(),
                })
            }
            ProviderType::LocalCustom => Ok(ModelProvider::LocalCustom {
                model: self.model.clone(),
                endpoint: self.endpoint.clone().unwrap_or_default(),
                api_key: self.api_key.clone(),
            }),
        }
    }
}
