//! Provider configuration as written in config files, and its resolution into a
//! [`ModelProvider`] with credentials.

use super::{CompletionOptions, ModelProvider};
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    #[serde(rename = "openai")]
    OpenAI,
    Anthropic,
    Ollama,
    Gemini,
    #[serde(rename = "local")]
    LocalCustom,
}

impl ProviderType {
    /// Environment variable consulted for the API key when none is configured.
    pub fn default_api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderType::OpenAI => Some("OPENAI_API_KEY"),
            ProviderType::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderType::Gemini => Some("GEMINI_API_KEY"),
            ProviderType::Ollama | ProviderType::LocalCustom => None,
        }
    }

    fn requires_api_key(&self) -> bool {
        matches!(
            self,
            ProviderType::OpenAI | ProviderType::Anthropic | ProviderType::Gemini
        )
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderType::OpenAI => "openai",
            ProviderType::Anthropic => "anthropic",
            ProviderType::Ollama => "ollama",
            ProviderType::Gemini => "gemini",
            ProviderType::LocalCustom => "local",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_type")]
    pub provider_type: ProviderType,

    #[serde(default = "default_model")]
    pub model: String,

    /// Inline API key. Prefer `api_key_env` so keys stay out of config files.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Name of the environment variable holding the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Base URL override (required for `local`).
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub default_options: CompletionOptions,
}

fn default_provider_type() -> ProviderType {
    ProviderType::Gemini
}

fn default_model() -> String {
    "gemini-3-pro-preview".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            model: default_model(),
            api_key: None,
            api_key_env: None,
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
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(format!(
                    "Endpoint must start with http:// or https://: {}",
                    endpoint
                ));
            }
        }
        if self.provider_type == ProviderType::LocalCustom && self.endpoint.is_none() {
            return Err("Local provider requires an endpoint".to_string());
        }
        if let Some(temperature) = self.default_options.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(format!("Temperature must be within 0.0-2.0: {}", temperature));
            }
        }
        Ok(())
    }

    /// Resolve the API key: inline value first, then the configured or default env var.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Some(key.clone());
        }
        let env_name = self
            .api_key_env
            .as_deref()
            .or_else(|| self.provider_type.default_api_key_env())?;
        std::env::var(env_name).ok().filter(|k| !k.trim().is_empty())
    }

    pub fn to_model_provider(&self) -> Result<ModelProvider, ApiError> {
        self.validate().map_err(ApiError::ConfigError)?;
        let api_key = self.resolve_api_key();
        if self.provider_type.requires_api_key() && api_key.is_none() {
            let env_name = self
                .api_key_env
                .as_deref()
                .or_else(|| self.provider_type.default_api_key_env())
                .unwrap_or("api_key");
            return Err(ApiError::ProviderNotConfigured(format!(
                "{} provider needs an API key: set provider.api_key or {}",
                self.provider_type, env_name
            )));
        }
        let model = self.model.clone();
        let base_url = self.endpoint.clone();
        let api_key_or_empty = api_key.clone().unwrap_or_default();

        Ok(match self.provider_type {
            ProviderType::OpenAI => ModelProvider::OpenAI {
                model,
                api_key: api_key_or_empty,
                base_url,
            },
            ProviderType::Anthropic => ModelProvider::Anthropic {
                model,
                api_key: api_key_or_empty,
                base_url,
            },
            ProviderType::Gemini => ModelProvider::Gemini {
                model,
                api_key: api_key_or_empty,
                base_url,
            },
            ProviderType::Ollama => ModelProvider::Ollama { model, base_url },
            ProviderType::LocalCustom => ModelProvider::LocalCustom {
                model,
                endpoint: base_url.unwrap_or_default(),
                api_key,
            },
        })
    }
}
