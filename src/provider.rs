//! Model Provider Abstraction
//!
//! Unified interface over the LLM HTTP APIs the pipeline can write with (OpenAI-compatible
//! servers including Ollama, Anthropic, Gemini). Every client classifies failures into
//! [`GenerationError`] so the executor can decide what is worth retrying.

use crate::error::{ApiError, GenerationError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

pub mod gemini;
pub mod profile;

pub use gemini::GeminiClient;
pub use profile::{ProviderConfig, ProviderType};

/// Resolved provider: credentials and endpoints ready for client construction
#[derive(Debug, Clone, PartialEq)]
pub enum ModelProvider {
    OpenAI {
        model: String,
        api_key: String,
        base_url: Option<String>,
    },
    Anthropic {
        model: String,
        api_key: String,
        base_url: Option<String>,
    },
    Ollama {
        model: String,
        base_url: Option<String>,
    },
    Gemini {
        model: String,
        api_key: String,
        base_url: Option<String>,
    },
    LocalCustom {
        model: String,
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

impl MessageRole {
    fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: Some(1.0),
            max_tokens: None,
            top_p: None,
        }
    }
}

/// Token counts reported by the provider. Reasoning tokens are billed as output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub reasoning_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
    pub finish_reason: Option<String>,
}

impl CompletionResponse {
    /// Provider stopped because the output token limit was hit.
    pub fn is_length_capped(&self) -> bool {
        matches!(
            self.finish_reason.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("length" | "max_tokens")
        )
    }

    /// Natural end of output, or no reason reported.
    pub fn finished_normally(&self) -> bool {
        match self.finish_reason.as_deref() {
            None => true,
            Some(reason) => matches!(
                reason.to_ascii_lowercase().as_str(),
                "stop" | "end_turn" | "stop_sequence" | "finish_reason_unspecified"
            ),
        }
    }
}

#[async_trait]
pub trait ModelProviderClient: Send + Sync {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, GenerationError>;

    fn provider_name(&self) -> &str;

    fn model_name(&self) -> &str;
}

/// Classify a non-success HTTP status.
pub fn classify_status(status: u16, body: &str) -> GenerationError {
    let detail = format!("status {}: {}", status, truncate(body, 300));
    match status {
        429 => GenerationError::RateLimited(detail),
        // Overloaded backends behave like rate limits: wait and try again.
        503 | 529 => GenerationError::RateLimited(detail),
        408 | 504 => GenerationError::Timeout(detail),
        400..=499 => GenerationError::InvalidRequest(detail),
        _ => GenerationError::Unknown(detail),
    }
}

fn map_http_error(error: reqwest::Error) -> GenerationError {
    if error.is_timeout() {
        GenerationError::Timeout(format!("Request timeout: {}", error))
    } else if let Some(status) = error.status() {
        classify_status(status.as_u16(), &error.to_string())
    } else if error.is_connect() {
        GenerationError::Unknown(format!("Connection error: {}", error))
    } else {
        GenerationError::Unknown(format!("HTTP error: {}", error))
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

/// Send a request and turn non-success statuses into classified errors.
async fn send_checked(request: RequestBuilder) -> Result<Response, GenerationError> {
    let response = request.send().await.map_err(map_http_error)?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(classify_status(status.as_u16(), &body))
}

fn parse_error(error: impl std::fmt::Display) -> GenerationError {
    GenerationError::Unknown(format!("Failed to parse response: {}", error))
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PROVIDER_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

fn build_provider_http_client() -> Result<Client, ApiError> {
    Client::builder()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .timeout(PROVIDER_HTTP_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ApiError::ProviderError(format!("Failed to create HTTP client: {}", e)))
}

// OpenAI-compatible request/response structures
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
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
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
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
    #[serde(default)]
    completion_tokens_details: Option<CompletionTokensDetails>,
}

#[derive(Deserialize)]
struct CompletionTokensDetails {
    #[serde(default)]
    reasoning_tokens: u64,
}

impl ChatCompletionResponse {
    fn into_completion(self) -> Result<CompletionResponse, GenerationError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::Unknown("No choices in response".to_string()))?;
        let usage = self
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                // completion_tokens includes reasoning here; split so it is billed once.
                completion_tokens: u
                    .completion_tokens
                    .saturating_sub(
                        u.completion_tokens_details
                            .as_ref()
                            .map(|d| d.reasoning_tokens)
                            .unwrap_or(0),
                    ),
                reasoning_tokens: u
                    .completion_tokens_details
                    .map(|d| d.reasoning_tokens)
                    .unwrap_or(0),
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();
        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            model: self.model,
            usage,
            finish_reason: choice.finish_reason,
        })
    }
}

/// Client for any OpenAI-compatible chat completions API: OpenAI itself, Ollama's
/// `/v1` endpoint, or a custom local server.
pub struct OpenAICompatibleClient {
    client: Client,
    provider_name: &'static str,
    model: String,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAICompatibleClient {
    pub fn openai(model: String, api_key: String, base_url: Option<String>) -> Result<Self, ApiError> {
        Self::with_base_url(
            "openai",
            model,
            Some(api_key),
            base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
        )
    }

    pub fn ollama(model: String, base_url: Option<String>) -> Result<Self, ApiError> {
        let base = base_url.unwrap_or_else(|| "http://localhost:11434".to_string());
        Self::with_base_url(
            "ollama",
            model,
            None,
            format!("{}/v1", base.trim_end_matches('/')),
        )
    }

    pub fn local(model: String, endpoint: String, api_key: Option<String>) -> Result<Self, ApiError> {
        Self::with_base_url("local", model, api_key, endpoint)
    }

    fn with_base_url(
        provider_name: &'static str,
        model: String,
        api_key: Option<String>,
        base_url: String,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            client: build_provider_http_client()?,
            provider_name,
            model,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ModelProviderClient for OpenAICompatibleClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, GenerationError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages
                .into_iter()
                .map(|msg| OpenAIMessage {
                    role: msg.role.as_str().to_string(),
                    content: Some(msg.content),
                })
                .collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            top_p: options.top_p,
            stream: false,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let mut builder = self.client.post(&url).json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let completion: ChatCompletionResponse = send_checked(builder)
            .await?
            .json()
            .await
            .map_err(parse_error)?;
        completion.into_completion()
    }

    fn provider_name(&self) -> &str {
        self.provider_name
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    model: String,
    usage: Option<AnthropicUsage>,
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
}

impl AnthropicResponse {
    fn into_completion(self) -> CompletionResponse {
        let content = self
            .content
            .into_iter()
            .filter_map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");
        let usage = self
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
                reasoning_tokens: 0,
                total_tokens: u.input_tokens + u.output_tokens,
            })
            .unwrap_or_default();
        CompletionResponse {
            content,
            model: self.model,
            usage,
            finish_reason: self.stop_reason,
        }
    }
}

const ANTHROPIC_DEFAULT_MAX_TOKENS: u32 = 16_000;

pub struct AnthropicClient {
    client: Client,
    model: String,
    api_key: String,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(model: String, api_key: String, base_url: Option<String>) -> Result<Self, ApiError> {
        Ok(Self {
            client: build_provider_http_client()?,
            model,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| "https://api.anthropic.com/v1".to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

#[async_trait]
impl ModelProviderClient for AnthropicClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, GenerationError> {
        let system: Vec<String> = messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.clone())
            .collect();
        let turns: Vec<_> = messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| json!({"role": m.role.as_str(), "content": m.content}))
            .collect();

        let mut body = json!({
            "model": self.model,
            "max_tokens": options.max_tokens.unwrap_or(ANTHROPIC_DEFAULT_MAX_TOKENS),
            "messages": turns,
        });
        if !system.is_empty() {
            body["system"] = json!(system.join("\n\n"));
        }
        if let Some(temp) = options.temperature {
            body["temperature"] = json!(temp);
        }

        let builder = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body);

        let completion: AnthropicResponse = send_checked(builder)
            .await?
            .json()
            .await
            .map_err(parse_error)?;
        Ok(completion.into_completion())
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_client(
        provider: &ModelProvider,
    ) -> Result<Box<dyn ModelProviderClient>, ApiError> {
        match provider {
            ModelProvider::OpenAI {
                model,
                api_key,
                base_url,
            } => Ok(Box::new(OpenAICompatibleClient::openai(
                model.clone(),
                api_key.clone(),
                base_url.clone(),
            )?)),
            ModelProvider::Anthropic {
                model,
                api_key,
                base_url,
            } => Ok(Box::new(AnthropicClient::new(
                model.clone(),
                api_key.clone(),
                base_url.clone(),
            )?)),
            ModelProvider::Ollama { model, base_url } => Ok(Box::new(
                OpenAICompatibleClient::ollama(model.clone(), base_url.clone())?,
            )),
            ModelProvider::Gemini {
                model,
                api_key,
                base_url,
            } => Ok(Box::new(GeminiClient::new(
                model.clone(),
                api_key.clone(),
                base_url.clone(),
            )?)),
            ModelProvider::LocalCustom {
                model,
                endpoint,
                api_key,
            } => Ok(Box::new(OpenAICompatibleClient::local(
                model.clone(),
                endpoint.clone(),
                api_key.clone(),
            )?)),
        }
    }
}
