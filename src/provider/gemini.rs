//! Gemini `generateContent` client.

use super::{
    build_provider_http_client, parse_error, send_checked, ChatMessage, CompletionOptions,
    CompletionResponse, MessageRole, ModelProviderClient, TokenUsage,
};
use crate::error::{ApiError, GenerationError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiClient {
    client: Client,
    model: String,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(model: String, api_key: String, base_url: Option<String>) -> Result<Self, ApiError> {
        Ok(Self {
            client: build_provider_http_client()?,
            model,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    fn build_request(messages: Vec<ChatMessage>, options: &CompletionOptions) -> GeminiRequest {
        let mut system = Vec::new();
        let mut contents = Vec::new();
        for message in messages {
            match message.role {
                MessageRole::System => system.push(message.content),
                MessageRole::User => contents.push(GeminiContent {
                    role: "user".to_string(),
                    parts: vec![GeminiPart {
                        text: Some(message.content),
                    }],
                }),
                MessageRole::Assistant => contents.push(GeminiContent {
                    role: "model".to_string(),
                    parts: vec![GeminiPart {
                        text: Some(message.content),
                    }],
                }),
            }
        }

        GeminiRequest {
            contents,
            system_instruction: (!system.is_empty()).then(|| GeminiSystemInstruction {
                parts: vec![GeminiPart {
                    text: Some(system.join("\n\n")),
                }],
            }),
            generation_config: Some(GeminiGenerationConfig {
                temperature: options.temperature,
                top_p: options.top_p,
                max_output_tokens: options.max_tokens,
            }),
        }
    }
}

#[async_trait]
impl ModelProviderClient for GeminiClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, GenerationError> {
        let request = Self::build_request(messages, &options);
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let builder = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request);

        let response: GeminiResponse = send_checked(builder)
            .await?
            .json()
            .await
            .map_err(parse_error)?;
        response.into_completion(&self.model)
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "topP", skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GeminiUsageMetadata>,
    #[serde(rename = "modelVersion")]
    model_version: Option<String>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)] // Matches API naming
struct GeminiUsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u64,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u64,
    #[serde(rename = "thoughtsTokenCount", default)]
    thoughts_token_count: u64,
    #[serde(rename = "totalTokenCount", default)]
    total_token_count: u64,
}

#[derive(Debug, Deserialize)]
struct GeminiPromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

impl GeminiResponse {
    fn into_completion(self, requested_model: &str) -> Result<CompletionResponse, GenerationError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(GenerationError::InvalidRequest(format!(
                "Prompt blocked: {}",
                reason
            )));
        }
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| parse_error("no candidates in response"))?;
        let content = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        let usage = self
            .usage_metadata
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
                reasoning_tokens: u.thoughts_token_count,
                total_tokens: u.total_token_count,
            })
            .unwrap_or_default();
        Ok(CompletionResponse {
            content,
            model: self
                .model_version
                .unwrap_or_else(|| requested_model.to_string()),
            usage,
            finish_reason: candidate.finish_reason,
        })
    }
}
