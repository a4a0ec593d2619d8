//! Content generator boundary.
//!
//! The executor only ever talks to a [`ContentGenerator`]. [`ProviderContentGenerator`]
//! adapts any configured [`ModelProviderClient`] to it; tests use scripted generators.

use crate::error::GenerationError;
use crate::plan::WordRange;
use crate::provider::{ChatMessage, CompletionOptions, ModelProviderClient, TokenUsage};
use async_trait::async_trait;
use tracing::warn;

/// One prompt for one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Unit label for logs, e.g. `section 1.2.1`.
    pub label: String,
    /// System-level writing instructions.
    pub instructions: String,
    pub prompt: String,
    pub word_range: WordRange,
    /// Closing text of the preceding unit, empty when unavailable.
    pub context: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedText {
    pub text: String,
    pub usage: TokenUsage,
    pub model: String,
}

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest)
        -> Result<GeneratedText, GenerationError>;
}

/// Generator backed by an LLM provider client.
pub struct ProviderContentGenerator {
    client: Box<dyn ModelProviderClient>,
    options: CompletionOptions,
}

impl ProviderContentGenerator {
    pub fn new(client: Box<dyn ModelProviderClient>, options: CompletionOptions) -> Self {
        Self { client, options }
    }

    pub fn provider_name(&self) -> &str {
        self.client.provider_name()
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    /// Chat messages for a request: instructions as system, prompt plus context as user.
    pub fn messages(request: &GenerationRequest) -> Vec<ChatMessage> {
        let mut user = request.prompt.clone();
        if !request.context.trim().is_empty() {
            user.push_str("\n\nThe text immediately preceding this part of the book ends with:\n\"\"\"\n");
            user.push_str(request.context.trim());
            user.push_str("\n\"\"\"\nContinue naturally from it without repeating it.");
        }
        vec![
            ChatMessage::system(request.instructions.clone()),
            ChatMessage::user(user),
        ]
    }
}

#[async_trait]
impl ContentGenerator for ProviderContentGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedText, GenerationError> {
        let response = self
            .client
            .complete(Self::messages(request), self.options.clone())
            .await?;
        if response.is_length_capped() {
            let reason = response.finish_reason.unwrap_or_default();
            warn!(unit = %request.label, reason = %reason, "Response hit the output token limit");
            return Err(GenerationError::Truncated(reason));
        }
        if !response.finished_normally() {
            warn!(
                unit = %request.label,
                reason = response.finish_reason.as_deref().unwrap_or_default(),
                "Response finished for an unexpected reason"
            );
        }
        Ok(GeneratedText {
            text: response.content,
            usage: response.usage,
            model: response.model,
        })
    }
}
