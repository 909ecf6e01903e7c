use super::types::{Completion, CompletionRequest, LlmError, LlmProvider};
use crate::shared::config::LlmConfig;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, FinishReason,
    },
    Client,
};
use async_trait::async_trait;

/// Провайдер для OpenAI-совместимых API (DeepSeek по умолчанию)
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAiProvider {
    /// Endpoint, модель и температура берутся из секции `[llm]`
    pub fn from_config(config: &LlmConfig, api_key: impl Into<String>) -> Self {
        let client = Client::with_config(
            OpenAIConfig::new()
                .with_api_key(api_key.into())
                .with_api_base(config.base_url.clone()),
        );

        Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature as f32,
        }
    }
}

/// Инструкция уходит системным сообщением, текст запроса пользовательским
fn build_messages(request: &CompletionRequest) -> Result<Vec<ChatCompletionRequestMessage>, LlmError> {
    let mut messages = Vec::with_capacity(2);

    if let Some(instruction) = &request.instruction {
        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(instruction.as_str())
                .build()
                .map_err(|e| LlmError::BadRequest(e.to_string()))?
                .into(),
        );
    }

    messages.push(
        ChatCompletionRequestUserMessageArgs::default()
            .content(request.prompt.as_str())
            .build()
            .map_err(|e| LlmError::BadRequest(e.to_string()))?
            .into(),
    );

    Ok(messages)
}

/// Классификация текста ошибки API
fn classify_api_error(err_str: String) -> LlmError {
    let lower = err_str.to_lowercase();
    if lower.contains("401") || lower.contains("authentication") {
        LlmError::Unauthorized(err_str)
    } else if lower.contains("429") || lower.contains("rate limit") {
        LlmError::RateLimited
    } else {
        LlmError::Transport(err_str)
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(build_messages(&request)?)
            .temperature(self.temperature)
            .build()
            .map_err(|e| LlmError::BadRequest(e.to_string()))?;

        tracing::debug!(
            "Sending completion request to model {} ({} prompt chars)",
            self.model,
            request.prompt.chars().count()
        );

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| classify_api_error(e.to_string()))?;

        let choice = response.choices.first().ok_or(LlmError::NoChoices)?;

        Ok(Completion {
            text: choice.message.content.clone().unwrap_or_default(),
            model: response.model.clone(),
            total_tokens: response.usage.as_ref().map(|u| u.total_tokens),
            truncated: matches!(choice.finish_reason, Some(FinishReason::Length)),
        })
    }

    fn provider_name(&self) -> &str {
        "OpenAI-compatible"
    }
}
