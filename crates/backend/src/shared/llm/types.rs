use async_trait::async_trait;
use thiserror::Error;

/// Сбой обращения к модели. Повторов нет, вызывающий решает сам.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM transport error: {0}")]
    Transport(String),

    #[error("LLM rejected credentials: {0}")]
    Unauthorized(String),

    #[error("LLM rate limit exceeded")]
    RateLimited,

    #[error("LLM request could not be built: {0}")]
    BadRequest(String),

    #[error("LLM reply contains no choices")]
    NoChoices,
}

impl LlmError {
    /// Короткая метка для журналов
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::Transport(_) => "transport",
            LlmError::Unauthorized(_) => "unauthorized",
            LlmError::RateLimited => "rate_limited",
            LlmError::BadRequest(_) => "bad_request",
            LlmError::NoChoices => "no_choices",
        }
    }
}

/// Однократный запрос: необязательная инструкция и текст пользователя
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub instruction: Option<String>,
    pub prompt: String,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            instruction: None,
            prompt: prompt.into(),
        }
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }
}

/// Текст первого варианта ответа
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub model: String,
    pub total_tokens: Option<u32>,
    /// Ответ обрезан по лимиту длины
    pub truncated: bool,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError>;

    fn provider_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = CompletionRequest::new("data").with_instruction("rules");
        assert_eq!(request.prompt, "data");
        assert_eq!(request.instruction.as_deref(), Some("rules"));
        assert_eq!(CompletionRequest::new("x").instruction, None);
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(LlmError::RateLimited.kind(), "rate_limited");
        assert_eq!(LlmError::Transport("reset".into()).kind(), "transport");
    }
}
