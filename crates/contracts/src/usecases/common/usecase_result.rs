use serde::{Deserialize, Serialize};

pub type UseCaseResult<T> = Result<T, UseCaseError>;

/// Коды, общие для всех UseCase. Коды конкретного UseCase задаются рядом с ним.
pub mod codes {
    pub const VALIDATION: &str = "VALIDATION_ERROR";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const NOT_CONFIGURED: &str = "NOT_CONFIGURED";
    pub const INTERNAL: &str = "INTERNAL_ERROR";
}

/// Ошибка, которую видит вызывающая сторона: стабильный код, текст для человека, подробности
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseCaseError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl UseCaseError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(codes::VALIDATION, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(codes::NOT_FOUND, message)
    }

    pub fn not_configured(message: impl Into<String>) -> Self {
        Self::new(codes::NOT_CONFIGURED, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL, message)
    }

    /// Ошибка вызвана запросом или окружением вызывающего, а не сбоем обработки
    pub fn is_caller_fault(&self) -> bool {
        matches!(
            self.code.as_str(),
            codes::VALIDATION | codes::NOT_FOUND | codes::NOT_CONFIGURED
        )
    }
}

impl std::fmt::Display for UseCaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, ": {}", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for UseCaseError {}
