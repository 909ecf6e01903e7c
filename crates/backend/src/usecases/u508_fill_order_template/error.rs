use contracts::usecases::common::UseCaseError;
use std::path::PathBuf;
use thiserror::Error;

use crate::shared::llm::LlmError;
use crate::shared::xlsx::SpreadsheetError;

/// Ошибки сопоставления названий внешним оракулом
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("mapping oracle call failed: {0}")]
    Oracle(#[from] LlmError),

    #[error("oracle reply contains no JSON object")]
    NoJsonObject,

    #[error("oracle reply is not a flat string-to-string object: {0}")]
    MalformedReply(String),
}

/// Фатальные ошибки заполнения шаблона. Мягкие ошибки разбора
/// (нет заголовка магазина, нераспознанная строка) сюда не попадают.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("cannot read order file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("order text contains no store blocks")]
    EmptyOrder,

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Spreadsheet(#[from] SpreadsheetError),
}

impl OrderError {
    pub fn code(&self) -> &'static str {
        match self {
            OrderError::Io { .. } => "IO_ERROR",
            OrderError::EmptyOrder => "EMPTY_ORDER",
            OrderError::Mapping(_) => "MAPPING_ERROR",
            OrderError::Spreadsheet(_) => "SPREADSHEET_ERROR",
        }
    }

    /// Итоговая ошибка для наблюдателя
    pub fn to_usecase_error(&self) -> UseCaseError {
        let message = match self {
            OrderError::Io { .. } => "Не удалось прочитать файл заказа",
            OrderError::EmptyOrder => "В тексте заказа нет ни одного блока магазина",
            OrderError::Mapping(_) => "Не удалось сопоставить названия товаров",
            OrderError::Spreadsheet(_) => "Не удалось обновить шаблон",
        };
        UseCaseError::new(self.code(), message).with_details(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(OrderError::EmptyOrder.code(), "EMPTY_ORDER");
        assert_eq!(
            OrderError::from(MappingError::NoJsonObject).code(),
            "MAPPING_ERROR"
        );
        assert_eq!(
            OrderError::from(SpreadsheetError::NoWorksheet).code(),
            "SPREADSHEET_ERROR"
        );
    }

    #[test]
    fn test_usecase_error_carries_details() {
        let err = OrderError::Io {
            path: PathBuf::from("uploads/order.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        }
        .to_usecase_error();
        assert_eq!(err.code, "IO_ERROR");
        assert!(err
            .details
            .as_deref()
            .is_some_and(|d| d.contains("uploads/order.txt")));
    }
}
