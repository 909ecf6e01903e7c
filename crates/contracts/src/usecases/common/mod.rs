//! Общие типы UseCase: метаданные и структурированный результат

pub mod usecase_result;

pub use usecase_result::{codes, UseCaseError, UseCaseResult};

/// Идентификация UseCase в журналах и ответах health-check
pub trait UseCaseMetadata {
    /// Индекс, например "u508"
    fn usecase_index() -> &'static str;

    /// Техническое имя, например "fill_order_template"
    fn usecase_name() -> &'static str;

    /// Отображаемое имя для UI
    fn display_name() -> &'static str;

    fn description() -> &'static str;

    /// "u508_fill_order_template"
    fn full_name() -> String {
        format!("{}_{}", Self::usecase_index(), Self::usecase_name())
    }
}
