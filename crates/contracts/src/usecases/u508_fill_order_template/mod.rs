pub mod order;
pub mod progress;
pub mod request;
pub mod response;

pub use order::{LineItem, NameMapping, ParsedOrder, ProductQuantity, StandardizedOrder};
pub use progress::{FillProgress, FillStatus, PipelineStage, ProgressLogEntry, ProgressLogKind};
pub use request::FillRequest;
pub use response::{ConfigResponse, FillResponse, FillStartStatus, UploadResponse};

use crate::usecases::common::UseCaseMetadata;

pub struct FillOrderTemplate;

impl UseCaseMetadata for FillOrderTemplate {
    fn usecase_index() -> &'static str {
        "u508"
    }

    fn usecase_name() -> &'static str {
        "fill_order_template"
    }

    fn display_name() -> &'static str {
        "Заполнение шаблона заказа"
    }

    fn description() -> &'static str {
        "Разбор текстовых заказов магазинов, приведение названий товаров к стандартным и запись количеств в Excel-шаблон"
    }
}
