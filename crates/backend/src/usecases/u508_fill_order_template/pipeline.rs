//! Конвейер заполнения шаблона:
//! чтение -> разбор -> сопоставление -> стандартизация -> запись.

use contracts::usecases::common::UseCaseError;
use contracts::usecases::u508_fill_order_template::{
    NameMapping, PipelineStage, StandardizedOrder,
};
use std::path::Path;
use std::sync::Arc;

use super::error::OrderError;
use super::mapping_oracle::MappingOracle;
use super::processors::line_item::parse_line;
use super::processors::order_text::{parse_blocks, split_blocks, UNKNOWN_STORE};
use super::processors::product_name::collect_variants;
use super::processors::standardizer::standardize;
use super::processors::template_writer::{update_template, TemplateLayout, UpdateSummary};

/// Получатель событий прогресса
pub trait ProgressObserver: Send + Sync {
    fn on_stage(&self, stage: PipelineStage, message: &str);

    fn on_detail(&self, _message: &str) {}

    fn on_failure(&self, error: &UseCaseError) {
        self.on_stage(PipelineStage::Failed, &error.message);
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub orders: Vec<StandardizedOrder>,
    pub summary: UpdateSummary,
}

/// Текущий этап одного запуска
struct StageRun<'a> {
    stage: PipelineStage,
    observer: &'a dyn ProgressObserver,
}

impl<'a> StageRun<'a> {
    fn new(observer: &'a dyn ProgressObserver) -> Self {
        Self {
            stage: PipelineStage::Pending,
            observer,
        }
    }

    fn advance(&mut self, next: PipelineStage, message: &str) {
        if !self.stage.can_advance_to(next) {
            tracing::warn!("Invalid stage transition {:?} -> {:?}", self.stage, next);
            return;
        }
        self.stage = next;
        tracing::info!("[{}%] {}", next.percent(), message);
        self.observer.on_stage(next, message);
    }

    fn detail(&self, message: &str) {
        tracing::info!("{}", message);
        self.observer.on_detail(message);
    }

    fn fail(&mut self, error: &OrderError) {
        tracing::error!("Order failed at {:?}: {}", self.stage, error);
        if self.stage.can_advance_to(PipelineStage::Failed) {
            self.stage = PipelineStage::Failed;
            self.observer.on_failure(&error.to_usecase_error());
        }
    }
}

/// Конвейер с внедренными каталогом, разметкой шаблона и оракулом
pub struct OrderPipeline {
    oracle: Arc<dyn MappingOracle>,
    catalog: Vec<String>,
    layout: TemplateLayout,
}

impl OrderPipeline {
    pub fn new(oracle: Arc<dyn MappingOracle>, catalog: Vec<String>, layout: TemplateLayout) -> Self {
        Self {
            oracle,
            catalog,
            layout,
        }
    }

    pub fn catalog(&self) -> &[String] {
        &self.catalog
    }

    /// Обрабатывает заказ целиком. Шаблон по `template_path` изменяется на
    /// месте и только после успешной стандартизации.
    pub async fn run(
        &self,
        order_path: &Path,
        template_path: &Path,
        observer: &dyn ProgressObserver,
    ) -> Result<PipelineOutcome, OrderError> {
        let mut run = StageRun::new(observer);

        match self.run_stages(&mut run, order_path, template_path).await {
            Ok(outcome) => {
                run.advance(
                    PipelineStage::Completed,
                    &format!(
                        "Готово: записано ячеек {}, магазинов {}",
                        outcome.summary.cells_written,
                        outcome.orders.len()
                    ),
                );
                Ok(outcome)
            }
            Err(error) => {
                run.fail(&error);
                Err(error)
            }
        }
    }

    async fn run_stages(
        &self,
        run: &mut StageRun<'_>,
        order_path: &Path,
        template_path: &Path,
    ) -> Result<PipelineOutcome, OrderError> {
        run.advance(PipelineStage::Reading, "Чтение файла заказа");
        let text = std::fs::read_to_string(order_path).map_err(|source| OrderError::Io {
            path: order_path.to_path_buf(),
            source,
        })?;
        let blocks = split_blocks(&text);
        if blocks.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        run.detail(&format!("Прочитано блоков заказа: {}", blocks.len()));

        run.advance(PipelineStage::Parsing, "Разбор заказов магазинов");
        let orders = parse_blocks(&blocks);
        for order in &orders {
            if order.store_name == UNKNOWN_STORE {
                run.detail("Блок без названия магазина");
            }
            let skipped = order
                .product_lines
                .iter()
                .filter(|line| parse_line(line).is_none())
                .count();
            if skipped > 0 {
                run.detail(&format!(
                    "{}: пропущено нераспознанных строк {}",
                    order.store_name, skipped
                ));
            }
        }

        run.advance(PipelineStage::Mapping, "Сопоставление названий товаров");
        let variants = collect_variants(&orders);
        let mapping = if variants.is_empty() {
            run.detail("Нет распознанных товаров, сопоставление не требуется");
            NameMapping::new()
        } else {
            self.oracle.resolve(&variants, &self.catalog).await?
        };
        run.detail(&format!(
            "Сопоставлено вариантов: {} из {}",
            variants.iter().filter(|v| mapping.contains_key(*v)).count(),
            variants.len()
        ));

        run.advance(PipelineStage::Standardizing, "Приведение к стандартным названиям");
        let standardized = standardize(&orders, &mapping);
        for order in &standardized {
            run.detail(&format!("{}: товаров {}", order.store_name, order.products.len()));
        }

        run.advance(PipelineStage::Writing, "Запись количеств в шаблон");
        let summary = update_template(template_path, &standardized, &self.layout)?;
        for store in &summary.unmatched_stores {
            run.detail(&format!("Колонка магазина не найдена: {}", store));
        }
        for (store, product) in &summary.unmatched_products {
            run.detail(&format!("Строка товара не найдена: {} / {}", store, product));
        }

        Ok(PipelineOutcome {
            orders: standardized,
            summary,
        })
    }
}
