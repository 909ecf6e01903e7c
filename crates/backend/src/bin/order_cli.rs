//! Однократное заполнение шаблона из командной строки.

use anyhow::Context;
use clap::Parser;
use contracts::usecases::common::UseCaseError;
use contracts::usecases::u508_fill_order_template::PipelineStage;
use std::path::PathBuf;
use std::sync::Arc;

use backend::shared::config::{load_config, load_config_from, Config};
use backend::shared::llm::OpenAiProvider;
use backend::system;
use backend::usecases::u508_fill_order_template::{
    LlmMappingOracle, OrderPipeline, ProgressObserver,
};

#[derive(Parser, Debug)]
#[command(name = "order-cli", version, about = "Заполнение шаблона заказа по текстовым заказам магазинов")]
struct Args {
    /// Текстовый файл заказа
    #[arg(long)]
    order: PathBuf,

    /// Excel-шаблон (.xlsx)
    #[arg(long)]
    template: PathBuf,

    /// Куда сохранить результат; без него шаблон изменяется на месте
    #[arg(long)]
    output: Option<PathBuf>,

    /// Путь к config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Подробный журнал в stderr
    #[arg(long, short)]
    verbose: bool,
}

struct ConsoleObserver;

impl ProgressObserver for ConsoleObserver {
    fn on_stage(&self, stage: PipelineStage, message: &str) {
        println!("[{:>3}%] {}", stage.percent(), message);
    }

    fn on_detail(&self, message: &str) {
        println!("       {}", message);
    }

    fn on_failure(&self, error: &UseCaseError) {
        println!("[ -1%] {}", error);
    }
}

fn load(args: &Args) -> anyhow::Result<Config> {
    match &args.config {
        Some(path) => load_config_from(path),
        None => load_config().map(|(config, _)| config),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    system::tracing::initialize_cli(args.verbose);

    let config = load(&args)?;
    let api_key = config
        .llm
        .api_key()
        .context("API key is not configured: set DEEPSEEK_API_KEY or [llm].api_key")?
        .to_string();

    let target = match &args.output {
        Some(output) => {
            std::fs::copy(&args.template, output).with_context(|| {
                format!(
                    "Cannot copy {} to {}",
                    args.template.display(),
                    output.display()
                )
            })?;
            output.clone()
        }
        None => args.template.clone(),
    };

    let provider = OpenAiProvider::from_config(&config.llm, api_key);
    let pipeline = OrderPipeline::new(
        Arc::new(LlmMappingOracle::new(Arc::new(provider))),
        config.catalog.products.clone(),
        config.template.clone(),
    );

    let outcome = pipeline.run(&args.order, &target, &ConsoleObserver).await?;

    println!();
    println!("Результат: {}", outcome.summary.path.display());
    for order in &outcome.orders {
        println!("  {}:", order.store_name);
        for product in &order.products {
            println!("    {} x {}", product.name, product.quantity);
        }
    }
    if !outcome.summary.unmatched_stores.is_empty() {
        println!("Магазины без колонки: {}", outcome.summary.unmatched_stores.join(", "));
    }

    Ok(())
}
