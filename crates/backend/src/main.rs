use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use backend::shared::config::{load_config, Config};
use backend::shared::llm::OpenAiProvider;
use backend::system::middleware::request_logger;
use backend::usecases::u508_fill_order_template::{
    FillExecutor, LlmMappingOracle, OrderPipeline, ProgressTracker,
};
use backend::{handlers, routes, system};

fn cors_layer(config: &Config) -> CorsLayer {
    let origin = if config.server.allow_cors_all {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            config
                .server
                .cors_origins
                .iter()
                .filter_map(|o| o.parse::<HeaderValue>().ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

fn build_executor(config: &Config) -> Arc<FillExecutor> {
    let provider = OpenAiProvider::from_config(&config.llm, config.llm.api_key().unwrap_or_default());
    let oracle = Arc::new(LlmMappingOracle::new(Arc::new(provider)));
    let pipeline = Arc::new(OrderPipeline::new(
        oracle,
        config.catalog.products.clone(),
        config.template.clone(),
    ));

    Arc::new(FillExecutor::new(
        Arc::new(ProgressTracker::new()),
        pipeline,
        config.storage.clone(),
    ))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, source) = load_config()?;
    config.storage.ensure_dirs()?;
    system::tracing::initialize(&config.storage.log_dir)?;

    tracing::info!("Configuration loaded from {}", source);
    if config.llm.api_key().is_none() {
        tracing::warn!("DEEPSEEK_API_KEY is not set, fill requests will be rejected");
    }

    handlers::init(config.clone(), build_executor(&config))?;

    let app = routes::configure_routes(config.limits.max_file_size)
        .layer(middleware::from_fn(request_logger))
        .layer(cors_layer(&config));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    tracing::info!("Attempting to bind server to http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            tracing::info!("Server successfully bound to {}", addr);
            listener
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(
                    "Error: Port {} is already in use. Please ensure no other process is using this port.",
                    config.server.port
                );
            } else {
                tracing::error!("Failed to bind to {}. Error: {}", addr, e);
            }
            return Err(e.into());
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
