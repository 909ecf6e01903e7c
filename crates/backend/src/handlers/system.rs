use axum::{http::StatusCode, Json};
use contracts::usecases::common::UseCaseMetadata;
use contracts::usecases::u508_fill_order_template::{ConfigResponse, FillOrderTemplate};
use serde_json::{json, Value};

use super::{config, executor};

/// GET /health, GET /api/health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "usecase": FillOrderTemplate::full_name(),
        "display_name": FillOrderTemplate::display_name(),
        "description": FillOrderTemplate::description(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// GET /api/config
pub async fn get_config() -> Result<Json<ConfigResponse>, StatusCode> {
    let config = config()?;
    Ok(Json(ConfigResponse {
        has_api_key: config.llm.api_key().is_some(),
        standard_products: executor()?.catalog().to_vec(),
        max_file_size: config.limits.max_file_size,
    }))
}
