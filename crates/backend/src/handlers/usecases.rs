use axum::{
    body::Body,
    extract::Path,
    http::{header, StatusCode},
    response::Response,
    Json,
};
use contracts::usecases::common::{codes, UseCaseError};
use contracts::usecases::u508_fill_order_template::{FillProgress, FillRequest, FillResponse};

use super::{config, executor};

fn status_for(error: &UseCaseError) -> StatusCode {
    match error.code.as_str() {
        codes::NOT_FOUND => StatusCode::NOT_FOUND,
        _ if error.is_caller_fault() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ============================================================================
// UseCase u508: Fill order template
// ============================================================================

/// POST /api/u508/fill/start
pub async fn u508_start_fill(
    Json(request): Json<FillRequest>,
) -> Result<Json<FillResponse>, (StatusCode, Json<UseCaseError>)> {
    let internal = |status: StatusCode| {
        (
            status,
            Json(UseCaseError::internal("Сервис не инициализирован")),
        )
    };
    let config = config().map_err(internal)?;
    let executor = executor().map_err(internal)?;

    if config.llm.api_key().is_none() {
        let e = UseCaseError::not_configured("API ключ не настроен (DEEPSEEK_API_KEY)");
        return Err((status_for(&e), Json(e)));
    }

    match executor.start_fill(request).await {
        Ok(response) => Ok(Json(response)),
        Err(e) if e.is_caller_fault() => {
            tracing::warn!("Rejected order fill request: {}", e);
            Err((status_for(&e), Json(e)))
        }
        Err(e) => {
            tracing::error!("Failed to start order fill: {}", e);
            Err((status_for(&e), Json(e)))
        }
    }
}

/// GET /api/u508/fill
pub async fn u508_list_sessions() -> Result<Json<Vec<FillProgress>>, StatusCode> {
    Ok(Json(executor()?.list_sessions()))
}

/// GET /api/u508/fill/:session_id/progress
pub async fn u508_get_progress(
    Path(session_id): Path<String>,
) -> Result<Json<FillProgress>, StatusCode> {
    match executor()?.get_progress(&session_id) {
        Some(progress) => Ok(Json(progress)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// GET /api/u508/fill/:session_id/download
pub async fn u508_download(Path(session_id): Path<String>) -> Result<Response, StatusCode> {
    let executor = executor()?;
    if executor.get_progress(&session_id).is_none() {
        return Err(StatusCode::NOT_FOUND);
    }
    let path = executor
        .result_file(&session_id)
        .ok_or(StatusCode::CONFLICT)?;

    let bytes = std::fs::read(&path).map_err(|e| {
        tracing::error!("Cannot read result {}: {}", path.display(), e);
        StatusCode::NOT_FOUND
    })?;

    let filename = format!("订货单_{}.xlsx", &session_id[..session_id.len().min(8)]);
    let disposition = format!(
        "attachment; filename=\"order.xlsx\"; filename*=UTF-8''{}",
        urlencoding::encode(&filename)
    );

    Response::builder()
        .header(
            header::CONTENT_TYPE,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        )
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from(bytes))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// DELETE /api/u508/fill/:session_id
pub async fn u508_delete_session(Path(session_id): Path<String>) -> Result<StatusCode, StatusCode> {
    if executor()?.delete_session(&session_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}
