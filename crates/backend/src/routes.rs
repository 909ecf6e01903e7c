use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::handlers;

/// Запас на multipart-обвязку сверх лимита размера файла
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Конфигурация всех роутов приложения
pub fn configure_routes(max_file_size: u64) -> Router {
    let upload_limit = usize::try_from(max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/health", get(handlers::system::health))
        .route("/api/health", get(handlers::system::health))
        .route("/api/config", get(handlers::system::get_config))
        .route(
            "/api/upload",
            post(handlers::files::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        // ========================================
        // USECASE u508: FILL ORDER TEMPLATE
        // ========================================
        .route("/api/u508/fill/start", post(handlers::usecases::u508_start_fill))
        .route("/api/u508/fill", get(handlers::usecases::u508_list_sessions))
        .route(
            "/api/u508/fill/:session_id/progress",
            get(handlers::usecases::u508_get_progress),
        )
        .route(
            "/api/u508/fill/:session_id/download",
            get(handlers::usecases::u508_download),
        )
        .route(
            "/api/u508/fill/:session_id",
            delete(handlers::usecases::u508_delete_session),
        )
}
