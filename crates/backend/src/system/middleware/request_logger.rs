use axum::body::to_bytes;
use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Local;

use crate::shared::format::format_number;

/// Middleware для логирования HTTP запросов
///
/// Выводит в консоль время, длительность, размер ответа, статус, метод и путь.
/// Файлы скачивания (`/download`) не буферизуются.
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();

    let response = next.run(req).await;
    let status = response.status().as_u16();

    if uri.path().ends_with("/download") {
        tracing::info!("{} {} {} ({}ms)", status, method, uri.path(), start.elapsed().as_millis());
        return response;
    }

    let (parts, body) = response.into_parts();

    // Читаем тело ответа, чтобы узнать реальный размер
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!("{} {} {}: cannot read response body: {}", status, method, uri.path(), e);
            return Response::from_parts(parts, Body::default());
        }
    };

    let duration = start.elapsed();

    // Голубой для 2xx, коричневый для остальных
    let color_code = if (200..300).contains(&status) { "36" } else { "33" };

    println!(
        "\x1b[{}m{}\x1b[0m | {:>5}ms | {:>12} | {} {:>6} {}",
        color_code,
        Local::now().format("%H:%M:%S"),
        duration.as_millis(),
        format_number(bytes.len() as u64),
        status,
        method,
        uri.path()
    );
    tracing::debug!("{} {} {} {} bytes", status, method, uri.path(), bytes.len());

    // Создаем новый ответ с прочитанным телом
    Response::from_parts(parts, Body::from(bytes))
}
