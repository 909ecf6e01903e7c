use axum::{extract::Multipart, http::StatusCode, Json};
use contracts::usecases::u508_fill_order_template::UploadResponse;
use std::path::Path;
use uuid::Uuid;

use super::config;
use crate::shared::format::format_bytes;

const ALLOWED_EXTENSIONS: [&str; 2] = ["txt", "xlsx"];

/// Расширение загружаемого файла в нижнем регистре, если оно допустимо
pub fn allowed_extension(filename: &str) -> Option<String> {
    let extension = Path::new(filename)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

/// POST /api/upload (multipart, поле `file`)
pub async fn upload(mut multipart: Multipart) -> Result<Json<UploadResponse>, (StatusCode, String)> {
    let config = config().map_err(|s| (s, "Service not initialized".to_string()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let extension = allowed_extension(&filename).ok_or((
            StatusCode::BAD_REQUEST,
            "Поддерживаются только файлы .txt и .xlsx".to_string(),
        ))?;

        let data = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("Cannot read upload: {}", e)))?;

        let size = data.len() as u64;
        if size > config.limits.max_file_size {
            return Err((
                StatusCode::PAYLOAD_TOO_LARGE,
                format!(
                    "Файл слишком большой: {} (максимум {})",
                    format_bytes(size),
                    format_bytes(config.limits.max_file_size)
                ),
            ));
        }

        let file_id = Uuid::new_v4().to_string();
        let path = config
            .storage
            .upload_dir
            .join(format!("{}.{}", file_id, extension));
        std::fs::write(&path, &data).map_err(|e| {
            tracing::error!("Cannot save upload {}: {}", path.display(), e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Cannot save file".to_string())
        })?;

        tracing::info!("Uploaded {} as {} ({})", filename, path.display(), format_bytes(size));

        return Ok(Json(UploadResponse {
            file_id,
            filename,
            size,
        }));
    }

    Err((StatusCode::BAD_REQUEST, "Missing 'file' field".to_string()))
}
