use serde::{Deserialize, Serialize};

/// Ответ на запуск заполнения
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillResponse {
    #[serde(rename = "sessionId")]
    pub session_id: String,

    pub status: FillStartStatus,

    pub message: String,
}

/// Статус запуска
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum FillStartStatus {
    Started,
    Failed,
}

/// Результат загрузки файла
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(rename = "fileId")]
    pub file_id: String,

    pub filename: String,

    pub size: u64,
}

/// Публичная часть конфигурации
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResponse {
    #[serde(rename = "hasApiKey")]
    pub has_api_key: bool,

    #[serde(rename = "standardProducts")]
    pub standard_products: Vec<String>,

    #[serde(rename = "maxFileSize")]
    pub max_file_size: u64,
}
