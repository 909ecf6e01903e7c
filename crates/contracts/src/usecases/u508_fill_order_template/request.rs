use serde::{Deserialize, Serialize};

/// Запрос на заполнение шаблона
///
/// Текст заказа передается либо ID загруженного файла, либо напрямую в `orderContent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillRequest {
    #[serde(rename = "orderFileId", default)]
    pub order_file_id: Option<String>,

    #[serde(rename = "orderContent", default)]
    pub order_content: Option<String>,

    #[serde(rename = "templateFileId")]
    pub template_file_id: String,
}
