//! Сопоставление вариантов названий стандартным товарам через внешний LLM.

use async_trait::async_trait;
use contracts::usecases::u508_fill_order_template::NameMapping;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::error::MappingError;
use crate::shared::llm::{CompletionRequest, LlmProvider};

/// Внешний источник сопоставления "вариант -> стандартное название".
/// Полнота ответа не гарантируется, отсутствующие ключи допустимы.
#[async_trait]
pub trait MappingOracle: Send + Sync {
    async fn resolve(
        &self,
        variants: &BTreeSet<String>,
        catalog: &[String],
    ) -> Result<NameMapping, MappingError>;
}

const ORACLE_INSTRUCTION: &str = "你是商品名称标准化助手，只输出一个JSON对象。";

/// Оракул поверх чат-модели: один запрос, без повторов
pub struct LlmMappingOracle {
    provider: Arc<dyn LlmProvider>,
}

impl LlmMappingOracle {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl MappingOracle for LlmMappingOracle {
    async fn resolve(
        &self,
        variants: &BTreeSet<String>,
        catalog: &[String],
    ) -> Result<NameMapping, MappingError> {
        tracing::info!(
            "Requesting mapping of {} variants against {} products from {}",
            variants.len(),
            catalog.len(),
            self.provider.provider_name()
        );

        let request = CompletionRequest::new(build_prompt(variants, catalog))
            .with_instruction(ORACLE_INSTRUCTION);
        let completion = self.provider.complete(request).await.map_err(|e| {
            tracing::error!("Oracle call failed ({}): {}", e.kind(), e);
            e
        })?;

        tracing::debug!("Raw oracle reply: {}", completion.text);
        if completion.truncated {
            tracing::warn!("Oracle reply from {} was cut by the length limit", completion.model);
        }

        let mapping = parse_mapping_reply(&completion.text)?;

        let missing = variants.iter().filter(|v| !mapping.contains_key(*v)).count();
        if missing > 0 {
            tracing::warn!("Oracle reply does not cover {} of {} variants", missing, variants.len());
        }
        tracing::info!(
            "Oracle mapped {} variants (tokens used: {:?})",
            mapping.len(),
            completion.total_tokens
        );

        Ok(mapping)
    }
}

fn pretty_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "[]".to_string())
}

/// Текст запроса: стандартный список, варианты, правила выбора и пример ответа
pub fn build_prompt(variants: &BTreeSet<String>, catalog: &[String]) -> String {
    format!(
        r#"请帮我将以下商品名称（包括各种变体）映射到标准的商品全称。

标准商品全称列表：
{catalog}

需要映射的商品名称（包括简写和变体）：
{variants}

映射规则和示例：
1. 优先根据重量信息精确匹配：
   - "150g鲜装牛肉丸" → "四海150g鲜装牛肉丸"
   - "170g鱼蛋鲜装" → "四海170g鱼蛋鲜装"
   - "250g手打牛筋丸" → "四海250g手打牛筋丸鲜装"

2. 关键词匹配（无重量信息时选择最常见规格）：
   - "牛肉丸" → "四海150g鲜装牛肉丸"（默认规格）
   - "鱼蛋鲜装" → "四海170g鱼蛋鲜装"
   - "手打牛肉丸" → "四海250g手打牛肉丸鲜装"

3. 同义词处理：
   - "香菇贡丸" = "手打香菇贡丸" → "四海250g手打香菇贡丸鲜装"
   - "台湾花枝味丸" = "台湾花枝味鱼丸" → "四海170g鲜装台湾花枝味鱼丸"
   - "八爪鱼味鱼球" → "四海170g八爪鱼味鱼球鲜装"

4. 变体处理：
   - "手打香茹丸"（错别字"茹"）→ "四海250g手打香菇贡丸鲜装"
   - "克" = "g"：统一为g

请返回JSON格式的映射关系，每个输入名称都必须有对应的标准全称：
{{
    "鱼蛋鲜装": "四海170g鱼蛋鲜装",
    "170g鱼蛋鲜装": "四海170g鱼蛋鲜装",
    "牛肉丸": "四海150g鲜装牛肉丸"
}}

只返回JSON格式，不要其他说明文字。
"#,
        catalog = pretty_json(catalog),
        variants = pretty_json(variants),
    )
}

/// Первый сбалансированный объект `{...}` в тексте.
/// Скобки внутри строковых литералов не учитываются.
pub fn extract_first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

pub fn parse_mapping_reply(reply: &str) -> Result<NameMapping, MappingError> {
    let object = extract_first_json_object(reply).ok_or(MappingError::NoJsonObject)?;
    serde_json::from_str::<HashMap<String, String>>(object)
        .map_err(|e| MappingError::MalformedReply(e.to_string()))
}
