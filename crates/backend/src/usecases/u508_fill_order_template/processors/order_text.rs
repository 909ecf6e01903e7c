//! Разбиение текста заказа на блоки магазинов и выделение названия магазина.

use contracts::usecases::u508_fill_order_template::ParsedOrder;
use once_cell::sync::Lazy;
use regex::Regex;

/// Название магазина, если в блоке не нашлось строки-заголовка
pub const UNKNOWN_STORE: &str = "未知店铺";

/// Признак строки с количеством: "<число>件"
static QUANTITY_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+件").expect("quantity marker regex must compile"));

/// Непустые строки одного магазина в порядке документа
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOrderBlock {
    pub lines: Vec<String>,
}

/// Делит текст по пустым строкам. Строки обрезаются, пустые блоки отбрасываются.
pub fn split_blocks(text: &str) -> Vec<RawOrderBlock> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut blocks = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(RawOrderBlock {
                    lines: std::mem::take(&mut current),
                });
            }
        } else {
            current.push(line.to_string());
        }
    }

    if !current.is_empty() {
        blocks.push(RawOrderBlock { lines: current });
    }

    blocks
}

fn has_quantity_marker(line: &str) -> bool {
    QUANTITY_MARKER.is_match(line)
}

/// Выделяет название магазина за один проход по строкам блока.
///
/// Приоритет:
/// 1. строка с `:` без маркера количества считается заголовком, товары идут после нее;
/// 2. первая строка без маркера количества считается заголовком;
/// 3. иначе магазин неизвестен, весь блок состоит из строк товаров.
pub fn parse_block(block: &RawOrderBlock) -> ParsedOrder {
    for (i, line) in block.lines.iter().enumerate() {
        if has_quantity_marker(line) {
            continue;
        }

        if line.contains(':') {
            return ParsedOrder {
                store_name: line.trim_end_matches([':', '：']).to_string(),
                product_lines: block.lines[i + 1..].to_vec(),
            };
        }

        if i == 0 {
            return ParsedOrder {
                store_name: line.clone(),
                product_lines: block.lines[1..].to_vec(),
            };
        }
    }

    tracing::warn!(
        "No store label found in block starting with '{}', using placeholder",
        block.lines.first().map(String::as_str).unwrap_or_default()
    );

    ParsedOrder {
        store_name: UNKNOWN_STORE.to_string(),
        product_lines: block.lines.clone(),
    }
}

pub fn parse_blocks(blocks: &[RawOrderBlock]) -> Vec<ParsedOrder> {
    blocks.iter().map(parse_block).collect()
}
