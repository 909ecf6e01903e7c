//! Нормализация названий товаров и генерация вариантов для сопоставления.

use contracts::usecases::u508_fill_order_template::ParsedOrder;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use super::line_item::parse_line;

/// Декоративный модификатор, не влияющий на выбор товара
pub const FRESH_MODIFIER: &str = "鲜装";

/// "150克", "150G" -> "150g"
static WEIGHT_UNIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+)[克G]").expect("weight unit regex must compile"));

static WEIGHT_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+g").expect("weight prefix regex must compile"));

/// Идемпотентна: пробелы удаляются до замены единиц, а замена
/// не порождает новых совпадений.
pub fn normalize(raw: &str) -> String {
    let compact: String = raw.trim().chars().filter(|c| !c.is_whitespace()).collect();
    WEIGHT_UNIT.replace_all(&compact, "${1}g").into_owned()
}

pub fn strip_weight_prefix(name: &str) -> String {
    WEIGHT_PREFIX.replace(name, "").into_owned()
}

pub fn remove_modifier(name: &str) -> String {
    name.replace(FRESH_MODIFIER, "")
}

/// Варианты одного нормализованного названия: само название, без веса,
/// без модификатора и без того и другого. Пустые варианты не включаются.
/// Для последнего сначала убирается модификатор, затем префикс веса.
pub fn expand(name: &str) -> BTreeSet<String> {
    let without_modifier = remove_modifier(name);

    [
        name.to_string(),
        strip_weight_prefix(name),
        strip_weight_prefix(&without_modifier),
        without_modifier,
    ]
    .into_iter()
    .filter(|variant| !variant.is_empty())
    .collect()
}

/// Все варианты всех распознанных строк заказа (один запрос к оракулу на заказ)
pub fn collect_variants(orders: &[ParsedOrder]) -> BTreeSet<String> {
    orders
        .iter()
        .flat_map(|order| order.product_lines.iter())
        .filter_map(|line| parse_line(line))
        .flat_map(|item| expand(&normalize(&item.raw_name)))
        .collect()
}
