//! Применение сопоставления названий к распознанным строкам заказов.

use contracts::usecases::u508_fill_order_template::{
    NameMapping, ParsedOrder, StandardizedOrder,
};

use super::line_item::parse_line;
use super::product_name::{normalize, strip_weight_prefix};

/// Как было найдено стандартное название
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// По нормализованному названию
    Direct,
    /// По названию без префикса веса
    WeightStripped,
    /// Сопоставления нет, используется нормализованное название
    Fallback,
}

/// Стандартное название для сырого названия товара. Никогда не пустое
/// для непустого входа.
pub fn canonical_name(raw_name: &str, mapping: &NameMapping) -> (String, Resolution) {
    let normalized = normalize(raw_name);

    if let Some(canonical) = mapping.get(&normalized) {
        return (canonical.clone(), Resolution::Direct);
    }

    if let Some(canonical) = mapping.get(&strip_weight_prefix(&normalized)) {
        return (canonical.clone(), Resolution::WeightStripped);
    }

    (normalized, Resolution::Fallback)
}

pub fn standardize_order(order: &ParsedOrder, mapping: &NameMapping) -> StandardizedOrder {
    let mut result = StandardizedOrder::new(order.store_name.clone());

    for line in &order.product_lines {
        let Some(item) = parse_line(line) else {
            tracing::warn!(
                "Store '{}': skipping unrecognized line '{}'",
                order.store_name,
                line
            );
            continue;
        };

        let (canonical, resolution) = canonical_name(&item.raw_name, mapping);
        if resolution == Resolution::Fallback {
            tracing::warn!(
                "Store '{}': no mapping for '{}', using '{}' as is",
                order.store_name,
                item.raw_name,
                canonical
            );
        }

        if let Some(previous) = result.set(canonical.clone(), item.quantity) {
            tracing::warn!(
                "Store '{}': '{}' listed again, quantity {} replaced by {}",
                order.store_name,
                canonical,
                previous,
                item.quantity
            );
        }
    }

    result
}

pub fn standardize(orders: &[ParsedOrder], mapping: &NameMapping) -> Vec<StandardizedOrder> {
    orders
        .iter()
        .map(|order| standardize_order(order, mapping))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::u508_fill_order_template::processors::order_text::{
        parse_blocks, split_blocks,
    };

    fn mapping(pairs: &[(&str, &str)]) -> NameMapping {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn order(store: &str, lines: &[&str]) -> ParsedOrder {
        ParsedOrder {
            store_name: store.to_string(),
            product_lines: lines.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_mapped_name_from_block() {
        let orders = parse_blocks(&split_blocks("黄记:\n150g鲜装牛肉丸:2件\n"));
        let result = standardize(&orders, &mapping(&[("150g鲜装牛肉丸", "四海150g鲜装牛肉丸")]));

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].store_name, "黄记");
        assert_eq!(result[0].products.len(), 1);
        assert_eq!(result[0].quantity("四海150g鲜装牛肉丸"), Some(2));
    }

    #[test]
    fn test_unmapped_name_falls_back_to_normalized() {
        let result = standardize_order(&order("金海", &["墨鱼丸5"]), &NameMapping::new());
        assert_eq!(result.quantity("墨鱼丸"), Some(5));
    }

    #[test]
    fn test_weight_stripped_lookup() {
        let map = mapping(&[("鱼蛋", "四海鱼蛋")]);
        assert_eq!(
            canonical_name("250克 鱼蛋", &map),
            ("四海鱼蛋".to_string(), Resolution::WeightStripped)
        );
    }

    #[test]
    fn test_direct_lookup_wins_over_stripped() {
        let map = mapping(&[("250g鱼蛋", "四海250g鱼蛋"), ("鱼蛋", "四海鱼蛋")]);
        assert_eq!(canonical_name("250g鱼蛋", &map).1, Resolution::Direct);
    }

    #[test]
    fn test_repeated_product_last_write_wins() {
        let map = mapping(&[("墨鱼丸", "四海墨鱼丸"), ("鲜装墨鱼丸", "四海墨鱼丸")]);
        let result = standardize_order(&order("洋湖", &["墨鱼丸:3件", "鲜装墨鱼丸  5"]), &map);
        assert_eq!(result.products.len(), 1);
        assert_eq!(result.quantity("四海墨鱼丸"), Some(5));
    }

    #[test]
    fn test_every_parsed_item_is_kept() {
        let lines = ["鱼蛋:1件", "谢谢", "牛肉丸  2", "香菇贡丸3件"];
        let result = standardize_order(&order("A", &lines), &NameMapping::new());
        let parsed = lines.iter().filter(|l| parse_line(l).is_some()).count();
        assert_eq!(result.products.len(), parsed);
        assert_eq!(result.products.iter().map(|p| p.quantity).sum::<u32>(), 6);
    }
}
