//! Запись количеств в шаблон: поиск колонки магазина и строки товара.

use contracts::usecases::u508_fill_order_template::{ProductQuantity, StandardizedOrder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::shared::xlsx::{SpreadsheetError, TemplateSheet};

/// Разметка шаблона. Строки и колонки 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateLayout {
    pub header_row: u32,
    pub first_product_row: u32,
    pub product_name_column: u32,
    /// Заголовки служебных колонок, которые не являются магазинами
    pub structural_columns: Vec<String>,
    /// Общие части названий магазинов для последнего прохода сопоставления
    pub store_aliases: Vec<String>,
}

impl Default for TemplateLayout {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            header_row: 2,
            first_product_row: 3,
            product_name_column: 3,
            structural_columns: strings(&[
                "序号", "商品编码", "商品名称", "规格", "入库价", "售价", "前台毛利", "供应商编码",
                "供应商名称",
            ]),
            store_aliases: strings(&["五江", "金海", "洋湖", "砂之船", "邵阳", "岳阳"]),
        }
    }
}

/// Колонка магазина из строки заголовков
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreColumn {
    pub column: u32,
    pub label: String,
}

/// Итог записи в шаблон
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateSummary {
    pub path: PathBuf,
    pub cells_written: usize,
    pub unmatched_stores: Vec<String>,
    /// (магазин, товар)
    pub unmatched_products: Vec<(String, String)>,
}

pub fn clean_store_name(store_name: &str) -> &str {
    store_name.trim().trim_end_matches([':', '：']).trim()
}

pub fn store_columns(sheet: &TemplateSheet, layout: &TemplateLayout) -> Vec<StoreColumn> {
    (1..=sheet.max_column())
        .filter_map(|column| {
            let label = sheet.text(layout.header_row, column)?;
            let label = label.trim();
            if label.is_empty() || layout.structural_columns.iter().any(|s| s == label) {
                return None;
            }
            Some(StoreColumn {
                column,
                label: label.to_string(),
            })
        })
        .collect()
}

/// Три прохода: точное совпадение, вхождение в любую сторону, общий псевдоним.
/// В каждом проходе побеждает самая левая колонка.
pub fn resolve_store_column<'a>(
    columns: &'a [StoreColumn],
    store_name: &str,
    aliases: &[String],
) -> Option<&'a StoreColumn> {
    if store_name.is_empty() {
        return None;
    }

    columns
        .iter()
        .find(|c| c.label == store_name)
        .or_else(|| {
            columns
                .iter()
                .find(|c| c.label.contains(store_name) || store_name.contains(c.label.as_str()))
        })
        .or_else(|| {
            columns.iter().find(|c| {
                aliases.iter().any(|alias| {
                    !alias.is_empty()
                        && store_name.contains(alias.as_str())
                        && c.label.contains(alias.as_str())
                })
            })
        })
}

/// Первая строка товара, название в которой содержит стандартное название
pub fn find_product_row(sheet: &TemplateSheet, layout: &TemplateLayout, canonical: &str) -> Option<u32> {
    (layout.first_product_row..=sheet.max_row()).find(|&row| {
        sheet
            .text(row, layout.product_name_column)
            .is_some_and(|name| name.contains(canonical))
    })
}

/// Записывает количества всех магазинов и сохраняет файл один раз.
/// Магазин без колонки и товар без строки пропускаются с предупреждением.
pub fn update_template(
    path: &Path,
    orders: &[StandardizedOrder],
    layout: &TemplateLayout,
) -> Result<UpdateSummary, SpreadsheetError> {
    let mut sheet = TemplateSheet::open(path)?;
    let columns = store_columns(&sheet, layout);
    tracing::info!(
        "Template store columns: {:?}",
        columns.iter().map(|c| c.label.as_str()).collect::<Vec<_>>()
    );

    let mut summary = UpdateSummary {
        path: path.to_path_buf(),
        ..UpdateSummary::default()
    };

    for order in orders {
        let store = clean_store_name(&order.store_name);

        let Some(target) = resolve_store_column(&columns, store, &layout.store_aliases) else {
            tracing::warn!("No template column for store '{}', skipping it", order.store_name);
            summary.unmatched_stores.push(order.store_name.clone());
            continue;
        };

        for ProductQuantity { name: product, quantity } in &order.products {
            match find_product_row(&sheet, layout, product) {
                Some(row) => {
                    sheet.set_number(row, target.column, *quantity);
                    tracing::info!("{} / {}: {} -> row {}", target.label, product, quantity, row);
                }
                None => {
                    tracing::warn!("No template row for product '{}' (store '{}')", product, store);
                    summary
                        .unmatched_products
                        .push((store.to_string(), product.clone()));
                }
            }
        }
    }

    summary.cells_written = sheet.save()?;
    tracing::info!(
        "Template {} updated: {} cells written",
        path.display(),
        summary.cells_written
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::xlsx::test_support::{write_template, TemplateFixture};

    fn column(column: u32, label: &str) -> StoreColumn {
        StoreColumn {
            column,
            label: label.to_string(),
        }
    }

    fn order(store: &str, products: &[(&str, u32)]) -> StandardizedOrder {
        let mut order = StandardizedOrder::new(store);
        for (name, qty) in products {
            order.set(*name, *qty);
        }
        order
    }

    #[test]
    fn test_store_name_cleanup() {
        assert_eq!(clean_store_name("黄记："), "黄记");
        assert_eq!(clean_store_name(" 洋湖店:: "), "洋湖店");
    }

    #[test]
    fn test_resolve_by_containment() {
        let columns = vec![column(4, "黄记"), column(5, "金海万象城")];
        let aliases = TemplateLayout::default().store_aliases;
        assert_eq!(resolve_store_column(&columns, "金海", &aliases).map(|c| c.column), Some(5));
        assert_eq!(resolve_store_column(&columns, "黄记长沙店", &[]).map(|c| c.column), Some(4));
    }

    #[test]
    fn test_exact_match_beats_containment() {
        let columns = vec![column(4, "洋湖店"), column(5, "洋湖")];
        assert_eq!(resolve_store_column(&columns, "洋湖", &[]).map(|c| c.column), Some(5));
    }

    #[test]
    fn test_resolve_by_alias() {
        let columns = vec![column(4, "黄记"), column(6, "五江天街")];
        let aliases = TemplateLayout::default().store_aliases;
        assert_eq!(resolve_store_column(&columns, "五江店", &aliases).map(|c| c.column), Some(6));
        assert_eq!(resolve_store_column(&columns, "五江店", &[]), None);
    }

    #[test]
    fn test_empty_store_matches_nothing() {
        let columns = vec![column(4, "黄记")];
        assert_eq!(resolve_store_column(&columns, "", &[]), None);
    }

    #[test]
    fn test_store_columns_skip_structural_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.xlsx");
        write_template(&path, &TemplateFixture::standard());

        let sheet = TemplateSheet::open(&path).unwrap();
        let labels: Vec<_> = store_columns(&sheet, &TemplateLayout::default())
            .into_iter()
            .map(|c| (c.column, c.label))
            .collect();
        assert_eq!(
            labels,
            vec![
                (4, "黄记".to_string()),
                (5, "金海万象城".to_string()),
                (6, "五江天街".to_string())
            ]
        );
    }

    #[test]
    fn test_update_template_writes_matched_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.xlsx");
        write_template(&path, &TemplateFixture::standard());

        let orders = vec![
            order("黄记:", &[("四海150g鲜装牛肉丸", 2), ("不存在的商品", 1)]),
            order("金海", &[("四海170g鱼蛋鲜装", 4)]),
            order("未知店铺", &[("四海170g鱼蛋鲜装", 8)]),
        ];
        let summary = update_template(&path, &orders, &TemplateLayout::default()).unwrap();

        assert_eq!(summary.cells_written, 2);
        assert_eq!(summary.unmatched_stores, vec!["未知店铺".to_string()]);
        assert_eq!(
            summary.unmatched_products,
            vec![("黄记".to_string(), "不存在的商品".to_string())]
        );

        let sheet = TemplateSheet::open(&path).unwrap();
        assert_eq!(sheet.text(3, 4).as_deref(), Some("2"));
        assert_eq!(sheet.text(4, 5).as_deref(), Some("4"));
        assert_eq!(sheet.text(4, 4), None);
    }

    #[test]
    fn test_first_matching_row_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.xlsx");
        let fixture = TemplateFixture {
            headers: vec!["序号", "商品编码", "商品名称", "洋湖", "售价"],
            products: vec!["四海墨鱼丸", "四海墨鱼丸(大包)"],
        };
        write_template(&path, &fixture);

        update_template(&path, &[order("洋湖", &[("四海墨鱼丸", 3)])], &TemplateLayout::default())
            .unwrap();

        let sheet = TemplateSheet::open(&path).unwrap();
        assert_eq!(sheet.text(3, 4).as_deref(), Some("3"));
        assert_eq!(sheet.text(4, 4), None);
    }

    #[test]
    fn test_same_cell_takes_later_line_in_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.xlsx");
        write_template(&path, &TemplateFixture::standard());

        // оба названия попадают в строку 5; в тексте "四海..." идет вторым
        let orders = vec![order("黄记", &[("墨鱼丸", 4), ("四海250g手打墨鱼丸鲜装", 9)])];
        let summary = update_template(&path, &orders, &TemplateLayout::default()).unwrap();

        assert_eq!(summary.cells_written, 1);
        let sheet = TemplateSheet::open(&path).unwrap();
        assert_eq!(sheet.text(5, 4).as_deref(), Some("9"));
    }
}
