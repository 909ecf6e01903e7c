//! Настоящие .xlsx шаблоны для тестов (пишутся через rust_xlsxwriter).

use rust_xlsxwriter::{Format, FormatBorder, Workbook};
use std::path::Path;

use super::sheet_xml::column_letters;

pub(crate) struct TemplateFixture {
    /// Заголовки строки 2, колонки с 1
    pub headers: Vec<&'static str>,
    /// Названия товаров в колонке 3, строки с 3
    pub products: Vec<&'static str>,
}

impl TemplateFixture {
    pub(crate) fn standard() -> Self {
        Self {
            headers: vec!["序号", "商品编码", "商品名称", "黄记", "金海万象城", "五江天街", "入库价"],
            products: vec!["四海150g鲜装牛肉丸", "四海170g鱼蛋鲜装", "四海250g手打墨鱼丸鲜装"],
        }
    }

    /// Колонки магазинов: между "商品名称" и последней колонкой цены
    fn store_columns(&self) -> std::ops::Range<u16> {
        3..(self.headers.len() as u16 - 1)
    }
}

pub(crate) fn write_template(path: &Path, fixture: &TemplateFixture) {
    let mut workbook = Workbook::new();
    let border = Format::new().set_border(FormatBorder::Thin);
    let title = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name("订货单").unwrap();
    sheet
        .merge_range(0, 0, 0, fixture.headers.len() as u16 - 1, "四海订货单", &title)
        .unwrap();

    for (col, header) in fixture.headers.iter().enumerate() {
        sheet.write_string(1, col as u16, *header).unwrap();
    }

    let last_col = fixture.headers.len() as u16 - 1;
    for (i, product) in fixture.products.iter().enumerate() {
        let row = 2 + i as u32;
        sheet.write_number(row, 0, (i + 1) as f64).unwrap();
        sheet.write_string(row, 1, format!("SH{:03}", i + 1)).unwrap();
        sheet.write_string(row, 2, *product).unwrap();
        for col in fixture.store_columns() {
            sheet.write_blank(row, col, &border).unwrap();
        }
        sheet.write_number(row, last_col, 12.5).unwrap();
    }

    let total_row = 2 + fixture.products.len() as u32;
    sheet.write_string(total_row, 2, "合计").unwrap();
    for col in fixture.store_columns() {
        let letters = column_letters(col as u32 + 1);
        let formula = format!("=SUM({0}3:{0}{1})", letters, total_row);
        sheet.write_formula(total_row, col, formula.as_str()).unwrap();
    }

    let notes = workbook.add_worksheet();
    notes.set_name("说明").unwrap();
    notes.write_string(0, 0, "数量填写在门店列").unwrap();

    workbook.save(path).unwrap();
}
