//! Точечная правка XML частей .xlsx пакета без полного разбора документа.
//!
//! Меняются только нужные элементы `<c>`; остальной текст части
//! (стили, формулы, объединения, расширения) сохраняется байт в байт.

use std::fmt::Write as _;

/// Открывающий тег элемента
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    /// Префикс пространства имен вместе с `:` (`"x:"`), пустой если его нет
    pub prefix: String,
    /// Позиция `<`
    pub start: usize,
    /// Позиция сразу после `>`
    pub end: usize,
    pub self_closing: bool,
    pub attributes: Vec<(String, String)>,
}

impl StartTag {
    /// Имя с префиксом этого тега: `qualified("row")` для `<x:sheetData>` дает `x:row`
    pub fn qualified(&self, local: &str) -> String {
        format!("{}{}", self.prefix, local)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Номер колонки (1-based) в буквы: 1 -> A, 27 -> AA
pub fn column_letters(mut column: u32) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push(b'A' + rem as u8);
        column = (column - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

pub fn cell_reference(row: u32, column: u32) -> String {
    format!("{}{}", column_letters(column), row)
}

/// "AB12" -> (12, 28)
pub fn parse_cell_reference(reference: &str) -> Option<(u32, u32)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let column = letters.chars().try_fold(0u32, |acc, c| {
        let value = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        acc.checked_mul(26)?.checked_add(value)
    })?;
    let row = digits.parse::<u32>().ok()?;
    Some((row, column))
}

/// Разбор атрибутов внутри тега; значения в одинарных или двойных кавычках
fn parse_attributes(inner: &str) -> Vec<(String, String)> {
    let mut attributes = Vec::new();
    let mut rest = inner;

    loop {
        rest = rest.trim_start();
        let Some(eq) = rest.find('=') else { break };
        let name = rest[..eq].trim().to_string();
        rest = rest[eq + 1..].trim_start();

        let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            break;
        };
        let Some(close) = rest[1..].find(quote) else { break };
        attributes.push((name, rest[1..close + 1].to_string()));
        rest = &rest[close + 2..];
    }

    attributes
}

/// Конец тега с учетом `>` внутри кавычек
fn tag_end(xml: &str, from: usize) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (offset, ch) in xml[from..].char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None if ch == '>' => return Some(from + offset + 1),
            None => {}
        }
    }
    None
}

/// Следующий открывающий тег с локальным именем `name` в `xml[from..limit]`,
/// с префиксом пространства имен или без него
pub fn find_start_tag(xml: &str, name: &str, from: usize, limit: usize) -> Option<StartTag> {
    let mut cursor = from;

    while cursor < limit {
        let found = cursor + xml[cursor..limit].find('<')?;
        let name_start = found + 1;
        let name_len = xml[name_start..]
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(xml.len() - name_start);
        let qualified = &xml[name_start..name_start + name_len];
        let (prefix, local) = match qualified.rfind(':') {
            Some(colon) => qualified.split_at(colon + 1),
            None => ("", qualified),
        };

        if local == name && !qualified.starts_with(['?', '!']) {
            let after = name_start + name_len;
            let end = tag_end(xml, after)?;
            let body = &xml[after..end - 1];
            let self_closing = body.ends_with('/');
            let inner = body.strip_suffix('/').unwrap_or(body);
            return Some(StartTag {
                prefix: prefix.to_string(),
                start: found,
                end,
                self_closing,
                attributes: parse_attributes(inner),
            });
        }
        cursor = name_start;
    }

    None
}

/// Конец элемента (после закрывающего тега). Вложенность одноименных
/// элементов не поддерживается, для `row` и `c` ее не бывает.
fn element_end(xml: &str, tag: &StartTag, name: &str, limit: usize) -> Option<usize> {
    if tag.self_closing {
        return Some(tag.end);
    }
    let closing = format!("</{}>", tag.qualified(name));
    xml[tag.end..limit]
        .find(&closing)
        .map(|pos| tag.end + pos + closing.len())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SheetXmlError {
    #[error("worksheet has no sheetData element")]
    NoSheetData,

    #[error("malformed worksheet XML near byte {0}")]
    Malformed(usize),
}

fn number_cell(prefix: &str, row: u32, column: u32, style: Option<&str>, value: u32) -> String {
    let mut cell = format!("<{}c r=\"{}\"", prefix, cell_reference(row, column));
    if let Some(style) = style {
        let _ = write!(cell, " s=\"{}\"", style);
    }
    let _ = write!(cell, "><{p}v>{}</{p}v></{p}c>", value, p = prefix);
    cell
}

/// Записывает число в ячейку `(row, column)` листа.
///
/// Существующая ячейка заменяется с сохранением стиля (`s`); тип и формула
/// убираются. Отсутствующие строка или ячейка вставляются с соблюдением порядка.
/// Новые элементы получают префикс пространства имен `sheetData`.
pub fn set_number_cell(xml: &str, row: u32, column: u32, value: u32) -> Result<String, SheetXmlError> {
    let data = find_start_tag(xml, "sheetData", 0, xml.len()).ok_or(SheetXmlError::NoSheetData)?;
    let prefix = data.prefix.as_str();

    if data.self_closing {
        let replacement = format!(
            "<{p}sheetData><{p}row r=\"{}\">{}</{p}row></{p}sheetData>",
            row,
            number_cell(prefix, row, column, None, value),
            p = prefix
        );
        return Ok(splice(xml, data.start, data.end, &replacement));
    }

    let data_end = data.end
        + xml[data.end..]
            .find(&format!("</{}>", data.qualified("sheetData")))
            .ok_or(SheetXmlError::Malformed(data.end))?;

    let mut cursor = data.end;
    let mut previous_row = 0u32;

    while let Some(tag) = find_start_tag(xml, "row", cursor, data_end) {
        let end = element_end(xml, &tag, "row", data_end).ok_or(SheetXmlError::Malformed(tag.start))?;
        let number = tag
            .attribute("r")
            .and_then(|r| r.parse::<u32>().ok())
            .unwrap_or(previous_row + 1);

        if number == row {
            return patch_row(xml, &tag, end, row, column, value);
        }
        if number > row {
            break;
        }

        previous_row = number;
        cursor = end;
    }

    // строки нет: вставляем перед первой строкой с большим номером
    let insert_at = find_start_tag(xml, "row", cursor, data_end)
        .map(|tag| tag.start)
        .unwrap_or(data_end);
    let new_row = format!(
        "<{p}row r=\"{}\">{}</{p}row>",
        row,
        number_cell(prefix, row, column, None, value),
        p = prefix
    );
    Ok(splice(xml, insert_at, insert_at, &new_row))
}

fn patch_row(
    xml: &str,
    row_tag: &StartTag,
    row_end: usize,
    row: u32,
    column: u32,
    value: u32,
) -> Result<String, SheetXmlError> {
    let prefix = row_tag.prefix.as_str();

    if row_tag.self_closing {
        let open = &xml[row_tag.start..row_tag.end - 2];
        let replacement = format!(
            "{}>{}</{}>",
            open.trim_end(),
            number_cell(prefix, row, column, None, value),
            row_tag.qualified("row")
        );
        return Ok(splice(xml, row_tag.start, row_tag.end, &replacement));
    }

    let content_end = row_end - format!("</{}>", row_tag.qualified("row")).len();
    let mut cursor = row_tag.end;
    let mut previous_column = 0u32;

    while let Some(cell) = find_start_tag(xml, "c", cursor, content_end) {
        let end = element_end(xml, &cell, "c", content_end).ok_or(SheetXmlError::Malformed(cell.start))?;
        let number = cell
            .attribute("r")
            .and_then(parse_cell_reference)
            .map(|(_, col)| col)
            .unwrap_or(previous_column + 1);

        if number == column {
            let replacement = number_cell(prefix, row, column, cell.attribute("s"), value);
            return Ok(splice(xml, cell.start, end, &replacement));
        }
        if number > column {
            let replacement = number_cell(prefix, row, column, None, value);
            return Ok(splice(xml, cell.start, cell.start, &replacement));
        }

        previous_column = number;
        cursor = end;
    }

    let replacement = number_cell(prefix, row, column, None, value);
    Ok(splice(xml, content_end, content_end, &replacement))
}

fn splice(xml: &str, from: usize, to: usize, replacement: &str) -> String {
    let mut result = String::with_capacity(xml.len() + replacement.len());
    result.push_str(&xml[..from]);
    result.push_str(replacement);
    result.push_str(&xml[to..]);
    result
}

/// Путь части первого листа из `xl/workbook.xml` и его связей
pub fn first_sheet_part(workbook_xml: &str, rels_xml: &str) -> Option<String> {
    let sheet = find_start_tag(workbook_xml, "sheet", 0, workbook_xml.len())?;
    let relationship_id = sheet
        .attributes
        .iter()
        .find(|(key, _)| key.ends_with(":id"))
        .map(|(_, value)| value.clone())?;

    let mut cursor = 0;
    while let Some(tag) = find_start_tag(rels_xml, "Relationship", cursor, rels_xml.len()) {
        if tag.attribute("Id") == Some(relationship_id.as_str()) {
            let target = tag.attribute("Target")?;
            return Some(match target.strip_prefix('/') {
                Some(absolute) => absolute.to_string(),
                None => format!("xl/{}", target),
            });
        }
        cursor = tag.end;
    }

    None
}

/// Помечает книгу для полного пересчета формул при открытии
pub fn enable_full_calc_on_load(workbook_xml: &str) -> String {
    if let Some(calc) = find_start_tag(workbook_xml, "calcPr", 0, workbook_xml.len()) {
        if calc.attribute("fullCalcOnLoad").is_some() {
            return workbook_xml.to_string();
        }
        let insert_at = if calc.self_closing { calc.end - 2 } else { calc.end - 1 };
        return splice(workbook_xml, insert_at, insert_at, " fullCalcOnLoad=\"1\"");
    }

    let prefix = find_start_tag(workbook_xml, "workbook", 0, workbook_xml.len())
        .map(|tag| tag.prefix)
        .unwrap_or_default();

    // calcPr идет после sheets/functionGroups/externalReferences/definedNames
    let insert_at = ["sheets", "functionGroups", "externalReferences", "definedNames"]
        .iter()
        .map(|name| format!("</{}{}>", prefix, name))
        .filter_map(|closing| workbook_xml.find(&closing).map(|pos| pos + closing.len()))
        .max();

    match insert_at {
        Some(pos) => splice(
            workbook_xml,
            pos,
            pos,
            &format!("<{}calcPr fullCalcOnLoad=\"1\"/>", prefix),
        ),
        None => workbook_xml.to_string(),
    }
}
