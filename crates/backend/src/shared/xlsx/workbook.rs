use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::package::patch_first_sheet;
use super::SpreadsheetError;

/// Первый лист шаблона: чтение через calamine, запись накапливается
/// в памяти и сохраняется одним вызовом `save`.
pub struct TemplateSheet {
    path: PathBuf,
    range: Range<Data>,
    pending: BTreeMap<(u32, u32), u32>,
}

impl TemplateSheet {
    pub fn open(path: &Path) -> Result<Self, SpreadsheetError> {
        let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e: calamine::XlsxError| {
            SpreadsheetError::Open {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or(SpreadsheetError::NoWorksheet)?
            .map_err(|e| SpreadsheetError::Open {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            range,
            pending: BTreeMap::new(),
        })
    }

    /// Последняя заполненная строка (1-based), 0 для пустого листа
    pub fn max_row(&self) -> u32 {
        self.range.end().map(|(row, _)| row + 1).unwrap_or(0)
    }

    /// Последняя заполненная колонка (1-based), 0 для пустого листа
    pub fn max_column(&self) -> u32 {
        self.range.end().map(|(_, col)| col + 1).unwrap_or(0)
    }

    /// Текст ячейки (1-based). Пустая ячейка дает `None`.
    pub fn text(&self, row: u32, column: u32) -> Option<String> {
        if row == 0 || column == 0 {
            return None;
        }
        let value = self.range.get_value((row - 1, column - 1))?;
        let text = match value {
            Data::Empty => return None,
            Data::String(s) => s.clone(),
            Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
            Data::Float(f) => f.to_string(),
            Data::Int(i) => i.to_string(),
            Data::Bool(b) => b.to_string(),
            other => other.to_string(),
        };
        Some(text)
    }

    /// Запоминает запись; повторная запись в ту же ячейку заменяет предыдущую
    pub fn set_number(&mut self, row: u32, column: u32, value: u32) {
        self.pending.insert((row, column), value);
    }

    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Сохраняет все записи разом. Без записей файл не трогается.
    pub fn save(self) -> Result<usize, SpreadsheetError> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        patch_first_sheet(&self.path, &self.pending)?;
        Ok(self.pending.len())
    }
}
