//! Перезапись первого листа внутри ZIP пакета .xlsx.
//!
//! Все части, кроме листа и `xl/workbook.xml`, копируются без распаковки.
//! Новый пакет пишется во временный файл рядом с исходным и атомарно
//! переименовывается поверх него: при ошибке исходный файл не меняется.

use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::sheet_xml::{enable_full_calc_on_load, first_sheet_part, set_number_cell};
use super::SpreadsheetError;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";

fn read_part<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<String, SpreadsheetError> {
    let mut part = archive
        .by_name(name)
        .map_err(|_| SpreadsheetError::Package(format!("missing part {}", name)))?;
    let mut content = String::new();
    part.read_to_string(&mut content)?;
    Ok(content)
}

/// Записывает числа `(row, column) -> value` (1-based) в первый лист книги
pub fn patch_first_sheet(
    path: &Path,
    cells: &BTreeMap<(u32, u32), u32>,
) -> Result<(), SpreadsheetError> {
    let bytes = std::fs::read(path)?;
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let workbook_xml = read_part(&mut archive, WORKBOOK_PART)?;
    let rels_xml = read_part(&mut archive, WORKBOOK_RELS_PART)?;
    let sheet_part = first_sheet_part(&workbook_xml, &rels_xml)
        .ok_or_else(|| SpreadsheetError::Package("cannot resolve first worksheet".to_string()))?;

    let mut sheet_xml = read_part(&mut archive, &sheet_part)?;
    for (&(row, column), &value) in cells {
        sheet_xml = set_number_cell(&sheet_xml, row, column, value)?;
    }

    let mut replacements: HashMap<&str, String> = HashMap::new();
    replacements.insert(WORKBOOK_PART, enable_full_calc_on_load(&workbook_xml));
    replacements.insert(sheet_part.as_str(), sheet_xml);

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let temp = tempfile::NamedTempFile::new_in(dir)?;

    let mut writer = ZipWriter::new(temp);

    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index)?;
        let name = entry.name().to_string();

        match replacements.get(name.as_str()) {
            Some(content) => {
                drop(entry);
                let options =
                    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
                writer.start_file(name.as_str(), options)?;
                writer.write_all(content.as_bytes())?;
            }
            None => writer.raw_copy_file(entry)?,
        }
    }

    let temp = writer.finish()?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| SpreadsheetError::Io(e.error))?;

    tracing::debug!(
        "Patched {} cells in {} of {}",
        cells.len(),
        sheet_part,
        path.display()
    );

    Ok(())
}
