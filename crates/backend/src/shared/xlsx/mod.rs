//! Чтение листа шаблона и сохранение правок с сохранением оформления.

pub mod package;
pub mod sheet_xml;
pub mod workbook;

#[cfg(test)]
pub(crate) mod test_support;

pub use workbook::TemplateSheet;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpreadsheetError {
    #[error("cannot open workbook {}: {message}", path.display())]
    Open { path: PathBuf, message: String },

    #[error("workbook has no worksheets")]
    NoWorksheet,

    #[error("invalid xlsx package: {0}")]
    Package(String),

    #[error("worksheet XML: {0}")]
    SheetXml(#[from] sheet_xml::SheetXmlError),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("cannot save workbook: {0}")]
    Io(#[from] std::io::Error),
}
