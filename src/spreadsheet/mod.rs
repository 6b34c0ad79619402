//! # Spreadsheet Reading Module
//!
//! Streams Excel 2007+ workbooks (.xlsx, .xlsm) straight out of their ZIP
//! package with quick-xml, without loading whole worksheets into a DOM.
//! Every accepted worksheet becomes a [`Table`] whose first used row is the
//! header row.
pub(crate) mod cell;
pub mod criteria;
pub(crate) mod excel;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod xlsx;

use crate::error::EtlError;
use crate::error::ResultMessage;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use crate::table::Table;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors raised while reading workbook files
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("File '{0}' not found in workbook package")]
    FileError(String),

    #[error("Workbook '{0}' contains no worksheets")]
    SpreadsheetEmptyError(String),

    #[error("Error cell in '{0}' sheet '{1}' at {2}: {3}")]
    CellValueError(String, String, String, String),

    #[error("Shared string index {1} out of range in '{0}'")]
    SharedStringError(String, usize),

    #[error("Date value '{0}' is outside the supported range")]
    DateValueError(String),

    #[error("Unsupported workbook format: '{0}'")]
    UnsupportedFormat(String),
}

/// Type alias for buffered file reader
pub(crate) type FileReader = BufReader<File>;

/// Common interface for workbook formats
pub(crate) trait Spreadsheet {
    /// File name of the workbook
    fn name(&self) -> String;

    /// Names of all worksheets in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// Reads every worksheet accepted by `criteria`
    fn read_sheets(&mut self, criteria: &Criteria) -> Result<Vec<Sheet>, EtlError>;
}

/// Opens a workbook, choosing the reader from the file extension
pub(crate) fn open_spreadsheet(path: &Path) -> Result<Box<dyn Spreadsheet>, EtlError> {
    let extension = path
        .extension()
        .map(|extension| extension.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "xlsx" | "xlsm" => Ok(Box::new(XlsxSpreadsheet::open(path)?)),
        _ => Err(SpreadsheetError::UnsupportedFormat(path.display().to_string()))?,
    }
}

/// Reads all data sheets of a workbook into tables, in workbook order.
///
/// # Arguments
/// * `path` - Workbook file
/// * `criteria` - Which sheets to skip and how to treat error cells
///
/// # Returns
/// One table per accepted worksheet, named after the sheet
pub fn read_workbook(path: &Path, criteria: &Criteria) -> Result<Vec<Table>, EtlError> {
    let prefix = path.display().to_string();
    let mut spreadsheet = open_spreadsheet(path).with_prefix(&prefix)?;
    let sheets = spreadsheet.read_sheets(criteria).with_prefix(&prefix)?;
    let mut tables = Vec::with_capacity(sheets.len());
    for sheet in sheets {
        if sheet.is_empty() {
            debug!(file = %sheet.file_name, sheet = %sheet.name, "sheet has no cells");
        }
        tables.push(sheet.into_table()?);
    }
    debug!(
        file = %spreadsheet.name(),
        sheets = spreadsheet.sheet_names().len(),
        tables = tables.len(),
        "workbook read"
    );
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::fixtures::WorkbookFixture;
    use tempfile::tempdir;

    #[test]
    fn read_workbook_tables() {
        let dir = tempdir().unwrap();
        let path = WorkbookFixture::new()
            .sheet("Notes", &[&["Read me"]])
            .sheet("IMD2019", &[&["code", "name", "Score"], &["E1", "Leeds 001A", "21.3"]])
            .sheet("Ranks", &[&["code", "Rank"], &["E1", "4"], &["E2", "17"]])
            .write(dir.path(), "IMD_19_LSOA.xlsx");

        let tables = read_workbook(&path, &Criteria::default()).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name, "IMD2019");
        assert_eq!(tables[0].columns, vec!["code", "name", "Score"]);
        assert_eq!(tables[1].name, "Ranks");
        assert_eq!(tables[1].height(), 2);
    }

    #[test]
    fn unsupported_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("IMD.ods");
        std::fs::write(&path, "").unwrap();

        let error = read_workbook(&path, &Criteria::default()).unwrap_err();
        assert!(error.to_string().contains("Unsupported workbook format"));
    }
}
