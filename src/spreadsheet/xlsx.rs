use crate::error::EtlError;
use crate::helpers::xml::attribute_value;
use crate::helpers::xml::StartTagExt;
use crate::helpers::zip::PackageExt;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::excel;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::FileReader;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELATIONSHIPS_PART: &str = "xl/_rels/workbook.xml.rels";
const STYLES_PART: &str = "xl/styles.xml";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// SpreadsheetML element names
mod tag {
    use quick_xml::name::QName;

    pub(super) const WORKBOOK_PROPERTIES: QName = QName(b"workbookPr");
    pub(super) const SHEET: QName = QName(b"sheet");

    pub(super) const NUMBER_FORMATS: QName = QName(b"numFmts");
    pub(super) const NUMBER_FORMAT: QName = QName(b"numFmt");
    pub(super) const CELL_FORMATS: QName = QName(b"cellXfs");
    pub(super) const CELL_FORMAT: QName = QName(b"xf");

    pub(super) const STRING_ITEM: QName = QName(b"si");

    pub(super) const ROW: QName = QName(b"row");
    pub(super) const CELL: QName = QName(b"c");
    pub(super) const INLINE_STRING: QName = QName(b"is");
    pub(super) const VALUE: QName = QName(b"v");
}

/// An Excel XLSX workbook opened from disk
pub(crate) struct XlsxSpreadsheet {
    pub(crate) name: String,
    zip: ZipArchive<FileReader>,
    /// Cell type implied by each cell style, indexed by the `s` attribute
    styles: Vec<CellType>,
    /// (sheet name, worksheet part) in workbook order
    worksheets: Vec<(String, String)>,
    shared_strings: Vec<String>,
}

impl XlsxSpreadsheet {
    /// Opens an XLSX workbook and parses its structure
    ///
    /// Loads the sheet list, cell styles and shared strings up front;
    /// worksheets are streamed later by `read_sheets`.
    pub(crate) fn open(path: &Path) -> Result<XlsxSpreadsheet, EtlError> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut zip = ZipArchive::new(BufReader::new(File::open(path)?))?;
        let (worksheets, is_1904) = read_workbook_part(&mut zip)?;
        if worksheets.is_empty() {
            Err(SpreadsheetError::SpreadsheetEmptyError(name.to_owned()))?
        }
        let styles = read_styles_part(&mut zip, is_1904)?;
        let shared_strings = read_shared_strings_part(&mut zip)?;
        debug!(file = %name, sheets = worksheets.len(), shared_strings = shared_strings.len(), "workbook opened");
        Ok(XlsxSpreadsheet {
            name,
            zip,
            styles,
            worksheets,
            shared_strings,
        })
    }

    /// Resolves the cell text stored at the end of a `<c>` element.
    fn resolve_cell(&self, sheet: &Sheet, row: usize, col: usize, kind: CellType, value: String) -> Result<Cell, EtlError> {
        match kind {
            CellType::Error => Err(SpreadsheetError::CellValueError(
                sheet.file_name.to_owned(),
                sheet.name.to_owned(),
                index_to_reference(row, col),
                value,
            ))?,
            CellType::SharedString => {
                let index = value.parse::<usize>()?;
                let text = self
                    .shared_strings
                    .get(index)
                    .ok_or_else(|| SpreadsheetError::SharedStringError(self.name.to_owned(), index))?;
                Ok(Cell { row, col, kind: CellType::InlineString, value: text.to_owned() })
            }
            _ => Ok(Cell { row, col, kind, value }),
        }
    }
}

impl Spreadsheet for XlsxSpreadsheet {
    fn name(&self) -> String {
        self.name.to_owned()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.worksheets.iter().map(|(name, _)| name.to_owned()).collect()
    }

    /// Reads every accepted worksheet into a [`Sheet`]
    ///
    /// Cell positions come from the `r` reference attribute, falling back to
    /// the position after the previous row or cell when it is absent.
    fn read_sheets(&mut self, criteria: &Criteria) -> Result<Vec<Sheet>, EtlError> {
        let mut sheets = Vec::<Sheet>::new();
        for (sheet_name, part) in self.worksheets.clone() {
            if criteria.accept(&sheet_name) {
                sheets.push(self.read_worksheet(&sheet_name, &part, criteria)?);
            } else {
                debug!(file = %self.name, sheet = %sheet_name, "sheet skipped");
            }
        }
        Ok(sheets)
    }
}

impl XlsxSpreadsheet {
    fn read_worksheet(&mut self, sheet_name: &str, part: &str, criteria: &Criteria) -> Result<Sheet, EtlError> {
        let mut sheet = Sheet::new(&self.name, sheet_name);
        let mut reader = self
            .zip
            .xml_part(part)?
            .ok_or_else(|| SpreadsheetError::FileError(part.to_owned()))?;

        let mut next_row = 0usize;
        let mut next_col = 0usize;
        let mut position = (0usize, 0usize);
        let mut kind = CellType::Empty;
        let mut value = String::new();
        let mut cells = Vec::<(usize, usize, CellType, String)>::new();
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == tag::ROW => {
                if let Some(number) = event.parse_attribute::<usize>("r")? {
                    next_row = number.saturating_sub(1);
                }
                next_col = 0;
            }
            Event::End(event) if event.name() == tag::ROW => next_row += 1,
            Event::Start(event) if event.name() == tag::CELL => {
                position = event
                    .attribute("r")?
                    .and_then(|reference| reference_to_index(&reference))
                    .unwrap_or((next_row, next_col));
                next_col = position.1 + 1;
                value.clear();
                kind = cell_type(event.attribute("t")?.as_deref(), criteria.error_as_null);
                if kind == CellType::Number {
                    if let Some(style) = event.parse_attribute::<usize>("s")? {
                        kind = self.styles.get(style).copied().unwrap_or(CellType::Number);
                    }
                }
            }
            Event::Start(event) if kind != CellType::Empty && event.name() == tag::INLINE_STRING => {
                value = reader.read_text(tag::INLINE_STRING, false)?;
            }
            Event::Start(event) if kind != CellType::Empty && event.name() == tag::VALUE => {
                value = reader.read_text(tag::VALUE, true)?;
            }
            Event::End(event) if event.name() == tag::CELL => {
                if kind != CellType::Empty && !value.is_empty() {
                    cells.push((position.0, position.1, kind, std::mem::take(&mut value)));
                }
                kind = CellType::Empty;
            }
        });
        // the part reader borrows the archive until dropped
        drop(reader);

        for (row, col, kind, value) in cells {
            let cell = self.resolve_cell(&sheet, row, col, kind, value)?;
            sheet.push(cell);
        }
        debug!(file = %self.name, sheet = %sheet_name, cells = sheet.cells.len(), "sheet read");
        Ok(sheet)
    }
}

/// Maps the `t` attribute of a cell to its type.
fn cell_type(t: Option<&str>, error_as_null: bool) -> CellType {
    match t {
        Some("inlineStr") | Some("str") => CellType::InlineString,
        Some("s") => CellType::SharedString,
        Some("d") => CellType::IsoDateTime,
        Some("b") => CellType::Boolean,
        Some("e") if error_as_null => CellType::Empty,
        Some("e") => CellType::Error,
        _ => CellType::Number,
    }
}

/// Reads the worksheet list and date system from `xl/workbook.xml`
///
/// # Returns
/// (worksheets, is_1904) where worksheets are (sheet name, part path) pairs
fn read_workbook_part(zip: &mut ZipArchive<FileReader>) -> Result<(Vec<(String, String)>, bool), EtlError> {
    let targets = excel::worksheet_targets(zip, WORKBOOK_RELATIONSHIPS_PART)?;
    let mut reader = zip
        .xml_part(WORKBOOK_PART)?
        .ok_or_else(|| SpreadsheetError::FileError(WORKBOOK_PART.to_owned()))?;

    let mut worksheets = Vec::<(String, String)>::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == tag::SHEET => {
            let mut sheet_name = None::<String>;
            let mut relationship = None::<String>;
            for attribute in event.attributes() {
                let attribute = attribute?;
                // `r:id` is matched by local name whatever the namespace prefix
                match attribute.key.local_name().as_ref() {
                    b"name" => sheet_name = Some(attribute_value(&attribute)?),
                    b"id" => relationship = Some(attribute_value(&attribute)?),
                    _ => (),
                }
            }
            let target = relationship.and_then(|id| targets.get(&id));
            if let (Some(sheet_name), Some(target)) = (sheet_name, target) {
                worksheets.push((sheet_name, target.to_owned()));
            }
        }
        Event::Start(event) if event.name() == tag::WORKBOOK_PROPERTIES => {
            is_1904 = matches!(event.attribute("date1904")?.as_deref(), Some("1") | Some("true"));
        }
    });
    Ok((worksheets, is_1904))
}

/// Section of `xl/styles.xml` being read
#[derive(Copy, Clone, PartialEq)]
enum StylesSection {
    Other,
    NumberFormats,
    CellFormats,
}

/// Reads the cell styles from `xl/styles.xml`
///
/// # Returns
/// Cell type implied by each cell style, indexed by style id; empty when the
/// workbook has no styles part
fn read_styles_part(zip: &mut ZipArchive<FileReader>, is_1904: bool) -> Result<Vec<CellType>, EtlError> {
    let Some(mut reader) = zip.xml_part(STYLES_PART)? else {
        return Ok(Vec::new());
    };

    let mut section = StylesSection::Other;
    let mut custom_formats = HashMap::<String, CellType>::new();
    let mut cell_formats = Vec::<String>::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == tag::NUMBER_FORMATS => section = StylesSection::NumberFormats,
        Event::Start(event) if event.name() == tag::CELL_FORMATS => section = StylesSection::CellFormats,
        Event::End(event) if event.name() == tag::NUMBER_FORMATS => section = StylesSection::Other,
        Event::End(event) if event.name() == tag::CELL_FORMATS => break,
        Event::Start(event) if section == StylesSection::NumberFormats && event.name() == tag::NUMBER_FORMAT => {
            let id = event.attribute("numFmtId")?;
            let code = event.attribute("formatCode")?;
            if let (Some(id), Some(code)) = (id, code) {
                custom_formats.insert(id, CellType::parse_custom_number_format(&code, is_1904));
            }
        }
        Event::Start(event) if section == StylesSection::CellFormats && event.name() == tag::CELL_FORMAT => {
            let id = event.attribute("numFmtId")?;
            cell_formats.push(id.unwrap_or_default());
        }
    });

    Ok(excel::style_cell_types(&cell_formats, &custom_formats, is_1904))
}

/// Reads the shared string table from `xl/sharedStrings.xml`, if present
fn read_shared_strings_part(zip: &mut ZipArchive<FileReader>) -> Result<Vec<String>, EtlError> {
    let mut strings = Vec::<String>::new();
    if let Some(mut reader) = zip.xml_part(SHARED_STRINGS_PART)? {
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == tag::STRING_ITEM => {
                strings.push(reader.read_text(tag::STRING_ITEM, false)?);
            }
        });
    }
    Ok(strings)
}
