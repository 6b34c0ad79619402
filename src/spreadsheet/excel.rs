//! Office Open XML package helpers
use crate::error::EtlError;
use crate::helpers::xml::StartTagExt;
use crate::helpers::zip::PackageExt;
use crate::match_xml_events;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::io::Read;
use std::io::Seek;
use zip::ZipArchive;

const RELATIONSHIP: &[u8] = b"Relationship";

/// Reads a relationships part and returns the worksheet targets by
/// relationship id, as paths inside the archive.
///
/// Relationships without a `Type` are assumed to be worksheets.
pub(super) fn worksheet_targets<RS: Read + Seek>(zip: &mut ZipArchive<RS>, part: &str) -> Result<HashMap<String, String>, EtlError> {
    let mut reader = zip
        .xml_part(part)?
        .ok_or_else(|| SpreadsheetError::FileError(part.to_owned()))?;
    let mut relationships = HashMap::<String, String>::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == RELATIONSHIP => {
            let is_worksheet = event
                .attribute("Type")?
                .map_or(true, |kind| kind.ends_with("/worksheet"));
            if let (true, Some(id), Some(target)) = (is_worksheet, event.attribute("Id")?, event.attribute("Target")?) {
                relationships.insert(id, to_zip_path(&target));
            }
        }
    });
    Ok(relationships)
}

/// Cell type of each cell style, given the number format id every style
/// refers to. Custom formats shadow built-in ids; unknown ids are plain numbers.
pub(super) fn style_cell_types(format_ids: &[String], custom_formats: &HashMap<String, CellType>, is_1904: bool) -> Vec<CellType> {
    let cell_type = |id: &String| {
        custom_formats
            .get(id)
            .copied()
            .or_else(|| CellType::parse_builtin_number_format_id(id, is_1904))
            .unwrap_or(CellType::Number)
    };
    format_ids.iter().map(cell_type).collect()
}

/// Normalizes a relationship target to a path inside the archive
pub(crate) fn to_zip_path(path: &str) -> String {
    if let Some(absolute) = path.strip_prefix("/xl/") {
        format!("xl/{absolute}")
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}
