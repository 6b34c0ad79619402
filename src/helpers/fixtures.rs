//! Minimal xlsx packages for tests.
//!
//! Cell text is encoded by shape: `""` leaves the cell out, `#...` is an
//! error cell, `@date:N` is serial `N` styled with a built-in date format,
//! numbers are numeric cells and everything else is a string cell.
use crate::spreadsheet::reference::index_to_reference;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/></Types>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="14"/></cellXfs></styleSheet>"#;

const DATE_PREFIX: &str = "@date:";

pub(crate) struct WorkbookFixture {
    sheets: Vec<(String, Vec<Vec<String>>)>,
    use_shared_strings: bool,
}

impl WorkbookFixture {
    pub(crate) fn new() -> Self {
        WorkbookFixture {
            sheets: Vec::new(),
            use_shared_strings: false,
        }
    }

    pub(crate) fn sheet(mut self, name: &str, rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|value| value.to_string()).collect())
            .collect();
        self.sheets.push((name.to_owned(), rows));
        self
    }

    /// Stores string cells in `xl/sharedStrings.xml` instead of inline.
    pub(crate) fn shared_strings(mut self) -> Self {
        self.use_shared_strings = true;
        self
    }

    /// Writes the package to `dir/file_name` and returns its path.
    pub(crate) fn write(&self, dir: &Path, file_name: &str) -> PathBuf {
        let path = dir.join(file_name);
        let mut zip = ZipWriter::new(File::create(&path).unwrap());
        let options = SimpleFileOptions::default();

        let mut workbook = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><workbookPr/><sheets>"#,
        );
        let mut relationships = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        let mut shared = Vec::<String>::new();
        let mut worksheets = Vec::<String>::new();
        for (index, (name, rows)) in self.sheets.iter().enumerate() {
            let number = index + 1;
            workbook.push_str(&format!(
                r#"<sheet name="{}" sheetId="{number}" r:id="rId{number}"/>"#,
                escape(name)
            ));
            relationships.push_str(&format!(
                r#"<Relationship Id="rId{number}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{number}.xml"/>"#
            ));
            worksheets.push(self.worksheet(rows, &mut shared));
        }
        workbook.push_str("</sheets></workbook>");
        let styles_id = self.sheets.len() + 1;
        relationships.push_str(&format!(
            r#"<Relationship Id="rId{styles_id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#
        ));
        relationships.push_str("</Relationships>");

        let mut parts = vec![
            ("[Content_Types].xml".to_owned(), CONTENT_TYPES.to_owned()),
            ("xl/workbook.xml".to_owned(), workbook),
            ("xl/_rels/workbook.xml.rels".to_owned(), relationships),
            ("xl/styles.xml".to_owned(), STYLES.to_owned()),
        ];
        for (index, worksheet) in worksheets.into_iter().enumerate() {
            parts.push((format!("xl/worksheets/sheet{}.xml", index + 1), worksheet));
        }
        if self.use_shared_strings {
            let items: String = shared
                .iter()
                .map(|text| format!("<si><t>{}</t></si>", escape(text)))
                .collect();
            parts.push((
                "xl/sharedStrings.xml".to_owned(),
                format!(r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">{items}</sst>"#, shared.len()),
            ));
        }

        for (name, content) in parts {
            zip.start_file(name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
        path
    }

    fn worksheet(&self, rows: &[Vec<String>], shared: &mut Vec<String>) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
        );
        for (row, values) in rows.iter().enumerate() {
            xml.push_str(&format!(r#"<row r="{}">"#, row + 1));
            for (col, value) in values.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let reference = index_to_reference(row, col);
                let cell = if value.starts_with('#') {
                    format!(r#"<c r="{reference}" t="e"><v>{}</v></c>"#, escape(value))
                } else if let Some(serial) = value.strip_prefix(DATE_PREFIX) {
                    format!(r#"<c r="{reference}" s="1"><v>{serial}</v></c>"#)
                } else if value.parse::<f64>().is_ok() {
                    format!(r#"<c r="{reference}"><v>{value}</v></c>"#)
                } else if self.use_shared_strings {
                    let index = shared.iter().position(|text| text == value).unwrap_or_else(|| {
                        shared.push(value.to_owned());
                        shared.len() - 1
                    });
                    format!(r#"<c r="{reference}" t="s"><v>{index}</v></c>"#)
                } else {
                    format!(r#"<c r="{reference}" t="inlineStr"><is><t>{}</t></is></c>"#, escape(value))
                };
                xml.push_str(&cell);
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData></worksheet>");
        xml
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
