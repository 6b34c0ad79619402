use glob::Pattern;

/// Sheet names dropped from every workbook: they carry notes, not data.
pub const NON_DATA_SHEETS: [&str; 2] = ["Notes", "Terms & Conditions"];

/// Criteria for selecting data from workbooks.
#[derive(Clone, Debug)]
pub struct Criteria {
    /// Sheet name patterns that are skipped when a workbook is read.
    pub excluded_sheets: Vec<Pattern>,

    /// Convert spreadsheet error cells (#N/A, #DIV/0!, ...) to nulls instead of failing.
    pub error_as_null: bool,
}

impl Criteria {
    /// Returns true unless the sheet name matches one of the excluded patterns.
    pub fn accept(&self, sheet_name: &str) -> bool {
        !self
            .excluded_sheets
            .iter()
            .any(|pattern| pattern.matches(sheet_name))
    }
}

impl Default for Criteria {
    /// Skips the non-data sheets by exact name and reads error cells as nulls.
    fn default() -> Self {
        Criteria {
            excluded_sheets: NON_DATA_SHEETS
                .iter()
                .map(|name| Pattern::new(&Pattern::escape(name)).expect("Hardcode sheet pattern"))
                .collect(),
            error_as_null: true,
        }
    }
}
