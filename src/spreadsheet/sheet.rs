use crate::error::EtlError;
use crate::error::ResultMessage;
use crate::spreadsheet::cell::Cell;
use crate::table::Table;
use std::collections::HashMap;

/// Cells read from one worksheet, with the bounds of the used area.
pub(crate) struct Sheet {
    /// Source file name
    pub(crate) file_name: String,
    /// Sheet name
    pub(crate) name: String,
    /// All non-empty cells in the sheet
    pub(crate) cells: Vec<Cell>,
    pub(crate) row_lower_bound: Option<usize>,
    pub(crate) row_upper_bound: Option<usize>,
    pub(crate) col_lower_bound: Option<usize>,
    pub(crate) col_upper_bound: Option<usize>,
}

impl Sheet {
    pub(super) fn new(file_name: &str, name: &str) -> Self {
        Self {
            file_name: file_name.to_owned(),
            name: name.to_owned(),
            cells: Vec::new(),
            row_lower_bound: None,
            row_upper_bound: None,
            col_lower_bound: None,
            col_upper_bound: None,
        }
    }

    /// Returns true if the sheet contains no cells.
    pub(crate) fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Adds a cell to the sheet, widening the used area.
    pub(super) fn push(&mut self, cell: Cell) {
        self.update_bound(cell.row, cell.col);
        self.cells.push(cell);
    }

    fn update_bound(&mut self, row: usize, col: usize) {
        self.row_lower_bound = Some(self.row_lower_bound.map_or(row, |bound| bound.min(row)));
        self.row_upper_bound = Some(self.row_upper_bound.map_or(row, |bound| bound.max(row)));
        self.col_lower_bound = Some(self.col_lower_bound.map_or(col, |bound| bound.min(col)));
        self.col_upper_bound = Some(self.col_upper_bound.map_or(col, |bound| bound.max(col)));
    }

    /// Converts the used area into a table.
    ///
    /// The first used row is the header row; header gaps are named
    /// `Unnamed: {i}` after their position and repeated headers get `.1`,
    /// `.2` suffixes. Missing cells become nulls.
    pub(crate) fn into_table(self) -> Result<Table, EtlError> {
        let (Some(row_lower), Some(row_upper), Some(col_lower), Some(col_upper)) = (
            self.row_lower_bound,
            self.row_upper_bound,
            self.col_lower_bound,
            self.col_upper_bound,
        ) else {
            return Ok(Table::new(&self.name, Vec::new()));
        };

        let width = col_upper - col_lower + 1;
        let mut grid = vec![vec![None::<String>; width]; row_upper - row_lower + 1];
        for cell in &self.cells {
            let text = cell
                .to_text()
                .with_prefix(&format!("{} '{}' at {}", self.file_name, self.name, cell.reference()))?;
            grid[cell.row - row_lower][cell.col - col_lower] = Some(text);
        }

        let mut rows = grid.into_iter();
        let header = rows.next().unwrap_or_default();
        let columns = dedup_headers(
            header
                .into_iter()
                .enumerate()
                .map(|(index, title)| title.unwrap_or_else(|| format!("Unnamed: {index}")))
                .collect(),
        );
        let mut table = Table::new(&self.name, columns);
        table.rows = rows.collect();
        Ok(table)
    }
}

/// Renames repeated headers to `name.1`, `name.2`, skipping any suffixed
/// name that is already taken.
fn dedup_headers(headers: Vec<String>) -> Vec<String> {
    let mut counts = HashMap::<String, usize>::new();
    for header in &headers {
        counts.entry(header.to_owned()).or_insert(0);
    }
    let mut seen = HashMap::<String, usize>::new();
    let mut columns = Vec::with_capacity(headers.len());
    for header in headers {
        let count = seen.entry(header.to_owned()).or_insert(0);
        if *count == 0 {
            *count = 1;
            columns.push(header);
            continue;
        }
        let mut renamed = format!("{header}.{count}");
        while counts.contains_key(&renamed) {
            *count += 1;
            renamed = format!("{header}.{count}");
        }
        *count += 1;
        counts.insert(renamed.to_owned(), 0);
        columns.push(renamed);
    }
    columns
}
