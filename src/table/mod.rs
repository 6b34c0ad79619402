//! # Tables
//!
//! The in-memory shape every stage works on: a named table with ordered column
//! headers and rows of nullable text cells. Sheets read from workbooks and
//! lookup files read from CSV are both turned into a [`Table`] before any
//! reshaping happens.
pub mod column;
pub mod io;
pub(crate) mod join;
pub(crate) mod melt;

use crate::table::column::ColumnSelector;
use std::collections::BTreeSet;
use thiserror::Error;

/// A nullable cell value. `None` is written as an empty CSV field.
pub type Value = Option<String>;

/// Errors raised when a table does not have the shape an operation expects.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("Column position {position} out of range in '{table}' ({width} columns)")]
    ColumnOutOfRange {
        table: String,
        position: usize,
        width: usize,
    },

    #[error("Column '{column}' not found in '{table}'")]
    ColumnNotFound { table: String, column: String },

    #[error("Table '{table}' has {width} columns, at least {required} required")]
    NotEnoughColumns {
        table: String,
        width: usize,
        required: usize,
    },

    #[error("Row {row} of '{table}' has {actual} values, expected {expected}")]
    RaggedRow {
        table: String,
        row: usize,
        actual: usize,
        expected: usize,
    },
}

/// A named table with ordered headers and rows of nullable text cells.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    /// Sheet name or file name the table was read from
    pub name: String,
    /// Column headers in order
    pub columns: Vec<String>,
    /// Data rows; every row has exactly `columns.len()` values
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(name: &str, columns: Vec<String>) -> Self {
        Self {
            name: name.to_owned(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Appends a row, rejecting rows whose width differs from the header.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), TableError> {
        if row.len() != self.width() {
            Err(TableError::RaggedRow {
                table: self.name.to_owned(),
                row: self.rows.len(),
                actual: row.len(),
                expected: self.width(),
            })?
        }
        self.rows.push(row);
        Ok(())
    }

    /// Index of the first column with the given header.
    pub fn column_index(&self, name: &str) -> Result<usize, TableError> {
        self.columns
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| TableError::ColumnNotFound {
                table: self.name.to_owned(),
                column: name.to_owned(),
            })
    }

    /// Resolves every selector against this table, failing on the first miss.
    pub fn resolve_all(&self, selectors: &[ColumnSelector]) -> Result<Vec<usize>, TableError> {
        selectors.iter().map(|selector| selector.resolve(self)).collect()
    }

    /// Iterates over the values of one column.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[index])
    }

    /// Removes the columns at the given positions.
    ///
    /// All positions are checked before anything is removed, so a failed call
    /// leaves the table untouched. Repeated positions are removed once.
    pub fn drop_columns(&mut self, indexes: &[usize]) -> Result<(), TableError> {
        let width = self.width();
        if let Some(position) = indexes.iter().find(|index| **index >= width) {
            Err(TableError::ColumnOutOfRange {
                table: self.name.to_owned(),
                position: *position,
                width,
            })?
        }
        let removed: BTreeSet<usize> = indexes.iter().copied().collect();
        self.columns = std::mem::take(&mut self.columns)
            .into_iter()
            .enumerate()
            .filter(|(index, _)| !removed.contains(index))
            .map(|(_, column)| column)
            .collect();
        for row in &mut self.rows {
            *row = std::mem::take(row)
                .into_iter()
                .enumerate()
                .filter(|(index, _)| !removed.contains(index))
                .map(|(_, value)| value)
                .collect();
        }
        Ok(())
    }

    /// Builds a new table from the columns at the given positions, in order.
    pub fn select_columns(&self, name: &str, indexes: &[usize]) -> Result<Table, TableError> {
        let width = self.width();
        if let Some(position) = indexes.iter().find(|index| **index >= width) {
            Err(TableError::ColumnOutOfRange {
                table: self.name.to_owned(),
                position: *position,
                width,
            })?
        }
        Ok(Table {
            name: name.to_owned(),
            columns: indexes.iter().map(|index| self.columns[*index].to_owned()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indexes.iter().map(|index| row[*index].to_owned()).collect())
                .collect(),
        })
    }
}
