use crate::table::Table;
use crate::table::TableError;
use std::fmt::Display;

/// Addresses a column either by zero-based position or by header name.
///
/// Positions reproduce the fixed offsets the source files were laid out with;
/// names survive columns being reordered. Either way the selector is resolved
/// against the actual table before it is used, so schema drift surfaces as an
/// error instead of a silently shifted column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnSelector {
    Position(usize),
    Name(String),
}

impl ColumnSelector {
    pub fn resolve(&self, table: &Table) -> Result<usize, TableError> {
        match self {
            Self::Position(position) if *position < table.width() => Ok(*position),
            Self::Position(position) => Err(TableError::ColumnOutOfRange {
                table: table.name.to_owned(),
                position: *position,
                width: table.width(),
            }),
            Self::Name(name) => table.column_index(name),
        }
    }
}

impl From<usize> for ColumnSelector {
    fn from(position: usize) -> Self {
        Self::Position(position)
    }
}

impl From<&str> for ColumnSelector {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl Display for ColumnSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Position(position) => write!(f, "#{position}"),
            Self::Name(name) => write!(f, "'{name}'"),
        }
    }
}

/// Converts a list of positions into selectors.
pub fn positions(positions: &[usize]) -> Vec<ColumnSelector> {
    positions.iter().copied().map(ColumnSelector::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::table;

    #[test]
    fn resolve_position_and_name() {
        let table = table("t", &["code", "name"], &[]);
        assert_eq!(ColumnSelector::from(1).resolve(&table).unwrap(), 1);
        assert_eq!(ColumnSelector::from("code").resolve(&table).unwrap(), 0);
    }

    #[test]
    fn resolve_failures() {
        let table = table("t", &["code", "name"], &[]);
        assert!(matches!(
            ColumnSelector::from(2).resolve(&table),
            Err(TableError::ColumnOutOfRange { position: 2, width: 2, .. })
        ));
        assert!(matches!(
            ColumnSelector::from("score").resolve(&table),
            Err(TableError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn display() {
        assert_eq!(ColumnSelector::from(3).to_string(), "#3");
        assert_eq!(ColumnSelector::from("LSOA11CD").to_string(), "'LSOA11CD'");
        assert_eq!(positions(&[1, 2]), vec![ColumnSelector::Position(1), ColumnSelector::Position(2)]);
    }
}
