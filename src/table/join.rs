use crate::table::Table;
use crate::table::TableError;
use crate::table::Value;
use std::collections::HashMap;
use std::collections::HashSet;
use tracing::warn;

/// Suffixes applied to column names present on both sides of a join.
const LEFT_SUFFIX: &str = "_x";
const RIGHT_SUFFIX: &str = "_y";

impl Table {
    /// Left-joins `right` onto this table where `left_on` equals `right_on`.
    ///
    /// Every left row appears exactly once in the result, in order. Columns are
    /// all left columns followed by all right columns; names present on both
    /// sides get `_x`/`_y` suffixes. When both keys share a name the right key
    /// column is dropped. A right key matching several rows joins its first row.
    /// Null keys never match, unlike pandas `merge` which pairs NaN with NaN;
    /// a missing LSOA code is not a geography to look up.
    pub fn left_join(&self, right: &Table, left_on: &str, right_on: &str) -> Result<Table, TableError> {
        let left_key = self.column_index(left_on)?;
        let right_key = right.column_index(right_on)?;
        let shared_key = left_on == right_on;

        let right_indexes: Vec<usize> = (0..right.width())
            .filter(|index| !(shared_key && *index == right_key))
            .collect();

        let left_names: HashSet<&str> = self.columns.iter().map(String::as_str).collect();
        let right_names: HashSet<&str> = right_indexes.iter().map(|index| right.columns[*index].as_str()).collect();
        let overlapping = |name: &str| left_names.contains(name) && right_names.contains(name);

        let mut columns: Vec<String> = self
            .columns
            .iter()
            .map(|name| if overlapping(name) { format!("{name}{LEFT_SUFFIX}") } else { name.to_owned() })
            .collect();
        columns.extend(right_indexes.iter().map(|index| {
            let name = &right.columns[*index];
            if overlapping(name) { format!("{name}{RIGHT_SUFFIX}") } else { name.to_owned() }
        }));

        let mut matches = HashMap::<&str, &Vec<Value>>::new();
        let mut duplicated = HashSet::<&str>::new();
        for row in &right.rows {
            if let Some(key) = row[right_key].as_deref() {
                if matches.contains_key(key) {
                    duplicated.insert(key);
                } else {
                    matches.insert(key, row);
                }
            }
        }
        if !duplicated.is_empty() {
            warn!(
                left = %self.name,
                right = %right.name,
                keys = duplicated.len(),
                "right table has duplicate join keys, first match used"
            );
        }

        let mut joined = Table::new(&self.name, columns);
        for row in &self.rows {
            let matched = row[left_key].as_deref().and_then(|key| matches.get(key));
            let mut values = row.to_owned();
            values.extend(right_indexes.iter().map(|index| matched.and_then(|right_row| right_row[*index].to_owned())));
            joined.push_row(values)?;
        }
        Ok(joined)
    }
}
