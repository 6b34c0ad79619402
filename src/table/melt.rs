use crate::table::Table;
use crate::table::TableError;

impl Table {
    /// Unpivots the table into entity-attribute-value form.
    ///
    /// The first `id_columns` columns are repeated on every output row. Every
    /// column from `value_start` onward is melted into an `attribute` column
    /// holding its header and a `value` column holding its cell. `value_start`
    /// may overlap the identity columns, in which case those columns are both
    /// repeated and melted.
    ///
    /// Output is column-major: all rows for the first melted column, then all
    /// rows for the next one.
    pub fn melt(
        &self,
        id_columns: usize,
        value_start: usize,
        attribute_name: &str,
        value_name: &str,
    ) -> Result<Table, TableError> {
        let required = id_columns.max(value_start);
        if self.width() < required {
            Err(TableError::NotEnoughColumns {
                table: self.name.to_owned(),
                width: self.width(),
                required,
            })?
        }

        let mut columns = self.columns[..id_columns].to_vec();
        columns.push(attribute_name.to_owned());
        columns.push(value_name.to_owned());

        let mut melted = Table::new(&self.name, columns);
        melted.rows.reserve(self.height() * (self.width() - value_start));
        for (index, attribute) in self.columns.iter().enumerate().skip(value_start) {
            for row in &self.rows {
                let mut values = row[..id_columns].to_vec();
                values.push(Some(attribute.to_owned()));
                values.push(row[index].to_owned());
                melted.rows.push(values);
            }
        }
        Ok(melted)
    }
}
