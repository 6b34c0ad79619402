use crate::config::BridgeSpec;
use crate::table::Table;
use crate::table::TableError;
use crate::table::Value;
use std::collections::HashSet;
use tracing::warn;

/// Header of the bridge code column
pub const CODE_COLUMN: &str = "code";
/// Header of the bridge name column
pub const NAME_COLUMN: &str = "name";

/// How a bridge table drops repeated values.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DedupPolicy {
    /// Each column is deduplicated on its own and the shorter one padded with
    /// nulls. Rows no longer pair a code with its own name once the two
    /// columns have different numbers of distinct values.
    #[default]
    PerColumn,
    /// Distinct (code, name) pairs.
    Pair,
}

/// Builds the `code`/`name` bridge table described by `spec` from `master`.
///
/// First occurrences are kept in master row order; null counts as a value.
pub fn build_bridge(master: &Table, spec: &BridgeSpec, policy: DedupPolicy) -> Result<Table, TableError> {
    let code = spec.code.resolve(master)?;
    let label = spec.label.resolve(master)?;
    let mut bridge = Table::new(&spec.name, vec![CODE_COLUMN.to_owned(), NAME_COLUMN.to_owned()]);

    match policy {
        DedupPolicy::PerColumn => {
            let codes = unique(master.column_values(code));
            let names = unique(master.column_values(label));
            if codes.len() != names.len() {
                warn!(
                    bridge = %spec.name,
                    codes = codes.len(),
                    names = names.len(),
                    "distinct code and name counts differ, bridge rows may not pair up"
                );
            }
            let height = codes.len().max(names.len());
            let mut codes = codes.into_iter();
            let mut names = names.into_iter();
            for _ in 0..height {
                bridge.push_row(vec![codes.next().flatten(), names.next().flatten()])?;
            }
        }
        DedupPolicy::Pair => {
            let mut seen = HashSet::<(&Value, &Value)>::new();
            for row in &master.rows {
                if seen.insert((&row[code], &row[label])) {
                    bridge.push_row(vec![row[code].to_owned(), row[label].to_owned()])?;
                }
            }
        }
    }
    Ok(bridge)
}

/// Distinct values in first-occurrence order.
fn unique<'a>(values: impl Iterator<Item = &'a Value>) -> Vec<Value> {
    let mut seen = HashSet::<&Value>::new();
    values
        .filter(|value| seen.insert(*value))
        .cloned()
        .collect()
}
