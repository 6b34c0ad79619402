//! CSV reading and writing for tables, plus input directory listing.
use crate::error::EtlError;
use crate::table::Table;
use crate::table::TableError;
use glob::Pattern;
use std::fs;
#[cfg(unix)]
use std::fs::Permissions;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::path::PathBuf;
use tempfile::Builder;
use tempfile::NamedTempFile;
use tracing::debug;

/// Lists regular files in `dir` whose names match `pattern`, sorted by name.
///
/// Returns (file name, path) pairs; names that are not valid UTF-8 are skipped.
pub fn list_files(dir: &Path, pattern: Option<&Pattern>) -> Result<Vec<(String, PathBuf)>, EtlError> {
    let mut files = Vec::<(String, PathBuf)>::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if pattern.map(|pattern| pattern.matches(&name)).unwrap_or(true) {
            files.push((name, entry.path()));
        }
    }
    files.sort();
    Ok(files)
}

/// Reads a CSV file with a header row into a table named after the file.
///
/// Empty fields become nulls. Short records are padded with nulls; records
/// longer than the header are rejected.
pub fn read_csv(path: &Path) -> Result<Table, EtlError> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let columns = reader.headers()?.iter().map(str::to_owned).collect();
    let mut table = Table::new(&name, columns);
    for result in reader.records() {
        let record = result?;
        if record.len() > table.width() {
            Err(TableError::RaggedRow {
                table: name.to_owned(),
                row: table.height(),
                actual: record.len(),
                expected: table.width(),
            })?
        }
        let mut row: Vec<_> = record
            .iter()
            .map(|field| (!field.is_empty()).then(|| field.to_owned()))
            .collect();
        row.resize(table.width(), None);
        table.push_row(row)?;
    }
    debug!(file = %name, rows = table.height(), columns = table.width(), "csv read");
    Ok(table)
}

/// Writes the table rows as headerless CSV to `dir/file_name`.
///
/// The data goes to a temporary file in `dir` that is renamed over the target
/// once complete, so a failed run never leaves a truncated output file.
pub fn write_csv(table: &Table, dir: &Path, file_name: &str) -> Result<PathBuf, EtlError> {
    let path = dir.join(file_name);
    let mut file = output_temp_file(dir)?;
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file.as_file_mut());
        for row in &table.rows {
            writer.write_record(row.iter().map(|value| value.as_deref().unwrap_or("")))?;
        }
        writer.flush()?;
    }
    file.persist(&path)?;
    debug!(file = %path.display(), rows = table.height(), "csv written");
    Ok(path)
}

/// Temporary file in `dir` that will be persisted as an output.
///
/// Temporary files default to owner-only access; outputs get the mode a plain
/// `File::create` would, so the umask still decides who can read them.
fn output_temp_file(dir: &Path) -> Result<NamedTempFile, EtlError> {
    let mut builder = Builder::new();
    #[cfg(unix)]
    builder.permissions(Permissions::from_mode(0o666));
    Ok(builder.tempfile_in(dir)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::table;
    use tempfile::tempdir;

    #[test]
    fn read_csv_with_nulls_and_short_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("LSOA_LEP_lookup.csv");
        fs::write(&path, "LSOA11CD,LEP17CD,LEP17NM\nE1,L1,Leeds\nE2,,\nE3,L3\n").unwrap();

        let table = read_csv(&path).unwrap();
        assert_eq!(table.name, "LSOA_LEP_lookup.csv");
        assert_eq!(table.columns, vec!["LSOA11CD", "LEP17CD", "LEP17NM"]);
        assert_eq!(table.height(), 3);
        assert_eq!(table.rows[1], vec![Some("E2".to_owned()), None, None]);
        assert_eq!(table.rows[2], vec![Some("E3".to_owned()), Some("L3".to_owned()), None]);
    }

    #[test]
    fn read_csv_rejects_long_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "a,b\n1,2,3\n").unwrap();

        assert!(matches!(read_csv(&path), Err(EtlError::TableError(TableError::RaggedRow { .. }))));
    }

    #[test]
    fn write_csv_without_header() {
        let dir = tempdir().unwrap();
        let table = table("t", &["code", "name"], &[&["E1", "Leeds, West"], &["E2", ""]]);

        let path = write_csv(&table, dir.path(), "out.csv").unwrap();
        assert_eq!(path, dir.path().join("out.csv"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "E1,\"Leeds, West\"\nE2,\n");
        assert_eq!(list_files(dir.path(), None).unwrap().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn write_csv_uses_default_file_mode() {
        let dir = tempdir().unwrap();
        let table = table("t", &["code"], &[&["E1"]]);

        let written = write_csv(&table, dir.path(), "out.csv").unwrap();
        let plain = dir.path().join("plain.csv");
        fs::write(&plain, "E1\n").unwrap();

        let mode = |path: &Path| fs::metadata(path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&written), mode(&plain));
    }

    #[test]
    fn list_files_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.xlsx"), "").unwrap();
        fs::write(dir.path().join("a.xlsx"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("c.xlsx")).unwrap();

        let pattern = Pattern::new("*.xlsx").unwrap();
        let names: Vec<_> = list_files(dir.path(), Some(&pattern))
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["a.xlsx", "b.xlsx"]);
        assert_eq!(list_files(dir.path(), None).unwrap().len(), 3);
    }
}
