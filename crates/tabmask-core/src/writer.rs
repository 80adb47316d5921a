//! CSV export

use crate::error::{Error, Result};
use crate::table::Table;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Written before the header so spreadsheet tools detect UTF-8
pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Suffix of the de-identified export
pub const ANONYMIZED_SUFFIX: &str = "_anonymized";
/// Suffix of the export holding the original values of the masked columns
pub const ORIGINAL_COLUMNS_SUFFIX: &str = "_anonymized_columns";

/// Write a table as UTF-8 CSV with a byte-order mark
///
/// `Missing` cells are written as empty fields. Parent directories are
/// created as needed.
pub fn write_table<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let path = path.as_ref();
    let write_err = |e: std::io::Error| Error::Write {
        path: path.to_path_buf(),
        source: e,
    };
    let csv_err = |e: csv::Error| Error::WriteCsv {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let file = File::create(path).map_err(write_err)?;
    let mut out = BufWriter::new(file);
    out.write_all(UTF8_BOM).map_err(write_err)?;

    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(table.column_names()).map_err(csv_err)?;
    for row in &table.rows {
        writer
            .write_record(row.cells.iter().map(|c| c.to_text()))
            .map_err(csv_err)?;
    }
    writer.flush().map_err(write_err)?;

    info!(path = %path.display(), rows = table.row_count(), "wrote table");
    Ok(())
}

/// Paths for the de-identified table and the original-columns slice
///
/// `out/people.csv` gives `out/people_anonymized.csv` and
/// `out/people_anonymized_columns.csv`.
pub fn derive_export_paths<P: AsRef<Path>>(base: P) -> (PathBuf, PathBuf) {
    let base = base.as_ref();
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "table".to_string());

    (
        base.with_file_name(format!("{}{}.csv", stem, ANONYMIZED_SUFFIX)),
        base.with_file_name(format!("{}{}.csv", stem, ORIGINAL_COLUMNS_SUFFIX)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{load_table, parse_csv_str};

    #[test]
    fn test_write_starts_with_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let table = parse_csv_str("id,name\n1,\"Kim, J\"\n2,\n", "in.csv").unwrap();

        write_table(&table, &path).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text, "id,name\n1,\"Kim, J\"\n2,\n");
    }

    #[test]
    fn test_written_table_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        let table = parse_csv_str("id,이름\n1,홍길동\n", "in.csv").unwrap();

        write_table(&table, &path).unwrap();
        let loaded = load_table(&path).unwrap();

        assert_eq!(loaded.column_names(), table.column_names());
        assert_eq!(loaded.rows, table.rows);
    }

    #[test]
    fn test_write_to_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_table(&Table::new(["a"]), dir.path()).unwrap_err();
        assert!(err.is_write_error());
    }

    #[test]
    fn test_derive_export_paths() {
        let (anonymized, originals) = derive_export_paths("out/people.csv");
        assert_eq!(anonymized, PathBuf::from("out/people_anonymized.csv"));
        assert_eq!(originals, PathBuf::from("out/people_anonymized_columns.csv"));
    }
}
