//! CSV loading with encoding fallback

use crate::error::{Error, Result};
use crate::table::{normalize, Table};
use encoding_rs::{Encoding, EUC_KR, UTF_8, WINDOWS_1252};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Encodings tried in order when reading a CSV file. EUC-KR in encoding_rs
/// is the CP949 superset used by Korean spreadsheet exports.
const FALLBACK_ENCODINGS: &[&Encoding] = &[UTF_8, EUC_KR, WINDOWS_1252];

/// Load a CSV file into a Table
///
/// The first row is the header. Text is decoded as UTF-8 when valid and
/// falls back to the regional 8-bit encodings otherwise.
pub fn load_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let (content, encoding) = decode(&bytes).ok_or_else(|| Error::CsvParse {
        path: path.to_path_buf(),
        message: "file is not valid in any supported text encoding".to_string(),
    })?;
    if encoding != UTF_8 {
        debug!(path = %path.display(), encoding = encoding.name(), "decoded with fallback encoding");
    }

    let table = parse_records(&content, path)?;
    info!(
        path = %path.display(),
        columns = table.column_count(),
        rows = table.row_count(),
        "loaded table"
    );
    Ok(table)
}

/// Parse CSV from a string (useful for testing)
pub fn parse_csv_str(content: &str, source_name: &str) -> Result<Table> {
    parse_records(content, Path::new(source_name))
}

/// Decode raw bytes with the first encoding that accepts them
fn decode(bytes: &[u8]) -> Option<(String, &'static Encoding)> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    FALLBACK_ENCODINGS.iter().find_map(|&encoding| {
        encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| (text.into_owned(), encoding))
    })
}

fn parse_records(content: &str, path: &Path) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // Allow varying number of fields
        .from_reader(content.as_bytes());

    let headers = csv_reader.headers().map_err(|e| Error::Csv {
        path: path.to_path_buf(),
        source: e,
    })?;

    let names: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();

    if names.is_empty() || names.iter().all(|n| n.is_empty()) {
        return Err(Error::CsvParse {
            path: path.to_path_buf(),
            message: "no columns found in CSV".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for name in &names {
        if !seen.insert(name.as_str()) {
            return Err(Error::DuplicateColumn {
                path: path.to_path_buf(),
                column: name.clone(),
            });
        }
    }

    let mut table = Table::new(names).with_source(path);

    for (row_idx, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| Error::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;

        if record.len() > table.column_count() {
            warn!(
                row = row_idx + 1,
                path = %path.display(),
                "row has more cells than columns, truncating"
            );
        }

        table.push_row(record.iter().map(normalize).collect());
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;
    use std::io::Write;

    #[test]
    fn test_parse_simple_csv() {
        let csv = "id,name,age\n1,kim,30\n2,lee,41\n";
        let table = parse_csv_str(csv, "test.csv").unwrap();

        assert_eq!(table.column_names(), vec!["id", "name", "age"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[1].cells[2], Cell::Integer(41));
    }

    #[test]
    fn test_parse_with_missing_cells() {
        let csv = "id,name,age\n1,,30\n2,lee,NaN\n";
        let table = parse_csv_str(csv, "test.csv").unwrap();

        assert_eq!(table.rows[0].cells[1], Cell::Missing);
        assert_eq!(table.rows[1].cells[2], Cell::Missing);
    }

    #[test]
    fn test_parse_ragged_rows() {
        let csv = "a,b,c\n1\n1,2,3,4\n";
        let table = parse_csv_str(csv, "test.csv").unwrap();

        assert_eq!(table.rows[0].cells, vec![Cell::Integer(1), Cell::Missing, Cell::Missing]);
        assert_eq!(table.rows[1].cells.len(), 3);
    }

    #[test]
    fn test_parse_duplicate_column() {
        let csv = "id,name,id\n1,kim,2\n";
        assert!(matches!(
            parse_csv_str(csv, "test.csv"),
            Err(Error::DuplicateColumn { .. })
        ));
    }

    #[test]
    fn test_parse_empty_input() {
        let err = parse_csv_str("", "empty.csv").unwrap_err();
        assert!(err.is_load_error());
    }

    #[test]
    fn test_decode_utf8_with_bom() {
        let bytes = [UTF8_BOM, "id,이름\n".as_bytes()].concat();
        let (text, encoding) = decode(&bytes).unwrap();
        assert_eq!(text, "id,이름\n");
        assert_eq!(encoding, UTF_8);
    }

    #[test]
    fn test_decode_falls_back_to_euc_kr() {
        let (encoded, _, had_errors) = EUC_KR.encode("id,이름\n1,홍길동\n");
        assert!(!had_errors);
        let (text, encoding) = decode(&encoded).unwrap();
        assert_eq!(encoding, EUC_KR);
        assert!(text.contains("홍길동"));
    }

    #[test]
    fn test_load_table_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"id,city\n1,Seoul\n").unwrap();

        let table = load_table(file.path()).unwrap();
        assert_eq!(table.column_names(), vec!["id", "city"]);
        assert_eq!(table.source.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_table("/nonexistent/table.csv").unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }
}
