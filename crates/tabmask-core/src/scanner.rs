//! Directory scanner for discovering CSV tables to process in batch

use crate::error::Result;
use crate::writer::{ANONYMIZED_SUFFIX, ORIGINAL_COLUMNS_SUFFIX};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Result of scanning directories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Root directories that were scanned
    pub roots: Vec<PathBuf>,
    /// Discovered tables, sorted by path
    pub tables: Vec<PathBuf>,
    /// Files skipped because they are earlier exports
    pub skipped_exports: usize,
}

impl ScanResult {
    /// Total number of tables found
    pub fn total_tables(&self) -> usize {
        self.tables.len()
    }
}

/// Scan one or more directories for CSV tables
///
/// Files produced by an earlier export (`*_anonymized.csv`,
/// `*_anonymized_columns.csv`) are not picked up again.
pub fn scan_tables<P: AsRef<Path>>(roots: &[P]) -> Result<ScanResult> {
    let mut tables = Vec::new();
    let mut skipped_exports = 0;

    for root in roots {
        for entry in WalkDir::new(root.as_ref()).follow_links(true) {
            let entry = entry?;
            let path = entry.path();

            if !entry.file_type().is_file() || !is_csv(path) {
                continue;
            }

            if is_export(path) {
                skipped_exports += 1;
                continue;
            }

            tables.push(path.to_path_buf());
        }
    }

    tables.sort();
    tables.dedup();

    Ok(ScanResult {
        roots: roots.iter().map(|r| r.as_ref().to_path_buf()).collect(),
        tables,
        skipped_exports,
    })
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn is_export(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| stem.ends_with(ANONYMIZED_SUFFIX) || stem.ends_with(ORIGINAL_COLUMNS_SUFFIX))
}
