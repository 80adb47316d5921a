//! Error types for tabmask-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tabmask-core
///
/// Transform application never produces an error; every transform is total
/// over its input cells.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse CSV
    #[error("failed to parse CSV '{path}': {message}")]
    CsvParse { path: PathBuf, message: String },

    /// CSV parsing error from the csv crate
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Header row names the same column twice
    #[error("duplicate column '{column}' in {path}")]
    DuplicateColumn { path: PathBuf, column: String },

    /// Merge key is not a column of both tables
    #[error("merge key '{key}' is not present in both tables")]
    InvalidKey { key: String },

    /// The two tables share no column that could serve as a key
    #[error("the tables have no column in common, nothing to merge on")]
    NoCommonColumns,

    /// Operation needs a loaded table
    #[error("no table loaded")]
    NoTableLoaded,

    /// Transform name not found in the catalog
    #[error("unknown transform '{0}'")]
    UnknownTransform(String),

    /// Transform name found but its parameter is unusable
    #[error("invalid parameter for transform '{name}': {message}")]
    InvalidTransformParameter { name: String, message: String },

    /// Malformed `column=Transform` pair
    #[error("invalid assignment: {0}")]
    InvalidAssignment(String),

    /// Failed to create or write an output file
    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV writer error while exporting
    #[error("failed to write CSV '{path}': {source}")]
    WriteCsv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Directory traversal error
    #[error("failed to traverse directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for failures that happen while reading a table from disk
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Error::FileRead { .. }
                | Error::CsvParse { .. }
                | Error::Csv { .. }
                | Error::DuplicateColumn { .. }
        )
    }

    /// True for failures that happen while exporting a table
    pub fn is_write_error(&self) -> bool {
        matches!(self, Error::Write { .. } | Error::WriteCsv { .. })
    }
}
