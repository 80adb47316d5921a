//! tabmask-core: Core library for merging CSV tables and de-identifying columns
//!
//! This library provides functionality to:
//! - Load CSV files into tables of normalized cells
//! - Find the columns two tables share and outer-join them on one
//! - Assign masking, hashing, banding and rounding transforms to columns
//! - Apply those assignments to produce a de-identified copy of a table
//! - Export tables as BOM-prefixed UTF-8 CSV

pub mod error;
pub mod keys;
pub mod merger;
pub mod parser;
pub mod pipeline;
pub mod scanner;
pub mod settings;
pub mod table;
pub mod transform;
pub mod writer;

pub use error::{Error, Result};
pub use keys::{common_keys, highlight, intersect, KeySelection};
pub use merger::{merge_on_default_key, merge_tables};
pub use parser::{load_table, parse_csv_str};
pub use pipeline::{AnonymizationSession, SessionState};
pub use scanner::{scan_tables, ScanResult};
pub use settings::{ColumnAssignment, SettingsFile};
pub use table::{normalize, normalize_date_aware, Cell, Column, Row, Table};
pub use transform::{CatalogEntry, TransformKind, TransformRegistry, CATALOG};
pub use writer::{derive_export_paths, write_table};
