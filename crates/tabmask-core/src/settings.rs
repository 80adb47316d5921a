//! Column assignments and the settings file format
//!
//! A settings file stores which transform applies to which column, so the
//! same configuration can be reused across similarly shaped tables:
//!
//! ```json
//! { "assignments": { "name": "NameMask", "area": "RoundUp(100)" } }
//! ```

use crate::error::{Error, Result};
use crate::transform::TransformKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Mapping from column name to the one transform applied to it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnAssignment {
    columns: BTreeMap<String, TransformKind>,
}

impl ColumnAssignment {
    /// Create an empty assignment
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a transform to a column, returning the kind it replaces
    pub fn set(&mut self, column: impl Into<String>, kind: TransformKind) -> Option<TransformKind> {
        self.columns.insert(column.into(), kind)
    }

    /// Remove a column's assignment
    pub fn remove(&mut self, column: &str) -> Option<TransformKind> {
        self.columns.remove(column)
    }

    /// Transform assigned to a column
    pub fn get(&self, column: &str) -> Option<TransformKind> {
        self.columns.get(column).copied()
    }

    /// Number of assigned columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when nothing is assigned
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Assigned columns sorted by name
    pub fn iter(&self) -> impl Iterator<Item = (&str, TransformKind)> {
        self.columns.iter().map(|(c, k)| (c.as_str(), *k))
    }

    /// Copy every entry of `other` over this assignment
    pub fn extend_from(&mut self, other: &ColumnAssignment) {
        for (column, kind) in other.iter() {
            self.set(column, kind);
        }
    }

    /// Parse a `column=Transform` command-line pair
    pub fn parse_pair(pair: &str) -> Result<(String, TransformKind)> {
        let (column, kind) = pair
            .split_once('=')
            .ok_or_else(|| Error::InvalidAssignment(format!("expected column=Transform, got '{}'", pair)))?;
        let column = column.trim();
        if column.is_empty() {
            return Err(Error::InvalidAssignment(format!("missing column name in '{}'", pair)));
        }
        Ok((column.to_string(), kind.parse()?))
    }
}

impl FromIterator<(String, TransformKind)> for ColumnAssignment {
    fn from_iter<I: IntoIterator<Item = (String, TransformKind)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

/// A settings file holding column assignments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsFile {
    /// Column to transform mapping
    pub assignments: ColumnAssignment,
}

impl SettingsFile {
    /// Create a settings file from an assignment
    pub fn new(assignments: ColumnAssignment) -> Self {
        Self { assignments }
    }

    /// Load a settings file from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the settings file to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
