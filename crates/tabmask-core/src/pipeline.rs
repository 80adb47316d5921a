//! Anonymization session
//!
//! A session moves through two states:
//! - `Empty`: nothing loaded, every operation except `load` is refused
//! - `Loaded`: a table is present and column assignments can be set one
//!   column at a time, then applied with [`AnonymizationSession::anonymize`]
//!
//! The loaded table is never modified. Both `anonymize` and
//! `extract_assigned_columns` build new tables from it, so they can be called
//! in any order and any number of times.

use crate::error::{Error, Result};
use crate::settings::ColumnAssignment;
use crate::table::{Row, Table};
use crate::transform::{TransformKind, TransformRegistry};
use tracing::{debug, info};

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No table loaded
    Empty,
    /// A table is loaded and can be configured and anonymized
    Loaded,
}

/// One operator's de-identification session over a single table
#[derive(Debug, Clone, Default)]
pub struct AnonymizationSession {
    table: Option<Table>,
    assignments: ColumnAssignment,
    registry: TransformRegistry,
}

impl AnonymizationSession {
    /// Create an empty session using the given registry
    pub fn new(registry: TransformRegistry) -> Self {
        Self {
            table: None,
            assignments: ColumnAssignment::new(),
            registry,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        match self.table {
            Some(_) => SessionState::Loaded,
            None => SessionState::Empty,
        }
    }

    /// Load a table, replacing any previous one and clearing assignments
    pub fn load(&mut self, table: Table) {
        info!(
            columns = table.column_count(),
            rows = table.row_count(),
            "session loaded table"
        );
        self.table = Some(table);
        self.assignments = ColumnAssignment::new();
    }

    /// The loaded table
    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    /// The registry used to apply transforms
    pub fn registry(&self) -> &TransformRegistry {
        &self.registry
    }

    /// All assignments, including ones that name absent columns
    pub fn assignments(&self) -> &ColumnAssignment {
        &self.assignments
    }

    /// Assign a transform to a column, overwriting any earlier choice
    ///
    /// The column does not have to exist; such assignments are ignored when
    /// the table is anonymized.
    pub fn assign(
        &mut self,
        column: impl Into<String>,
        kind: TransformKind,
    ) -> Result<Option<TransformKind>> {
        if self.table.is_none() {
            return Err(Error::NoTableLoaded);
        }
        Ok(self.assignments.set(column, kind))
    }

    /// Drop a column's assignment
    pub fn unassign(&mut self, column: &str) -> Option<TransformKind> {
        self.assignments.remove(column)
    }

    /// Merge previously saved assignments into this session
    pub fn import_assignments(&mut self, assignments: &ColumnAssignment) -> Result<()> {
        if self.table.is_none() {
            return Err(Error::NoTableLoaded);
        }
        self.assignments.extend_from(assignments);
        Ok(())
    }

    /// Assignments that hit a column of the loaded table, in column order
    pub fn effective_assignments(&self) -> Vec<(&str, TransformKind)> {
        let Some(table) = &self.table else {
            return Vec::new();
        };

        table
            .columns
            .iter()
            .filter_map(|c| self.assignments.get(&c.name).map(|k| (c.name.as_str(), k)))
            .collect()
    }

    /// Build the de-identified table
    ///
    /// Assigned columns are transformed cell by cell; all other columns are
    /// copied unchanged.
    pub fn anonymize(&self) -> Result<Table> {
        let table = self.table.as_ref().ok_or(Error::NoTableLoaded)?;

        for (column, kind) in self.assignments.iter() {
            if table.find_column(column).is_none() {
                debug!(column, transform = %kind, "ignoring assignment for absent column");
            }
        }

        let plan: Vec<Option<TransformKind>> = table
            .columns
            .iter()
            .map(|c| self.assignments.get(&c.name))
            .collect();

        for (column, kind) in table.columns.iter().zip(&plan) {
            if let Some(kind) = kind {
                debug!(column = %column.name, transform = %kind, "applying transform");
            }
        }

        let rows = table
            .rows
            .iter()
            .map(|row| {
                let cells = row
                    .cells
                    .iter()
                    .zip(&plan)
                    .map(|(cell, kind)| match kind {
                        Some(kind) => self.registry.apply(*kind, cell),
                        None => cell.clone(),
                    })
                    .collect();
                Row::new(cells)
            })
            .collect();

        let transformed = plan.iter().filter(|k| k.is_some()).count();
        info!(
            columns = transformed,
            rows = table.row_count(),
            "anonymized table"
        );

        Ok(Table {
            columns: table.columns.clone(),
            rows,
            source: table.source.clone(),
        })
    }

    /// The assigned columns with their original, untransformed values
    pub fn extract_assigned_columns(&self) -> Result<Table> {
        let table = self.table.as_ref().ok_or(Error::NoTableLoaded)?;
        let names: Vec<&str> = self
            .effective_assignments()
            .into_iter()
            .map(|(column, _)| column)
            .collect();
        Ok(table.select(&names))
    }
}
