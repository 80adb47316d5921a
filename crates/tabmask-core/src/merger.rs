//! Full outer join of two tables on a shared key column

use crate::error::{Error, Result};
use crate::keys::KeySelection;
use crate::table::{Cell, Row, Table};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Suffix for a left non-key column whose name also appears on the right
pub const LEFT_SUFFIX: &str = "_x";
/// Suffix for a right non-key column whose name also appears on the left
pub const RIGHT_SUFFIX: &str = "_y";

/// Merge two tables with a full outer join on `key`
///
/// Keys are compared by their canonical text form, so `7` and `7.0` match.
/// Output columns are all of `left`'s, then `right`'s non-key columns.
/// Rows come in left order, each followed by its right matches in right
/// order, then the unmatched right rows. A missing key has the empty
/// canonical text, so missing keys match each other.
pub fn merge_tables(left: &Table, right: &Table, key: &str) -> Result<Table> {
    let (Some(left_key), Some(right_key)) = (left.column_index(key), right.column_index(key))
    else {
        return Err(Error::InvalidKey {
            key: key.to_string(),
        });
    };

    let right_extra: Vec<usize> = right
        .columns
        .iter()
        .filter(|c| c.index != right_key)
        .map(|c| c.index)
        .collect();

    let mut table = Table::new(output_columns(left, right, key));

    // Index right rows by key text
    let mut right_by_key: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, row) in right.rows.iter().enumerate() {
        right_by_key
            .entry(row.cells[right_key].to_text())
            .or_default()
            .push(i);
    }

    let mut matched = vec![false; right.row_count()];
    let padding = vec![Cell::Missing; right_extra.len()];

    for row in &left.rows {
        match right_by_key.get(&row.cells[left_key].to_text()) {
            Some(indices) => {
                for &i in indices {
                    matched[i] = true;
                    let mut cells = row.cells.clone();
                    cells.extend(right_extra.iter().map(|&c| right.rows[i].cells[c].clone()));
                    table.rows.push(Row::new(cells));
                }
            }
            None => {
                let mut cells = row.cells.clone();
                cells.extend(padding.iter().cloned());
                table.rows.push(Row::new(cells));
            }
        }
    }

    let mut unmatched_right = 0;
    for (i, row) in right.rows.iter().enumerate() {
        if matched[i] {
            continue;
        }
        unmatched_right += 1;

        let mut cells = vec![Cell::Missing; left.column_count()];
        cells[left_key] = row.cells[right_key].clone();
        cells.extend(right_extra.iter().map(|&c| row.cells[c].clone()));
        table.rows.push(Row::new(cells));
    }

    debug!(key, unmatched_right, "outer join finished");
    info!(
        key,
        left_rows = left.row_count(),
        right_rows = right.row_count(),
        rows = table.row_count(),
        "merged tables"
    );

    Ok(table)
}

/// Merge on the first key the two tables share
pub fn merge_on_default_key(left: &Table, right: &Table) -> Result<Table> {
    let selection = KeySelection::analyze(left, right);
    let key = selection.default_key().ok_or(Error::NoCommonColumns)?;
    merge_tables(left, right, key)
}

/// Output column names, with overlapping non-key names suffixed
fn output_columns(left: &Table, right: &Table, key: &str) -> Vec<String> {
    let left_names: HashSet<&str> = left.columns.iter().map(|c| c.name.as_str()).collect();
    let right_names: HashSet<&str> = right.columns.iter().map(|c| c.name.as_str()).collect();

    let mut names: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    let mut push = |base: &str, suffix: &str, overlaps: bool| {
        let mut name = if overlaps {
            format!("{}{}", base, suffix)
        } else {
            base.to_string()
        };
        while seen.contains(&name) {
            name.push_str(suffix);
        }
        seen.insert(name.clone());
        names.push(name);
    };

    for col in &left.columns {
        let overlaps = col.name != key && right_names.contains(col.name.as_str());
        push(&col.name, LEFT_SUFFIX, overlaps);
    }
    for col in &right.columns {
        if col.name == key {
            continue;
        }
        push(&col.name, RIGHT_SUFFIX, left_names.contains(col.name.as_str()));
    }

    names
}
