//! Core table types and cell normalization

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw tokens that mean "no value", matching what spreadsheet and pandas
/// exports write for empty cells.
pub const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// An immutable snapshot of tabular data
///
/// Every row holds exactly one cell per column, in column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Column definitions, order is significant for output
    pub columns: Vec<Column>,
    /// Row data
    pub rows: Vec<Row>,
    /// File the table was loaded from, if any
    pub source: Option<PathBuf>,
}

impl Table {
    /// Create an empty table with the given column names
    pub fn new<I, S>(column_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = column_names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Column::new(name.into(), i))
            .collect();

        Self {
            columns,
            rows: Vec::new(),
            source: None,
        }
    }

    /// Attach the file this table came from
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Append a row, padding or truncating it to the column count
    pub fn push_row(&mut self, mut cells: Vec<Cell>) {
        cells.resize(self.columns.len(), Cell::Missing);
        self.rows.push(Row::new(cells));
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Position of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.find_column(name).map(|c| c.index)
    }

    /// Column names in table order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// All cells of one column, top to bottom
    pub fn column_values(&self, name: &str) -> Option<Vec<&Cell>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r.cells[index]).collect())
    }

    /// Get a single cell by row position and column name
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let index = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(index))
    }

    /// Build a new table holding only the named columns, kept in this
    /// table's column order. Names that are not columns are skipped.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Table {
        let picked: Vec<&Column> = self
            .columns
            .iter()
            .filter(|c| names.iter().any(|n| n.as_ref() == c.name))
            .collect();

        let mut table = Table::new(picked.iter().map(|c| c.name.clone()));
        table.source = self.source.clone();
        for row in &self.rows {
            let cells = picked.iter().map(|c| row.cells[c.index].clone()).collect();
            table.rows.push(Row::new(cells));
        }
        table
    }
}

/// A column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name, unique and case-sensitive within a table
    pub name: String,
    /// Column index (0-based)
    pub index: usize,
}

impl Column {
    /// Create a new column
    pub fn new(name: String, index: usize) -> Self {
        Self { name, index }
    }
}

/// A row of data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Cell values for each column
    pub cells: Vec<Cell>,
}

impl Row {
    /// Create a new row
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }
}

/// A canonical cell value
///
/// `Missing` is distinct from an empty `Text` and from zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    /// No value
    Missing,
    /// Integer value
    Integer(i64),
    /// Floating-point value, always finite
    Float(f64),
    /// Calendar date
    Date(NaiveDate),
    /// Anything else
    Text(String),
}

impl Cell {
    /// Parse a raw value into a Cell without date detection
    pub fn parse(raw: &str) -> Self {
        normalize(raw)
    }

    /// Check if the cell is missing
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Numeric value of the cell, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Integer(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Interpret the cell as a calendar date
    ///
    /// Eight-digit integers are read as `YYYYMMDD`.
    pub fn to_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            Cell::Text(s) => match normalize_date_aware(s) {
                Cell::Date(d) => Some(d),
                _ => None,
            },
            Cell::Integer(i) => parse_date(&i.to_string()),
            Cell::Float(_) | Cell::Missing => None,
        }
    }

    /// Canonical text form; `Missing` becomes the empty string
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Missing => write!(f, ""),
            Cell::Integer(i) => write!(f, "{}", i),
            Cell::Float(fl) => write!(f, "{}", fl),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Cell::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Cell {
    fn from(raw: &str) -> Self {
        normalize(raw)
    }
}

/// Significant digits `f64` carries exactly through a text round trip
const FLOAT_DIGITS: usize = 15;

/// Convert a raw value into its canonical cell
///
/// Empty and NA-like input becomes `Missing`, numbers become `Integer` or
/// `Float`, everything else stays `Text` with its surrounding whitespace.
/// Numbers that cannot be held without losing digits stay `Text` as well.
pub fn normalize(raw: &str) -> Cell {
    let trimmed = raw.trim();

    if trimmed.is_empty() || NA_TOKENS.contains(&trimmed) {
        return Cell::Missing;
    }

    if let Ok(i) = trimmed.parse::<i64>() {
        return Cell::Integer(i);
    }

    if !is_integer_literal(trimmed) && significant_digits(trimmed) <= FLOAT_DIGITS {
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                return Cell::Float(f);
            }
        }
    }

    Cell::Text(raw.to_string())
}

/// Optionally signed run of ASCII digits
fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Digits in the mantissa, ignoring leading and trailing zeros
fn significant_digits(s: &str) -> usize {
    let mantissa = s.split(['e', 'E']).next().unwrap_or(s);
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    digits.trim_start_matches('0').trim_end_matches('0').len()
}

/// Like [`normalize`], but text that reads as a calendar date becomes `Date`
pub fn normalize_date_aware(raw: &str) -> Cell {
    match normalize(raw) {
        Cell::Text(s) => match parse_date(&s) {
            Some(d) => Cell::Date(d),
            None => Cell::Text(s),
        },
        other => other,
    }
}

/// Parse a calendar date in one of the accepted layouts
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        let year = s[0..4].parse().ok()?;
        let month = s[4..6].parse().ok()?;
        let day = s[6..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, format) {
            return Some(d);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
    }

    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}
