//! Tabular frames with null-aware typed columns.
//!
//! A [`Frame`] is an ordered list of named [`Column`]s of equal length. Each
//! column stores one element type with `None` for missing values, so an
//! integer column with a gap stays an integer column.

use crate::error::{HandlerError, Result};
use crate::value::Value;
use chrono::NaiveDateTime;
use std::fmt;

/// Typed column storage.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Boolean column
    Bool(Vec<Option<bool>>),
    /// 64-bit integer column
    Int(Vec<Option<i64>>),
    /// 64-bit float column
    Float(Vec<Option<f64>>),
    /// Text column
    Text(Vec<Option<String>>),
    /// Naive datetime column
    DateTime(Vec<Option<NaiveDateTime>>),
}

/// A single cell, detached from its column.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Missing value
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// Text
    Text(String),
    /// Naive datetime
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Convert to a structured value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::Int(*i),
            Self::Float(f) => Value::Float(*f),
            Self::Text(s) => Value::String(s.clone()),
            Self::DateTime(dt) => Value::DateTime(*dt),
        }
    }

    fn render(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(format!("{f:?}")),
            Self::Text(s) => Some(s.clone()),
            Self::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

impl ColumnData {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Bool(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Text(v) => v.len(),
            Self::DateTime(v) => v.len(),
        }
    }

    /// Returns `true` when the column has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type name.
    #[must_use]
    pub const fn dtype(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int64",
            Self::Float(_) => "float64",
            Self::Text(_) => "string",
            Self::DateTime(_) => "datetime",
        }
    }

    /// Cell at `row`, `Cell::Null` when out of range or missing.
    #[must_use]
    pub fn get(&self, row: usize) -> Cell {
        fn pick<T: Clone>(v: &[Option<T>], row: usize) -> Option<T> {
            v.get(row).cloned().flatten()
        }
        match self {
            Self::Bool(v) => pick(v, row).map_or(Cell::Null, Cell::Bool),
            Self::Int(v) => pick(v, row).map_or(Cell::Null, Cell::Int),
            Self::Float(v) => pick(v, row).map_or(Cell::Null, Cell::Float),
            Self::Text(v) => pick(v, row).map_or(Cell::Null, Cell::Text),
            Self::DateTime(v) => pick(v, row).map_or(Cell::Null, Cell::DateTime),
        }
    }

    /// Number of missing values.
    #[must_use]
    pub fn null_count(&self) -> usize {
        (0..self.len())
            .filter(|&row| self.get(row) == Cell::Null)
            .count()
    }

    /// Infer the narrowest column type from raw text fields.
    ///
    /// Tried in order: int, float, bool (`True`/`False` in any case), naive
    /// datetime, text. `None` fields are missing values and do not vote. A
    /// column with no values at all becomes a float column of nulls.
    #[must_use]
    pub fn infer_from_text(raw: Vec<Option<String>>) -> Self {
        fn all<T>(raw: &[Option<String>], parse: impl Fn(&str) -> Option<T>) -> Option<Vec<Option<T>>> {
            raw.iter()
                .map(|field| match field {
                    None => Some(None),
                    Some(s) => parse(s).map(Some),
                })
                .collect()
        }

        if raw.iter().all(Option::is_none) {
            return Self::Float(vec![None; raw.len()]);
        }
        if let Some(ints) = all(&raw, |s| s.trim().parse::<i64>().ok()) {
            return Self::Int(ints);
        }
        if let Some(floats) = all(&raw, |s| s.trim().parse::<f64>().ok()) {
            return Self::Float(floats);
        }
        if let Some(bools) = all(&raw, parse_bool) {
            return Self::Bool(bools);
        }
        if let Some(dts) = all(&raw, parse_naive) {
            return Self::DateTime(dts);
        }
        Self::Text(raw)
    }

    /// Infer the narrowest column type from typed cells.
    ///
    /// Numbers that are all integral collapse to an int column. Mixed cell
    /// kinds fall back to text, rendering each value.
    #[must_use]
    pub fn infer_from_cells(cells: Vec<Cell>) -> Self {
        let mut has_float = false;
        let mut numeric = true;
        let mut integral = true;
        let mut boolean = true;
        let mut temporal = true;
        let mut any = false;

        for cell in &cells {
            match cell {
                Cell::Null => continue,
                Cell::Int(_) => {
                    boolean = false;
                    temporal = false;
                }
                Cell::Float(f) => {
                    has_float = true;
                    if f.fract() != 0.0 || !f.is_finite() || f.abs() >= 9.0e15 {
                        integral = false;
                    }
                    boolean = false;
                    temporal = false;
                }
                Cell::Bool(_) => {
                    numeric = false;
                    temporal = false;
                }
                Cell::DateTime(_) => {
                    numeric = false;
                    boolean = false;
                }
                Cell::Text(_) => {
                    numeric = false;
                    boolean = false;
                    temporal = false;
                }
            }
            any = true;
        }

        if !any {
            return Self::Float(vec![None; cells.len()]);
        }
        if numeric && (integral || !has_float) {
            #[allow(clippy::cast_possible_truncation)]
            return Self::Int(
                cells
                    .into_iter()
                    .map(|c| match c {
                        Cell::Int(i) => Some(i),
                        Cell::Float(f) => Some(f as i64),
                        _ => None,
                    })
                    .collect(),
            );
        }
        if numeric {
            #[allow(clippy::cast_precision_loss)]
            return Self::Float(
                cells
                    .into_iter()
                    .map(|c| match c {
                        Cell::Int(i) => Some(i as f64),
                        Cell::Float(f) => Some(f),
                        _ => None,
                    })
                    .collect(),
            );
        }
        if boolean {
            return Self::Bool(
                cells
                    .into_iter()
                    .map(|c| match c {
                        Cell::Bool(b) => Some(b),
                        _ => None,
                    })
                    .collect(),
            );
        }
        if temporal {
            return Self::DateTime(
                cells
                    .into_iter()
                    .map(|c| match c {
                        Cell::DateTime(dt) => Some(dt),
                        _ => None,
                    })
                    .collect(),
            );
        }
        Self::Text(cells.iter().map(Cell::render).collect())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    match crate::datetime::parse_datetime(s.trim()) {
        Some(crate::datetime::ParsedDateTime::Naive(dt)) => Some(dt),
        _ => None,
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    /// Create a column.
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column storage.
    #[must_use]
    pub const fn data(&self) -> &ColumnData {
        &self.data
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` when the column has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// An ordered collection of equally long named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    columns: Vec<Column>,
}

impl Frame {
    /// Build a frame, checking that every column has the same length.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::PayloadError`] when column lengths differ.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let rows = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != rows) {
                return Err(HandlerError::PayloadError(format!(
                    "column '{}' has {} rows, expected {rows}",
                    bad.name,
                    bad.len()
                )));
            }
        }
        Ok(Self { columns })
    }

    /// Build a frame from raw text columns, inferring each column's type.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::PayloadError`] when column lengths differ.
    pub fn from_text_columns(columns: Vec<(String, Vec<Option<String>>)>) -> Result<Self> {
        Self::new(
            columns
                .into_iter()
                .map(|(name, raw)| Column::new(name, ColumnData::infer_from_text(raw)))
                .collect(),
        )
    }

    /// Build a frame from typed cells, inferring each column's type.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::PayloadError`] when column lengths differ.
    pub fn from_cell_columns(columns: Vec<(String, Vec<Cell>)>) -> Result<Self> {
        Self::new(
            columns
                .into_iter()
                .map(|(name, cells)| Column::new(name, ColumnData::infer_from_cells(cells)))
                .collect(),
        )
    }

    /// Columns in order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// First column with the given name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Number of rows (zero for a frame without columns).
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Number of columns.
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Cells of one row, in column order.
    #[must_use]
    pub fn row(&self, row: usize) -> Vec<Cell> {
        self.columns.iter().map(|c| c.data.get(row)).collect()
    }

    /// Render as a list of row objects.
    #[must_use]
    pub fn to_records(&self) -> Value {
        Value::List(
            (0..self.n_rows())
                .map(|row| {
                    self.columns
                        .iter()
                        .map(|c| (c.name.clone(), c.data.get(row).to_value()))
                        .collect()
                })
                .collect(),
        )
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rows x {} columns", self.n_rows(), self.n_cols())?;
        for column in &self.columns {
            write!(f, "\n  {}: {}", column.name, column.data.dtype())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn text(values: &[&str]) -> Vec<Option<String>> {
        values
            .iter()
            .map(|s| (!s.is_empty()).then(|| (*s).to_string()))
            .collect()
    }

    #[test]
    fn test_infer_int_with_gap() {
        assert_eq!(
            ColumnData::infer_from_text(text(&["3", ""])),
            ColumnData::Int(vec![Some(3), None])
        );
    }

    #[test]
    fn test_infer_float_bool_datetime_text() {
        assert_eq!(
            ColumnData::infer_from_text(text(&["1.0", "2"])),
            ColumnData::Float(vec![Some(1.0), Some(2.0)])
        );
        assert_eq!(
            ColumnData::infer_from_text(text(&["True", "false", ""])),
            ColumnData::Bool(vec![Some(true), Some(false), None])
        );
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(
            ColumnData::infer_from_text(text(&["2024-03-01 09:30:00"])),
            ColumnData::DateTime(vec![Some(dt)])
        );
        assert_eq!(
            ColumnData::infer_from_text(text(&["1", "abc"])),
            ColumnData::Text(text(&["1", "abc"]))
        );
    }

    #[test]
    fn test_all_null_column_is_float() {
        assert_eq!(
            ColumnData::infer_from_text(vec![None, None]),
            ColumnData::Float(vec![None, None])
        );
    }

    #[test]
    fn test_infer_from_cells_collapses_integral_floats() {
        assert_eq!(
            ColumnData::infer_from_cells(vec![Cell::Float(1.0), Cell::Null, Cell::Float(3.0)]),
            ColumnData::Int(vec![Some(1), None, Some(3)])
        );
        assert_eq!(
            ColumnData::infer_from_cells(vec![Cell::Int(1), Cell::Float(2.5)]),
            ColumnData::Float(vec![Some(1.0), Some(2.5)])
        );
        assert_eq!(
            ColumnData::infer_from_cells(vec![Cell::Int(1), Cell::Text("x".into())]),
            ColumnData::Text(vec![Some("1".into()), Some("x".into())])
        );
    }

    #[test]
    fn test_frame_rejects_ragged_columns() {
        let err = Frame::new(vec![
            Column::new("M", ColumnData::Int(vec![Some(1), Some(2)])),
            Column::new("N", ColumnData::Int(vec![Some(3)])),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("column 'N' has 1 rows, expected 2"));
    }

    #[test]
    fn test_rows_and_records() {
        let frame = Frame::new(vec![
            Column::new("M", ColumnData::Int(vec![Some(1), Some(2)])),
            Column::new("N", ColumnData::Int(vec![Some(3), None])),
        ])
        .unwrap();
        assert_eq!(frame.n_rows(), 2);
        assert_eq!(frame.column_names(), vec!["M", "N"]);
        assert_eq!(frame.row(1), vec![Cell::Int(2), Cell::Null]);
        assert_eq!(frame.column("N").unwrap().data().null_count(), 1);
        assert_eq!(
            frame.to_records().to_json(),
            serde_json::json!([{"M": 1, "N": 3}, {"M": 2, "N": null}])
        );
        assert_eq!(frame.to_string(), "2 rows x 2 columns\n  M: int64\n  N: int64");
    }
}
