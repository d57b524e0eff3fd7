//! CSV adapter
//!
//! The first record is the header. Ragged rows are padded with missing
//! values, empty fields are missing values, and column types are inferred
//! with `ColumnData::infer_from_text`.
//!
//! Writing renders floats with a decimal point (`1.0`) and booleans as
//! `True`/`False`, so a written frame reads back with the same column types.

use crate::traits::{AdapterOptions, FileAdapter};
use chrono::Timelike;
use filehandler_core::{Cell, FileFormat, Frame, HandlerError, Payload, Result};
use std::path::Path;

/// CSV adapter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CsvAdapter;

impl CsvAdapter {
    /// Create a new CSV adapter instance
    #[inline]
    #[must_use = "creates an adapter instance that should be used for file I/O"]
    pub const fn new() -> Self {
        Self
    }

    /// Parse CSV bytes into a frame.
    ///
    /// # Errors
    /// Returns an error if the data is not valid CSV or the header is missing.
    pub fn parse_bytes(data: &[u8]) -> Result<Frame> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_reader(data);

        let mut records = reader.records();
        let header: Vec<String> = match records.next() {
            Some(record) => record
                .map_err(|e| HandlerError::BackendError(format!("Failed to parse CSV: {e}")))?
                .iter()
                .map(str::to_string)
                .collect(),
            None => {
                return Err(HandlerError::BackendError(
                    "No columns to parse from file".to_string(),
                ))
            }
        };

        let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); header.len()];
        for record in records {
            let record =
                record.map_err(|e| HandlerError::BackendError(format!("Failed to parse CSV: {e}")))?;
            if record.len() > header.len() {
                return Err(HandlerError::BackendError(format!(
                    "Expected {} fields in line {}, saw {}",
                    header.len(),
                    record.position().map_or(0, csv::Position::line),
                    record.len()
                )));
            }
            for (col, values) in raw.iter_mut().enumerate() {
                let field = record.get(col).filter(|s| !s.is_empty());
                values.push(field.map(str::to_string));
            }
        }

        Frame::from_text_columns(header.into_iter().zip(raw).collect())
    }

    /// Render a frame as CSV bytes.
    ///
    /// # Errors
    /// Returns an error if the CSV writer fails.
    pub fn to_bytes(frame: &Frame) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let map_err = |e: csv::Error| HandlerError::BackendError(format!("Failed to write CSV: {e}"));

        writer.write_record(frame.column_names()).map_err(map_err)?;
        for row in 0..frame.n_rows() {
            let fields: Vec<String> = frame.row(row).iter().map(render_cell).collect();
            writer.write_record(&fields).map_err(map_err)?;
        }
        writer
            .into_inner()
            .map_err(|e| HandlerError::BackendError(format!("Failed to write CSV: {e}")))
    }
}

fn render_cell(cell: &Cell) -> String {
    match cell {
        Cell::Null => String::new(),
        Cell::Bool(true) => "True".to_string(),
        Cell::Bool(false) => "False".to_string(),
        Cell::Int(i) => i.to_string(),
        Cell::Float(f) if f.is_nan() => String::new(),
        Cell::Float(f) => format!("{f:?}"),
        Cell::Text(s) => s.clone(),
        Cell::DateTime(dt) => {
            if dt.nanosecond() == 0 {
                dt.format("%Y-%m-%d %H:%M:%S").to_string()
            } else {
                dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
            }
        }
    }
}

impl FileAdapter for CsvAdapter {
    #[inline]
    fn format(&self) -> FileFormat {
        FileFormat::Csv
    }

    fn load(&self, path: &Path, _options: &AdapterOptions<'_>) -> Result<Payload> {
        let data = std::fs::read(path)?;
        Ok(Payload::Frame(Self::parse_bytes(&data)?))
    }

    fn write(&self, path: &Path, data: &Payload, _options: &AdapterOptions<'_>) -> Result<()> {
        let Payload::Frame(frame) = data else {
            return Err(HandlerError::PayloadError(format!(
                "csv files take a frame, not {}",
                data.kind()
            )));
        };
        std::fs::write(path, Self::to_bytes(frame)?)?;
        Ok(())
    }
}
