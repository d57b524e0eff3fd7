//! Parquet adapter built on the Arrow reader/writer.
//!
//! Frames map onto Arrow as Int64, Float64, Boolean, Utf8 and
//! Timestamp(µs, no zone). Other Arrow types found on read are cast to the
//! nearest of those.

use crate::traits::{AdapterOptions, FileAdapter};
use arrow::array::{
    Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray,
    TimestampMicrosecondArray,
};
use arrow::compute::{cast, concat_batches};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::DateTime;
use filehandler_core::{Column, ColumnData, FileFormat, Frame, HandlerError, Payload, Result};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// Parquet adapter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ParquetAdapter;

impl ParquetAdapter {
    /// Create a new Parquet adapter instance
    #[inline]
    #[must_use = "creates an adapter instance that should be used for file I/O"]
    pub const fn new() -> Self {
        Self
    }
}

fn backend_err(context: &str) -> impl Fn(String) -> HandlerError + '_ {
    move |e| HandlerError::BackendError(format!("{context}: {e}"))
}

fn downcast<T: 'static>(array: &ArrayRef) -> Result<&T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        HandlerError::BackendError(format!(
            "unexpected Arrow array for {}",
            array.data_type()
        ))
    })
}

fn cast_to(array: &ArrayRef, to: &DataType) -> Result<ArrayRef> {
    cast(array, to).map_err(|e| HandlerError::BackendError(format!("Arrow cast failed: {e}")))
}

fn collect<T, A: Array>(array: &A, value: impl Fn(&A, usize) -> T) -> Vec<Option<T>> {
    (0..array.len())
        .map(|i| array.is_valid(i).then(|| value(array, i)))
        .collect()
}

fn column_to_array(data: &ColumnData) -> (DataType, ArrayRef) {
    match data {
        ColumnData::Bool(v) => (
            DataType::Boolean,
            Arc::new(BooleanArray::from(v.clone())) as ArrayRef,
        ),
        ColumnData::Int(v) => (
            DataType::Int64,
            Arc::new(Int64Array::from(v.clone())) as ArrayRef,
        ),
        ColumnData::Float(v) => (
            DataType::Float64,
            Arc::new(Float64Array::from(v.clone())) as ArrayRef,
        ),
        ColumnData::Text(v) => (
            DataType::Utf8,
            Arc::new(StringArray::from(
                v.iter().map(Option::as_deref).collect::<Vec<Option<&str>>>(),
            )) as ArrayRef,
        ),
        ColumnData::DateTime(v) => (
            DataType::Timestamp(TimeUnit::Microsecond, None),
            Arc::new(TimestampMicrosecondArray::from(
                v.iter()
                    .map(|dt| dt.map(|dt| dt.and_utc().timestamp_micros()))
                    .collect::<Vec<Option<i64>>>(),
            )) as ArrayRef,
        ),
    }
}

fn array_to_column(array: &ArrayRef) -> Result<ColumnData> {
    match array.data_type() {
        DataType::Null => Ok(ColumnData::Float(vec![None; array.len()])),
        DataType::Boolean => Ok(ColumnData::Bool(collect(
            downcast::<BooleanArray>(array)?,
            BooleanArray::value,
        ))),
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => {
            let ints = cast_to(array, &DataType::Int64)?;
            Ok(ColumnData::Int(collect(
                downcast::<Int64Array>(&ints)?,
                Int64Array::value,
            )))
        }
        DataType::Float16 | DataType::Float32 | DataType::Float64 | DataType::Decimal128(_, _) => {
            let floats = cast_to(array, &DataType::Float64)?;
            Ok(ColumnData::Float(collect(
                downcast::<Float64Array>(&floats)?,
                Float64Array::value,
            )))
        }
        DataType::Timestamp(_, _) | DataType::Date32 | DataType::Date64 => {
            let stamps = cast_to(array, &DataType::Timestamp(TimeUnit::Microsecond, None))?;
            let stamps = downcast::<TimestampMicrosecondArray>(&stamps)?;
            Ok(ColumnData::DateTime(
                (0..stamps.len())
                    .map(|i| {
                        stamps
                            .is_valid(i)
                            .then(|| DateTime::from_timestamp_micros(stamps.value(i)))
                            .flatten()
                            .map(|dt| dt.naive_utc())
                    })
                    .collect(),
            ))
        }
        other => {
            let strings = cast_to(array, &DataType::Utf8).map_err(|_| {
                HandlerError::BackendError(format!("unsupported parquet column type {other}"))
            })?;
            Ok(ColumnData::Text(collect(
                downcast::<StringArray>(&strings)?,
                |a, i| a.value(i).to_string(),
            )))
        }
    }
}

/// Convert a frame into one Arrow record batch.
///
/// # Errors
/// Returns an error if Arrow rejects the batch.
pub fn frame_to_batch(frame: &Frame) -> Result<RecordBatch> {
    let (fields, arrays): (Vec<Field>, Vec<ArrayRef>) = frame
        .columns()
        .iter()
        .map(|column| {
            let (data_type, array) = column_to_array(column.data());
            (Field::new(column.name(), data_type, true), array)
        })
        .unzip();
    let schema = Arc::new(Schema::new(fields));
    if arrays.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }
    RecordBatch::try_new(schema, arrays).map_err(|e| backend_err("Arrow batch")(e.to_string()))
}

/// Convert an Arrow record batch into a frame.
///
/// # Errors
/// Returns an error for column types that cannot be represented.
pub fn batch_to_frame(batch: &RecordBatch) -> Result<Frame> {
    let schema = batch.schema();
    let columns = schema
        .fields()
        .iter()
        .zip(batch.columns())
        .map(|(field, array)| Ok(Column::new(field.name().clone(), array_to_column(array)?)))
        .collect::<Result<Vec<_>>>()?;
    Frame::new(columns)
}

impl FileAdapter for ParquetAdapter {
    #[inline]
    fn format(&self) -> FileFormat {
        FileFormat::Parquet
    }

    fn load(&self, path: &Path, _options: &AdapterOptions<'_>) -> Result<Payload> {
        let file = File::open(path)?;
        let read_err = backend_err("Failed to read parquet");
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)
            .map_err(|e| read_err(e.to_string()))?;
        let schema = builder.schema().clone();
        let reader = builder.build().map_err(|e| read_err(e.to_string()))?;

        let batches = reader
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| read_err(e.to_string()))?;
        let batch = concat_batches(&schema, &batches).map_err(|e| read_err(e.to_string()))?;
        Ok(Payload::Frame(batch_to_frame(&batch)?))
    }

    fn write(&self, path: &Path, data: &Payload, _options: &AdapterOptions<'_>) -> Result<()> {
        let Payload::Frame(frame) = data else {
            return Err(HandlerError::PayloadError(format!(
                "parquet files take a frame, not {}",
                data.kind()
            )));
        };
        let batch = frame_to_batch(frame)?;
        let write_err = backend_err("Failed to write parquet");

        let file = File::create(path)?;
        let mut writer =
            ArrowWriter::try_new(file, batch.schema(), None).map_err(|e| write_err(e.to_string()))?;
        writer.write(&batch).map_err(|e| write_err(e.to_string()))?;
        writer.close().map_err(|e| write_err(e.to_string()))?;
        Ok(())
    }
}
