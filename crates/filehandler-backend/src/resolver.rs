//! Extension resolver: picks the adapter for a path.
//!
//! Resolution never fails. Unknown extensions and binary transfer modes fall
//! back to the text adapter, which moves the file as an opaque string or
//! byte blob.

use crate::csv::CsvAdapter;
use crate::json::JsonAdapter;
use crate::parquet::ParquetAdapter;
use crate::pdf::PdfAdapter;
use crate::pptx::PptxAdapter;
use crate::text::TextAdapter;
use crate::traits::FileAdapter;
use crate::utils::is_binary_mode;
use crate::xlsx::XlsxAdapter;
use filehandler_core::FileFormat;
use std::path::Path;

static TEXT: TextAdapter = TextAdapter::new();
static JSON: JsonAdapter = JsonAdapter::new();
static CSV: CsvAdapter = CsvAdapter::new();
static PARQUET: ParquetAdapter = ParquetAdapter::new();
static XLSX: XlsxAdapter = XlsxAdapter::new();
static PPTX: PptxAdapter = PptxAdapter::new();
static PDF: PdfAdapter = PdfAdapter::new();

/// Format used for `path` under `mode`.
///
/// ```
/// use filehandler_backend::resolver::resolve;
/// use filehandler_core::FileFormat;
/// use std::path::Path;
///
/// assert_eq!(resolve(Path::new("Report.XLSX"), "r"), FileFormat::Xlsx);
/// assert_eq!(resolve(Path::new("report.xlsx"), "rb"), FileFormat::Text);
/// assert_eq!(resolve(Path::new("notes.md"), "r"), FileFormat::Text);
/// ```
#[must_use]
pub fn resolve(path: &Path, mode: &str) -> FileFormat {
    if is_binary_mode(mode) {
        return FileFormat::Text;
    }
    FileFormat::from_path(path).unwrap_or(FileFormat::Text)
}

/// The adapter registered for `format`.
#[must_use]
pub fn adapter(format: FileFormat) -> &'static dyn FileAdapter {
    match format {
        FileFormat::Text => &TEXT,
        FileFormat::Json => &JSON,
        FileFormat::Csv => &CSV,
        FileFormat::Parquet => &PARQUET,
        FileFormat::Xlsx => &XLSX,
        FileFormat::Pptx => &PPTX,
        FileFormat::Pdf => &PDF,
    }
}

/// Shorthand for `adapter(resolve(path, mode))`.
#[must_use]
pub fn adapter_for(path: &Path, mode: &str) -> &'static dyn FileAdapter {
    adapter(resolve(path, mode))
}
