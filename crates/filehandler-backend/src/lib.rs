//! Format adapters and batch dispatch for filehandler
//!
//! # Overview
//!
//! [`FileHandler`] loads or writes many files in one call. Each path is
//! routed by extension to a [`FileAdapter`]; failures of a single file are
//! contained and reported under that file's key, while malformed calls fail
//! as a whole.
//!
//! ```text
//!  PathSpec / WriteSpec ──► FileHandler ──► resolver ──► FileAdapter
//!                              │                          (txt, json, csv,
//!                              ├── availability gate       parquet, xlsx,
//!                              └── rayon pool (optional)   pptx, pdf)
//! ```
//!
//! # Supported Formats
//!
//! | Extension | Adapter | Load | Write |
//! |-----------|---------|------|-------|
//! | txt (and anything unknown) | [`TextAdapter`] | text or bytes | text or bytes |
//! | json | [`JsonAdapter`] | structured | structured |
//! | csv | [`CsvAdapter`] | frame | frame |
//! | parquet | [`ParquetAdapter`] | frame | frame |
//! | xlsx | [`XlsxAdapter`] | sheets | frame or sheets |
//! | ppt, pptx | [`PptxAdapter`] | slides | not implemented |
//! | pdf | [`PdfAdapter`] | pages | not implemented |
//!
//! A transfer mode containing `b` routes every path to the text adapter and
//! moves raw bytes.
//!
//! # Examples
//!
//! ```no_run
//! use filehandler_backend::{FileHandler, HandlerOptions, PathSpec};
//!
//! let handler = FileHandler::new().with_options(HandlerOptions::default().with_parallel(true));
//! let spec = PathSpec::with_passwords([("report.pdf", Some("secret")), ("data.csv", None)]);
//!
//! for (path, outcome) in handler.load(spec)? {
//!     match outcome {
//!         Ok(payload) => println!("{path}: {}", payload.summary()),
//!         Err(message) => eprintln!("{message}"),
//!     }
//! }
//! # Ok::<(), filehandler_core::HandlerError>(())
//! ```

pub mod availability;
pub mod csv;
pub mod handler;
pub mod json;
pub mod parquet;
pub mod path_spec;
pub mod pdf;
pub mod pptx;
pub mod resolver;
pub mod text;
pub mod traits;
pub mod utils;
pub mod xlsx;

pub use self::csv::CsvAdapter;
pub use handler::{
    FileHandler, HandlerOptions, LoadOutcome, LoadResult, WriteOutcome, WriteResult,
};
pub use json::JsonAdapter;
pub use self::parquet::ParquetAdapter;
pub use path_spec::{PathSpec, WriteSpec};
pub use pdf::PdfAdapter;
pub use pptx::PptxAdapter;
pub use resolver::{adapter, adapter_for, resolve};
pub use text::TextAdapter;
pub use traits::{AdapterOptions, FileAdapter};
pub use xlsx::XlsxAdapter;
