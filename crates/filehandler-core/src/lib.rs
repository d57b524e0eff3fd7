//! # filehandler core
//!
//! Shared types for the filehandler workspace: the format registry, the
//! payload shapes adapters produce and consume, the datetime codec used by
//! the JSON adapter, and the collaborator traits (diagnostics, progress)
//! that the dispatch core in `filehandler-backend` is built against.
//!
//! ```rust,ignore
//! use filehandler_backend::FileHandler;
//! use filehandler_core::Payload;
//!
//! let handler = FileHandler::new();
//! let results = handler.load(["report.csv", "notes.txt"])?;
//! for (path, outcome) in &results {
//!     match outcome {
//!         Ok(Payload::Frame(frame)) => println!("{path}: {frame}"),
//!         Ok(other) => println!("{path}: {}", other.summary()),
//!         Err(message) => eprintln!("{message}"),
//!     }
//! }
//! # Ok::<(), filehandler_core::HandlerError>(())
//! ```

pub mod datetime;
pub mod diagnostics;
pub mod error;
pub mod format;
pub mod frame;
pub mod payload;
pub mod progress;
pub mod value;

pub use diagnostics::{Diagnostics, LogDiagnostics, MemoryDiagnostics, Severity};
pub use error::{HandlerError, Result};
pub use format::FileFormat;
pub use frame::{Cell, Column, ColumnData, Frame};
pub use payload::Payload;
pub use progress::{CountingProgress, NoProgress, Progress};
pub use value::Value;
