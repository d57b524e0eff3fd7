//! Error types for file handling operations.
//!
//! Two kinds of failure exist in this crate. Call-level faults
//! ([`HandlerError::InvalidArgument`]) abort a whole `load`/`write` call and are
//! returned to the caller. Every other variant is raised by a single format
//! adapter and is contained by the dispatch core, which turns it into an error
//! string stored under the offending path.

use thiserror::Error;

/// Error types that can occur while loading or writing files.
///
/// # Examples
///
/// ```rust,ignore
/// use filehandler_backend::FileHandler;
/// use filehandler_core::HandlerError;
///
/// let handler = FileHandler::new();
///
/// match handler.load(["missing.csv"]) {
///     Ok(results) => println!("{} files", results.len()),
///     Err(HandlerError::InvalidArgument(msg)) => eprintln!("bad call: {msg}"),
///     Err(e) => eprintln!("unexpected: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Malformed call arguments.
    ///
    /// Raised for malformed path lists, non-string passwords, missing input
    /// paths and non path-like write keys. Never contained per file.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Structured data could not be parsed or serialized.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Text could not be decoded or encoded with the requested encoding.
    #[error("Encoding error: {0}")]
    EncodingError(String),

    /// A format library failed (csv, calamine, zip, quick-xml, lopdf, parquet).
    #[error("Backend error: {0}")]
    BackendError(String),

    /// The payload shape does not fit the target format.
    #[error("Unsupported payload: {0}")]
    PayloadError(String),

    /// The format adapter has no implementation for this operation.
    ///
    /// Displayed without a prefix so callers see the adapter's own wording.
    #[error("{0}")]
    NotImplemented(String),

    /// Unexpected environment failure, e.g. a non-permission OS error while
    /// probing a write target.
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl HandlerError {
    /// Returns `true` for faults that must abort the whole batch call.
    #[inline]
    #[must_use]
    pub const fn is_call_level(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

/// Result type alias for file handling operations.
pub type Result<T> = std::result::Result<T, HandlerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_display() {
        let error = HandlerError::InvalidArgument(
            "file_paths should be str, list[str] or dict[str, str]".to_string(),
        );
        assert_eq!(
            error.to_string(),
            "Invalid argument: file_paths should be str, list[str] or dict[str, str]"
        );
        assert!(error.is_call_level());
    }

    #[test]
    fn test_not_implemented_display_is_bare() {
        let error = HandlerError::NotImplemented("I can't write pdf files yet!".to_string());
        assert_eq!(error.to_string(), "I can't write pdf files yet!");
        assert!(!error.is_call_level());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: HandlerError = io_err.into();

        match err {
            HandlerError::IoError(e) => {
                assert_eq!(e.kind(), std::io::ErrorKind::NotFound);
                assert!(e.to_string().contains("file not found"));
            }
            _ => panic!("Expected IoError variant"),
        }
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ invalid json }").unwrap_err();
        let err: HandlerError = json_err.into();
        assert!(matches!(err, HandlerError::JsonError(_)));
        assert!(err.to_string().starts_with("JSON error:"));
    }

    #[test]
    fn test_backend_error_display() {
        let error = HandlerError::BackendError("zip: invalid archive".to_string());
        assert_eq!(error.to_string(), "Backend error: zip: invalid archive");
    }
}
