//! JSON adapter.
//!
//! Datetime strings are decoded into native values on load and encoded back
//! on write (see `filehandler_core::datetime`). Output is indented with four
//! spaces.

use crate::traits::{AdapterOptions, FileAdapter};
use crate::utils::{decode, encode};
use filehandler_core::{FileFormat, HandlerError, Payload, Result, Value};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// JSON adapter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct JsonAdapter;

impl JsonAdapter {
    /// Create a new JSON adapter instance
    #[inline]
    #[must_use = "creates an adapter instance that should be used for file I/O"]
    pub const fn new() -> Self {
        Self
    }

    /// Serialize a value the way `write` lays it out on disk.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_pretty_string(value: &Value) -> Result<String> {
        let mut out = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = Serializer::with_formatter(&mut out, formatter);
        value.to_json().serialize(&mut serializer)?;
        String::from_utf8(out).map_err(|e| HandlerError::EncodingError(e.to_string()))
    }
}

impl FileAdapter for JsonAdapter {
    #[inline]
    fn format(&self) -> FileFormat {
        FileFormat::Json
    }

    fn load(&self, path: &Path, options: &AdapterOptions<'_>) -> Result<Payload> {
        let bytes = std::fs::read(path)?;
        let text = decode(&bytes, options.encoding, path)?;
        let json: serde_json::Value = serde_json::from_str(&text)?;
        Ok(Payload::Structured(Value::from_json(json)))
    }

    fn write(&self, path: &Path, data: &Payload, options: &AdapterOptions<'_>) -> Result<()> {
        let value = match data {
            Payload::Structured(value) => value.clone(),
            Payload::Text(_) | Payload::Pages(_) => data.to_value(),
            other => {
                return Err(HandlerError::PayloadError(format!(
                    "Object of type {} is not JSON serializable",
                    other.kind()
                )))
            }
        };
        let text = Self::to_pretty_string(&value)?;
        let bytes = encode(&text, options.encoding)?;

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(options.is_append())
            .truncate(!options.is_append())
            .open(path)?;
        file.write_all(&bytes)?;
        Ok(())
    }
}
