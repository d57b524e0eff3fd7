//! Plain text adapter.
//!
//! Also serves unknown extensions and every binary-mode transfer, so it is
//! the one adapter that honours both `encoding` and `mode`.

use crate::traits::{AdapterOptions, FileAdapter};
use crate::utils::{decode, encode};
use filehandler_core::{FileFormat, HandlerError, Payload, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Text (and raw byte) adapter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextAdapter;

impl TextAdapter {
    /// Create a new text adapter instance
    #[inline]
    #[must_use = "creates an adapter instance that should be used for file I/O"]
    pub const fn new() -> Self {
        Self
    }
}

impl FileAdapter for TextAdapter {
    #[inline]
    fn format(&self) -> FileFormat {
        FileFormat::Text
    }

    fn load(&self, path: &Path, options: &AdapterOptions<'_>) -> Result<Payload> {
        let bytes = std::fs::read(path)?;
        if options.is_binary() {
            return Ok(Payload::Bytes(bytes));
        }
        Ok(Payload::Text(decode(&bytes, options.encoding, path)?))
    }

    fn write(&self, path: &Path, data: &Payload, options: &AdapterOptions<'_>) -> Result<()> {
        let bytes = match (data, options.is_binary()) {
            (Payload::Bytes(bytes), true) => bytes.clone(),
            (Payload::Text(text), false) => encode(text, options.encoding)?,
            (Payload::Text(_), true) => {
                return Err(HandlerError::PayloadError(
                    "a bytes-like payload is required in binary mode, not text".to_string(),
                ))
            }
            (Payload::Bytes(_), false) => {
                return Err(HandlerError::PayloadError(
                    "write() argument must be text, not bytes".to_string(),
                ))
            }
            (other, _) => {
                return Err(HandlerError::PayloadError(format!(
                    "text files take text or bytes, not {}",
                    other.kind()
                )))
            }
        };

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

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_text_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("note.txt");
        let adapter = TextAdapter::new();

        adapter
            .write(&path, &Payload::from("oi\nolá"), &AdapterOptions::write())
            .unwrap();
        assert_eq!(
            adapter.load(&path, &AdapterOptions::read()).unwrap(),
            Payload::from("oi\nolá")
        );
    }

    #[test]
    fn test_append_mode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.txt");
        let adapter = TextAdapter::new();

        adapter
            .write(&path, &Payload::from("a"), &AdapterOptions::write())
            .unwrap();
        adapter
            .write(&path, &Payload::from("b"), &AdapterOptions::write().with_mode("a"))
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ab");
    }

    #[test]
    fn test_binary_mode_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blob.bin");
        let adapter = TextAdapter::new();
        let wb = AdapterOptions::write().with_mode("wb").with_encoding(None);
        let rb = AdapterOptions::read().with_mode("rb").with_encoding(None);

        adapter.write(&path, &Payload::from(b"oi".to_vec()), &wb).unwrap();
        assert_eq!(adapter.load(&path, &rb).unwrap(), Payload::Bytes(b"oi".to_vec()));
    }

    #[test]
    fn test_payload_must_match_mode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.txt");
        let adapter = TextAdapter::new();

        let err = adapter
            .write(&path, &Payload::from(b"oi".to_vec()), &AdapterOptions::write())
            .unwrap_err();
        assert!(err.to_string().contains("must be text, not bytes"));

        let err = adapter
            .write(&path, &Payload::from("oi"), &AdapterOptions::write().with_mode("wb"))
            .unwrap_err();
        assert!(err.to_string().contains("bytes-like payload is required"));
        assert!(!path.exists());
    }

    #[test]
    fn test_encoding_is_honoured() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("latin.txt");
        std::fs::write(&path, [0x63, 0x61, 0x66, 0xe9]).unwrap();
        let adapter = TextAdapter::new();

        assert!(adapter.load(&path, &AdapterOptions::read()).is_err());
        assert_eq!(
            adapter
                .load(&path, &AdapterOptions::read().with_encoding(Some("latin-1")))
                .unwrap(),
            Payload::from("café")
        );
    }
}
