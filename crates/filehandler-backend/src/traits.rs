//! Core trait definitions for format adapters

use filehandler_core::{Diagnostics, FileFormat, LogDiagnostics, Payload, Result};
use std::fmt;
use std::path::Path;

/// Per-file options handed to an adapter.
///
/// Borrowed from the batch call; adapters never keep them.
#[derive(Clone, Copy)]
pub struct AdapterOptions<'a> {
    /// Password for the file. Only the PDF adapter consults it.
    pub password: Option<&'a str>,

    /// Text encoding label, `None` for raw bytes.
    pub encoding: Option<&'a str>,

    /// Transfer mode (`r`, `w`, `a`, with an optional `b` for binary).
    pub mode: &'a str,

    /// Sink for notices that do not fail the file (e.g. a locked PDF).
    pub diagnostics: &'a dyn Diagnostics,
}

impl fmt::Debug for AdapterOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterOptions")
            .field("password", &self.password.map(|_| "***"))
            .field("encoding", &self.encoding)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl<'a> AdapterOptions<'a> {
    /// Options for reading UTF-8 text.
    #[inline]
    #[must_use = "creates adapter options"]
    pub fn read() -> Self {
        Self {
            password: None,
            encoding: Some("utf-8"),
            mode: "r",
            diagnostics: &LogDiagnostics,
        }
    }

    /// Options for writing UTF-8 text.
    #[inline]
    #[must_use = "creates adapter options"]
    pub fn write() -> Self {
        Self {
            password: None,
            encoding: Some("utf-8"),
            mode: "w",
            diagnostics: &LogDiagnostics,
        }
    }

    /// Set the password
    #[inline]
    #[must_use = "returns options with the password configured"]
    pub const fn with_password(mut self, password: Option<&'a str>) -> Self {
        self.password = password;
        self
    }

    /// Set the encoding label
    #[inline]
    #[must_use = "returns options with the encoding configured"]
    pub const fn with_encoding(mut self, encoding: Option<&'a str>) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the transfer mode
    #[inline]
    #[must_use = "returns options with the mode configured"]
    pub const fn with_mode(mut self, mode: &'a str) -> Self {
        self.mode = mode;
        self
    }

    /// Set the diagnostics sink
    #[inline]
    #[must_use = "returns options with the diagnostics sink configured"]
    pub fn with_diagnostics(mut self, diagnostics: &'a dyn Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Whether the mode asks for raw bytes.
    #[inline]
    #[must_use]
    pub fn is_binary(&self) -> bool {
        crate::utils::is_binary_mode(self.mode)
    }

    /// Whether the mode asks to append.
    #[inline]
    #[must_use]
    pub fn is_append(&self) -> bool {
        self.mode.contains('a')
    }
}

impl Default for AdapterOptions<'_> {
    #[inline]
    fn default() -> Self {
        Self::read()
    }
}

/// Load/write pair for one file format.
///
/// Adapters are stateless, touch exactly one file per call and return every
/// failure to the caller. Containment is the dispatch core's job.
pub trait FileAdapter: Send + Sync {
    /// Format this adapter handles
    fn format(&self) -> FileFormat;

    /// Read one file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    fn load(&self, path: &Path, options: &AdapterOptions<'_>) -> Result<Payload>;

    /// Write one file.
    ///
    /// # Errors
    /// Returns an error if the payload does not fit the format, if the
    /// format cannot be written, or if I/O fails.
    fn write(&self, path: &Path, data: &Payload, options: &AdapterOptions<'_>) -> Result<()>;
}
