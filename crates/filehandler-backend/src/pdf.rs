//! PDF adapter (text extraction via lopdf)
//!
//! Each page becomes one entry `Page N` whose text is reflowed with
//! [`adjust_phrases`]. Encrypted documents are decrypted with the supplied
//! password (an empty password when none is given). When that fails the
//! adapter does not error: it returns a single `Error` entry describing the
//! problem and reports a warning to the options' diagnostics sink.

use crate::traits::{AdapterOptions, FileAdapter};
use crate::utils::adjust_phrases;
use filehandler_core::{Diagnostics, FileFormat, HandlerError, Payload, Result};
use indexmap::IndexMap;
use lopdf::Document;
use std::path::Path;

/// PDF adapter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PdfAdapter;

impl PdfAdapter {
    /// Create a new PDF adapter instance
    #[inline]
    #[must_use = "creates an adapter instance that should be used for file I/O"]
    pub const fn new() -> Self {
        Self
    }

    /// Extract reflowed text for every page of a loaded document.
    ///
    /// # Errors
    /// Returns an error if a page's content stream cannot be decoded.
    pub fn extract_pages(doc: &Document) -> Result<IndexMap<String, String>> {
        let pages = doc.get_pages();
        let mut out = IndexMap::with_capacity(pages.len());
        for (position, page_number) in pages.keys().enumerate() {
            let raw = doc.extract_text(&[*page_number]).map_err(|e| {
                HandlerError::BackendError(format!("Failed to extract page {page_number}: {e}"))
            })?;
            out.insert(format!("Page {}", position + 1), adjust_phrases(&raw));
        }
        Ok(out)
    }
}

fn locked(path: &Path, diagnostics: &dyn Diagnostics) -> Payload {
    let message = format!("PDF file {} is encrypted. Need password!", path.display());
    diagnostics.warn(&message);
    Payload::Pages(IndexMap::from([("Error".to_string(), message)]))
}

impl FileAdapter for PdfAdapter {
    #[inline]
    fn format(&self) -> FileFormat {
        FileFormat::Pdf
    }

    fn load(&self, path: &Path, options: &AdapterOptions<'_>) -> Result<Payload> {
        let mut doc = Document::load(path)
            .map_err(|e| HandlerError::BackendError(format!("Failed to open PDF: {e}")))?;

        if doc.is_encrypted() && doc.decrypt(options.password.unwrap_or_default()).is_err() {
            return Ok(locked(path, options.diagnostics));
        }

        Ok(Payload::Pages(Self::extract_pages(&doc)?))
    }

    fn write(&self, _path: &Path, _data: &Payload, _options: &AdapterOptions<'_>) -> Result<()> {
        Err(HandlerError::NotImplemented(
            "I can't write pdf files yet!".to_string(),
        ))
    }
}
