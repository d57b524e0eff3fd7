//! Data carried by a load result or a write request.

use crate::format::FileFormat;
use crate::frame::Frame;
use crate::value::Value;
use indexmap::IndexMap;

/// What a format adapter produced on load, or what it is asked to write.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Decoded text
    Text(String),
    /// Raw bytes (binary transfer mode)
    Bytes(Vec<u8>),
    /// Structured data
    Structured(Value),
    /// One tabular frame
    Frame(Frame),
    /// Named sheets of a workbook, in workbook order
    Sheets(IndexMap<String, Frame>),
    /// Named pages or slides, in document order
    Pages(IndexMap<String, String>),
}

impl Payload {
    /// Short variant name used in summaries and error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Structured(_) => "structured",
            Self::Frame(_) => "frame",
            Self::Sheets(_) => "sheets",
            Self::Pages(_) => "pages",
        }
    }

    /// One-line human summary.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Text(s) => format!("text, {} chars", s.chars().count()),
            Self::Bytes(b) => format!("bytes, {} bytes", b.len()),
            Self::Structured(v) => format!("structured {}", v.kind()),
            Self::Frame(f) => format!("frame, {} rows x {} columns", f.n_rows(), f.n_cols()),
            Self::Sheets(s) => format!(
                "{} sheet(s): {}",
                s.len(),
                s.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
            ),
            Self::Pages(p) => format!("{} page(s)", p.len()),
        }
    }

    /// Render as a JSON document for display.
    ///
    /// Bytes become an array of numbers, frames become row records.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        self.to_value().to_json()
    }

    /// Render as a structured value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Bytes(b) => Value::List(b.iter().map(|&x| Value::Int(i64::from(x))).collect()),
            Self::Structured(v) => v.clone(),
            Self::Frame(f) => f.to_records(),
            Self::Sheets(sheets) => sheets
                .iter()
                .map(|(name, frame)| (name.clone(), frame.to_records()))
                .collect(),
            Self::Pages(pages) => pages
                .iter()
                .map(|(name, text)| (name.clone(), text.as_str()))
                .collect(),
        }
    }

    /// Reshape a loaded payload so that `target` can write it.
    ///
    /// Used when converting between formats. Payloads the target already
    /// accepts pass through unchanged; shapes with no sensible mapping are
    /// returned as-is and left for the adapter to reject.
    #[must_use]
    pub fn into_format(self, target: FileFormat) -> Self {
        match (target, self) {
            (FileFormat::Json, payload @ (Self::Frame(_) | Self::Sheets(_))) => {
                Self::Structured(payload.to_value())
            }
            (FileFormat::Text, Self::Pages(pages)) => {
                Self::Text(pages.into_values().collect::<Vec<_>>().join("\n\n"))
            }
            (FileFormat::Text, Self::Structured(value)) => Self::Text(
                serde_json::to_string_pretty(&value.to_json()).unwrap_or_default(),
            ),
            (FileFormat::Csv | FileFormat::Parquet, Self::Sheets(sheets)) if sheets.len() == 1 => {
                match sheets.into_values().next() {
                    Some(frame) => Self::Frame(frame),
                    None => Self::Sheets(IndexMap::new()),
                }
            }
            (_, payload) => payload,
        }
    }
}

impl From<Frame> for Payload {
    fn from(frame: Frame) -> Self {
        Self::Frame(frame)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Structured(value)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}
