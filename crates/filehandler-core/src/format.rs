//! File format registry.
//!
//! The set of formats is closed: adding one means extending [`FileFormat`].

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported file format, selected from a path's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Plain text, also the fallback for unknown extensions and binary mode
    Text,
    /// JSON structured data
    Json,
    /// Comma separated values
    Csv,
    /// Apache Parquet columnar file
    Parquet,
    /// Microsoft Excel workbook (.xlsx)
    Xlsx,
    /// Microsoft `PowerPoint` deck (.pptx, .ppt)
    Pptx,
    /// PDF document
    Pdf,
}

impl FileFormat {
    /// Every registered format, in registry order.
    pub const ALL: [Self; 7] = [
        Self::Text,
        Self::Json,
        Self::Xlsx,
        Self::Pdf,
        Self::Pptx,
        Self::Csv,
        Self::Parquet,
    ];

    /// Look up a format by extension (case-insensitive, without the dot).
    #[inline]
    #[must_use = "returns the format for the extension, if registered"]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "parquet" => Some(Self::Parquet),
            "xlsx" => Some(Self::Xlsx),
            "ppt" | "pptx" => Some(Self::Pptx),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Look up a format from a path's extension.
    #[must_use = "returns the format for the path, if registered"]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Extensions registered for this format.
    #[inline]
    #[must_use = "returns the registered extensions"]
    pub const fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Text => &["txt"],
            Self::Json => &["json"],
            Self::Csv => &["csv"],
            Self::Parquet => &["parquet"],
            Self::Xlsx => &["xlsx"],
            Self::Pptx => &["ppt", "pptx"],
            Self::Pdf => &["pdf"],
        }
    }

    /// Formats that can only be read.
    #[inline]
    #[must_use = "returns whether writing is unsupported"]
    pub const fn is_read_only(&self) -> bool {
        matches!(self, Self::Pptx | Self::Pdf)
    }
}

impl std::fmt::Display for FileFormat {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Text => "txt",
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Parquet => "parquet",
            Self::Xlsx => "xlsx",
            Self::Pptx => "pptx",
            Self::Pdf => "pdf",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for FileFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s.trim_start_matches('.'))
            .ok_or_else(|| format!("Unknown file format: '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_extension_is_case_insensitive() {
        assert_eq!(FileFormat::from_extension("CSV"), Some(FileFormat::Csv));
        assert_eq!(FileFormat::from_extension("Pdf"), Some(FileFormat::Pdf));
        assert_eq!(FileFormat::from_extension("ppt"), Some(FileFormat::Pptx));
        assert_eq!(FileFormat::from_extension("PPTX"), Some(FileFormat::Pptx));
        assert_eq!(FileFormat::from_extension("docx"), None);
        assert_eq!(FileFormat::from_extension(""), None);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            FileFormat::from_path(&PathBuf::from("data/report.XLSX")),
            Some(FileFormat::Xlsx)
        );
        assert_eq!(FileFormat::from_path(&PathBuf::from("README")), None);
        assert_eq!(FileFormat::from_path(&PathBuf::from("a.tar.gz")), None);
    }

    #[test]
    fn test_extensions_round_trip() {
        for format in FileFormat::ALL {
            for ext in format.extensions() {
                assert_eq!(FileFormat::from_extension(ext), Some(format));
            }
        }
    }

    #[test]
    fn test_read_only_formats() {
        let read_only: Vec<_> = FileFormat::ALL
            .into_iter()
            .filter(FileFormat::is_read_only)
            .collect();
        assert_eq!(read_only, vec![FileFormat::Pdf, FileFormat::Pptx]);
    }

    #[test]
    fn test_display_and_from_str() {
        assert_eq!(FileFormat::Parquet.to_string(), "parquet");
        assert_eq!(".json".parse::<FileFormat>(), Ok(FileFormat::Json));
        assert!("exe".parse::<FileFormat>().is_err());
    }
}
