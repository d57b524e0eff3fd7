//! Microsoft Excel (.xlsx) adapter
//!
//! Reading goes through calamine: every worksheet, in workbook order, becomes
//! one frame whose first row is the header. Writing produces a minimal
//! SpreadsheetML package directly with `zip`: inline strings, one date-time
//! cell style, no shared-string table.

// Clippy pedantic allows:
// - Excel serials are f64 day counts
#![allow(clippy::cast_precision_loss)]

use crate::traits::{AdapterOptions, FileAdapter};
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use chrono::{NaiveDate, NaiveDateTime};
use filehandler_core::{Cell, FileFormat, Frame, HandlerError, Payload, Result};
use indexmap::IndexMap;
use quick_xml::escape::escape;
use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Characters Excel refuses in sheet names
const FORBIDDEN_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Longest sheet name Excel accepts
const MAX_SHEET_NAME_LEN: usize = 31;

/// Sheet name used when a single frame is written
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Microsoft Excel adapter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct XlsxAdapter;

impl XlsxAdapter {
    /// Create a new XLSX adapter instance
    #[inline]
    #[must_use = "creates an adapter instance that should be used for file I/O"]
    pub const fn new() -> Self {
        Self
    }

    /// Check a sheet name against Excel's rules.
    ///
    /// # Errors
    /// Returns [`HandlerError::PayloadError`] for empty, too long or
    /// otherwise invalid names.
    pub fn validate_sheet_name(name: &str) -> Result<()> {
        let len = name.chars().count();
        if len == 0 || len > MAX_SHEET_NAME_LEN {
            return Err(HandlerError::PayloadError(format!(
                "Invalid Excel sheet name '{name}': must be 1 to {MAX_SHEET_NAME_LEN} characters"
            )));
        }
        if name.contains(FORBIDDEN_SHEET_CHARS) {
            return Err(HandlerError::PayloadError(format!(
                "Invalid Excel sheet name '{name}': contains one of []:*?/\\"
            )));
        }
        if name.starts_with('\'') || name.ends_with('\'') {
            return Err(HandlerError::PayloadError(format!(
                "Invalid Excel sheet name '{name}': cannot start or end with an apostrophe"
            )));
        }
        Ok(())
    }
}

fn excel_epoch() -> NaiveDateTime {
    // 1899-12-30 is always valid; the default is never reached.
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

fn to_serial(dt: &NaiveDateTime) -> f64 {
    let delta = *dt - excel_epoch();
    delta
        .num_microseconds()
        .map_or_else(|| delta.num_seconds() as f64 / 86_400.0, |us| us as f64 / 86_400_000_000.0)
}

/// Spreadsheet column letters for a zero-based index (0 -> A, 26 -> AA).
fn column_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(char::from(b'A' + (index % 26) as u8));
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}

fn header_text(data: &Data, col: usize) -> String {
    match data {
        Data::Empty | Data::Error(_) => format!("Unnamed: {col}"),
        Data::Float(f) if f.fract() == 0.0 && f.is_finite() => format!("{f:.0}"),
        other => other.to_string(),
    }
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map_or_else(|| Cell::Float(dt.as_f64()), Cell::DateTime),
        Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .map_or_else(|_| Cell::Text(s.clone()), Cell::DateTime),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) | Data::Empty => Cell::Null,
    }
}

fn range_to_frame(range: &Range<Data>) -> Result<Frame> {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Frame::default());
    };

    let mut columns: Vec<(String, Vec<Cell>)> = header
        .iter()
        .enumerate()
        .map(|(col, data)| (header_text(data, col), Vec::new()))
        .collect();
    for row in rows {
        for (col, (_, cells)) in columns.iter_mut().enumerate() {
            cells.push(row.get(col).map_or(Cell::Null, data_to_cell));
        }
    }
    Frame::from_cell_columns(columns)
}

// `write!` into a String is infallible, hence the ignored results below.
fn sheet_xml(frame: &Frame) -> String {
    let mut xml = format!(r#"{XML_DECL}<worksheet xmlns="{NS_MAIN}"><sheetData>"#);

    xml.push_str(r#"<row r="1">"#);
    for (col, name) in frame.column_names().iter().enumerate() {
        let _ = write!(
            xml,
            r#"<c r="{}1" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
            column_letters(col),
            escape(*name)
        );
    }
    xml.push_str("</row>");

    for row in 0..frame.n_rows() {
        let r = row + 2;
        let _ = write!(xml, r#"<row r="{r}">"#);
        for (col, cell) in frame.row(row).iter().enumerate() {
            let at = format!("{}{r}", column_letters(col));
            let _ = match cell {
                Cell::Null => Ok(()),
                Cell::Bool(b) => write!(xml, r#"<c r="{at}" t="b"><v>{}</v></c>"#, u8::from(*b)),
                Cell::Int(i) => write!(xml, r#"<c r="{at}"><v>{i}</v></c>"#),
                Cell::Float(f) if !f.is_finite() => Ok(()),
                Cell::Float(f) => write!(xml, r#"<c r="{at}"><v>{f:?}</v></c>"#),
                Cell::Text(s) => write!(
                    xml,
                    r#"<c r="{at}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                    escape(s.as_str())
                ),
                Cell::DateTime(dt) => {
                    write!(xml, r#"<c r="{at}" s="1"><v>{}</v></c>"#, to_serial(dt))
                }
            };
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

fn workbook_parts(sheets: &IndexMap<String, Frame>) -> Vec<(String, String)> {
    let mut content_types = format!(
        r#"{XML_DECL}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#
    );
    let mut workbook = format!(
        r#"{XML_DECL}<workbook xmlns="{NS_MAIN}" xmlns:r="{NS_REL}"><sheets>"#
    );
    let mut workbook_rels = format!(r#"{XML_DECL}<Relationships xmlns="{NS_PKG_REL}">"#);
    let mut parts = Vec::with_capacity(sheets.len() + 5);

    for (idx, (name, frame)) in sheets.iter().enumerate() {
        let n = idx + 1;
        let _ = write!(
            content_types,
            r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        );
        let _ = write!(
            workbook,
            r#"<sheet name="{}" sheetId="{n}" r:id="rId{n}"/>"#,
            escape(name.as_str())
        );
        let _ = write!(
            workbook_rels,
            r#"<Relationship Id="rId{n}" Type="{NS_REL}/worksheet" Target="worksheets/sheet{n}.xml"/>"#
        );
        parts.push((format!("xl/worksheets/sheet{n}.xml"), sheet_xml(frame)));
    }

    let styles_id = sheets.len() + 1;
    let _ = write!(
        workbook_rels,
        r#"<Relationship Id="rId{styles_id}" Type="{NS_REL}/styles" Target="styles.xml"/></Relationships>"#
    );
    content_types.push_str("</Types>");
    workbook.push_str("</sheets></workbook>");

    let root_rels = format!(
        r#"{XML_DECL}<Relationships xmlns="{NS_PKG_REL}"><Relationship Id="rId1" Type="{NS_REL}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
    );
    let styles = format!(
        r#"{XML_DECL}<styleSheet xmlns="{NS_MAIN}"><fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="22" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/></cellXfs></styleSheet>"#
    );

    let mut all = vec![
        ("[Content_Types].xml".to_string(), content_types),
        ("_rels/.rels".to_string(), root_rels),
        ("xl/workbook.xml".to_string(), workbook),
        ("xl/_rels/workbook.xml.rels".to_string(), workbook_rels),
        ("xl/styles.xml".to_string(), styles),
    ];
    all.append(&mut parts);
    all
}

fn write_workbook(path: &Path, sheets: &IndexMap<String, Frame>) -> Result<()> {
    if sheets.is_empty() {
        return Err(HandlerError::PayloadError(
            "At least one sheet must be written".to_string(),
        ));
    }
    let mut seen = std::collections::HashSet::new();
    for name in sheets.keys() {
        XlsxAdapter::validate_sheet_name(name)?;
        if !seen.insert(name.to_lowercase()) {
            return Err(HandlerError::PayloadError(format!(
                "Duplicate Excel sheet name '{name}'"
            )));
        }
    }

    let zip_err = |e: zip::result::ZipError| {
        HandlerError::BackendError(format!("Failed to write XLSX: {e}"))
    };
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(File::create(path)?);
    for (name, content) in workbook_parts(sheets) {
        zip.start_file(name, options).map_err(zip_err)?;
        zip.write_all(content.as_bytes())?;
    }
    zip.finish().map_err(zip_err)?;
    Ok(())
}

impl FileAdapter for XlsxAdapter {
    #[inline]
    fn format(&self) -> FileFormat {
        FileFormat::Xlsx
    }

    fn load(&self, path: &Path, _options: &AdapterOptions<'_>) -> Result<Payload> {
        let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| {
            HandlerError::BackendError(format!("Failed to open XLSX: {e}: {}", path.display()))
        })?;

        let mut sheets = IndexMap::new();
        for name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&name).map_err(|e| {
                HandlerError::BackendError(format!("Failed to read sheet '{name}': {e}"))
            })?;
            let frame = range_to_frame(&range)?;
            log::debug!("Read sheet '{name}': {frame}");
            sheets.insert(name, frame);
        }
        Ok(Payload::Sheets(sheets))
    }

    fn write(&self, path: &Path, data: &Payload, _options: &AdapterOptions<'_>) -> Result<()> {
        match data {
            Payload::Frame(frame) => {
                let sheets: IndexMap<String, Frame> =
                    [(DEFAULT_SHEET_NAME.to_string(), frame.clone())].into_iter().collect();
                write_workbook(path, &sheets)
            }
            Payload::Sheets(sheets) => write_workbook(path, sheets),
            other => Err(HandlerError::PayloadError(format!(
                "xlsx files take a frame or named frames, not {}",
                other.kind()
            ))),
        }
    }
}
