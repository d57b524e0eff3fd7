//! Microsoft `PowerPoint` adapter (.pptx; .ppt paths are routed here too)
//!
//! A PPTX file is a ZIP archive:
//! - `ppt/presentation.xml`: slide list (`p:sldIdLst`) in presentation order
//! - `ppt/_rels/presentation.xml.rels`: maps slide ids to `slides/slideN.xml`
//! - `ppt/slides/slideN.xml`: shapes, whose `p:txBody` holds paragraphs of runs
//!
//! Each slide becomes one entry `Slide N` whose value is the text of every
//! run (`a:r/a:t`) in every shape text body, one run per line. Legacy binary
//! `.ppt` files are not ZIP archives and fail to open.

use crate::traits::{AdapterOptions, FileAdapter};
use filehandler_core::{FileFormat, HandlerError, Payload, Result};
use indexmap::IndexMap;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use zip::ZipArchive;

const SLIDE_REL_TYPE_SUFFIX: &str = "/slide";

/// Microsoft `PowerPoint` adapter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PptxAdapter;

impl PptxAdapter {
    /// Create a new `PowerPoint` adapter instance
    #[inline]
    #[must_use = "creates an adapter instance that should be used for file I/O"]
    pub const fn new() -> Self {
        Self
    }

    /// Extract per-slide text from an open archive.
    ///
    /// # Errors
    /// Returns an error if a required part is missing or malformed.
    pub fn extract_slides<R: Read + Seek>(
        archive: &mut ZipArchive<R>,
    ) -> Result<IndexMap<String, String>> {
        let slide_paths = slide_paths(archive)?;
        let mut slides = IndexMap::with_capacity(slide_paths.len());
        for (idx, slide_path) in slide_paths.iter().enumerate() {
            let xml = read_part(archive, slide_path)?;
            let runs = slide_runs(&xml)
                .map_err(|e| HandlerError::BackendError(format!("XML parse error in {slide_path}: {e}")))?;
            slides.insert(format!("Slide {}", idx + 1), runs.join("\n"));
        }
        Ok(slides)
    }
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String> {
    let mut file = archive
        .by_name(name)
        .map_err(|e| HandlerError::BackendError(format!("Missing {name}: {e}")))?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(content)
}

/// Slide part names in presentation order.
fn slide_paths<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
    let rels_xml = read_part(archive, "ppt/_rels/presentation.xml.rels")?;
    let mut targets: HashMap<String, String> = HashMap::new();
    let mut reader = Reader::from_str(&rels_xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e) | Event::Start(e)) if e.name().as_ref() == b"Relationship" => {
                let mut id = String::new();
                let mut target = String::new();
                let mut is_slide = false;
                for attr in e.attributes().flatten() {
                    let Ok(val) = attr.decode_and_unescape_value(&reader) else {
                        continue;
                    };
                    match attr.key.as_ref() {
                        b"Id" => id = val.into_owned(),
                        b"Target" => target = val.into_owned(),
                        b"Type" => is_slide = val.ends_with(SLIDE_REL_TYPE_SUFFIX),
                        _ => {}
                    }
                }
                if is_slide && !target.is_empty() {
                    let full = target
                        .strip_prefix('/')
                        .map_or_else(|| format!("ppt/{target}"), str::to_string);
                    targets.insert(id, full);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(HandlerError::BackendError(format!(
                    "XML parse error in presentation.xml.rels: {e}"
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    let presentation_xml = read_part(archive, "ppt/presentation.xml")?;
    let mut ordered = Vec::with_capacity(targets.len());
    let mut reader = Reader::from_str(&presentation_xml);
    reader.trim_text(true);

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e) | Event::Start(e)) if e.name().as_ref() == b"p:sldId" => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"r:id" {
                        if let Ok(val) = attr.decode_and_unescape_value(&reader) {
                            if let Some(path) = targets.get(&*val) {
                                ordered.push(path.clone());
                            }
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(HandlerError::BackendError(format!(
                    "XML parse error in presentation.xml: {e}"
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    if ordered.is_empty() && !targets.is_empty() {
        // No slide list: fall back to slide file numbering.
        ordered = targets.into_values().collect();
        ordered.sort_by_key(|p| slide_number(p));
    }
    Ok(ordered)
}

fn slide_number(path: &str) -> u32 {
    path.trim_end_matches(".xml")
        .rsplit(|c: char| !c.is_ascii_digit())
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

/// Text of every run inside a shape text body, in document order.
fn slide_runs(xml: &str) -> std::result::Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut runs = Vec::new();

    let mut body_depth = 0usize;
    let mut current_run: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"p:txBody" => body_depth += 1,
                b"a:r" if body_depth > 0 => current_run = Some(String::new()),
                b"a:t" if current_run.is_some() => in_text = true,
                _ => {}
            },
            Event::Empty(e) => {
                if e.name().as_ref() == b"a:r" && body_depth > 0 {
                    runs.push(String::new());
                }
            }
            Event::Text(e) if in_text => {
                if let Some(run) = current_run.as_mut() {
                    run.push_str(&e.unescape()?);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"p:txBody" => body_depth = body_depth.saturating_sub(1),
                b"a:t" => in_text = false,
                b"a:r" => {
                    if let Some(run) = current_run.take() {
                        runs.push(run);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(runs)
}

impl FileAdapter for PptxAdapter {
    #[inline]
    fn format(&self) -> FileFormat {
        FileFormat::Pptx
    }

    fn load(&self, path: &Path, _options: &AdapterOptions<'_>) -> Result<Payload> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(file).map_err(|e| {
            HandlerError::BackendError(format!("Failed to open presentation: {e}"))
        })?;
        Ok(Payload::Pages(Self::extract_slides(&mut archive)?))
    }

    fn write(&self, _path: &Path, _data: &Payload, _options: &AdapterOptions<'_>) -> Result<()> {
        Err(HandlerError::NotImplemented(
            "I can't write ppt files yet!".to_string(),
        ))
    }
}
