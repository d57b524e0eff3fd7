//! Helpers shared by the adapters: transfer modes, text encodings and the
//! page-text reflow used by the PDF adapter.

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use filehandler_core::{HandlerError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\n+").expect("valid regex"));
static SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").expect("valid regex"));

/// Whether a transfer mode asks for raw bytes.
#[inline]
#[must_use]
pub fn is_binary_mode(mode: &str) -> bool {
    mode.contains('b')
}

/// Resolve an encoding label (`utf-8`, `latin1`, `cp1252`, ...).
///
/// # Errors
/// Returns [`HandlerError::EncodingError`] for unknown labels.
pub fn lookup_encoding(label: &str) -> Result<&'static Encoding> {
    let normalised = label.trim().to_ascii_lowercase().replace('_', "-");
    let normalised = match normalised.as_str() {
        "utf8" => "utf-8",
        "latin1" | "latin-1" => "iso-8859-1",
        other => other,
    };
    Encoding::for_label(normalised.as_bytes())
        .ok_or_else(|| HandlerError::EncodingError(format!("unknown encoding: {label}")))
}

/// Decode bytes with the given label, `None` meaning UTF-8.
///
/// Malformed input is an error, never silently replaced.
///
/// # Errors
/// Returns [`HandlerError::EncodingError`] for unknown labels or malformed input.
pub fn decode(bytes: &[u8], label: Option<&str>, path: &Path) -> Result<String> {
    let encoding = label.map_or(Ok(UTF_8), lookup_encoding)?;
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(std::borrow::Cow::into_owned)
        .ok_or_else(|| {
            HandlerError::EncodingError(format!(
                "'{}' codec can't decode {}",
                encoding.name(),
                path.display()
            ))
        })
}

/// Encode text with the given label, `None` meaning UTF-8.
///
/// # Errors
/// Returns [`HandlerError::EncodingError`] for unknown labels or characters
/// the encoding cannot represent.
pub fn encode(text: &str, label: Option<&str>) -> Result<Vec<u8>> {
    let encoding = label.map_or(Ok(UTF_8), lookup_encoding)?;
    // encoding_rs only encodes to ASCII-compatible encodings.
    if encoding == UTF_16LE {
        return Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect());
    }
    if encoding == UTF_16BE {
        return Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect());
    }
    let (bytes, _, unmappable) = encoding.encode(text);
    if unmappable {
        return Err(HandlerError::EncodingError(format!(
            "'{}' codec can't encode the given text",
            encoding.name()
        )));
    }
    Ok(bytes.into_owned())
}

fn ends_sentence(line: &str) -> bool {
    line.ends_with(&['.', '!', '?'][..])
}

fn starts_sentence(line: &str) -> bool {
    line.chars()
        .next()
        .is_some_and(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '"' || c == '\u{201C}')
}

/// Reflow text extracted from a PDF page.
///
/// Soft-wrapped lines are merged into one unless the first ends a sentence
/// (`.`, `!`, `?`) and the second starts one (capital, digit or opening
/// quote). A trailing hyphen joins the halves of a broken word, unless the
/// continuation starts with a digit. Blank-line runs collapse to one blank
/// line, space runs to one space, and trailing newlines are dropped.
///
/// ```
/// use filehandler_backend::utils::adjust_phrases;
///
/// assert_eq!(adjust_phrases("hyphen-\nated"), "hyphenated");
/// assert_eq!(adjust_phrases("one line\nwrapped.\nNext one."), "one line wrapped.\nNext one.");
/// ```
#[must_use]
pub fn adjust_phrases(page_text: &str) -> String {
    let lines: Vec<&str> = page_text.split('\n').collect();
    let n = lines.len();
    let mut joined: Vec<String> = Vec::with_capacity(n);

    let mut i = 0;
    while i < n {
        let mut current = lines[i].trim().to_string();
        if !current.is_empty() && i + 1 < n {
            let mut next = lines[i + 1].trim();
            while !(ends_sentence(&current) && starts_sentence(next)) && i + 2 < n && !next.is_empty() {
                if current.ends_with('-') {
                    if !next.starts_with(|c: char| c.is_ascii_digit()) {
                        current.pop();
                    }
                    current.push_str(next);
                } else {
                    current.push(' ');
                    current.push_str(next);
                }
                i += 1;
                next = lines[i + 1].trim();
            }
        }
        joined.push(current);
        i += 1;
    }

    let text = joined.join("\n");
    let text = BLANK_RUNS.replace_all(&text, "\n\n");
    let text = text.replace("-\n\n", "").replace("-\n", "");
    let text = SPACE_RUNS.replace_all(&text, " ");
    let mut text = text.replace("\n ", "\n").replace(" \n", "\n");
    while text.ends_with('\n') {
        text.pop();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::path::PathBuf;

    #[test]
    fn test_hyphen_across_line_break() {
        assert_eq!(adjust_phrases("hyphen-\nated"), "hyphenated");
        assert_eq!(adjust_phrases("hyphen-\nated\n"), "hyphenated");
    }

    #[test]
    fn test_hyphen_before_digit_is_kept() {
        assert_eq!(adjust_phrases("pages 10-\n20 and\nmore\n"), "pages 10-20 and more");
    }

    #[test]
    fn test_sentence_boundary_keeps_break() {
        let text = "The first sentence\nwraps here.\nThe second starts.\n\n\n\nNew paragraph\nafter gap\n";
        assert_eq!(
            adjust_phrases(text),
            "The first sentence wraps here.\nThe second starts.\n\nNew paragraph after gap"
        );
    }

    #[test]
    fn test_spaces_collapse_and_trim() {
        assert_eq!(adjust_phrases("  a   b  \n"), "a b");
        assert_eq!(adjust_phrases(""), "");
        assert_eq!(adjust_phrases("\n\n"), "");
    }

    #[test]
    fn test_quote_starts_sentence() {
        assert_eq!(
            adjust_phrases("He left.\n\u{201C}Bye\u{201D} she said\nlater.\n"),
            "He left.\n\u{201C}Bye\u{201D} she said later."
        );
    }

    #[test]
    fn test_binary_mode() {
        assert!(is_binary_mode("rb"));
        assert!(is_binary_mode("wb"));
        assert!(!is_binary_mode("r"));
        assert!(!is_binary_mode("a"));
    }

    #[test]
    fn test_decode_and_encode() {
        let path = PathBuf::from("x.txt");
        assert_eq!(decode("olá".as_bytes(), None, &path).unwrap(), "olá");
        assert_eq!(decode(&[0x6f, 0x6c, 0xe1], Some("latin1"), &path).unwrap(), "olá");
        assert!(decode(&[0xff, 0xfe, 0xfd], Some("utf-8"), &path).is_err());
        assert_eq!(encode("olá", Some("cp1252")).unwrap(), vec![0x6f, 0x6c, 0xe1]);
        assert_eq!(encode("a", Some("utf-16le")).unwrap(), vec![0x61, 0x00]);
        assert!(encode("日本", Some("latin1")).is_err());
    }

    #[test]
    fn test_unknown_encoding() {
        let err = lookup_encoding("klingon").unwrap_err();
        assert_eq!(err.to_string(), "Encoding error: unknown encoding: klingon");
        assert!(lookup_encoding("UTF_8").is_ok());
    }

    proptest! {
        #[test]
        fn prop_reflow_output_is_normalised(text in "[a-zA-Z0-9 .!?\"\\-\n]{0,200}") {
            let out = adjust_phrases(&text);
            prop_assert!(!out.ends_with('\n'));
            prop_assert!(!out.contains("  "));
        }

        #[test]
        fn prop_single_line_only_collapses_spaces(line in "[a-z]{1,10}( [a-z]{1,10}){0,8}") {
            prop_assert_eq!(adjust_phrases(&line), line);
        }
    }
}
