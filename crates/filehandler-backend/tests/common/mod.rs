//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use filehandler_core::{Column, ColumnData, Frame};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Frame with `M = [1, 2]` and `N = [3, null]`.
pub fn mn_frame() -> Frame {
    Frame::new(vec![
        Column::new("M", ColumnData::Int(vec![Some(1), Some(2)])),
        Column::new("N", ColumnData::Int(vec![Some(3), None])),
    ])
    .unwrap()
}

/// Write a PDF with one text object per line, one page per slice.
pub fn write_pdf(path: &Path, pages: &[&[&str]]) {
    build_pdf(pages).save(path).unwrap();
}

fn build_pdf(pages: &[&[&str]]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            let y = 720 - 14 * i64::try_from(i).unwrap();
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            operations.push(Operation::new("Td", vec![72.into(), y.into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        kids.push(page_id.into());
    }

    let count = i64::try_from(kids.len()).unwrap();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// Password padding of the standard security handler.
const PAD: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01,
    0x08, 0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53,
    0x69, 0x7A,
];

fn padded(password: &str) -> Vec<u8> {
    password
        .bytes()
        .chain(PAD)
        .take(32)
        .collect()
}

fn rc4(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut s: Vec<u8> = (0..=255).collect();
    let mut j: u8 = 0;
    for i in 0..256 {
        j = j.wrapping_add(s[i]).wrapping_add(key[i % key.len()]);
        s.swap(i, usize::from(j));
    }
    let (mut i, mut j) = (0u8, 0u8);
    data.iter()
        .map(|byte| {
            i = i.wrapping_add(1);
            j = j.wrapping_add(s[usize::from(i)]);
            s.swap(usize::from(i), usize::from(j));
            byte ^ s[usize::from(s[usize::from(i)].wrapping_add(s[usize::from(j)]))]
        })
        .collect()
}

/// Write a PDF locked with `user_password`: standard security handler,
/// revision 2, 40-bit RC4.
pub fn write_encrypted_pdf(path: &Path, pages: &[&[&str]], user_password: &str) {
    const PERMISSIONS: i32 = -4;
    let mut doc = build_pdf(pages);
    let file_id: Vec<u8> = (1..=16).collect();

    let owner_digest = md5::compute(padded("owner"));
    let owner_entry = rc4(&owner_digest.0[..5], &padded(user_password));

    let mut ctx = md5::Context::new();
    ctx.consume(padded(user_password));
    ctx.consume(&owner_entry);
    ctx.consume(PERMISSIONS.to_le_bytes());
    ctx.consume(&file_id);
    let file_key = ctx.compute().0[..5].to_vec();
    let user_entry = rc4(&file_key, &PAD);

    for (&(number, generation), object) in &mut doc.objects {
        if let Object::Stream(stream) = object {
            let mut key = file_key.clone();
            key.extend_from_slice(&number.to_le_bytes()[..3]);
            key.extend_from_slice(&generation.to_le_bytes()[..2]);
            let object_digest = md5::compute(&key);
            let sealed = rc4(&object_digest.0[..10], &stream.content);
            stream.set_content(sealed);
        }
    }

    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
        "Length" => 40,
        "O" => Object::String(owner_entry, StringFormat::Hexadecimal),
        "U" => Object::String(user_entry, StringFormat::Hexadecimal),
        "P" => i64::from(PERMISSIONS),
    });
    doc.trailer.set("Encrypt", encrypt_id);
    doc.trailer.set(
        "ID",
        vec![
            Object::String(file_id.clone(), StringFormat::Hexadecimal),
            Object::String(file_id, StringFormat::Hexadecimal),
        ],
    );
    doc.save(path).unwrap();
}

/// Write a minimal deck, one text run per line, one slide per slice.
pub fn write_pptx(path: &Path, slides: &[&[&str]]) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let opts = SimpleFileOptions::default();

    let mut ids = String::new();
    let mut rels = String::new();
    for n in 1..=slides.len() {
        ids.push_str(&format!("<p:sldId id=\"{}\" r:id=\"rId{n}\"/>", 255 + n));
        rels.push_str(&format!(
            "<Relationship Id=\"rId{n}\" \
             Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide\" \
             Target=\"slides/slide{n}.xml\"/>"
        ));
    }

    zip.start_file("ppt/presentation.xml", opts).unwrap();
    write!(
        zip,
        "<p:presentation xmlns:p=\"p\" xmlns:r=\"r\"><p:sldIdLst>{ids}</p:sldIdLst></p:presentation>"
    )
    .unwrap();
    zip.start_file("ppt/_rels/presentation.xml.rels", opts).unwrap();
    write!(zip, "<Relationships>{rels}</Relationships>").unwrap();

    for (i, lines) in slides.iter().enumerate() {
        let body: String = lines
            .iter()
            .map(|line| format!("<a:p><a:r><a:t>{line}</a:t></a:r></a:p>"))
            .collect();
        zip.start_file(format!("ppt/slides/slide{}.xml", i + 1), opts)
            .unwrap();
        write!(
            zip,
            "<p:sld xmlns:a=\"a\" xmlns:p=\"p\"><p:cSld><p:spTree><p:sp>\
             <p:txBody>{body}</p:txBody></p:sp></p:spTree></p:cSld></p:sld>"
        )
        .unwrap();
    }
    zip.finish().unwrap();
}
