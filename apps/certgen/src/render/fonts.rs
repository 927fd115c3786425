//! Font dictionaries for generated content.
//!
//! Built-in faces are referenced by name. Font files are embedded whole as a
//! simple font with WinAnsiEncoding; the `/Widths` array comes from the same
//! advance table the fit engine measures with, so viewers lay glyphs out
//! exactly where the engine expects them.

use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::layout::{FontHandle, TextMetrics, TrueTypeFont};

const FIRST_CHAR: u8 = 32;
const LAST_CHAR: u8 = 255;

/// Adds the font dictionary (and any embedded font program) to `doc`.
pub fn add_font_object(doc: &mut Document, font: &FontHandle) -> ObjectId {
    match font {
        FontHandle::Builtin(base) => doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => base.postscript_name(),
            "Encoding" => "WinAnsiEncoding",
        }),
        FontHandle::Embedded(tt) => add_embedded_font(doc, tt),
    }
}

fn add_embedded_font(doc: &mut Document, font: &TrueTypeFont) -> ObjectId {
    let (file_key, file_stream) = if font.is_cff() {
        (
            "FontFile3",
            Stream::new(dictionary! { "Subtype" => "OpenType" }, font.data().to_vec()),
        )
    } else {
        (
            "FontFile2",
            Stream::new(
                dictionary! { "Length1" => font.data().len() as i64 },
                font.data().to_vec(),
            ),
        )
    };
    let file_id = doc.add_object(file_stream);

    let [x_min, y_min, x_max, y_max] = font.bbox();
    let ascent = (font.ascender() * 1000.0).round() as i64;
    let descent = (font.descender() * 1000.0).round() as i64;
    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => Object::Name(font.postscript_name().as_bytes().to_vec()),
        // Nonsymbolic
        "Flags" => 32,
        "FontBBox" => vec![
            Object::Integer(x_min as i64),
            Object::Integer(y_min as i64),
            Object::Integer(x_max as i64),
            Object::Integer(y_max as i64),
        ],
        "ItalicAngle" => 0,
        "Ascent" => ascent,
        "Descent" => descent,
        "CapHeight" => ascent,
        "StemV" => 80,
        file_key => file_id,
    });

    let widths: Vec<Object> = (FIRST_CHAR..=LAST_CHAR)
        .map(|code| Object::Integer(font.pdf_width(code) as i64))
        .collect();

    let subtype = if font.is_cff() { "Type1" } else { "TrueType" };
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => subtype,
        "BaseFont" => Object::Name(font.postscript_name().as_bytes().to_vec()),
        "FirstChar" => FIRST_CHAR as i64,
        "LastChar" => LAST_CHAR as i64,
        "Widths" => widths,
        "FontDescriptor" => descriptor_id,
        "Encoding" => "WinAnsiEncoding",
    })
}
