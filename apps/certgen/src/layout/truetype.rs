//! TrueType / OpenType faces loaded from font files.
//!
//! The face is parsed once with `ttf-parser`; advance widths are resolved up
//! front for every WinAnsi code so measuring never re-parses the file. The raw
//! bytes are kept for embedding into generated PDFs.

use std::path::Path;

use thiserror::Error;

use crate::layout::encoding;
use crate::layout::font_metrics::TextMetrics;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("could not read font file: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse font: {0}")]
    Parse(#[from] ttf_parser::FaceParsingError),

    #[error("font has an invalid units-per-em value")]
    InvalidUnitsPerEm,
}

/// A parsed font file ready for measuring and embedding.
pub struct TrueTypeFont {
    postscript_name: String,
    data: Vec<u8>,
    is_cff: bool,
    ascender: f32,
    descender: f32,
    /// `[x_min, y_min, x_max, y_max]` in 1/1000 em.
    bbox: [i32; 4],
    /// Advance per WinAnsi code in 1/1000 em; `None` when the glyph is missing.
    widths: [Option<u16>; 256],
    missing_width: u16,
}

impl TrueTypeFont {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FontError> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(data)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self, FontError> {
        let face = ttf_parser::Face::parse(&data, 0)?;
        let upem = face.units_per_em();
        if upem == 0 {
            return Err(FontError::InvalidUnitsPerEm);
        }
        let scale = 1000.0 / upem as f32;

        let mut widths = [None; 256];
        for (code, slot) in widths.iter_mut().enumerate() {
            *slot = encoding::decode_byte(code as u8)
                .and_then(|c| face.glyph_index(c))
                .and_then(|gid| face.glyph_hor_advance(gid))
                .map(|adv| (adv as f32 * scale).round() as u16);
        }
        let missing_width = widths[b'n' as usize].unwrap_or(500);

        let postscript_name = face
            .names()
            .into_iter()
            .find(|n| n.name_id == ttf_parser::name_id::POST_SCRIPT_NAME && n.is_unicode())
            .and_then(|n| n.to_string())
            .unwrap_or_else(|| "EmbeddedFont".to_string());

        let ascender = face.ascender() as f32 / upem as f32;
        let descender = face.descender() as f32 / upem as f32;
        let is_cff = face.tables().cff.is_some();
        let gbb = face.global_bounding_box();
        let bbox = [gbb.x_min, gbb.y_min, gbb.x_max, gbb.y_max]
            .map(|v| (v as f32 * scale).round() as i32);

        Ok(Self {
            postscript_name: sanitize_pdf_name(&postscript_name),
            data,
            is_cff,
            ascender,
            descender,
            bbox,
            widths,
            missing_width,
        })
    }

    pub fn postscript_name(&self) -> &str {
        &self.postscript_name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// CFF-flavoured OpenType fonts embed as `FontFile3`, not `FontFile2`.
    pub fn is_cff(&self) -> bool {
        self.is_cff
    }

    pub fn bbox(&self) -> [i32; 4] {
        self.bbox
    }

    /// Advance width in 1/1000 em for a WinAnsi code, for the `/Widths` array.
    pub fn pdf_width(&self, code: u8) -> u16 {
        self.widths[code as usize].unwrap_or(self.missing_width)
    }
}

impl TextMetrics for TrueTypeFont {
    fn char_width_em(&self, c: char) -> Option<f32> {
        let code = encoding::encode_char(c)?;
        self.widths[code as usize].map(|w| w as f32 / 1000.0)
    }

    fn missing_width_em(&self) -> f32 {
        self.missing_width as f32 / 1000.0
    }

    fn ascender(&self) -> f32 {
        self.ascender
    }

    fn descender(&self) -> f32 {
        self.descender
    }
}

/// PDF names may not contain whitespace or delimiters.
fn sanitize_pdf_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_graphic() && !"()<>[]{}/%#".contains(*c))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;

    /// DejaVu Sans Mono: glyf outlines, every glyph 1233/2048 em wide.
    pub(crate) fn fixture_path() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/DejaVuSansMono.ttf")
    }

    pub(crate) fn fixture_font() -> TrueTypeFont {
        TrueTypeFont::from_path(fixture_path()).unwrap()
    }

    #[test]
    fn test_fixture_face_parses_with_metrics() {
        let font = fixture_font();
        assert_eq!(font.postscript_name(), "DejaVuSansMono");
        assert!(!font.is_cff());
        assert!(font.ascender() > 0.8 && font.ascender() < 1.0);
        assert!(font.descender() < 0.0 && font.descender() > -0.5);
        let [x_min, y_min, x_max, y_max] = font.bbox();
        assert!(x_min < 0 && y_min < 0 && x_max > 0 && y_max > 0);
        assert_eq!(font.data().len(), std::fs::read(fixture_path()).unwrap().len());
    }

    #[test]
    fn test_fixture_face_measures_winansi_text() {
        let font = fixture_font();
        assert_eq!(font.pdf_width(b'A'), 602);
        assert_eq!(font.pdf_width(0xE9), 602); // eacute
        assert_eq!(font.char_width_em('A'), Some(0.602));

        let w = font.text_width("Alice", 10.0);
        assert!(w > 0.0);
        assert!((w - 30.1).abs() < 1e-3, "got {w}");

        assert!(font.can_render("Zoë Müller"));
        assert!(!font.can_render("漢字"));
    }

    #[test]
    fn test_garbage_bytes_fail_to_parse() {
        let err = TrueTypeFont::from_bytes(b"definitely not a font".to_vec())
            .err()
            .expect("garbage must not parse");
        assert!(matches!(err, FontError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TrueTypeFont::from_path(dir.path().join("Brixton_Medium.otf"))
            .err()
            .expect("missing file must fail");
        assert!(matches!(err, FontError::Io(_)));
    }

    #[test]
    fn test_pdf_name_sanitizing() {
        assert_eq!(sanitize_pdf_name("Brixton Medium"), "BrixtonMedium");
        assert_eq!(sanitize_pdf_name("Foo/Bar#1"), "FooBar1");
    }
}
