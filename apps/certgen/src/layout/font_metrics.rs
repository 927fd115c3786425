//! Font metrics used by the text-fit engine and the PDF canvas.
//!
//! Widths are in em units (relative to font size). The two built-in faces
//! carry the standard Adobe AFM advance widths for Helvetica and
//! Helvetica-Bold over every WinAnsi code: ASCII 0x20..=0x7E plus the upper
//! half 0x80..=0xFF. Faces loaded from font files measure through
//! [`TrueTypeFont`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::layout::encoding;
use crate::layout::truetype::TrueTypeFont;

// ────────────────────────────────────────────────────────────────────────────
// Metrics capability
// ────────────────────────────────────────────────────────────────────────────

/// What the fit engine needs to know about a font.
pub trait TextMetrics {
    /// Advance width of `c` in em units, `None` if the face cannot render it.
    fn char_width_em(&self, c: char) -> Option<f32>;

    /// Width used for characters the face cannot render.
    fn missing_width_em(&self) -> f32;

    /// Ascender in em units (positive, above the baseline).
    fn ascender(&self) -> f32;

    /// Descender in em units (negative, below the baseline).
    fn descender(&self) -> f32;

    /// Rendered width of `text` in points at `size`.
    fn text_width(&self, text: &str, size: f32) -> f32 {
        let em: f32 = text
            .chars()
            .map(|c| self.char_width_em(c).unwrap_or_else(|| self.missing_width_em()))
            .sum();
        em * size
    }

    /// Line advance per point of font size.
    fn line_height_factor(&self) -> f32 {
        self.ascender() - self.descender()
    }

    fn can_render(&self, text: &str) -> bool {
        text.chars().all(|c| self.char_width_em(c).is_some())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Built-in faces
// ────────────────────────────────────────────────────────────────────────────

/// Standard-14 faces that need no embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Base14Font {
    Helvetica,
    HelveticaBold,
}

impl Base14Font {
    pub fn postscript_name(self) -> &'static str {
        match self {
            Base14Font::Helvetica => "Helvetica",
            Base14Font::HelveticaBold => "Helvetica-Bold",
        }
    }

    fn table(self) -> &'static WidthTable {
        match self {
            Base14Font::Helvetica => &HELVETICA,
            Base14Font::HelveticaBold => &HELVETICA_BOLD,
        }
    }
}

impl TextMetrics for Base14Font {
    fn char_width_em(&self, c: char) -> Option<f32> {
        let code = encoding::encode_char(c)? as usize;
        let table = self.table();
        let units = match code {
            0x20..=0x7E => table.widths[code - 0x20],
            0x80..=0xFF => table.high[code - 0x80],
            _ => table.average,
        };
        Some(units as f32 / 1000.0)
    }

    fn missing_width_em(&self) -> f32 {
        self.table().average as f32 / 1000.0
    }

    fn ascender(&self) -> f32 {
        self.table().ascender as f32 / 1000.0
    }

    fn descender(&self) -> f32 {
        self.table().descender as f32 / 1000.0
    }
}

/// AFM widths in 1/1000 em.
///
/// ```text
/// [0]=sp  [1]=!   [2]="   [3]=#   [4]=$   [5]=%   [6]=&   [7]='
/// [8]=(   [9]=)   [10]=*  [11]=+  [12]=,  [13]=-  [14]=.  [15]=/
/// [16..25]=0-9
/// [26]=:  [27]=;  [28]=<  [29]==  [30]=>  [31]=?  [32]=@
/// [33..58]=A-Z
/// [59]=[  [60]=\  [61]=]  [62]=^  [63]=_  [64]=`
/// [65..90]=a-z
/// [91]={  [92]=|  [93]=}  [94]=~
/// ```
///
/// `high` holds WinAnsi 0x80..=0xFF, eight codes per row. The five codes
/// WinAnsi leaves unassigned (0x81, 0x8D, 0x8F, 0x90, 0x9D) are never
/// produced by the encoder and hold 0.
struct WidthTable {
    widths: [u16; 95],
    high: [u16; 128],
    average: u16,
    ascender: i16,
    descender: i16,
}

#[rustfmt::skip]
static HELVETICA: WidthTable = WidthTable {
    widths: [
        278, 278, 355, 556, 556, 889, 667, 191,
        333, 333, 389, 584, 278, 333, 278, 278,
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        278, 278, 584, 584, 584, 556, 1015,
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        278, 278, 278, 469, 556, 333,
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
        334, 260, 334, 584,
    ],
    high: [
        556,   0, 222, 556, 333, 1000, 556, 556,   // 0x80 Euro .. daggerdbl
        333, 1000, 667, 333, 1000,  0, 611,   0,   // 0x88 circumflex .. Zcaron
          0, 222, 222, 333, 333, 350, 556, 1000,   // 0x90 .. emdash
        333, 1000, 500, 333, 944,   0, 500, 667,   // 0x98 tilde .. Ydieresis
        278, 333, 556, 556, 556, 556, 260, 556,    // 0xA0 nbsp .. section
        333, 737, 370, 556, 584, 333, 737, 333,    // 0xA8 dieresis .. macron
        400, 584, 333, 333, 333, 556, 537, 278,    // 0xB0 degree .. periodcentered
        333, 333, 365, 556, 834, 834, 834, 611,    // 0xB8 cedilla .. questiondown
        667, 667, 667, 667, 667, 667, 1000, 722,   // 0xC0 Agrave .. Ccedilla
        667, 667, 667, 667, 278, 278, 278, 278,    // 0xC8 Egrave .. Idieresis
        722, 722, 778, 778, 778, 778, 778, 584,    // 0xD0 Eth .. multiply
        778, 722, 722, 722, 722, 667, 667, 611,    // 0xD8 Oslash .. germandbls
        556, 556, 556, 556, 556, 556, 889, 500,    // 0xE0 agrave .. ccedilla
        556, 556, 556, 556, 278, 278, 278, 278,    // 0xE8 egrave .. idieresis
        556, 556, 556, 556, 556, 556, 556, 584,    // 0xF0 eth .. divide
        611, 556, 556, 556, 556, 500, 556, 500,    // 0xF8 oslash .. ydieresis
    ],
    average: 556,
    ascender: 718,
    descender: -207,
};

#[rustfmt::skip]
static HELVETICA_BOLD: WidthTable = WidthTable {
    widths: [
        278, 333, 474, 556, 556, 889, 722, 238,
        333, 333, 389, 584, 278, 333, 278, 278,
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        333, 333, 584, 584, 584, 611, 975,
        722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        333, 278, 333, 584, 556, 333,
        556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
        611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
        389, 280, 389, 584,
    ],
    high: [
        556,   0, 278, 556, 500, 1000, 556, 556,   // 0x80 Euro .. daggerdbl
        333, 1000, 667, 333, 1000,  0, 611,   0,   // 0x88 circumflex .. Zcaron
          0, 278, 278, 500, 500, 350, 556, 1000,   // 0x90 .. emdash
        333, 1000, 556, 333, 944,   0, 500, 667,   // 0x98 tilde .. Ydieresis
        278, 333, 556, 556, 556, 556, 280, 556,    // 0xA0 nbsp .. section
        333, 737, 370, 556, 584, 333, 737, 333,    // 0xA8 dieresis .. macron
        400, 584, 333, 333, 333, 611, 556, 278,    // 0xB0 degree .. periodcentered
        333, 333, 365, 556, 834, 834, 834, 611,    // 0xB8 cedilla .. questiondown
        722, 722, 722, 722, 722, 722, 1000, 722,   // 0xC0 Agrave .. Ccedilla
        667, 667, 667, 667, 278, 278, 278, 278,    // 0xC8 Egrave .. Idieresis
        722, 722, 778, 778, 778, 778, 778, 584,    // 0xD0 Eth .. multiply
        778, 722, 722, 722, 722, 667, 667, 611,    // 0xD8 Oslash .. germandbls
        556, 556, 556, 556, 556, 556, 889, 556,    // 0xE0 agrave .. ccedilla
        556, 556, 556, 556, 278, 278, 278, 278,    // 0xE8 egrave .. idieresis
        611, 611, 611, 611, 611, 611, 611, 584,    // 0xF0 eth .. divide
        611, 611, 611, 611, 611, 556, 611, 556,    // 0xF8 oslash .. ydieresis
    ],
    average: 611,
    ascender: 718,
    descender: -207,
};

// ────────────────────────────────────────────────────────────────────────────
// Font handle
// ────────────────────────────────────────────────────────────────────────────

/// A font reference that can be measured and embedded. Cheap to clone.
#[derive(Clone)]
pub enum FontHandle {
    Builtin(Base14Font),
    Embedded(Arc<TrueTypeFont>),
}

impl FontHandle {
    pub fn name(&self) -> &str {
        match self {
            FontHandle::Builtin(f) => f.postscript_name(),
            FontHandle::Embedded(f) => f.postscript_name(),
        }
    }
}

impl fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontHandle::Builtin(b) => f.debug_tuple("Builtin").field(b).finish(),
            FontHandle::Embedded(t) => f.debug_tuple("Embedded").field(&t.postscript_name()).finish(),
        }
    }
}

impl TextMetrics for FontHandle {
    fn char_width_em(&self, c: char) -> Option<f32> {
        match self {
            FontHandle::Builtin(f) => f.char_width_em(c),
            FontHandle::Embedded(f) => f.char_width_em(c),
        }
    }

    fn missing_width_em(&self) -> f32 {
        match self {
            FontHandle::Builtin(f) => f.missing_width_em(),
            FontHandle::Embedded(f) => f.missing_width_em(),
        }
    }

    fn ascender(&self) -> f32 {
        match self {
            FontHandle::Builtin(f) => f.ascender(),
            FontHandle::Embedded(f) => f.ascender(),
        }
    }

    fn descender(&self) -> f32 {
        match self {
            FontHandle::Builtin(f) => f.descender(),
            FontHandle::Embedded(f) => f.descender(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
