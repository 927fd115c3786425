//! PDF rendering: composites certificate text onto the first page of a template.
//!
//! # Canvas contract
//! The text-fit engine talks to [`TextCanvas`] only. A text box is laid out
//! top-down in its rectangle with every line centered, clipped to the
//! rectangle, and the whole block rotated about the center of the glyph runs it
//! produced. [`TextCanvas::search_for`] reports those glyph runs in the
//! unrotated frame, so anything positioned relative to them (the underline)
//! rotates about the same pivot as the text.
//!
//! The pivot is the union of *all* line runs, not the last line's run. For
//! multi-line rotated text this places the block differently from a pivot on
//! the last line alone. `CertificatePage::insert_textbox` (the text pivot) and
//! `place_text` (the underline pivot, via the occupied rectangle) must change
//! together or the underline detaches from the text.

pub mod fonts;
pub mod page;

use thiserror::Error;

use crate::layout::{Alignment, FontHandle, Point, Rect, Rgb};

pub use page::{CertificatePage, TemplateInfo};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("This PDF has no pages")]
    NoPages,

    #[error("Malformed page: {0}")]
    MalformedPage(&'static str),
}

/// The drawing surface the text-fit engine renders onto.
pub trait TextCanvas {
    /// Draws `text` into `rect`. Lines that do not fit the rectangle's height,
    /// and lines containing characters the font cannot render, are not drawn.
    #[allow(clippy::too_many_arguments)]
    fn insert_textbox(
        &mut self,
        rect: Rect,
        text: &str,
        font: &FontHandle,
        size: f32,
        rotation: f32,
        alignment: Alignment,
        color: Rgb,
    ) -> Result<(), RenderError>;

    /// Rectangles of the drawn glyph runs spelling `text` inside `clip`, one per
    /// non-blank line, in the unrotated frame. Empty when the text was not drawn.
    fn search_for(&self, text: &str, clip: Rect) -> Vec<Rect>;

    /// Strokes a segment given in page coordinates.
    fn draw_line(&mut self, p1: Point, p2: Point, width: f32, color: Rgb)
        -> Result<(), RenderError>;
}
