//! Placement values handed to the text-fit engine, and what it reports back.

use serde::{Deserialize, Serialize};

use crate::layout::font_metrics::FontHandle;
use crate::layout::geometry::{Point, Rect};

/// Horizontal alignment of each line within the box. Certificates only
/// center their text; the underline geometry depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Center,
}

/// RGB color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    pub const WHITE: Rgb = Rgb(1.0, 1.0, 1.0);
    pub const RED: Rgb = Rgb(1.0, 0.0, 0.0);

    pub fn clamped(self) -> Rgb {
        Rgb(
            self.0.clamp(0.0, 1.0),
            self.1.clamp(0.0, 1.0),
            self.2.clamp(0.0, 1.0),
        )
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Rgb::WHITE
    }
}

/// Everything needed to place one text field. Immutable per render call.
#[derive(Debug, Clone)]
pub struct PlacementSpec {
    pub rect: Rect,
    pub font: FontHandle,
    pub start_size: f32,
    pub min_size: f32,
    /// Degrees; positive turns clockwise on the page.
    pub rotation: f32,
    pub alignment: Alignment,
    pub underline: bool,
    /// Gap between the bottom of the occupied rectangle and the underline.
    pub underline_spacing: f32,
    /// When false, `start_size` is used without fitting.
    pub autoresize: bool,
    pub color: Rgb,
}

/// Underline segment in page coordinates, already rotated with the text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Underline {
    pub p1: Point,
    pub p2: Point,
    pub stroke_width: f32,
}

/// Outcome of placing one text field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderResult {
    pub font_size: f32,
    /// Glyph-run rectangles reported by the canvas, unrotated frame.
    pub runs: Vec<Rect>,
    /// Union of `runs`; `None` when the canvas could not locate the text.
    pub occupied: Option<Rect>,
    pub underline: Option<Underline>,
}
