//! Text-fit engine: shrink text until it fits a box, draw it, underline it.
//!
//! # Policy
//! - No wrapping or reflow. Explicit `\n` breaks are the only line breaks.
//! - Sizes step down by 1pt from the starting size; the first size that fits
//!   wins. If none fits, the minimum size is used and drawing goes ahead.
//! - The underline is positioned from the glyph runs the canvas reports, not
//!   from the nominal box, and rotates about the same pivot as the text.

use tracing::debug;

use crate::layout::font_metrics::TextMetrics;
use crate::layout::geometry::{Point, Rect};
use crate::layout::placement::{PlacementSpec, RenderResult, Underline};
use crate::render::{RenderError, TextCanvas};

const SIZE_STEP: f32 = 1.0;
const MIN_STROKE_WIDTH: f32 = 0.7;
const STROKE_WIDTH_PER_POINT: f32 = 0.05;

// ────────────────────────────────────────────────────────────────────────────
// Fit
// ────────────────────────────────────────────────────────────────────────────

/// Largest size in `[min_size, start_size]` (1pt steps from the top) at which
/// `text` fits `rect`, or `min_size` when nothing in range fits.
///
/// Single-line text only has to fit the width. Multi-line text must also fit
/// the height at `line_count * size * (ascender - descender)`.
pub fn fit_font_size<M: TextMetrics + ?Sized>(
    text: &str,
    rect: &Rect,
    font: &M,
    start_size: f32,
    min_size: f32,
) -> f32 {
    let lines: Vec<&str> = text.split('\n').collect();
    if start_size.is_nan() || start_size < min_size {
        return min_size;
    }
    // Counting steps keeps the scan finite where `size - 1.0 == size`.
    let steps = ((start_size - min_size) / SIZE_STEP).floor() as u32;
    let first = first_candidate_step(&lines, rect, font, start_size).min(steps);
    for i in first..=steps {
        let size = start_size - i as f32 * SIZE_STEP;
        if fits(&lines, rect, font, size) {
            return size;
        }
    }
    min_size
}

/// Widths and heights grow linearly with size, so no size above
/// `rect / extent-at-1pt` can fit. Returns the step just before that bound.
fn first_candidate_step<M: TextMetrics + ?Sized>(
    lines: &[&str],
    rect: &Rect,
    font: &M,
    start_size: f32,
) -> u32 {
    let widest_em = lines
        .iter()
        .map(|line| font.text_width(line, 1.0))
        .fold(0.0_f32, f32::max);
    let mut bound = if widest_em > 0.0 {
        rect.width() / widest_em
    } else {
        f32::INFINITY
    };
    if lines.len() > 1 {
        let height_em = lines.len() as f32 * font.line_height_factor();
        if height_em > 0.0 {
            bound = bound.min(rect.height() / height_em);
        }
    }
    if bound.is_nan() || bound >= start_size {
        return 0;
    }
    (((start_size - bound) / SIZE_STEP).floor() as u32).saturating_sub(1)
}

fn fits<M: TextMetrics + ?Sized>(lines: &[&str], rect: &Rect, font: &M, size: f32) -> bool {
    let widest = lines
        .iter()
        .map(|line| font.text_width(line, size))
        .fold(0.0_f32, f32::max);
    if lines.len() == 1 {
        return widest <= rect.width();
    }
    let total_height = lines.len() as f32 * size * font.line_height_factor();
    widest <= rect.width() && total_height <= rect.height()
}

// ────────────────────────────────────────────────────────────────────────────
// Render
// ────────────────────────────────────────────────────────────────────────────

/// Draws the text box and returns the glyph-run rectangles the canvas reports
/// for it (empty when the canvas could not locate the text it drew).
pub fn render_text_box<C: TextCanvas + ?Sized>(
    canvas: &mut C,
    spec: &PlacementSpec,
    text: &str,
    size: f32,
) -> Result<Vec<Rect>, RenderError> {
    canvas.insert_textbox(
        spec.rect,
        text,
        &spec.font,
        size,
        spec.rotation,
        spec.alignment,
        spec.color,
    )?;
    Ok(canvas.search_for(text, spec.rect))
}

// ────────────────────────────────────────────────────────────────────────────
// Underline
// ────────────────────────────────────────────────────────────────────────────

/// Last line of `text` with any non-whitespace content.
pub fn last_non_blank_line(text: &str) -> Option<&str> {
    text.split('\n').rev().find(|line| !line.trim().is_empty())
}

/// Underline under `last_line`, `spacing` below the occupied rectangle.
///
/// The segment is as wide as the measured line and centered on the occupied
/// rectangle. With a non-zero rotation both endpoints turn about the occupied
/// rectangle's center, the pivot the canvas rotates the text about.
pub fn compute_underline<M: TextMetrics + ?Sized>(
    occupied: &Rect,
    last_line: &str,
    font: &M,
    size: f32,
    rotation: f32,
    spacing: f32,
) -> Underline {
    let half_width = font.text_width(last_line, size) / 2.0;
    let center = occupied.center();
    let y = occupied.y1 + spacing;

    let mut p1 = Point::new(center.x - half_width, y);
    let mut p2 = Point::new(center.x + half_width, y);
    if rotation != 0.0 {
        p1 = p1.rotated_about(center, rotation);
        p2 = p2.rotated_about(center, rotation);
    }

    Underline {
        p1,
        p2,
        stroke_width: (size * STROKE_WIDTH_PER_POINT).max(MIN_STROKE_WIDTH),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Place
// ────────────────────────────────────────────────────────────────────────────

/// Fits, draws and (if requested) underlines one text field.
pub fn place_text<C: TextCanvas + ?Sized>(
    canvas: &mut C,
    spec: &PlacementSpec,
    text: &str,
) -> Result<RenderResult, RenderError> {
    let font_size = if spec.autoresize {
        fit_font_size(text, &spec.rect, &spec.font, spec.start_size, spec.min_size)
    } else {
        spec.start_size
    };

    let runs = render_text_box(canvas, spec, text, font_size)?;
    let occupied = Rect::union_all(&runs);
    debug!(
        font = spec.font.name(),
        font_size,
        runs = runs.len(),
        "Placed text box"
    );

    let mut underline = None;
    if spec.underline {
        if let Some(last_line) = last_non_blank_line(text) {
            match occupied {
                Some(occupied) => {
                    let segment = compute_underline(
                        &occupied,
                        last_line,
                        &spec.font,
                        font_size,
                        spec.rotation,
                        spec.underline_spacing,
                    );
                    canvas.draw_line(segment.p1, segment.p2, segment.stroke_width, spec.color)?;
                    debug!(
                        length = segment.p1.distance_to(segment.p2),
                        center = ?segment.p1.midpoint(segment.p2),
                        "Drew underline"
                    );
                    underline = Some(segment);
                }
                None => {
                    debug!(
                        font = spec.font.name(),
                        "Rendered text not found on page; underline skipped"
                    );
                }
            }
        }
    }

    Ok(RenderResult {
        font_size,
        runs,
        occupied,
        underline,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
