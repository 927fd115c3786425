//! `CertificatePage`: the first page of a template, open for compositing.
//!
//! Generated operators are buffered and appended as one content stream when
//! the page is saved. The template's own streams are wrapped in `q`/`Q` so
//! whatever graphics state they leave behind cannot leak into ours.

use std::collections::HashMap;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use serde::Serialize;
use tracing::{debug, warn};

use crate::layout::encoding;
use crate::layout::{Alignment, FontHandle, Point, Rect, Rgb, TextMetrics};
use crate::render::fonts::add_font_object;
use crate::render::{RenderError, TextCanvas};

/// Used when neither the page nor its ancestors carry a MediaBox (A4).
const FALLBACK_PAGE_SIZE: (f32, f32) = (595.0, 842.0);

/// Slack for float drift when deciding whether a line starts inside the box.
const LAYOUT_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemplateInfo {
    pub page_count: usize,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone)]
struct GlyphRun {
    text: String,
    rect: Rect,
}

pub struct CertificatePage {
    doc: Document,
    page_id: ObjectId,
    page_count: usize,
    /// MediaBox as `(llx, lly, urx, ury)` in PDF user space.
    media_box: (f32, f32, f32, f32),
    /// PostScript name → resource name on this page.
    font_resources: HashMap<String, String>,
    operations: Vec<Operation>,
    runs: Vec<GlyphRun>,
}

impl CertificatePage {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RenderError> {
        Self::from_document(Document::load_mem(bytes)?)
    }

    pub fn from_document(doc: Document) -> Result<Self, RenderError> {
        let pages = doc.get_pages();
        let page_count = pages.len();
        let page_id = *pages.values().next().ok_or(RenderError::NoPages)?;
        let media_box = page_media_box(&doc, page_id).unwrap_or((
            0.0,
            0.0,
            FALLBACK_PAGE_SIZE.0,
            FALLBACK_PAGE_SIZE.1,
        ));

        Ok(Self {
            doc,
            page_id,
            page_count,
            media_box,
            font_resources: HashMap::new(),
            operations: Vec::new(),
            runs: Vec::new(),
        })
    }

    pub fn info(&self) -> TemplateInfo {
        TemplateInfo {
            page_count: self.page_count,
            width: self.width(),
            height: self.height(),
        }
    }

    pub fn width(&self) -> f32 {
        self.media_box.2 - self.media_box.0
    }

    pub fn height(&self) -> f32 {
        self.media_box.3 - self.media_box.1
    }

    /// Outlines `rect` (used to show the achievement box on previews).
    pub fn draw_rect(&mut self, rect: Rect, width: f32, color: Rgb) {
        let (x, y) = self.to_pdf(Point::new(rect.x0, rect.y1));
        let Rgb(r, g, b) = color.clamped();
        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new("w", vec![real(width)]),
            Operation::new("RG", vec![real(r), real(g), real(b)]),
            Operation::new(
                "re",
                vec![real(x), real(y), real(rect.width()), real(rect.height())],
            ),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }

    /// Compresses streams, drops unreferenced objects and writes the file.
    pub fn save(self, path: impl AsRef<Path>) -> Result<(), RenderError> {
        let mut doc = self.finish()?;
        doc.prune_objects();
        doc.compress();
        doc.save(path.as_ref())?;
        Ok(())
    }

    pub fn to_bytes(self) -> Result<Vec<u8>, RenderError> {
        let mut doc = self.finish()?;
        doc.prune_objects();
        doc.compress();
        let mut buf = Vec::new();
        doc.save_to(&mut buf)?;
        Ok(buf)
    }

    fn finish(mut self) -> Result<Document, RenderError> {
        if self.operations.is_empty() {
            return Ok(self.doc);
        }

        let mut operations = vec![Operation::new("Q", vec![])];
        operations.append(&mut self.operations);
        let content = Content { operations }.encode()?;

        let existing = self
            .doc
            .get_dictionary(self.page_id)?
            .get(b"Contents")
            .ok()
            .cloned();
        let mut contents = match existing {
            Some(Object::Reference(id)) => match self.doc.get_object(id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(id)],
            },
            Some(Object::Array(items)) => items,
            _ => Vec::new(),
        };

        let save_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, content));
        contents.insert(0, save_id.into());
        contents.push(content_id.into());

        self.doc
            .get_object_mut(self.page_id)
            .and_then(|o| o.as_dict_mut())?
            .set("Contents", contents);
        Ok(self.doc)
    }

    /// Layout space (top-left origin) → PDF user space.
    fn to_pdf(&self, p: Point) -> (f32, f32) {
        (self.media_box.0 + p.x, self.media_box.3 - p.y)
    }

    fn ensure_font(&mut self, font: &FontHandle) -> Result<String, RenderError> {
        if let Some(name) = self.font_resources.get(font.name()) {
            return Ok(name.clone());
        }
        let font_id = add_font_object(&mut self.doc, font);

        let mut resources = self.inherited_resources();
        let mut fonts = resources
            .get(b"Font")
            .ok()
            .and_then(|o| resolve_dict(&self.doc, o))
            .unwrap_or_else(Dictionary::new);

        let mut index = fonts.len();
        let mut name = format!("CG{index}");
        while fonts.has(name.as_bytes()) {
            index += 1;
            name = format!("CG{index}");
        }
        fonts.set(name.clone(), font_id);
        resources.set("Font", fonts);

        self.doc
            .get_object_mut(self.page_id)
            .and_then(|o| o.as_dict_mut())
            .map_err(|_| RenderError::MalformedPage("page is not a dictionary"))?
            .set("Resources", resources);

        debug!(font = font.name(), resource = %name, "Registered font resource");
        self.font_resources.insert(font.name().to_string(), name.clone());
        Ok(name)
    }

    /// The page's resource dictionary (own or inherited), as an owned copy.
    fn inherited_resources(&self) -> Dictionary {
        let mut current = Some(self.page_id);
        while let Some(id) = current {
            let Ok(dict) = self.doc.get_dictionary(id) else {
                break;
            };
            if let Some(res) = dict
                .get(b"Resources")
                .ok()
                .and_then(|o| resolve_dict(&self.doc, o))
            {
                return res;
            }
            current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        }
        Dictionary::new()
    }
}

impl TextCanvas for CertificatePage {
    fn insert_textbox(
        &mut self,
        rect: Rect,
        text: &str,
        font: &FontHandle,
        size: f32,
        rotation: f32,
        _alignment: Alignment,
        color: Rgb,
    ) -> Result<(), RenderError> {
        let line_height = size * font.line_height_factor();
        let ascent = size * font.ascender();

        let mut runs = Vec::new();
        let mut shows = Vec::new();
        for (i, line) in text.split('\n').enumerate() {
            let top = rect.y0 + i as f32 * line_height;
            if top >= rect.y1 - LAYOUT_EPSILON {
                debug!(line_index = i, "Text box overflow; remaining lines clipped");
                break;
            }
            if line.trim().is_empty() {
                continue;
            }
            let Some(bytes) = encoding::encode_str(line).filter(|_| font.can_render(line)) else {
                warn!(font = font.name(), line, "Font cannot render line; skipped");
                continue;
            };

            let width = font.text_width(line, size);
            let x = rect.x0 + (rect.width() - width) / 2.0;
            if let Some(visible) = Rect::new(x, top, x + width, top + line_height).intersect(&rect) {
                runs.push(GlyphRun {
                    text: line.to_string(),
                    rect: visible,
                });
            }
            shows.push((Point::new(x, top + ascent), bytes));
        }

        if shows.is_empty() {
            return Ok(());
        }

        let rects: Vec<Rect> = runs.iter().map(|r| r.rect).collect();
        let pivot = Rect::union_all(&rects).unwrap_or(rect).center();
        let resource = self.ensure_font(font)?;
        let Rgb(r, g, b) = color.clamped();

        self.operations.push(Operation::new("q", vec![]));
        if rotation != 0.0 {
            let (px, py) = self.to_pdf(pivot);
            let m = rotation_matrix(px, py, rotation);
            self.operations
                .push(Operation::new("cm", m.iter().copied().map(real).collect()));
        }
        let (cx, cy) = self.to_pdf(Point::new(rect.x0, rect.y1));
        self.operations.extend([
            Operation::new(
                "re",
                vec![real(cx), real(cy), real(rect.width()), real(rect.height())],
            ),
            Operation::new("W", vec![]),
            Operation::new("n", vec![]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(resource.into_bytes()), real(size)]),
            Operation::new("rg", vec![real(r), real(g), real(b)]),
        ]);
        for (origin, bytes) in shows {
            let (x, y) = self.to_pdf(origin);
            self.operations.extend([
                Operation::new(
                    "Tm",
                    vec![real(1.0), real(0.0), real(0.0), real(1.0), real(x), real(y)],
                ),
                Operation::new("Tj", vec![Object::string_literal(bytes)]),
            ]);
        }
        self.operations.extend([
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ]);

        self.runs.extend(runs);
        Ok(())
    }

    fn search_for(&self, text: &str, clip: Rect) -> Vec<Rect> {
        let needle: Vec<&str> = text
            .split('\n')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        if needle.is_empty() {
            return Vec::new();
        }

        let candidates: Vec<&GlyphRun> = self
            .runs
            .iter()
            .filter(|r| r.rect.intersect(&clip).is_some())
            .collect();

        candidates
            .windows(needle.len())
            .rev()
            .find(|window| {
                window
                    .iter()
                    .zip(&needle)
                    .all(|(run, line)| run.text.trim() == *line)
            })
            .map(|window| window.iter().map(|run| run.rect).collect())
            .unwrap_or_default()
    }

    fn draw_line(
        &mut self,
        p1: Point,
        p2: Point,
        width: f32,
        color: Rgb,
    ) -> Result<(), RenderError> {
        let (x1, y1) = self.to_pdf(p1);
        let (x2, y2) = self.to_pdf(p2);
        let Rgb(r, g, b) = color.clamped();
        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new("w", vec![real(width)]),
            Operation::new("RG", vec![real(r), real(g), real(b)]),
            Operation::new("m", vec![real(x1), real(y1)]),
            Operation::new("l", vec![real(x2), real(y2)]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ]);
        Ok(())
    }
}

/// `cm` operands rotating PDF user space about `(px, py)`.
///
/// PDF space is the layout frame mirrored in y, so the layout rotation
/// `(x, y) → (x·cos − y·sin, x·sin + y·cos)` becomes `[cos −sin sin cos]` here.
fn rotation_matrix(px: f32, py: f32, degrees: f32) -> [f32; 6] {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let (a, b, c, d) = (cos, -sin, sin, cos);
    [a, b, c, d, px - (a * px + c * py), py - (b * px + d * py)]
}

fn real(v: f32) -> Object {
    Object::Real(v)
}

fn resolve_dict(doc: &Document, obj: &Object) -> Option<Dictionary> {
    match obj {
        Object::Dictionary(d) => Some(d.clone()),
        Object::Reference(id) => doc.get_dictionary(*id).ok().cloned(),
        _ => None,
    }
}

fn page_media_box(doc: &Document, page_id: ObjectId) -> Option<(f32, f32, f32, f32)> {
    let mut current = Some(page_id);
    while let Some(id) = current {
        let dict = doc.get_dictionary(id).ok()?;
        if let Some(media) = dict.get(b"MediaBox").ok().and_then(|raw| {
            let resolved = match raw {
                Object::Reference(id) => doc.get_object(*id).ok()?,
                other => other,
            };
            parse_box(resolved.as_array().ok()?)
        }) {
            return Some(media);
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

fn parse_box(arr: &[Object]) -> Option<(f32, f32, f32, f32)> {
    if arr.len() != 4 {
        return None;
    }
    let v: Vec<f32> = arr.iter().map(obj_to_f32).collect::<Option<_>>()?;
    Some((v[0].min(v[2]), v[1].min(v[3]), v[0].max(v[2]), v[1].max(v[3])))
}

fn obj_to_f32(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(f) => Some(*f),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::layout::font_metrics::Base14Font;

    /// One blank page of the given size, with its own content stream.
    pub(crate) fn blank_template(width: i64, height: i64) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(dictionary! {}, b"0 0 1 rg".to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(width),
                    Object::Integer(height),
                ],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    fn helvetica() -> FontHandle {
        FontHandle::Builtin(Base14Font::Helvetica)
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_inherited_media_box_gives_page_size() {
        let page = CertificatePage::from_bytes(&blank_template(842, 595)).unwrap();
        let info = page.info();
        assert_eq!(info.page_count, 1);
        assert_eq!(info.width, 842.0);
        assert_eq!(info.height, 595.0);
    }

    #[test]
    fn test_document_without_pages_is_rejected() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        });
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        assert!(matches!(
            CertificatePage::from_document(doc),
            Err(RenderError::NoPages)
        ));
    }

    #[test]
    fn test_lines_are_centered_and_searchable() {
        let mut page = CertificatePage::from_bytes(&blank_template(600, 400)).unwrap();
        let rect = Rect::new(100.0, 100.0, 500.0, 300.0);
        let font = helvetica();
        page.insert_textbox(rect, "Won gold\nand silver", &font, 20.0, 0.0, Alignment::Center, Rgb::RED)
            .unwrap();

        let runs = page.search_for("Won gold\nand silver", rect);
        assert_eq!(runs.len(), 2);
        for (run, line) in runs.iter().zip(["Won gold", "and silver"]) {
            assert!(approx(run.center().x, rect.center().x));
            assert!(approx(run.width(), font.text_width(line, 20.0)));
        }
        // Second line sits one line height below the first.
        assert!(approx(runs[1].y0 - runs[0].y0, 20.0 * font.line_height_factor()));
        assert!(approx(runs[0].y0, rect.y0));
    }

    #[test]
    fn test_search_respects_clip_and_missing_text() {
        let mut page = CertificatePage::from_bytes(&blank_template(600, 400)).unwrap();
        let rect = Rect::new(0.0, 0.0, 300.0, 100.0);
        page.insert_textbox(rect, "Alice", &helvetica(), 24.0, 0.0, Alignment::Center, Rgb::RED)
            .unwrap();
        assert_eq!(page.search_for("Alice", rect).len(), 1);
        assert!(page.search_for("Alice", Rect::new(0.0, 200.0, 300.0, 300.0)).is_empty());
        assert!(page.search_for("Bob", rect).is_empty());
        assert!(page.search_for("  \n ", rect).is_empty());
    }

    #[test]
    fn test_unrenderable_text_is_not_found() {
        let mut page = CertificatePage::from_bytes(&blank_template(600, 400)).unwrap();
        let rect = Rect::new(0.0, 0.0, 300.0, 100.0);
        page.insert_textbox(rect, "漢字", &helvetica(), 24.0, 0.0, Alignment::Center, Rgb::RED)
            .unwrap();
        assert!(page.search_for("漢字", rect).is_empty());
    }

    #[test]
    fn test_lines_below_the_box_are_dropped() {
        let mut page = CertificatePage::from_bytes(&blank_template(600, 400)).unwrap();
        // The second 20pt line would start below the box.
        let rect = Rect::new(0.0, 0.0, 300.0, 15.0);
        page.insert_textbox(rect, "one\ntwo", &helvetica(), 20.0, 0.0, Alignment::Center, Rgb::RED)
            .unwrap();
        assert_eq!(page.search_for("one", rect).len(), 1);
        assert!(page.search_for("one\ntwo", rect).is_empty());
    }

    #[test]
    fn test_rotation_matrix_matches_layout_rotation() {
        let page = CertificatePage::from_bytes(&blank_template(600, 800)).unwrap();
        let pivot = Point::new(250.0, 310.0);
        let p = Point::new(320.0, 330.0);
        for deg in [-45.0, 15.0, 90.0] {
            let (px, py) = page.to_pdf(pivot);
            let [a, b, c, d, e, f] = rotation_matrix(px, py, deg);
            let (x, y) = page.to_pdf(p);
            let via_cm = (a * x + c * y + e, b * x + d * y + f);
            let expected = page.to_pdf(p.rotated_about(pivot, deg));
            assert!(approx(via_cm.0, expected.0), "x at {deg}");
            assert!(approx(via_cm.1, expected.1), "y at {deg}");
        }
    }

    #[test]
    fn test_rotation_pivot_is_union_of_all_line_runs() {
        let mut page = CertificatePage::from_bytes(&blank_template(600, 400)).unwrap();
        let rect = Rect::new(100.0, 100.0, 500.0, 300.0);
        let text = "Winner of the regional finals\nGold";
        page.insert_textbox(rect, text, &helvetica(), 20.0, 30.0, Alignment::Center, Rgb::RED)
            .unwrap();

        let runs = page.search_for(text, rect);
        let union_center = Rect::union_all(&runs).unwrap().center();
        let last_center = runs[1].center();
        assert!(!approx(union_center.y, last_center.y));

        let cm = page.operations.iter().find(|op| op.operator == "cm").unwrap();
        let m: Vec<f32> = cm.operands.iter().map(|o| obj_to_f32(o).unwrap()).collect();
        let (px, py) = page.to_pdf(union_center);
        // The pivot is the matrix's fixed point.
        assert!((m[0] * px + m[2] * py + m[4] - px).abs() < 1e-2);
        assert!((m[1] * px + m[3] * py + m[5] - py).abs() < 1e-2);
    }

    #[test]
    fn test_save_wraps_template_content_and_registers_font() {
        let mut page = CertificatePage::from_bytes(&blank_template(600, 400)).unwrap();
        let rect = Rect::new(0.0, 0.0, 300.0, 100.0);
        page.insert_textbox(rect, "Alice", &helvetica(), 24.0, 10.0, Alignment::Center, Rgb::WHITE)
            .unwrap();
        page.draw_line(Point::new(0.0, 50.0), Point::new(10.0, 50.0), 1.2, Rgb::WHITE)
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.pdf");
        page.save(&out).unwrap();

        let doc = Document::load(&out).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        let dict = doc.get_dictionary(page_id).unwrap();
        let contents = dict.get(b"Contents").unwrap().as_array().unwrap();
        assert_eq!(contents.len(), 3, "q stream, template stream, generated stream");

        let resources = dict.get(b"Resources").unwrap().as_dict().unwrap();
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
        assert!(fonts.has(b"CG0"));

        let text = String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).to_string();
        assert!(text.contains("(Alice) Tj"), "content: {text}");
        assert!(text.contains(" cm"));
    }
}
