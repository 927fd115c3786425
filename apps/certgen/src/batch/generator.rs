//! Batch generation: one certificate per record, written to an output folder.
//!
//! Rows are rendered strictly in order. A row that fails (unreadable template
//! bytes, unwritable path) is logged and recorded in the report; the batch
//! carries on with the remaining rows.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::batch::layout::CertificateLayout;
use crate::batch::naming::certificate_path;
use crate::batch::records::CertificateRecord;
use crate::layout::{place_text, RenderResult, Rgb};
use crate::render::{CertificatePage, RenderError};

const PREVIEW_OUTLINE_WIDTH: f32 = 1.5;

/// How a single certificate came out.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedCertificate {
    pub name: RenderResult,
    pub achievement: RenderResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowFailure {
    /// 1-based position in the parsed record list.
    pub row: usize,
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub succeeded: usize,
    pub outputs: Vec<PathBuf>,
    pub failures: Vec<RowFailure>,
}

/// Draws one record onto a fresh copy of the template's first page.
///
/// With `outline_achievement_box` set the nominal achievement box is stroked
/// in red, as the interactive preview shows it.
pub fn render_certificate(
    template: &[u8],
    layout: &CertificateLayout,
    record: &CertificateRecord,
    outline_achievement_box: bool,
) -> Result<(CertificatePage, RenderedCertificate), RenderError> {
    let mut page = CertificatePage::from_bytes(template)?;

    let name = place_text(&mut page, &layout.name, &record.name)?;
    if outline_achievement_box {
        page.draw_rect(layout.achievement.rect, PREVIEW_OUTLINE_WIDTH, Rgb::RED);
    }
    let achievement = place_text(&mut page, &layout.achievement, &record.achievement)?;

    Ok((page, RenderedCertificate { name, achievement }))
}

/// Renders and saves one certificate, returning where it was written.
pub fn write_certificate(
    template: &[u8],
    layout: &CertificateLayout,
    record: &CertificateRecord,
    output_dir: &Path,
) -> Result<PathBuf, RenderError> {
    let (page, _) = render_certificate(template, layout, record, false)?;
    let path = certificate_path(output_dir, &record.name);
    page.save(&path)?;
    Ok(path)
}

/// Generates every record, continuing past per-row failures.
pub fn generate_batch(
    template: &[u8],
    layout: &CertificateLayout,
    records: &[CertificateRecord],
    output_dir: &Path,
) -> BatchReport {
    let batch_id = Uuid::new_v4();
    let started_at = Utc::now();
    info!(%batch_id, rows = records.len(), output_dir = %output_dir.display(), "Starting certificate batch");

    let mut outputs = Vec::new();
    let mut failures = Vec::new();
    for (i, record) in records.iter().enumerate() {
        match write_certificate(template, layout, record, output_dir) {
            Ok(path) => outputs.push(path),
            Err(e) => {
                warn!(%batch_id, row = i + 1, name = %record.name, error = %e, "Certificate failed; continuing");
                failures.push(RowFailure {
                    row: i + 1,
                    name: record.name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    let succeeded = outputs.len();
    info!(%batch_id, succeeded, failed = failures.len(), "Certificate batch finished");
    BatchReport {
        batch_id,
        started_at,
        total: records.len(),
        succeeded,
        outputs,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::layout::{FontSet, LayoutRequest, RenderDefaults};
    use crate::render::page::tests::blank_template;
    use lopdf::Document;

    fn layout_for(template: &[u8]) -> CertificateLayout {
        let info = CertificatePage::from_bytes(template).unwrap().info();
        CertificateLayout::resolve(
            &LayoutRequest::suggested(&info),
            &info,
            &FontSet::default(),
            &RenderDefaults::default(),
        )
        .unwrap()
    }

    fn records(names: &[&str]) -> Vec<CertificateRecord> {
        names
            .iter()
            .map(|n| CertificateRecord::new(*n, "Outstanding contribution"))
            .collect()
    }

    #[test]
    fn test_batch_writes_one_file_per_record() {
        let template = blank_template(842, 595);
        let layout = layout_for(&template);
        let dir = tempfile::tempdir().unwrap();

        let report = generate_batch(&template, &layout, &records(&["Alice", "A/B:C"]), dir.path());
        assert_eq!(report.total, 2);
        assert_eq!(report.succeeded, 2);
        assert!(report.failures.is_empty());
        assert!(dir.path().join("Certificate - Alice.pdf").is_file());
        assert!(dir.path().join("Certificate - A_B_C.pdf").is_file());

        let doc = Document::load(dir.path().join("Certificate - Alice.pdf")).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_batch_continues_past_a_failing_row() {
        let template = blank_template(842, 595);
        let layout = layout_for(&template);
        let dir = tempfile::tempdir().unwrap();
        // A directory squatting on row 3's output path makes that save fail.
        std::fs::create_dir(dir.path().join("Certificate - Carol.pdf")).unwrap();

        let names = ["Alice", "Bob", "Carol", "Dave", "Erin"];
        let report = generate_batch(&template, &layout, &records(&names), dir.path());

        assert_eq!(report.total, 5);
        assert_eq!(report.succeeded, 4);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].row, 3);
        assert_eq!(report.failures[0].name, "Carol");
        for name in ["Alice", "Bob", "Dave", "Erin"] {
            assert!(dir.path().join(format!("Certificate - {name}.pdf")).is_file(), "{name}");
        }
    }

    #[test]
    fn test_duplicate_names_overwrite_silently() {
        let template = blank_template(842, 595);
        let layout = layout_for(&template);
        let dir = tempfile::tempdir().unwrap();

        let report = generate_batch(&template, &layout, &records(&["A/B", "A:B"]), dir.path());
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.outputs[0], report.outputs[1]);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_render_is_deterministic_for_identical_input() {
        let template = blank_template(842, 595);
        let layout = layout_for(&template);
        let record = CertificateRecord::new("Alice", "Won gold\nand silver");

        let (_, first) = render_certificate(&template, &layout, &record, false).unwrap();
        let (_, second) = render_certificate(&template, &layout, &record, false).unwrap();
        assert_eq!(first.achievement, second.achievement);
        assert_eq!(first.name, second.name);
        assert!(first.achievement.underline.is_some());
        assert!(first.name.underline.is_none());
    }

    #[test]
    fn test_unreadable_template_fails_every_row() {
        let dir = tempfile::tempdir().unwrap();
        let template = blank_template(842, 595);
        let layout = layout_for(&template);
        let report = generate_batch(b"not a pdf", &layout, &records(&["Alice", "Bob"]), dir.path());
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failures.len(), 2);
    }
}
