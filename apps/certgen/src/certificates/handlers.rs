use std::path::{Path, PathBuf};

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::batch::{
    generate_batch, load_records, render_certificate, BatchReport, CertificateLayout,
    CertificateRecord, LayoutRequest,
};
use crate::errors::AppError;
use crate::render::{CertificatePage, TemplateInfo};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct InspectRequest {
    pub template_path: PathBuf,
}

#[derive(Serialize)]
pub struct InspectResponse {
    pub template: TemplateInfo,
    pub suggested_layout: LayoutRequest,
}

#[derive(Deserialize)]
pub struct ParseRecordsRequest {
    pub csv_path: PathBuf,
    /// Overrides the configured number of header rows.
    pub header_rows: Option<usize>,
}

#[derive(Serialize)]
pub struct ParseRecordsResponse {
    pub count: usize,
    pub records: Vec<CertificateRecord>,
}

/// Either `name` (with an optional `achievement`) or `csv_path` must be given;
/// with only a CSV the first record is previewed.
#[derive(Deserialize)]
pub struct PreviewRequest {
    pub template_path: PathBuf,
    pub name: Option<String>,
    pub achievement: Option<String>,
    pub csv_path: Option<PathBuf>,
    pub header_rows: Option<usize>,
    /// Falls back to the suggested layout for the template.
    pub layout: Option<LayoutRequest>,
}

#[derive(Deserialize)]
pub struct BatchRequest {
    pub template_path: PathBuf,
    pub csv_path: PathBuf,
    pub output_dir: PathBuf,
    pub header_rows: Option<usize>,
    pub layout: Option<LayoutRequest>,
}

/// POST /api/v1/templates/inspect
pub async fn handle_inspect(
    Json(req): Json<InspectRequest>,
) -> Result<Json<InspectResponse>, AppError> {
    let template = read_input(&req.template_path, "Template").await?;
    let info = blocking(move || Ok(CertificatePage::from_bytes(&template)?.info())).await?;
    Ok(Json(InspectResponse {
        template: info,
        suggested_layout: LayoutRequest::suggested(&info),
    }))
}

/// POST /api/v1/records/parse
pub async fn handle_parse_records(
    State(state): State<AppState>,
    Json(req): Json<ParseRecordsRequest>,
) -> Result<Json<ParseRecordsResponse>, AppError> {
    let records = read_records(&state, &req.csv_path, req.header_rows).await?;
    Ok(Json(ParseRecordsResponse {
        count: records.len(),
        records,
    }))
}

/// POST /api/v1/certificates/preview
///
/// Returns the rendered certificate as `application/pdf`, with the nominal
/// achievement box outlined in red.
pub async fn handle_preview(
    State(state): State<AppState>,
    Json(req): Json<PreviewRequest>,
) -> Result<Response, AppError> {
    let template = read_input(&req.template_path, "Template").await?;
    let record = match (req.name, &req.csv_path) {
        (Some(name), _) => CertificateRecord::new(name, req.achievement.unwrap_or_default()),
        (None, Some(csv_path)) => read_records(&state, csv_path, req.header_rows)
            .await?
            .swap_remove(0),
        (None, None) => {
            return Err(AppError::Validation(
                "Preview needs a name or a csv_path".to_string(),
            ))
        }
    };

    let pdf = blocking(move || {
        let info = CertificatePage::from_bytes(&template)?.info();
        let layout = resolve_layout(req.layout, &info, &state)?;
        let (page, _) = render_certificate(&template, &layout, &record, true)?;
        Ok(page.to_bytes()?)
    })
    .await?;

    Ok(([(header::CONTENT_TYPE, "application/pdf")], Bytes::from(pdf)).into_response())
}

/// POST /api/v1/certificates/batch
pub async fn handle_batch(
    State(state): State<AppState>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<BatchReport>, AppError> {
    let template = read_input(&req.template_path, "Template").await?;
    let records = read_records(&state, &req.csv_path, req.header_rows).await?;
    tokio::fs::create_dir_all(&req.output_dir)
        .await
        .map_err(|e| {
            AppError::Validation(format!(
                "Cannot use output folder {}: {e}",
                req.output_dir.display()
            ))
        })?;

    let output_dir = req.output_dir;
    let report = blocking(move || {
        let info = CertificatePage::from_bytes(&template)?.info();
        let layout = resolve_layout(req.layout, &info, &state)?;
        Ok(generate_batch(&template, &layout, &records, &output_dir))
    })
    .await?;

    info!(
        batch_id = %report.batch_id,
        succeeded = report.succeeded,
        total = report.total,
        "Batch request complete"
    );
    Ok(Json(report))
}

fn resolve_layout(
    request: Option<LayoutRequest>,
    info: &TemplateInfo,
    state: &AppState,
) -> Result<CertificateLayout, AppError> {
    let request = request.unwrap_or_else(|| LayoutRequest::suggested(info));
    Ok(CertificateLayout::resolve(
        &request,
        info,
        &state.fonts,
        &state.defaults,
    )?)
}

async fn read_input(path: &Path, what: &str) -> Result<Vec<u8>, AppError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound(format!(
            "{what} {} not found",
            path.display()
        ))),
        Err(e) => Err(AppError::Validation(format!(
            "Cannot read {} {}: {e}",
            what.to_lowercase(),
            path.display()
        ))),
    }
}

async fn read_records(
    state: &AppState,
    path: &Path,
    header_rows: Option<usize>,
) -> Result<Vec<CertificateRecord>, AppError> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(AppError::NotFound(format!("CSV {} not found", path.display())));
    }
    let path = path.to_path_buf();
    let header_rows = header_rows.unwrap_or(state.config.csv_header_rows);
    let records = blocking(move || Ok(load_records(&path, header_rows)?)).await?;
    if records.is_empty() {
        return Err(AppError::Validation("No valid data found in CSV".to_string()));
    }
    Ok(records)
}

/// Runs PDF and CSV work off the async executor.
async fn blocking<T, F>(work: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed: {e}")))?
}
