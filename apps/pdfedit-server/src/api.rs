//! JSON API handlers and the shared edit runner

use std::time::Instant;

use axum::{extract::State, Json};
use pdfedit_core::{
    EditOptions, EditOutcome, EditRequest, EditResult, PdfSubstitutionEngine, ProcessMetrics,
    ReplacementImage, SubstitutionRequest,
};
use serde::Serialize;
use tracing::info;

use crate::error::ServerError;
use crate::form::NOTHING_TO_DO;
use crate::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "pdfedit-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Run one edit on the blocking pool. The image is decoded before the
/// document is parsed.
pub async fn run_edit(
    options: EditOptions,
    pdf: Vec<u8>,
    request: SubstitutionRequest,
    image: Option<Vec<u8>>,
) -> Result<EditOutcome, ServerError> {
    tokio::task::spawn_blocking(move || {
        let image = image.as_deref().map(ReplacementImage::decode).transpose()?;
        PdfSubstitutionEngine::new(options).edit_with_report(&pdf, &request, image.as_ref())
    })
    .await
    .map_err(|e| ServerError::Internal(format!("Edit task failed: {}", e)))?
    .map_err(ServerError::from)
}

/// Handler: POST /api/edit
pub async fn handle_edit(
    State(state): State<AppState>,
    Json(req): Json<EditRequest>,
) -> Result<Json<EditResult>, ServerError> {
    let started = Instant::now();
    let pdf = req.pdf_bytes()?;
    let image = req.image_bytes()?;
    if req.substitutions.is_empty() && image.is_none() {
        return Err(ServerError::InvalidRequest(NOTHING_TO_DO.into()));
    }
    let options = EditOptions {
        compress: req.compress.unwrap_or(state.options.compress),
    };

    info!(
        "API edit request: {} bytes, {} substitutions, image: {}",
        pdf.len(),
        req.substitutions.len(),
        image.is_some()
    );

    let input_size_bytes = pdf.len();
    let outcome = run_edit(options, pdf, req.substitutions, image).await?;

    let metrics = ProcessMetrics {
        input_size_bytes,
        output_size_bytes: outcome.bytes.len(),
        page_count: outcome.report.page_count,
        replacements: outcome.report.replacements,
        images_replaced: outcome.report.images_replaced,
        skipped: outcome.report.skipped,
        processing_time_ms: started.elapsed().as_millis() as u64,
    };

    Ok(Json(EditResult::new(&outcome.bytes, metrics)))
}
