//! Axum route handlers for the Fit API.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde::Deserialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::layout::budget::DocumentKind;
use crate::layout::limits::{validate_limits, ValidationResult};
use crate::layout::orchestrator::{FitOrchestrator, FitSuccess};
use crate::models::ContentModel;
use crate::state::AppState;

pub const PAGES_HEADER: &str = "x-fit-pages";
pub const SHRINK_LEVEL_HEADER: &str = "x-fit-shrink-level";
pub const SHRINK_CHANGES_HEADER: &str = "x-fit-shrink-changes";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct DocumentQuery {
    #[serde(default)]
    pub document: DocumentKind,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/fit/validate
///
/// Dry run: budgets and the height estimate only, no rendering.
pub async fn handle_validate(
    State(state): State<AppState>,
    Query(query): Query<DocumentQuery>,
    Json(content): Json<ContentModel>,
) -> Result<Json<ValidationResult>, AppError> {
    let result = validate_limits(&content, state.fit_config(query.document));
    info!(
        document = ?query.document,
        valid = result.is_valid,
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        estimated_pages = result.estimated_pages,
        "Validated content"
    );
    Ok(Json(result))
}

/// POST /api/v1/fit/render
///
/// Runs the full fit loop and returns the PDF, or 422 with the failure payload.
pub async fn handle_render(
    State(state): State<AppState>,
    Query(query): Query<DocumentQuery>,
    Json(content): Json<ContentModel>,
) -> Result<Response, AppError> {
    let request_id = Uuid::new_v4();
    let orchestrator = FitOrchestrator::new(
        state.fit_config(query.document).clone(),
        state.oracle.clone(),
    );

    let span = info_span!("fit", %request_id, document = ?query.document);
    let success = orchestrator.run(content).instrument(span).await?;
    info!(
        %request_id,
        pages = success.metadata.pages,
        steps = success.metadata.steps,
        bullets = success.content.total_bullets(),
        "Rendered fitted document"
    );

    pdf_response(success, request_id)
}

fn pdf_response(success: FitSuccess, request_id: Uuid) -> Result<Response, AppError> {
    let metadata = &success.metadata;
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(PAGES_HEADER, metadata.pages.to_string())
        .header(SHRINK_LEVEL_HEADER, metadata.shrink_level.to_string())
        .header(SHRINK_CHANGES_HEADER, metadata.shrink_changes.join(","))
        .header(REQUEST_ID_HEADER, request_id.to_string())
        .body(Body::from(success.document))
        .map_err(|e| AppError::Internal(anyhow::Error::new(e)))
}
