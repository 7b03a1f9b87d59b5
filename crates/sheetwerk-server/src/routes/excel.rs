// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// POST /excel/topdf: render an uploaded workbook to a PDF.

use axum::Json;
use axum::extract::{Multipart, State};
use serde::Serialize;
use sheetwerk_core::DocumentType;
use sheetwerk_document::{SheetSummary, WorkbookConverter};
use tracing::{info, instrument};

use super::upload::Upload;
use crate::error::ApiError;
use crate::services::ArtifactKind;
use crate::state::AppState;

const RESULT_FILE: &str = "result.pdf";

#[derive(Debug, Serialize)]
pub struct ConversionResponse {
    pub id: String,
    pub url: String,
    pub pages: usize,
    pub sheets: Vec<SheetSummary>,
}

#[instrument(skip_all)]
pub async fn excel_to_pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ConversionResponse>, ApiError> {
    let upload = Upload::read(multipart).await?;
    let workbook = upload.single_file(DocumentType::Xlsx)?;

    // The whole pipeline is CPU-bound; keep it off the async workers.
    let response = tokio::task::spawn_blocking(move || {
        let artifacts = state.store.begin(ArtifactKind::ExcelToPdf)?;
        let output = WorkbookConverter::new(&state.config.render, &state.fonts).convert(&workbook)?;
        let url = artifacts.write(RESULT_FILE, &output.pdf)?;
        let pages = output.page_count();
        let id = artifacts.commit();
        Ok::<_, ApiError>(ConversionResponse {
            id: id.to_string(),
            url,
            pages,
            sheets: output.sheets,
        })
    })
    .await??;

    info!(id = %response.id, pages = response.pages, "Workbook converted");
    Ok(Json(response))
}
