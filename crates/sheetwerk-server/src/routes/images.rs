// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// POST /img2pdf: one PDF page per uploaded PNG or JPEG, in upload order.

use axum::Json;
use axum::extract::{Multipart, State};
use sheetwerk_document::images_to_pdf;
use tracing::instrument;

use super::pdf::{DocumentResponse, store_result};
use super::upload::Upload;
use crate::error::ApiError;
use crate::services::ArtifactKind;
use crate::state::AppState;

#[instrument(skip_all)]
pub async fn image_to_pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<DocumentResponse>, ApiError> {
    let upload = Upload::read(multipart).await?;
    let files = upload.all_images()?.to_vec();
    let response = store_result(state, ArtifactKind::ImageToPdf, move || {
        let images: Vec<&[u8]> = files.iter().map(|f| f.as_ref()).collect();
        images_to_pdf(&images)
    })
    .await?;
    Ok(Json(response))
}
