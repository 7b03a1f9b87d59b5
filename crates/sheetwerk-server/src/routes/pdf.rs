// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF page utilities: merge, split, rotate and reorder.
//
// Each route takes its documents and options in one multipart body, writes
// the results under a fresh request directory and answers with their URLs.

use axum::Json;
use axum::extract::{Multipart, State};
use serde::Serialize;
use sheetwerk_core::DocumentType;
use sheetwerk_core::error::SheetwerkError;
use sheetwerk_document::PdfReader;
use tracing::{info, instrument};

use super::upload::{Upload, parse_page_list};
use crate::error::ApiError;
use crate::services::ArtifactKind;
use crate::state::AppState;

const RESULT_FILE: &str = "result.pdf";

/// Rotation applied when the request names no angle.
const DEFAULT_ANGLE: i32 = 90;

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: String,
    pub url: String,
    pub pages: usize,
}

#[derive(Debug, Serialize)]
pub struct SplitResponse {
    pub id: String,
    pub urls: Vec<String>,
}

/// Run one PDF transformation off the async workers and store its result.
pub(super) async fn store_result<F>(
    state: AppState,
    kind: ArtifactKind,
    transform: F,
) -> Result<DocumentResponse, ApiError>
where
    F: FnOnce() -> sheetwerk_core::error::Result<Vec<u8>> + Send + 'static,
{
    let response = tokio::task::spawn_blocking(move || {
        let artifacts = state.store.begin(kind)?;
        let pdf = transform()?;
        let pages = PdfReader::from_bytes(&pdf)?.page_count();
        let url = artifacts.write(RESULT_FILE, &pdf)?;
        let id = artifacts.commit();
        Ok::<_, ApiError>(DocumentResponse {
            id: id.to_string(),
            url,
            pages,
        })
    })
    .await??;
    info!(id = %response.id, kind = kind.dir_name(), pages = response.pages, "PDF stored");
    Ok(response)
}

/// POST /pdf/merge: concatenate every uploaded PDF in upload order.
#[instrument(skip_all)]
pub async fn merge(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<DocumentResponse>, ApiError> {
    let upload = Upload::read(multipart).await?;
    let files = upload.all_files(DocumentType::Pdf)?.to_vec();
    let response = store_result(state, ArtifactKind::PdfMerge, move || {
        let documents: Vec<&[u8]> = files.iter().map(|f| f.as_ref()).collect();
        PdfReader::merge(&documents)
    })
    .await?;
    Ok(Json(response))
}

/// POST /pdf/split: one single-page PDF per page.
#[instrument(skip_all)]
pub async fn split(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SplitResponse>, ApiError> {
    let upload = Upload::read(multipart).await?;
    let file = upload.single_file(DocumentType::Pdf)?;

    let response = tokio::task::spawn_blocking(move || {
        let artifacts = state.store.begin(ArtifactKind::PdfSplit)?;
        let pages = PdfReader::from_bytes(&file)?.split_pages()?;
        let urls = pages
            .iter()
            .enumerate()
            .map(|(i, page)| artifacts.write(&format!("page-{}.pdf", i + 1), page))
            .collect::<sheetwerk_core::error::Result<Vec<_>>>()?;
        let id = artifacts.commit();
        Ok::<_, ApiError>(SplitResponse {
            id: id.to_string(),
            urls,
        })
    })
    .await??;

    info!(id = %response.id, pages = response.urls.len(), "PDF split");
    Ok(Json(response))
}

/// POST /pdf/rotate: fields `angle` (default 90) and `pages` (default all).
#[instrument(skip_all)]
pub async fn rotate(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<DocumentResponse>, ApiError> {
    let upload = Upload::read(multipart).await?;
    let file = upload.single_file(DocumentType::Pdf)?;
    let angle = match upload.field("angle") {
        Some(raw) => raw
            .parse::<i32>()
            .map_err(|_| SheetwerkError::InvalidRequest(format!("invalid angle: {raw:?}")))?,
        None => DEFAULT_ANGLE,
    };
    let pages = parse_page_list(upload.field("pages"))?;

    let response = store_result(state, ArtifactKind::PdfRotate, move || {
        PdfReader::from_bytes(&file)?.rotate(angle, &pages)
    })
    .await?;
    Ok(Json(response))
}

/// POST /pdf/reorder: field `order`, e.g. `3,1,2`.
#[instrument(skip_all)]
pub async fn reorder(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<DocumentResponse>, ApiError> {
    let upload = Upload::read(multipart).await?;
    let file = upload.single_file(DocumentType::Pdf)?;
    let order = parse_page_list(upload.field("order"))?;

    let response = store_result(state, ArtifactKind::PdfReorder, move || {
        PdfReader::from_bytes(&file)?.reorder(&order)
    })
    .await?;
    Ok(Json(response))
}
