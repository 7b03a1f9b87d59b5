// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// sheetwerk-server — HTTP surface for workbook conversion and PDF utilities.
//
// Routes:
//   GET  /health
//   POST /excel/topdf
//   POST /pdf/merge | /pdf/split | /pdf/rotate | /pdf/reorder
//   POST /img2pdf
//   GET  /files/<kind>/<id>/<name>   generated artifacts

pub mod error;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use state::AppState;

/// Build the application router over `state`.
pub fn router(state: AppState) -> Router {
    let files = ServeDir::new(state.store.root());
    let max_upload = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(routes::health))
        .route("/excel/topdf", post(routes::excel::excel_to_pdf))
        .route("/pdf/merge", post(routes::pdf::merge))
        .route("/pdf/split", post(routes::pdf::split))
        .route("/pdf/rotate", post(routes::pdf::rotate))
        .route("/pdf/reorder", post(routes::pdf::reorder))
        .route("/img2pdf", post(routes::images::image_to_pdf))
        .nest_service("/files", files)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
