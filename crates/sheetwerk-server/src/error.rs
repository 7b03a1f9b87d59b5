// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP error responses.
//
// Every failure leaves a handler as one `ApiError` and reaches the client as
// `{ "error": ..., "suggestion": ... }`. Bad input is a 400, anything that
// goes wrong after the input was accepted is a 500.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use sheetwerk_core::SheetwerkError;
use sheetwerk_core::human_errors::humanize_error;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Document(#[from] SheetwerkError),

    #[error("malformed upload: {0}")]
    Upload(#[from] MultipartError),

    #[error("worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    suggestion: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Document(e) if e.is_rejection() => StatusCode::BAD_REQUEST,
            Self::Document(_) | Self::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upload(e) => e.status(),
        }
    }

    fn body(&self) -> ErrorBody {
        let human = match self {
            Self::Document(e) => humanize_error(e),
            Self::Upload(e) => humanize_error(&SheetwerkError::InvalidRequest(e.body_text())),
            Self::Worker(_) => {
                humanize_error(&SheetwerkError::Render("processing was interrupted".into()))
            }
        };
        ErrorBody {
            error: human.message,
            suggestion: human.suggestion,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, %status, "Request failed");
        } else {
            warn!(error = %self, %status, "Request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_are_client_errors() {
        let err = ApiError::from(SheetwerkError::InvalidRequest("no file".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let err = ApiError::from(SheetwerkError::UnsupportedDocument("text/plain".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn pipeline_failures_are_server_errors() {
        let err = ApiError::from(SheetwerkError::Spreadsheet("bad zip".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = err.body();
        assert!(!body.error.is_empty());
        assert!(!body.suggestion.is_empty());
    }
}
