// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for SheetWerk.

use thiserror::Error;

/// Top-level error type for all SheetWerk operations.
#[derive(Debug, Error)]
pub enum SheetwerkError {
    // -- Request errors --
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unsupported document type: {0}")]
    UnsupportedDocument(String),

    // -- Spreadsheet input --
    #[error("spreadsheet could not be read: {0}")]
    Spreadsheet(String),

    #[error("spreadsheet XML is malformed in {part}: {detail}")]
    Xml { part: String, detail: String },

    // -- Rendering / assembly --
    #[error("rendering failed: {0}")]
    Render(String),

    #[error("font loading failed: {0}")]
    Font(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SheetwerkError {
    /// Shorthand for an XML error inside a named package part.
    pub fn xml(part: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        Self::Xml {
            part: part.into(),
            detail: detail.to_string(),
        }
    }

    /// Whether the request was rejected before any processing started.
    ///
    /// Everything else (including spreadsheets that fail to parse) is a
    /// generic processing failure.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::InvalidRequest(_) | Self::UnsupportedDocument(_))
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SheetwerkError>;
