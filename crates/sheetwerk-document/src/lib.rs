// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// sheetwerk-document — Spreadsheet rendering and PDF page operations.
//
// Reads XLSX workbooks (values and formatting), lays each worksheet out as a
// paginated table, rasterizes the pages, and assembles them into a PDF.
// Also merges, splits, rotates, and reorders pages of existing PDFs, and
// turns images into PDF pages.

pub mod convert;
pub mod pdf;
pub mod render;
pub mod xlsx;

// Re-export the primary entry points so callers can use
// `sheetwerk_document::WorkbookConverter` etc.
pub use convert::{ConversionOutput, SheetSummary, WorkbookConverter};
pub use pdf::{PdfReader, images_to_pdf};
pub use render::FontBook;
