// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — page-level operations on existing PDFs, and image pages.

pub mod images;
pub mod reader;

pub use images::images_to_pdf;
pub use reader::PdfReader;
