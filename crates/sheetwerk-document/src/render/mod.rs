// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Render module — table extraction, layout, rasterization and PDF assembly.
//
// Pipeline per worksheet: `style::extract_table` → `layout::compute_layout`
// → `raster::Rasterizer::render_page` per page → `assemble::encode_page`,
// collected into one `assemble::OutputDocument`.

pub mod assemble;
pub mod fonts;
pub mod layout;
pub mod raster;
pub mod style;

pub use assemble::{EncodedPage, OutputDocument, PixelData, Placement, encode_page, place_on_sheet};
pub use fonts::{FontBook, FontSpec, TextMeasure};
pub use layout::{LayoutPlan, compute_layout, paginate, wrap_text};
pub use raster::{Rasterizer, RenderedPage};
pub use style::{CellBorder, CellStyle, TableCell, TableModel, ThemeColor, extract_table};
