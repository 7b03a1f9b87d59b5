// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout engine — column widths, wrapped row heights, and the partition
// of rows into vertically bounded pages.

use std::ops::Range;

use sheetwerk_core::RenderConfig;
use tracing::{debug, instrument};

use super::fonts::{FontSpec, TextMeasure};
use super::style::{CellStyle, TableModel};

/// Slack for float rounding when a line is exactly as wide as its column.
const WRAP_EPSILON: f32 = 1e-3;

/// Geometry of one table: every row appears in exactly one page, pages are
/// contiguous and in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutPlan {
    pub column_widths: Vec<f32>,
    pub row_heights: Vec<f32>,
    pub pages: Vec<Range<usize>>,
    columns: usize,
    /// Wrapped lines of every cell, row-major.
    lines: Vec<Vec<String>>,
}

impl LayoutPlan {
    /// The lines a cell is drawn as.
    pub fn lines(&self, row: usize, column: usize) -> &[String] {
        &self.lines[row * self.columns + column]
    }

    pub fn table_width(&self) -> f32 {
        self.column_widths.iter().sum()
    }

    pub fn page_height(&self, rows: &Range<usize>) -> f32 {
        self.row_heights[rows.clone()].iter().sum()
    }
}

/// The font a cell's text is set in.
pub fn font_spec<'a>(style: &'a CellStyle, config: &'a RenderConfig) -> FontSpec<'a> {
    FontSpec {
        family: style
            .font_family
            .as_deref()
            .unwrap_or(config.default_font_family.as_str()),
        size: style.font_size.unwrap_or(config.default_font_size),
        bold: style.bold,
        italic: style.italic,
    }
}

/// Explicit lines of a cell: split on `\n` or `\r\n`. Empty text has no
/// lines; a trailing break yields a trailing empty line.
pub fn explicit_lines(text: &str) -> impl Iterator<Item = &str> {
    let has_text = !text.is_empty();
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(move |_| has_text)
}

/// Greedy per-character wrap of `text` to `max_width`.
///
/// Every explicit line produces at least one output line (an empty line
/// stays empty). A character moves to a new line only when the current line
/// is non-empty, so a single over-wide character still gets a line.
pub fn wrap_text(
    text: &str,
    max_width: f32,
    font: &FontSpec<'_>,
    measure: &impl TextMeasure,
) -> Vec<String> {
    let mut wrapped = Vec::new();
    for line in explicit_lines(text) {
        if line.is_empty() {
            wrapped.push(String::new());
            continue;
        }
        let mut current = String::new();
        let mut width = 0.0f32;
        for ch in line.chars() {
            let advance = measure.advance(ch, font);
            if width + advance > max_width + WRAP_EPSILON && !current.is_empty() {
                wrapped.push(std::mem::take(&mut current));
                width = 0.0;
            }
            current.push(ch);
            width += advance;
        }
        wrapped.push(current);
    }
    wrapped
}

/// Split rows into pages whose accumulated height stays within `budget`.
///
/// A row that alone exceeds the budget still gets its own page.
pub fn paginate(row_heights: &[f32], budget: f32) -> Vec<Range<usize>> {
    let (mut pages, open, _) = row_heights.iter().enumerate().fold(
        (Vec::<Range<usize>>::new(), None::<Range<usize>>, 0.0f32),
        |(mut pages, open, used), (row, &height)| match open {
            Some(page) if used + height > budget => {
                pages.push(page);
                (pages, Some(row..row + 1), height)
            }
            Some(page) => (pages, Some(page.start..row + 1), used + height),
            None => (pages, Some(row..row + 1), height),
        },
    );
    pages.extend(open);
    pages
}

/// Compute the full layout of a table.
#[instrument(skip_all, fields(sheet = %table.name(), rows = table.rows(), columns = table.columns()))]
pub fn compute_layout(
    table: &TableModel,
    measure: &impl TextMeasure,
    config: &RenderConfig,
) -> LayoutPlan {
    if table.is_empty() {
        return LayoutPlan::default();
    }
    let pad = 2.0 * config.padding;

    let mut column_widths = vec![config.min_column_width; table.columns()];
    for row in table.iter_rows() {
        for (width, cell) in column_widths.iter_mut().zip(row) {
            let font = font_spec(&cell.style, config);
            for line in explicit_lines(&cell.text) {
                let wanted = (measure.measure(line, &font) + pad).min(config.max_column_width);
                *width = width.max(wanted);
            }
        }
    }

    let mut lines = Vec::with_capacity(table.rows() * table.columns());
    let mut row_heights = Vec::with_capacity(table.rows());
    for row in table.iter_rows() {
        let mut height = config.min_row_height;
        for (cell, width) in row.iter().zip(&column_widths) {
            let font = font_spec(&cell.style, config);
            let wrapped = wrap_text(&cell.text, width - pad, &font, measure);
            if !wrapped.is_empty() {
                let needed = wrapped.len() as f32 * config.line_height(font.size) + pad;
                height = height.max(needed);
            }
            lines.push(wrapped);
        }
        row_heights.push(height);
    }

    let pages = paginate(&row_heights, config.max_page_height);
    debug!(pages = pages.len(), "Layout computed");

    LayoutPlan {
        column_widths,
        row_heights,
        pages,
        columns: table.columns(),
        lines,
    }
}
