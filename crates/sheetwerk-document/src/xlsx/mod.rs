// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// XLSX module — read an Office Open XML workbook into an immutable, raw model.
//
// The model keeps formatting exactly as the file declares it (ARGB literals,
// theme indices, border keywords). Turning that into renderable styles is the
// job of `render::style`.

mod package;
mod sheet;
mod styles;

use std::io::Cursor;
use std::sync::Arc;

use sheetwerk_core::error::{Result, SheetwerkError};
use tracing::{debug, info, instrument, warn};

use package::{Package, Relationship};

/// An ordered sequence of worksheets.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<Worksheet>,
}

/// Largest grid (used rows times used columns) a worksheet may span.
pub const MAX_GRID_CELLS: usize = 1_000_000;

/// One worksheet: a sparse grid of cells.
#[derive(Debug, Clone, Default)]
pub struct Worksheet {
    pub name: String,
    /// Rows by 0-based index. Rows the file never mentions are empty.
    pub rows: Vec<Row>,
    /// Column-level default formats from `<cols>`.
    pub column_formats: Vec<ColumnFormat>,
}

/// One row. `cells[i]` is the cell in column `i`, if the file contains it.
#[derive(Debug, Clone, Default)]
pub struct Row {
    pub cells: Vec<Option<Cell>>,
    /// Row-level default format (`<row s=".." customFormat="1">`).
    pub format: Option<Arc<CellFormat>>,
}

#[derive(Debug, Clone)]
pub struct Cell {
    /// Display text: shared/inline strings with rich-text runs joined,
    /// cached formula results, or the raw numeric literal.
    pub value: String,
    pub format: Arc<CellFormat>,
}

/// A `<col>` range (0-based, inclusive) carrying a default format.
#[derive(Debug, Clone)]
pub struct ColumnFormat {
    pub first: usize,
    pub last: usize,
    pub format: Arc<CellFormat>,
}

/// Raw formatting of a cell as declared in `styles.xml`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellFormat {
    pub fill: Fill,
    pub font: Option<FontFormat>,
    pub border: BorderFormat,
}

/// A colour reference: literal, theme-indexed, or legacy-indexed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorRef {
    /// `AARRGGBB` literal.
    pub argb: Option<String>,
    pub theme: Option<u32>,
    pub indexed: Option<u32>,
    pub tint: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Fill {
    #[default]
    None,
    Pattern {
        /// `patternType` keyword (`solid`, `gray125`, `none`, ...).
        pattern: String,
        foreground: Option<ColorRef>,
        background: Option<ColorRef>,
    },
    Gradient,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontFormat {
    pub bold: bool,
    pub italic: bool,
    /// Size in points.
    pub size: Option<f32>,
    pub name: Option<String>,
    pub color: Option<ColorRef>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BorderEdge {
    /// Border style keyword; `None` when the edge is absent.
    pub style: Option<String>,
    pub color: Option<ColorRef>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BorderFormat {
    pub top: BorderEdge,
    pub right: BorderEdge,
    pub bottom: BorderEdge,
    pub left: BorderEdge,
}

impl Worksheet {
    /// Number of rows in the used range, up to the last row the file
    /// actually mentions. `<dimension>` is not trusted.
    pub fn row_extent(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns in the used range, up to the last stored cell.
    pub fn column_extent(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
    }

    /// `(rows, columns)` of the used range, refusing grids larger than
    /// [`MAX_GRID_CELLS`].
    pub fn grid_size(&self) -> Result<(usize, usize)> {
        let (rows, columns) = (self.row_extent(), self.column_extent());
        check_grid(&self.name, rows, columns)?;
        Ok((rows, columns))
    }

    /// The format a cell inherits when it is not stored in the file: the
    /// row default first, then the column default.
    pub fn underlying_format(&self, row: usize, column: usize) -> Option<&CellFormat> {
        self.rows
            .get(row)
            .and_then(|r| r.format.as_deref())
            .or_else(|| {
                self.column_formats
                    .iter()
                    .find(|c| c.first <= column && column <= c.last)
                    .map(|c| c.format.as_ref())
            })
    }
}

pub(crate) fn check_grid(sheet: &str, rows: usize, columns: usize) -> Result<()> {
    match rows.checked_mul(columns) {
        Some(cells) if cells <= MAX_GRID_CELLS => Ok(()),
        _ => Err(SheetwerkError::Spreadsheet(format!(
            "worksheet {sheet:?} spans {rows} rows by {columns} columns, more than {MAX_GRID_CELLS} cells"
        ))),
    }
}

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";

const REL_SHARED_STRINGS: &str = "/sharedStrings";
const REL_STYLES: &str = "/styles";
const REL_WORKSHEET: &str = "/worksheet";

/// Read an XLSX payload into a [`Workbook`].
///
/// Worksheets appear in workbook order. Chart sheets and sheets whose part
/// is missing are skipped with a warning; anything that prevents reading the
/// container, the workbook part, or a worksheet's XML is an error.
#[instrument(skip_all, fields(bytes_len = bytes.len()))]
pub fn read_workbook(bytes: &[u8]) -> Result<Workbook> {
    let mut package = Package::open(Cursor::new(bytes))?;

    let workbook_xml = package.read_part(WORKBOOK_PART)?.ok_or_else(|| {
        SheetwerkError::Spreadsheet(format!("{WORKBOOK_PART} is missing"))
    })?;
    let entries = package::parse_sheet_entries(&workbook_xml)?;

    let relationships = match package.read_part(WORKBOOK_RELS_PART)? {
        Some(xml) => package::parse_relationships(&xml, WORKBOOK_RELS_PART)?,
        None => Vec::new(),
    };

    let shared_strings = match package.read_part(&related_part(
        &relationships,
        REL_SHARED_STRINGS,
        "xl/sharedStrings.xml",
    ))? {
        Some(xml) => package::parse_shared_strings(&xml)?,
        None => Vec::new(),
    };

    let style_table = match package.read_part(&related_part(
        &relationships,
        REL_STYLES,
        "xl/styles.xml",
    ))? {
        Some(xml) => styles::parse_styles(&xml)?,
        None => styles::StyleTable::default(),
    };

    debug!(
        sheets = entries.len(),
        shared_strings = shared_strings.len(),
        formats = style_table.len(),
        "Workbook parts loaded"
    );

    let mut sheets = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(rel) = relationships.iter().find(|r| r.id == entry.relationship_id) else {
            warn!(sheet = %entry.name, "No relationship for sheet, skipping");
            continue;
        };
        if !rel.kind.ends_with(REL_WORKSHEET) {
            debug!(sheet = %entry.name, kind = %rel.kind, "Not a worksheet, skipping");
            continue;
        }
        let part = package::resolve_target(&rel.target);
        let Some(xml) = package.read_part(&part)? else {
            warn!(sheet = %entry.name, %part, "Worksheet part missing, skipping");
            continue;
        };
        let worksheet =
            sheet::parse_worksheet(&entry.name, &part, &xml, &shared_strings, &style_table)?;
        sheets.push(worksheet);
    }

    info!(sheets = sheets.len(), "Workbook read");
    Ok(Workbook { sheets })
}

/// Part name of the first relationship of the given type, or a fallback.
fn related_part(relationships: &[Relationship], kind_suffix: &str, fallback: &str) -> String {
    relationships
        .iter()
        .find(|r| r.kind.ends_with(kind_suffix))
        .map(|r| package::resolve_target(&r.target))
        .unwrap_or_else(|| fallback.to_string())
}
