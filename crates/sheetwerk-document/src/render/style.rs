// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Style extraction — turn a raw worksheet into a dense table of display
// text and resolved visual styles.

use sheetwerk_core::error::Result;
use sheetwerk_core::{BorderClass, Rgb};
use tracing::{debug, instrument};

use crate::xlsx::{BorderEdge, CellFormat, ColorRef, Fill, Worksheet};

/// The ten-entry default Office theme palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeColor {
    Dark1,
    Light1,
    Light2,
    Dark2,
    Accent1,
    Accent2,
    Accent3,
    Accent4,
    Accent5,
    Accent6,
}

impl ThemeColor {
    pub fn from_index(index: u32) -> Option<Self> {
        Some(match index {
            0 => Self::Dark1,
            1 => Self::Light1,
            2 => Self::Light2,
            3 => Self::Dark2,
            4 => Self::Accent1,
            5 => Self::Accent2,
            6 => Self::Accent3,
            7 => Self::Accent4,
            8 => Self::Accent5,
            9 => Self::Accent6,
            _ => return None,
        })
    }

    pub fn rgb(self) -> Rgb {
        Rgb::from_u32(match self {
            Self::Dark1 => 0x000000,
            Self::Light1 => 0xFFFFFF,
            Self::Light2 => 0xE7E6E6,
            Self::Dark2 => 0x44546A,
            Self::Accent1 => 0x4472C4,
            Self::Accent2 => 0xED7D31,
            Self::Accent3 => 0xA5A5A5,
            Self::Accent4 => 0xFFC000,
            Self::Accent5 => 0x5B9BD5,
            Self::Accent6 => 0x70AD47,
        })
    }
}

/// Border drawn around a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellBorder {
    pub color: Rgb,
    pub class: BorderClass,
}

/// Visual style of one table cell. Absent fields fall back to render
/// defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellStyle {
    pub background: Option<Rgb>,
    pub text_color: Option<Rgb>,
    pub bold: bool,
    pub italic: bool,
    /// Rounded from the declared point size; used directly as pixels.
    pub font_size: Option<f32>,
    pub font_family: Option<String>,
    pub border: Option<CellBorder>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableCell {
    pub text: String,
    pub style: CellStyle,
}

impl TableCell {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: CellStyle::default(),
        }
    }

    pub fn styled(text: impl Into<String>, style: CellStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// A rectangular grid of cells, stored row-major. Every row has exactly
/// `columns` entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableModel {
    name: String,
    rows: usize,
    columns: usize,
    cells: Vec<TableCell>,
}

impl TableModel {
    /// Build from ragged rows, padding short rows with empty unstyled cells.
    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<TableCell>>) -> Self {
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        let row_count = if columns == 0 { 0 } else { rows.len() };
        let mut cells = Vec::with_capacity(row_count * columns);
        for mut row in rows.into_iter().take(row_count) {
            row.resize_with(columns, TableCell::default);
            cells.extend(row);
        }
        Self {
            name: name.into(),
            rows: row_count,
            columns,
            cells,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.columns == 0
    }

    pub fn row(&self, row: usize) -> &[TableCell] {
        let start = row * self.columns;
        &self.cells[start..start + self.columns]
    }

    pub fn cell(&self, row: usize, column: usize) -> &TableCell {
        &self.cells[row * self.columns + column]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[TableCell]> {
        // `chunks_exact(0)` panics; an empty table yields no rows.
        self.cells.chunks_exact(self.columns.max(1)).take(self.rows)
    }
}

/// Resolve a colour reference: ARGB literal first, then the theme palette.
/// Tint and legacy indexed colours are not applied.
fn resolve_color(color: &ColorRef) -> Option<Rgb> {
    color
        .argb
        .as_deref()
        .and_then(Rgb::from_hex)
        .or_else(|| color.theme.and_then(ThemeColor::from_index).map(ThemeColor::rgb))
}

fn resolve_background(fill: &Fill) -> Option<Rgb> {
    match fill {
        Fill::Pattern {
            pattern,
            foreground,
            background,
        } => foreground.as_ref().and_then(resolve_color).or_else(|| {
            if pattern == "solid" {
                background
                    .as_ref()
                    .and_then(|c| c.argb.as_deref())
                    .and_then(Rgb::from_hex)
            } else {
                None
            }
        }),
        Fill::None | Fill::Gradient => None,
    }
}

/// Text colour. Theme index 1 (light 1) is forced to black so that text in
/// the default "automatic" colour stays readable.
fn resolve_text_color(color: &ColorRef) -> Option<Rgb> {
    if let Some(argb) = color.argb.as_deref() {
        return Rgb::from_hex(argb);
    }
    match color.theme {
        Some(1) => Some(Rgb::BLACK),
        Some(theme) => ThemeColor::from_index(theme).map(ThemeColor::rgb),
        None => None,
    }
}

/// First drawn side in top, right, bottom, left order decides the border.
fn resolve_border(format: &CellFormat) -> Option<CellBorder> {
    let b = &format.border;
    [&b.top, &b.right, &b.bottom, &b.left]
        .into_iter()
        .find_map(|edge: &BorderEdge| {
            let class = BorderClass::from_keyword(edge.style.as_deref()?)?;
            let color = match edge.color.as_ref() {
                Some(c) => c
                    .argb
                    .as_deref()
                    .and_then(Rgb::from_hex)
                    .or_else(|| c.theme.and_then(ThemeColor::from_index).map(ThemeColor::rgb))
                    .unwrap_or(Rgb::BLACK),
                None => Rgb::BLACK,
            };
            Some(CellBorder { color, class })
        })
}

/// Full visual style of a stored cell.
pub fn resolve_style(format: &CellFormat) -> CellStyle {
    let font = format.font.as_ref();
    CellStyle {
        background: resolve_background(&format.fill),
        text_color: font
            .and_then(|f| f.color.as_ref())
            .and_then(resolve_text_color),
        bold: font.is_some_and(|f| f.bold),
        italic: font.is_some_and(|f| f.italic),
        font_size: font.and_then(|f| f.size).map(f32::round),
        font_family: font.and_then(|f| f.name.clone()),
        border: resolve_border(format),
    }
}

/// Style of a synthesized cell past the end of its row: only the border of
/// the underlying row or column format carries over.
pub fn border_only(format: Option<&CellFormat>) -> CellStyle {
    CellStyle {
        border: format.and_then(resolve_border),
        ..CellStyle::default()
    }
}

/// Turn a worksheet into a dense table model covering its used range.
///
/// Stored cells keep their full style. Gaps inside a row's populated span
/// take the full underlying (row or column) format; cells beyond the span
/// only keep its border. Grids beyond [`crate::xlsx::MAX_GRID_CELLS`] are
/// refused.
#[instrument(skip_all, fields(sheet = %sheet.name))]
pub fn extract_table(sheet: &Worksheet) -> Result<TableModel> {
    let (rows, columns) = sheet.grid_size()?;
    if rows == 0 || columns == 0 {
        return Ok(TableModel {
            name: sheet.name.clone(),
            ..Default::default()
        });
    }

    let mut cells = Vec::with_capacity(rows * columns);
    for r in 0..rows {
        let stored = sheet.rows.get(r).map(|row| row.cells.as_slice()).unwrap_or(&[]);
        for c in 0..columns {
            let cell = match stored.get(c) {
                Some(Some(cell)) => TableCell::styled(cell.value.clone(), resolve_style(&cell.format)),
                Some(None) => TableCell::styled(
                    "",
                    sheet
                        .underlying_format(r, c)
                        .map(resolve_style)
                        .unwrap_or_default(),
                ),
                None => TableCell::styled("", border_only(sheet.underlying_format(r, c))),
            };
            cells.push(cell);
        }
    }

    debug!(rows, columns, "Table extracted");
    Ok(TableModel {
        name: sheet.name.clone(),
        rows,
        columns,
        cells,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::xlsx::{BorderFormat, Cell, ColumnFormat, FontFormat, Row};

    fn argb(hex: &str) -> ColorRef {
        ColorRef {
            argb: Some(hex.into()),
            ..Default::default()
        }
    }

    fn theme(index: u32) -> ColorRef {
        ColorRef {
            theme: Some(index),
            ..Default::default()
        }
    }

    fn edge(style: &str, color: Option<ColorRef>) -> BorderEdge {
        BorderEdge {
            style: Some(style.into()),
            color,
        }
    }

    fn cell(value: &str, format: CellFormat) -> Option<Cell> {
        Some(Cell {
            value: value.into(),
            format: Arc::new(format),
        })
    }

    #[test]
    fn theme_palette() {
        assert_eq!(ThemeColor::from_index(4).unwrap().rgb().to_hex(), "#4472C4");
        assert_eq!(ThemeColor::from_index(9).unwrap().rgb().to_hex(), "#70AD47");
        assert_eq!(ThemeColor::from_index(10), None);
    }

    #[test]
    fn fill_prefers_foreground_then_solid_background() {
        let fg = Fill::Pattern {
            pattern: "solid".into(),
            foreground: Some(theme(5)),
            background: Some(argb("FF000000")),
        };
        assert_eq!(resolve_background(&fg), Some(Rgb::from_u32(0xED7D31)));

        let bg_only = Fill::Pattern {
            pattern: "solid".into(),
            foreground: None,
            background: Some(argb("FFABCDEF")),
        };
        assert_eq!(resolve_background(&bg_only), Some(Rgb::from_u32(0xABCDEF)));

        let patterned_bg = Fill::Pattern {
            pattern: "gray125".into(),
            foreground: None,
            background: Some(argb("FFABCDEF")),
        };
        assert_eq!(resolve_background(&patterned_bg), None);
        assert_eq!(resolve_background(&Fill::Gradient), None);
    }

    #[test]
    fn light_theme_text_is_forced_black() {
        assert_eq!(resolve_text_color(&theme(1)), Some(Rgb::BLACK));
        assert_eq!(resolve_text_color(&theme(4)), Some(Rgb::from_u32(0x4472C4)));
        assert_eq!(resolve_text_color(&theme(42)), None);
        assert_eq!(resolve_text_color(&argb("FF00FF00")), Some(Rgb::new(0, 255, 0)));
    }

    #[test]
    fn first_drawn_side_wins() {
        let format = CellFormat {
            border: BorderFormat {
                top: BorderEdge::default(),
                right: edge("none", Some(argb("FFFF0000"))),
                bottom: edge("thick", Some(theme(4))),
                left: edge("thin", Some(argb("FF00FF00"))),
            },
            ..Default::default()
        };
        assert_eq!(
            resolve_border(&format),
            Some(CellBorder {
                color: Rgb::from_u32(0x4472C4),
                class: BorderClass::Thick
            })
        );
    }

    #[test]
    fn border_colour_defaults_to_black() {
        let format = CellFormat {
            border: BorderFormat {
                left: edge("dashed", Some(theme(77))),
                ..Default::default()
            },
            ..Default::default()
        };
        let border = resolve_border(&format).unwrap();
        assert_eq!(border.color, Rgb::BLACK);
        assert_eq!(border.class, BorderClass::Thin);
    }

    #[test]
    fn font_size_is_rounded() {
        let format = CellFormat {
            font: Some(FontFormat {
                bold: true,
                size: Some(10.5),
                name: Some("Arial".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let style = resolve_style(&format);
        assert!(style.bold);
        assert!(!style.italic);
        assert_eq!(style.font_size, Some(11.0));
        assert_eq!(style.font_family.as_deref(), Some("Arial"));
        assert_eq!(style.border, None);
    }

    #[test]
    fn short_rows_are_padded_with_border_only_cells() {
        let bordered = CellFormat {
            fill: Fill::Pattern {
                pattern: "solid".into(),
                foreground: Some(argb("FFFFFF00")),
                background: None,
            },
            border: BorderFormat {
                bottom: edge("medium", None),
                ..Default::default()
            },
            ..Default::default()
        };
        let sheet = Worksheet {
            name: "Data".into(),
            rows: vec![
                Row {
                    cells: vec![cell("a", CellFormat::default()), None, cell("c", CellFormat::default())],
                    format: None,
                },
                Row {
                    cells: vec![cell("d", CellFormat::default())],
                    format: None,
                },
            ],
            column_formats: vec![ColumnFormat {
                first: 1,
                last: 2,
                format: Arc::new(bordered),
            }],
            ..Default::default()
        };

        let table = extract_table(&sheet).unwrap();
        assert_eq!((table.rows(), table.columns()), (2, 3));
        assert!(table.iter_rows().all(|row| row.len() == 3));

        // Gap inside the populated span: full underlying style.
        let gap = table.cell(0, 1);
        assert_eq!(gap.text, "");
        assert_eq!(gap.style.background, Some(Rgb::from_u32(0xFFFF00)));

        // Past the end of row 2: border only.
        let padded = table.cell(1, 2);
        assert_eq!(padded.text, "");
        assert_eq!(padded.style.background, None);
        assert_eq!(padded.style.border.unwrap().class, BorderClass::Medium);
    }

    #[test]
    fn empty_sheet_yields_empty_table() {
        let table = extract_table(&Worksheet {
            name: "Blank".into(),
            ..Default::default()
        })
        .unwrap();
        assert!(table.is_empty());
        assert_eq!(table.iter_rows().count(), 0);
        assert_eq!(table.name(), "Blank");
    }

    #[test]
    fn oversized_sheet_is_an_error_not_an_allocation() {
        let mut rows = vec![Row::default(); 1_048_576];
        rows[0].cells = vec![cell("x", CellFormat::default())];
        rows[1_048_575].cells = vec![None; 16_384];
        let sheet = Worksheet {
            name: "Far".into(),
            rows,
            ..Default::default()
        };
        let err = extract_table(&sheet).unwrap_err();
        assert!(matches!(err, sheetwerk_core::SheetwerkError::Spreadsheet(_)));
    }

    #[test]
    fn from_rows_pads_to_widest() {
        let table = TableModel::from_rows(
            "t",
            vec![vec![TableCell::new("a")], vec![TableCell::new("b"), TableCell::new("c")]],
        );
        assert_eq!(table.columns(), 2);
        assert_eq!(table.row(0)[1], TableCell::default());
    }
}
