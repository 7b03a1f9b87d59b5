// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Worksheet parts (`xl/worksheets/sheetN.xml`).

use std::sync::Arc;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use sheetwerk_core::error::{Result, SheetwerkError};
use tracing::debug;

use super::package::attr;
use super::styles::StyleTable;
use super::{Cell, CellFormat, ColumnFormat, Row, Worksheet, check_grid};

/// Split an A1-style reference into 0-based `(row, column)`.
pub(crate) fn parse_cell_ref(reference: &str) -> Option<(usize, usize)> {
    let reference = reference.trim().replace('$', "");
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let column = letters.chars().try_fold(0usize, |acc, c| {
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        acc.checked_mul(26)?.checked_add(digit)
    })?;
    let row: usize = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, column - 1))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ValueKind {
    Number,
    SharedString,
    InlineString,
    Boolean,
    Error,
    FormulaString,
    Date,
}

impl ValueKind {
    fn from_attr(t: Option<&str>) -> Self {
        match t {
            Some("s") => Self::SharedString,
            Some("inlineStr") => Self::InlineString,
            Some("b") => Self::Boolean,
            Some("e") => Self::Error,
            Some("str") => Self::FormulaString,
            Some("d") => Self::Date,
            _ => Self::Number,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TextTarget {
    None,
    Value,
    Inline,
}

struct PendingCell {
    row: usize,
    column: usize,
    kind: ValueKind,
    style: usize,
    raw: String,
    inline: String,
}

struct SheetBuilder<'a> {
    part: &'a str,
    shared_strings: &'a [String],
    styles: &'a StyleTable,
    sheet: Worksheet,
    row: usize,
    row_format: Option<Arc<CellFormat>>,
    next_column: usize,
    /// Widest row seen so far.
    columns: usize,
    cell: Option<PendingCell>,
    target: TextTarget,
    in_phonetic: bool,
    in_cols: bool,
}

impl<'a> SheetBuilder<'a> {
    fn open(&mut self, e: &BytesStart<'_>) -> Result<()> {
        match e.local_name().as_ref() {
            b"cols" => self.in_cols = true,
            b"col" if self.in_cols => self.open_column(e),
            b"row" => self.open_row(e)?,
            b"c" => self.open_cell(e),
            b"v" if self.cell.is_some() => self.target = TextTarget::Value,
            b"rPh" => self.in_phonetic = true,
            b"t" if self.cell.is_some() && !self.in_phonetic => self.target = TextTarget::Inline,
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) -> Result<()> {
        match name {
            b"cols" => self.in_cols = false,
            b"v" | b"t" => self.target = TextTarget::None,
            b"rPh" => self.in_phonetic = false,
            b"c" => self.finish_cell()?,
            b"row" => self.row_format = None,
            _ => {}
        }
        Ok(())
    }

    /// Refuse a cell position that would grow the grid past its limit.
    fn reserve(&mut self, row: usize, column: usize) -> Result<()> {
        let rows = self.sheet.rows.len().max(row.saturating_add(1));
        let columns = self.columns.max(column.saturating_add(1));
        check_grid(&self.sheet.name, rows, columns)?;
        self.columns = columns;
        Ok(())
    }

    fn text(&mut self, text: &str) {
        let Some(cell) = self.cell.as_mut() else {
            return;
        };
        match self.target {
            TextTarget::Value => cell.raw.push_str(text),
            TextTarget::Inline => cell.inline.push_str(text),
            TextTarget::None => {}
        }
    }

    fn open_column(&mut self, e: &BytesStart<'_>) {
        let Some(style) = attr(e, b"style").and_then(|v| v.parse::<usize>().ok()) else {
            return;
        };
        let bound = |key: &[u8]| attr(e, key).and_then(|v| v.parse::<usize>().ok());
        let (Some(min), Some(max)) = (bound(b"min"), bound(b"max")) else {
            return;
        };
        if min == 0 || max < min {
            return;
        }
        self.sheet.column_formats.push(ColumnFormat {
            first: min - 1,
            last: max - 1,
            format: self.styles.get(style),
        });
    }

    fn open_row(&mut self, e: &BytesStart<'_>) -> Result<()> {
        self.row = attr(e, b"r")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|r| *r > 0)
            .map(|r| r - 1)
            .unwrap_or(self.sheet.rows.len());
        self.next_column = 0;

        let custom = matches!(attr(e, b"customFormat").as_deref(), Some("1" | "true"));
        self.row_format = match attr(e, b"s").and_then(|v| v.parse::<usize>().ok()) {
            Some(style) if custom => Some(self.styles.get(style)),
            _ => None,
        };
        if self.row_format.is_some() {
            self.reserve(self.row, 0)?;
            self.ensure_row(self.row);
        }
        Ok(())
    }

    fn open_cell(&mut self, e: &BytesStart<'_>) {
        let (row, column) = attr(e, b"r")
            .as_deref()
            .and_then(parse_cell_ref)
            .unwrap_or((self.row, self.next_column));
        self.next_column = column.saturating_add(1);
        self.cell = Some(PendingCell {
            row,
            column,
            kind: ValueKind::from_attr(attr(e, b"t").as_deref()),
            style: attr(e, b"s").and_then(|v| v.parse().ok()).unwrap_or(0),
            raw: String::new(),
            inline: String::new(),
        });
    }

    fn finish_cell(&mut self) -> Result<()> {
        self.target = TextTarget::None;
        let Some(pending) = self.cell.take() else {
            return Ok(());
        };
        self.reserve(pending.row, pending.column)?;
        let value = match pending.kind {
            ValueKind::SharedString => pending
                .raw
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|i| self.shared_strings.get(i))
                .cloned()
                .unwrap_or_default(),
            ValueKind::InlineString if !pending.inline.is_empty() => pending.inline,
            ValueKind::Boolean => match pending.raw.trim() {
                "" => String::new(),
                "1" | "true" => "TRUE".into(),
                _ => "FALSE".into(),
            },
            ValueKind::InlineString
            | ValueKind::Number
            | ValueKind::Error
            | ValueKind::FormulaString
            | ValueKind::Date => pending.raw,
        };

        let format = self.styles.get(pending.style);
        let row = self.ensure_row(pending.row);
        if row.cells.len() <= pending.column {
            row.cells.resize(pending.column + 1, None);
        }
        row.cells[pending.column] = Some(Cell { value, format });
        Ok(())
    }

    fn ensure_row(&mut self, index: usize) -> &mut Row {
        if self.sheet.rows.len() <= index {
            self.sheet.rows.resize_with(index + 1, Row::default);
        }
        let row = &mut self.sheet.rows[index];
        if index == self.row && row.format.is_none() {
            row.format = self.row_format.clone();
        }
        row
    }
}

/// Parse one worksheet part.
pub(crate) fn parse_worksheet(
    name: &str,
    part: &str,
    xml: &[u8],
    shared_strings: &[String],
    styles: &StyleTable,
) -> Result<Worksheet> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut builder = SheetBuilder {
        part,
        shared_strings,
        styles,
        sheet: Worksheet {
            name: name.to_string(),
            ..Default::default()
        },
        row: 0,
        row_format: None,
        next_column: 0,
        columns: 0,
        cell: None,
        target: TextTarget::None,
        in_phonetic: false,
        in_cols: false,
    };

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| SheetwerkError::xml(builder.part, e))?
        {
            Event::Start(e) => builder.open(&e)?,
            Event::Empty(e) => {
                builder.open(&e)?;
                builder.close(e.local_name().as_ref())?;
            }
            Event::End(e) => builder.close(e.local_name().as_ref())?,
            Event::Text(e) => {
                if builder.target != TextTarget::None {
                    let text = e.unescape().map_err(|err| SheetwerkError::xml(part, err))?;
                    builder.text(&text);
                }
            }
            Event::CData(e) => builder.text(&String::from_utf8_lossy(&e)),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let sheet = builder.sheet;
    debug!(
        sheet = %sheet.name,
        rows = sheet.row_extent(),
        columns = sheet.column_extent(),
        "Worksheet parsed"
    );
    Ok(sheet)
}
