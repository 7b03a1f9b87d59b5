// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `xl/styles.xml` — fonts, fills, borders and the `cellXfs` table that
// cells index with their `s` attribute.

use std::sync::Arc;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use sheetwerk_core::error::{Result, SheetwerkError};

use super::package::attr;
use super::{BorderEdge, BorderFormat, CellFormat, ColorRef, Fill, FontFormat};

const PART: &str = "xl/styles.xml";

/// Resolved `cellXfs` entries, indexed by a cell's `s` attribute.
#[derive(Debug, Clone, Default)]
pub(crate) struct StyleTable {
    formats: Vec<Arc<CellFormat>>,
    fallback: Arc<CellFormat>,
}

impl StyleTable {
    /// Format for an `xf` index. Out-of-range indices get the empty format.
    pub(crate) fn get(&self, index: usize) -> Arc<CellFormat> {
        self.formats
            .get(index)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    pub(crate) fn len(&self) -> usize {
        self.formats.len()
    }
}

/// Top-level collection currently being read. Fonts, fills and borders
/// also occur inside `dxfs`; only the direct collections are kept.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Outside,
    Fonts,
    Fills,
    Borders,
    CellXfs,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Side {
    Top,
    Right,
    Bottom,
    Left,
    Other,
}

#[derive(Debug, Clone, Copy, Default)]
struct XfRef {
    font: usize,
    fill: usize,
    border: usize,
}

struct StylesBuilder {
    depth: usize,
    section: Section,
    fonts: Vec<FontFormat>,
    fills: Vec<Fill>,
    borders: Vec<BorderFormat>,
    xfs: Vec<XfRef>,
    font: Option<FontFormat>,
    fill: Option<Fill>,
    border: Option<BorderFormat>,
    side: Option<Side>,
}

impl StylesBuilder {
    fn new() -> Self {
        Self {
            depth: 0,
            section: Section::Outside,
            fonts: Vec::new(),
            fills: Vec::new(),
            borders: Vec::new(),
            xfs: Vec::new(),
            font: None,
            fill: None,
            border: None,
            side: None,
        }
    }

    fn open(&mut self, e: &BytesStart<'_>) {
        let name = e.local_name();
        let name = name.as_ref();
        self.depth += 1;

        // Depth 1 is `<styleSheet>`; its children are the collections.
        if self.depth == 2 {
            self.section = match name {
                b"fonts" => Section::Fonts,
                b"fills" => Section::Fills,
                b"borders" => Section::Borders,
                b"cellXfs" => Section::CellXfs,
                _ => Section::Ignored,
            };
            return;
        }

        match self.section {
            Section::Fonts => self.open_font_element(name, e),
            Section::Fills => self.open_fill_element(name, e),
            Section::Borders => self.open_border_element(name, e),
            Section::CellXfs if name == b"xf" => {
                let index = |key: &[u8]| {
                    attr(e, key)
                        .and_then(|v| v.parse::<usize>().ok())
                        .unwrap_or(0)
                };
                self.xfs.push(XfRef {
                    font: index(b"fontId"),
                    fill: index(b"fillId"),
                    border: index(b"borderId"),
                });
            }
            _ => {}
        }
    }

    fn open_font_element(&mut self, name: &[u8], e: &BytesStart<'_>) {
        if name == b"font" {
            self.font = Some(FontFormat::default());
            return;
        }
        let Some(font) = self.font.as_mut() else {
            return;
        };
        match name {
            b"b" => font.bold = flag(e),
            b"i" => font.italic = flag(e),
            b"sz" => font.size = attr(e, b"val").and_then(|v| v.parse().ok()),
            b"name" => font.name = attr(e, b"val"),
            b"color" => font.color = Some(color_ref(e)),
            _ => {}
        }
    }

    fn open_fill_element(&mut self, name: &[u8], e: &BytesStart<'_>) {
        match name {
            b"fill" => self.fill = Some(Fill::None),
            b"patternFill" => {
                self.fill = Some(Fill::Pattern {
                    pattern: attr(e, b"patternType").unwrap_or_else(|| "none".into()),
                    foreground: None,
                    background: None,
                });
            }
            b"gradientFill" => self.fill = Some(Fill::Gradient),
            b"fgColor" | b"bgColor" => {
                if let Some(Fill::Pattern {
                    foreground,
                    background,
                    ..
                }) = self.fill.as_mut()
                {
                    let slot = if name == b"fgColor" {
                        foreground
                    } else {
                        background
                    };
                    *slot = Some(color_ref(e));
                }
            }
            _ => {}
        }
    }

    fn open_border_element(&mut self, name: &[u8], e: &BytesStart<'_>) {
        if name == b"border" {
            self.border = Some(BorderFormat::default());
            return;
        }
        let Some(border) = self.border.as_mut() else {
            return;
        };
        let side = match name {
            b"top" => Some(Side::Top),
            b"right" | b"end" => Some(Side::Right),
            b"bottom" => Some(Side::Bottom),
            b"left" | b"start" => Some(Side::Left),
            b"diagonal" | b"vertical" | b"horizontal" => Some(Side::Other),
            _ => None,
        };
        if let Some(side) = side {
            self.side = Some(side);
            if let Some(edge) = edge_mut(border, side) {
                edge.style = attr(e, b"style");
            }
            return;
        }
        if name == b"color" {
            if let Some(edge) = self.side.and_then(|side| edge_mut(border, side)) {
                edge.color = Some(color_ref(e));
            }
        }
    }

    fn close(&mut self, name: &[u8]) {
        let depth = self.depth;
        self.depth = self.depth.saturating_sub(1);
        if depth <= 2 {
            self.section = Section::Outside;
            return;
        }

        match (self.section, name) {
            (Section::Fonts, b"font") => {
                if let Some(font) = self.font.take() {
                    self.fonts.push(font);
                }
            }
            (Section::Fills, b"fill") => {
                if let Some(fill) = self.fill.take() {
                    self.fills.push(fill);
                }
            }
            (Section::Borders, b"border") => {
                if let Some(border) = self.border.take() {
                    self.borders.push(border);
                }
                self.side = None;
            }
            (Section::Borders, b"top" | b"right" | b"end" | b"bottom" | b"left" | b"start")
            | (Section::Borders, b"diagonal" | b"vertical" | b"horizontal") => {
                self.side = None;
            }
            _ => {}
        }
    }

    fn finish(self) -> StyleTable {
        let formats = self
            .xfs
            .iter()
            .map(|xf| {
                Arc::new(CellFormat {
                    fill: self.fills.get(xf.fill).cloned().unwrap_or_default(),
                    font: self.fonts.get(xf.font).cloned(),
                    border: self.borders.get(xf.border).cloned().unwrap_or_default(),
                })
            })
            .collect();
        StyleTable {
            formats,
            fallback: Arc::new(CellFormat::default()),
        }
    }
}

fn edge_mut(border: &mut BorderFormat, side: Side) -> Option<&mut BorderEdge> {
    match side {
        Side::Top => Some(&mut border.top),
        Side::Right => Some(&mut border.right),
        Side::Bottom => Some(&mut border.bottom),
        Side::Left => Some(&mut border.left),
        Side::Other => None,
    }
}

/// Boolean font property: `<b/>` is on, `<b val="0"/>` is off.
fn flag(e: &BytesStart<'_>) -> bool {
    !matches!(attr(e, b"val").as_deref(), Some("0" | "false"))
}

pub(crate) fn color_ref(e: &BytesStart<'_>) -> ColorRef {
    ColorRef {
        argb: attr(e, b"rgb"),
        theme: attr(e, b"theme").and_then(|v| v.parse().ok()),
        indexed: attr(e, b"indexed").and_then(|v| v.parse().ok()),
        tint: attr(e, b"tint").and_then(|v| v.parse().ok()),
    }
}

pub(crate) fn parse_styles(xml: &[u8]) -> Result<StyleTable> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut builder = StylesBuilder::new();

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| SheetwerkError::xml(PART, e))?
        {
            Event::Start(e) => builder.open(&e),
            Event::Empty(e) => {
                builder.open(&e);
                builder.close(e.local_name().as_ref());
            }
            Event::End(e) => builder.close(e.local_name().as_ref()),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <fonts count="3">
    <font><sz val="11"/><color theme="1"/><name val="Calibri"/></font>
    <font><b/><i val="0"/><sz val="14.5"/><color rgb="FFFF0000"/><name val="Arial"/></font>
    <font><i/><sz val="9"/><name val="Courier New"/></font>
  </fonts>
  <fills count="3">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor theme="4" tint="0.3999"/><bgColor indexed="64"/></patternFill></fill>
  </fills>
  <borders count="2">
    <border><left/><right/><top/><bottom/><diagonal/></border>
    <border><left style="thin"><color rgb="FF00FF00"/></left><right/><top/><bottom style="thick"/><diagonal style="thin"><color rgb="FF123456"/></diagonal></border>
  </borders>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="2" fillId="2" borderId="1"/></cellStyleXfs>
  <cellXfs count="3">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="0" fontId="1" fillId="2" borderId="1" xfId="0" applyFont="1"/>
    <xf numFmtId="0" fontId="2" fillId="1" borderId="0" xfId="0"/>
  </cellXfs>
  <dxfs count="1"><dxf><font><b/></font><fill><patternFill><bgColor rgb="FFFFC7CE"/></patternFill></fill></dxf></dxfs>
</styleSheet>"#;

    #[test]
    fn cell_xfs_resolve_to_components() {
        let table = parse_styles(STYLES).unwrap();
        assert_eq!(table.len(), 3);

        let header = table.get(1);
        let font = header.font.as_ref().unwrap();
        assert!(font.bold);
        assert!(!font.italic);
        assert_eq!(font.size, Some(14.5));
        assert_eq!(font.name.as_deref(), Some("Arial"));
        assert_eq!(font.color.as_ref().unwrap().argb.as_deref(), Some("FFFF0000"));

        match &header.fill {
            Fill::Pattern {
                pattern,
                foreground,
                background,
            } => {
                assert_eq!(pattern, "solid");
                let fg = foreground.as_ref().unwrap();
                assert_eq!(fg.theme, Some(4));
                assert_eq!(fg.tint, Some(0.3999));
                assert_eq!(background.as_ref().unwrap().indexed, Some(64));
            }
            other => panic!("unexpected fill {other:?}"),
        }

        assert_eq!(header.border.left.style.as_deref(), Some("thin"));
        assert_eq!(
            header.border.left.color.as_ref().unwrap().argb.as_deref(),
            Some("FF00FF00")
        );
        assert_eq!(header.border.bottom.style.as_deref(), Some("thick"));
        assert_eq!(header.border.top.style, None);
    }

    #[test]
    fn differential_formats_do_not_leak_into_tables() {
        let table = parse_styles(STYLES).unwrap();
        // Three fonts declared; the dxf font must not be appended.
        let plain = table.get(2);
        let font = plain.font.as_ref().unwrap();
        assert!(font.italic);
        assert!(!font.bold);
        assert_eq!(font.name.as_deref(), Some("Courier New"));
    }

    #[test]
    fn out_of_range_index_is_empty_format() {
        let table = parse_styles(STYLES).unwrap();
        assert_eq!(*table.get(99), CellFormat::default());
    }

    #[test]
    fn empty_pattern_has_no_colours() {
        let table = parse_styles(STYLES).unwrap();
        assert_eq!(
            table.get(0).fill,
            Fill::Pattern {
                pattern: "none".into(),
                foreground: None,
                background: None
            }
        );
    }
}
