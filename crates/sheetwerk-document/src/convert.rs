// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Workbook-to-PDF conversion.
//
// Every worksheet with a used range contributes one or more pages, in
// workbook order. Worksheets without one are skipped; a workbook where every
// worksheet is skipped still yields a valid, zero-page PDF.

use serde::Serialize;
use sheetwerk_core::RenderConfig;
use sheetwerk_core::error::Result;
use tracing::{debug, info, instrument, warn};

use crate::render::{
    FontBook, OutputDocument, Rasterizer, compute_layout, encode_page, extract_table,
};
use crate::xlsx::{self, Workbook};

/// What was rendered for one worksheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetSummary {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
    pub pages: usize,
}

#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub pdf: Vec<u8>,
    /// Rendered worksheets only; skipped worksheets are not listed.
    pub sheets: Vec<SheetSummary>,
}

impl ConversionOutput {
    pub fn page_count(&self) -> usize {
        self.sheets.iter().map(|s| s.pages).sum()
    }
}

/// Converts XLSX workbooks into paginated PDFs.
pub struct WorkbookConverter<'a> {
    config: &'a RenderConfig,
    fonts: &'a FontBook,
}

impl<'a> WorkbookConverter<'a> {
    pub fn new(config: &'a RenderConfig, fonts: &'a FontBook) -> Self {
        Self { config, fonts }
    }

    /// Read an XLSX payload and render it to PDF bytes.
    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    pub fn convert(&self, bytes: &[u8]) -> Result<ConversionOutput> {
        let workbook = xlsx::read_workbook(bytes)?;
        let title = workbook
            .sheets
            .first()
            .map(|s| s.name.as_str())
            .unwrap_or("Workbook")
            .to_string();
        let (document, sheets) = self.render_workbook(&workbook)?;
        let pdf = document.to_pdf_bytes(&title)?;

        let output = ConversionOutput { pdf, sheets };
        info!(
            sheets = output.sheets.len(),
            pages = output.page_count(),
            pdf_bytes = output.pdf.len(),
            "Workbook converted"
        );
        Ok(output)
    }

    /// Render every worksheet with a used range into one output document.
    pub fn render_workbook(
        &self,
        workbook: &Workbook,
    ) -> Result<(OutputDocument, Vec<SheetSummary>)> {
        let rasterizer = Rasterizer::new(self.fonts, self.config);
        let mut document = OutputDocument::new();
        let mut summaries = Vec::with_capacity(workbook.sheets.len());

        for sheet in &workbook.sheets {
            let table = extract_table(sheet)?;
            if table.is_empty() {
                warn!(sheet = %sheet.name, "Worksheet has no used range, skipping");
                continue;
            }
            let plan = compute_layout(&table, self.fonts, self.config);
            for rows in &plan.pages {
                let page = rasterizer.render_page(&table, &plan, rows.clone())?;
                document.push(encode_page(&page, self.config.jpeg_quality)?, self.config);
            }
            debug!(sheet = %sheet.name, pages = plan.pages.len(), "Worksheet rendered");
            summaries.push(SheetSummary {
                name: sheet.name.clone(),
                rows: table.rows(),
                columns: table.columns(),
                pages: plan.pages.len(),
            });
        }

        Ok((document, summaries))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::xlsx::{Cell, CellFormat, Row, Worksheet};

    fn sheet(name: &str, values: &[&[&str]]) -> Worksheet {
        let format = Arc::new(CellFormat::default());
        Worksheet {
            name: name.into(),
            rows: values
                .iter()
                .map(|row| Row {
                    cells: row
                        .iter()
                        .map(|v| {
                            Some(Cell {
                                value: v.to_string(),
                                format: Arc::clone(&format),
                            })
                        })
                        .collect(),
                    format: None,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_worksheets_are_skipped() {
        let fonts = FontBook::embedded().unwrap();
        let cfg = RenderConfig::default();
        let workbook = Workbook {
            sheets: vec![
                sheet("Blank", &[]),
                sheet("Data", &[&["a", "b"], &["c", "d"]]),
            ],
        };
        let (document, summaries) = WorkbookConverter::new(&cfg, &fonts)
            .render_workbook(&workbook)
            .unwrap();
        assert_eq!(document.len(), 1);
        assert_eq!(
            summaries,
            vec![SheetSummary {
                name: "Data".into(),
                rows: 2,
                columns: 2,
                pages: 1
            }]
        );
    }

    #[test]
    fn long_sheet_paginates() {
        let fonts = FontBook::embedded().unwrap();
        let cfg = RenderConfig::default();
        let rows: Vec<Vec<String>> = (0..200).map(|i| vec![format!("row {i}")]).collect();
        let refs: Vec<Vec<&str>> = rows.iter().map(|r| r.iter().map(String::as_str).collect()).collect();
        let slices: Vec<&[&str]> = refs.iter().map(Vec::as_slice).collect();
        let workbook = Workbook {
            sheets: vec![sheet("Long", &slices)],
        };
        let (document, summaries) = WorkbookConverter::new(&cfg, &fonts)
            .render_workbook(&workbook)
            .unwrap();
        // One line of 11px text is 17.2 units tall: 69 rows per 1200-unit page.
        assert_eq!(summaries[0].pages, 3);
        assert_eq!(document.len(), 3);
    }
}
