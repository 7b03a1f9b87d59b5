// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the sheetwerk-document crate: table layout on its
// own, and the whole XLSX-to-PDF conversion for a mid-sized workbook.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rust_xlsxwriter::{Format, FormatBorder, Workbook};

use sheetwerk_core::RenderConfig;
use sheetwerk_document::render::{TableCell, TableModel, compute_layout};
use sheetwerk_document::{FontBook, WorkbookConverter};

const ROWS: u32 = 300;
const COLUMNS: u16 = 8;

fn synthetic_table() -> TableModel {
    let rows = (0..ROWS)
        .map(|r| {
            (0..COLUMNS)
                .map(|c| {
                    if c == 0 {
                        TableCell::new(format!("Item {r} with a longer description that wraps"))
                    } else {
                        TableCell::new(format!("{:.2}", f64::from(r) * f64::from(c) * 1.07))
                    }
                })
                .collect()
        })
        .collect();
    TableModel::from_rows("Bench", rows)
}

fn synthetic_workbook() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let header = Format::new().set_bold().set_border(FormatBorder::Thin);
    for c in 0..COLUMNS {
        sheet
            .write_string_with_format(0, c, format!("Column {c}"), &header)
            .unwrap();
    }
    for r in 1..ROWS {
        sheet.write_string(r, 0, format!("Item {r}")).unwrap();
        for c in 1..COLUMNS {
            sheet.write_number(r, c, f64::from(r) * f64::from(c)).unwrap();
        }
    }
    workbook.save_to_buffer().unwrap()
}

fn bench_layout(c: &mut Criterion) {
    let fonts = FontBook::embedded().unwrap();
    let cfg = RenderConfig::default();
    let table = synthetic_table();

    c.bench_function("compute_layout (300x8)", |b| {
        b.iter(|| black_box(compute_layout(black_box(&table), &fonts, &cfg)));
    });
}

fn bench_convert(c: &mut Criterion) {
    let fonts = FontBook::embedded().unwrap();
    let cfg = RenderConfig::default();
    let xlsx = synthetic_workbook();

    let mut group = c.benchmark_group("convert");
    group.sample_size(10);
    group.bench_function("xlsx_to_pdf (300x8)", |b| {
        b.iter(|| {
            let output = WorkbookConverter::new(&cfg, &fonts)
                .convert(black_box(&xlsx))
                .unwrap();
            black_box(output.pdf.len());
        });
    });
    group.finish();
}

criterion_group!(benches, bench_layout, bench_convert);
criterion_main!(benches);
