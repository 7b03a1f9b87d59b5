// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rasterizer — draw one page of a laid-out table onto a white canvas.

use std::ops::Range;

use image::{Rgb as Pixel, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use sheetwerk_core::error::{Result, SheetwerkError};
use sheetwerk_core::{RenderConfig, Rgb};
use tracing::{debug, instrument};

use super::fonts::{FontBook, TextMeasure, em_scale};
use super::layout::{LayoutPlan, font_spec};
use super::style::{CellStyle, TableModel};

/// One rendered page: the supersampled raster plus its size in logical
/// units (the size it occupies before scale-to-fit).
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub image: RgbImage,
    pub logical_width: f32,
    pub logical_height: f32,
}

/// Text colour actually drawn. Missing colours, colours equal to the
/// background, and white on an unfilled cell all become black.
pub fn text_color(style: &CellStyle) -> Rgb {
    match (style.text_color, style.background) {
        (None, _) => Rgb::BLACK,
        (Some(text), Some(background)) if text == background => Rgb::BLACK,
        (Some(Rgb::WHITE), None) => Rgb::BLACK,
        (Some(text), _) => text,
    }
}

fn pixel(color: Rgb) -> Pixel<u8> {
    Pixel(color.to_array())
}

pub struct Rasterizer<'a> {
    fonts: &'a FontBook,
    config: &'a RenderConfig,
}

impl<'a> Rasterizer<'a> {
    pub fn new(fonts: &'a FontBook, config: &'a RenderConfig) -> Self {
        Self { fonts, config }
    }

    /// Logical to pixel coordinate. Adjacent cells share rounded edges, so
    /// they tile without gaps.
    fn px(&self, logical: f32) -> i32 {
        (logical * self.config.scale).round() as i32
    }

    /// Draw rows `rows` of `table` using the geometry in `plan`.
    #[instrument(skip_all, fields(sheet = %table.name(), rows = ?rows))]
    pub fn render_page(
        &self,
        table: &TableModel,
        plan: &LayoutPlan,
        rows: Range<usize>,
    ) -> Result<RenderedPage> {
        let cfg = self.config;
        if rows.start >= rows.end || rows.end > table.rows() {
            return Err(SheetwerkError::Render(format!(
                "row range {rows:?} outside table of {} rows",
                table.rows()
            )));
        }

        let logical_width =
            (cfg.table_left + plan.table_width() + cfg.canvas_right).min(cfg.max_canvas_width);
        let logical_height = cfg.table_top + plan.page_height(&rows) + cfg.canvas_bottom;
        let width_px = (logical_width * cfg.scale).ceil().max(1.0) as u32;
        let height_px = (logical_height * cfg.scale).ceil().max(1.0) as u32;
        let mut image = RgbImage::from_pixel(width_px, height_px, pixel(Rgb::WHITE));

        let mut y = cfg.table_top;
        for row in rows {
            let height = plan.row_heights[row];
            let mut x = cfg.table_left;
            for (column, width) in plan.column_widths.iter().copied().enumerate() {
                if x >= logical_width {
                    break;
                }
                self.draw_cell(&mut image, table, plan, (row, column), (x, y, width, height));
                x += width;
            }
            y += height;
        }

        debug!(width_px, height_px, "Page rasterized");
        Ok(RenderedPage {
            image,
            logical_width,
            logical_height,
        })
    }

    fn draw_cell(
        &self,
        image: &mut RgbImage,
        table: &TableModel,
        plan: &LayoutPlan,
        (row, column): (usize, usize),
        (x, y, width, height): (f32, f32, f32, f32),
    ) {
        let cfg = self.config;
        let cell = table.cell(row, column);
        let style = &cell.style;

        let (x0, y0) = (self.px(x), self.px(y));
        let (w, h) = (self.px(x + width) - x0, self.px(y + height) - y0);
        if w <= 0 || h <= 0 {
            return;
        }

        let background = style.background.unwrap_or(Rgb::WHITE);
        draw_filled_rect_mut(
            image,
            Rect::at(x0, y0).of_size(w as u32, h as u32),
            pixel(background),
        );

        if let Some(border) = style.border {
            let stroke = cfg.border_widths.width(border.class) * cfg.scale;
            let thickness = (stroke.round() as i32).max(1);
            for inset in 0..thickness {
                let (iw, ih) = (w - 2 * inset, h - 2 * inset);
                if iw <= 0 || ih <= 0 {
                    break;
                }
                draw_hollow_rect_mut(
                    image,
                    Rect::at(x0 + inset, y0 + inset).of_size(iw as u32, ih as u32),
                    pixel(border.color),
                );
            }
        }

        let lines = plan.lines(row, column);
        if lines.is_empty() {
            return;
        }
        let font = font_spec(style, cfg);
        let color = pixel(text_color(style));
        let line_height = cfg.line_height(font.size);
        let mut glyph = [0u8; 4];
        for (i, line) in lines.iter().enumerate() {
            let baseline_top = self.px(y + cfg.padding + i as f32 * line_height);
            let mut pen = x + cfg.padding;
            for ch in line.chars() {
                let face = self.fonts.font_for(ch, &font);
                if !ch.is_whitespace() {
                    draw_text_mut(
                        image,
                        color,
                        self.px(pen),
                        baseline_top,
                        em_scale(face, font.size * cfg.scale),
                        face,
                        ch.encode_utf8(&mut glyph),
                    );
                }
                pen += self.fonts.advance(ch, &font);
            }
        }
    }
}
