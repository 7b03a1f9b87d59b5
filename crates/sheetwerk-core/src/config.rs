// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service and rendering configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{BorderClass, SheetSize};

/// Every constant that shapes the spreadsheet-to-PDF output.
///
/// Lengths are logical units (one unit renders as one PDF point before
/// scale-to-fit) unless noted otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Supersampling factor applied to both axes at draw time.
    pub scale: f32,
    /// JPEG quality (1-100) used to compress each page raster.
    pub jpeg_quality: u8,
    pub min_column_width: f32,
    pub max_column_width: f32,
    pub min_row_height: f32,
    /// Inner cell padding on every side.
    pub padding: f32,
    /// Font size used when a cell does not declare one.
    pub default_font_size: f32,
    /// Font family used when a cell does not declare one.
    pub default_font_family: String,
    /// Line height as a multiple of the font size.
    pub line_height_factor: f32,
    /// Maximum accumulated row height per page.
    pub max_page_height: f32,
    /// Margin kept free on every side of an output sheet, in points.
    pub page_margin: f32,
    /// Sheet used when a page is taller than (or as tall as) it is wide.
    pub portrait_sheet: SheetSize,
    /// Sheet used when a page is wider than it is tall.
    pub landscape_sheet: SheetSize,
    /// Offset of the table from the left edge of the canvas.
    pub table_left: f32,
    /// Offset of the table from the top edge of the canvas.
    pub table_top: f32,
    /// Blank canvas space right of the last column.
    pub canvas_right: f32,
    /// Blank canvas space below the last row.
    pub canvas_bottom: f32,
    /// Upper bound on the logical canvas width.
    pub max_canvas_width: f32,
    pub border_widths: BorderWidths,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: 1.5,
            jpeg_quality: 30,
            min_column_width: 80.0,
            max_column_width: 400.0,
            min_row_height: 16.0,
            padding: 2.0,
            default_font_size: 11.0,
            default_font_family: "Calibri".into(),
            line_height_factor: 1.2,
            max_page_height: 1200.0,
            page_margin: 20.0,
            portrait_sheet: SheetSize::A4_PORTRAIT,
            landscape_sheet: SheetSize::A3_LANDSCAPE,
            table_left: 5.0,
            table_top: 3.0,
            canvas_right: 15.0,
            canvas_bottom: 10.0,
            max_canvas_width: 4000.0,
            border_widths: BorderWidths::default(),
        }
    }
}

impl RenderConfig {
    /// Height of one text line at the given font size.
    pub fn line_height(&self, font_size: f32) -> f32 {
        font_size * self.line_height_factor
    }
}

/// Stroke widths for each border class, ascending.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BorderWidths {
    pub thin: f32,
    pub medium: f32,
    pub thick: f32,
}

impl Default for BorderWidths {
    fn default() -> Self {
        Self {
            thin: 0.5,
            medium: 1.5,
            thick: 2.0,
        }
    }
}

impl BorderWidths {
    pub fn width(&self, class: BorderClass) -> f32 {
        match class {
            BorderClass::Thin => self.thin,
            BorderClass::Medium => self.medium,
            BorderClass::Thick => self.thick,
        }
    }
}

/// HTTP service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    pub port: u16,
    /// Root directory for generated artifacts.
    pub output_dir: PathBuf,
    /// Largest accepted upload, in bytes.
    pub max_upload_bytes: usize,
    /// Age after which generated artifacts are swept.
    pub retention_hours: u64,
    /// Directory of extra `.ttf`/`.otf` faces loaded next to the built-in fonts.
    pub font_dir: Option<PathBuf>,
    pub render: RenderConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8787,
            output_dir: PathBuf::from("generated"),
            max_upload_bytes: 50 * 1024 * 1024,
            retention_hours: 24,
            font_dir: None,
            render: RenderConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read a JSON configuration file. Missing keys take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Apply `PORT`, `SHEETWERK_OUTPUT_DIR` and `SHEETWERK_FONT_DIR` overrides.
    pub fn apply_env(mut self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok());
        self
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.port = port;
        }
        if let Some(dir) = lookup("SHEETWERK_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("SHEETWERK_FONT_DIR") {
            self.font_dir = Some(PathBuf::from(dir));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: ServerConfig =
            serde_json::from_str(r#"{ "port": 9000, "render": { "jpeg_quality": 80 } }"#).unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.render.jpeg_quality, 80);
        assert_eq!(cfg.render.max_page_height, 1200.0);
        assert_eq!(cfg.retention_hours, 24);
    }

    #[test]
    fn env_overrides_win() {
        let mut cfg = ServerConfig::default();
        cfg.apply_overrides(|key| match key {
            "PORT" => Some("3001".into()),
            "SHEETWERK_OUTPUT_DIR" => Some("/var/lib/sheetwerk".into()),
            _ => None,
        });
        assert_eq!(cfg.port, 3001);
        assert_eq!(cfg.output_dir, PathBuf::from("/var/lib/sheetwerk"));
        assert!(cfg.font_dir.is_none());
    }

    #[test]
    fn unparsable_port_is_ignored() {
        let mut cfg = ServerConfig::default();
        cfg.apply_overrides(|key| (key == "PORT").then(|| "http".to_string()));
        assert_eq!(cfg.port, 8787);
    }

    #[test]
    fn border_widths_ascend() {
        let widths = BorderWidths::default();
        assert!(widths.width(BorderClass::Thin) < widths.width(BorderClass::Medium));
        assert!(widths.width(BorderClass::Medium) < widths.width(BorderClass::Thick));
    }
}
