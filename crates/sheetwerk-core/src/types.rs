// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types shared by the renderer and the HTTP service.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier namespacing the artifacts produced by one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier previously produced by [`RequestId::new`].
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Supported input document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    /// Office Open XML workbook (.xlsx / .xlsm).
    Xlsx,
    Pdf,
    Png,
    Jpeg,
}

impl DocumentType {
    /// MIME type string for responses and logs.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Pdf => "application/pdf",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::Png | Self::Jpeg)
    }

    /// Infer document type from the leading bytes of a payload.
    ///
    /// XLSX is a zip container (`PK\x03\x04`); PDF starts with `%PDF-`;
    /// images are recognised by their PNG signature or JPEG SOI marker.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"PK\x03\x04") {
            Some(Self::Xlsx)
        } else if bytes.starts_with(b"%PDF-") {
            Some(Self::Pdf)
        } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else {
            None
        }
    }
}

/// An opaque 24-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed `0xRRGGBB` value.
    pub const fn from_u32(packed: u32) -> Self {
        Self::new((packed >> 16) as u8, (packed >> 8) as u8, packed as u8)
    }

    /// Parse a spreadsheet colour literal.
    ///
    /// Accepts `AARRGGBB` (alpha discarded) and `RRGGBB`, with or without a
    /// leading `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let rgb = match hex.len() {
            8 => &hex[2..],
            6 => hex,
            _ => return None,
        };
        u32::from_str_radix(rgb, 16).ok().map(Self::from_u32)
    }

    /// `#RRGGBB` form.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn to_array(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// Line weight class of a cell border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BorderClass {
    Thin,
    Medium,
    Thick,
}

impl BorderClass {
    /// Map a spreadsheet border style keyword to a weight class.
    ///
    /// Returns `None` for `"none"` and the empty string. Every other drawn
    /// style (hair, dashed, dotted, double, ...) renders as thin.
    pub fn from_keyword(style: &str) -> Option<Self> {
        match style {
            "" | "none" => None,
            "medium" => Some(Self::Medium),
            "thick" => Some(Self::Thick),
            _ => Some(Self::Thin),
        }
    }
}

/// Output sheet geometry in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SheetSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl SheetSize {
    /// A4 portrait.
    pub const A4_PORTRAIT: SheetSize = SheetSize::new(595.0, 842.0);
    /// A3 landscape.
    pub const A3_LANDSCAPE: SheetSize = SheetSize::new(1190.0, 842.0);

    pub const fn new(width_pt: f32, height_pt: f32) -> Self {
        Self {
            width_pt,
            height_pt,
        }
    }
}
