// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Font book and text measurement.
//
// Layout and rasterization both measure text through `TextMeasure`, so a
// line that fits a column during layout is drawn at exactly that width.

use std::path::Path;

use ab_glyph::{Font, FontArc, FontRef, FontVec, PxScale, ScaleFont};
use sheetwerk_core::error::{Result, SheetwerkError};
use tracing::{debug, info, instrument, warn};

/// The font a run of text is set in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec<'a> {
    pub family: &'a str,
    /// Em size in logical units.
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
}

/// Horizontal text metrics. Widths are additive: no kerning or shaping.
pub trait TextMeasure {
    /// Advance width of one character.
    fn advance(&self, ch: char, font: &FontSpec<'_>) -> f32;

    /// Width of a single line: the sum of its advances.
    fn measure(&self, text: &str, font: &FontSpec<'_>) -> f32 {
        text.chars().map(|ch| self.advance(ch, font)).sum()
    }
}

/// Pixel scale that makes one em exactly `size` pixels.
///
/// `ab_glyph` scales by the ascent-to-descent height, not the em box.
pub fn em_scale(font: &FontArc, size: f32) -> PxScale {
    let units_per_em = font.units_per_em().unwrap_or(1000.0);
    PxScale::from(size * font.height_unscaled() / units_per_em)
}

/// Broad family classes used when a requested family is not installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GenericClass {
    Sans,
    Serif,
    Mono,
}

const MONO_KEYWORDS: &[&str] = &["mono", "courier", "consol", "code", "fixed"];
const SERIF_KEYWORDS: &[&str] = &[
    "times", "serif", "roman", "georgia", "cambria", "garamond", "song", "ming", "book",
];

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}

impl GenericClass {
    fn of(family: &str) -> Self {
        if MONO_KEYWORDS.iter().any(|k| contains_ignore_case(family, k)) {
            Self::Mono
        } else if contains_ignore_case(family, "sans") {
            Self::Sans
        } else if SERIF_KEYWORDS.iter().any(|k| contains_ignore_case(family, k)) {
            Self::Serif
        } else {
            Self::Sans
        }
    }
}

struct Face {
    family: String,
    bold: bool,
    italic: bool,
    monospaced: bool,
    font: FontArc,
}

impl Face {
    fn is_math(&self) -> bool {
        contains_ignore_case(&self.family, "math")
    }

    fn belongs_to(&self, class: GenericClass) -> bool {
        if self.is_math() {
            return false;
        }
        match class {
            GenericClass::Mono => self.monospaced,
            GenericClass::Sans => !self.monospaced && contains_ignore_case(&self.family, "sans"),
            GenericClass::Serif => {
                !self.monospaced
                    && !contains_ignore_case(&self.family, "sans")
                    && (contains_ignore_case(&self.family, "serif")
                        || contains_ignore_case(&self.family, "modern")
                        || contains_ignore_case(&self.family, "roman"))
            }
        }
    }

    /// Lower is better; weight mismatches cost more than slant.
    fn style_distance(&self, spec: &FontSpec<'_>) -> u8 {
        (u8::from(self.bold != spec.bold) << 1) | u8::from(self.italic != spec.italic)
    }
}

/// Family and style of the face a [`FontSpec`] resolves to.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceInfo<'a> {
    pub family: &'a str,
    pub bold: bool,
    pub italic: bool,
    pub monospaced: bool,
}

/// Family name, bold, italic, monospaced, read from the font's own tables.
fn describe(data: &[u8]) -> Option<(String, bool, bool, bool)> {
    let face = ttf_parser::Face::parse(data, 0).ok()?;
    let names = || face.names().into_iter();
    let family = names()
        .filter(|n| n.name_id == ttf_parser::name_id::TYPOGRAPHIC_FAMILY)
        .find_map(|n| n.to_string())
        .or_else(|| {
            names()
                .filter(|n| n.name_id == ttf_parser::name_id::FAMILY)
                .find_map(|n| n.to_string())
        })?;
    Some((family, face.is_bold(), face.is_italic(), face.is_monospaced()))
}

/// Every face available to the renderer.
///
/// Never empty: constructors fail rather than hand out a book that cannot
/// draw text.
pub struct FontBook {
    faces: Vec<Face>,
    /// Face used when neither the family nor its class is available.
    default_face: usize,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("faces", &self.faces.len())
            .field("families", &self.families())
            .finish()
    }
}

impl FontBook {
    /// Fonts compiled into the binary.
    #[instrument]
    pub fn embedded() -> Result<Self> {
        let mut faces = Vec::new();
        for data in typst_assets::fonts() {
            let Some((family, bold, italic, monospaced)) = describe(data) else {
                continue;
            };
            match FontRef::try_from_slice(data) {
                Ok(font) => faces.push(Face {
                    family,
                    bold,
                    italic,
                    monospaced,
                    font: FontArc::new(font),
                }),
                Err(e) => warn!(%family, "Skipping embedded font: {e}"),
            }
        }
        let book = Self::from_faces(faces)?;
        info!(faces = book.faces.len(), "Embedded fonts loaded");
        Ok(book)
    }

    /// Embedded fonts plus every `.ttf`/`.otf` file under `dir`.
    pub fn with_font_dir(dir: &Path) -> Result<Self> {
        let mut book = Self::embedded()?;
        book.load_dir(dir)?;
        Ok(book)
    }

    fn from_faces(faces: Vec<Face>) -> Result<Self> {
        if faces.is_empty() {
            return Err(SheetwerkError::Font("no usable font faces".into()));
        }
        let default_face = Self::pick_default(&faces);
        Ok(Self {
            faces,
            default_face,
        })
    }

    fn pick_default(faces: &[Face]) -> usize {
        let regular = |f: &Face| !f.bold && !f.italic;
        faces
            .iter()
            .position(|f| f.belongs_to(GenericClass::Sans) && regular(f))
            .or_else(|| faces.iter().position(|f| !f.is_math() && regular(f)))
            .unwrap_or(0)
    }

    /// Add one font file's bytes.
    pub fn add_font(&mut self, data: Vec<u8>) -> Result<()> {
        let (family, bold, italic, monospaced) = describe(&data)
            .ok_or_else(|| SheetwerkError::Font("font has no readable family name".into()))?;
        let font = FontVec::try_from_vec(data)
            .map_err(|e| SheetwerkError::Font(format!("{family}: {e}")))?;
        debug!(%family, bold, italic, "Font added");
        self.faces.push(Face {
            family,
            bold,
            italic,
            monospaced,
            font: FontArc::new(font),
        });
        self.default_face = Self::pick_default(&self.faces);
        Ok(())
    }

    /// Load every `.ttf` / `.otf` file in `dir` (recursively). Unreadable
    /// files are skipped with a warning. Returns the number of faces added.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let mut added = 0;
        for entry in std::fs::read_dir(dir)?.flatten() {
            let path = entry.path();
            if path.is_dir() {
                added += self.load_dir(&path)?;
                continue;
            }
            let is_font = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"));
            if !is_font {
                continue;
            }
            match std::fs::read(&path)
                .map_err(SheetwerkError::from)
                .and_then(|data| self.add_font(data))
            {
                Ok(()) => added += 1,
                Err(e) => warn!(path = %path.display(), "Skipping font: {e}"),
            }
        }
        info!(added, "Font directory loaded");
        Ok(added)
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Distinct family names, in load order.
    pub fn families(&self) -> Vec<&str> {
        let mut families: Vec<&str> = Vec::new();
        for face in &self.faces {
            if !families.contains(&face.family.as_str()) {
                families.push(&face.family);
            }
        }
        families
    }

    /// Resolve a spec to a face: exact family, then a face of the same
    /// generic class, then the default family. Within the candidates the
    /// closest bold/italic match wins; ties keep load order.
    fn select(&self, spec: &FontSpec<'_>) -> usize {
        let family = spec.family.trim();
        let best = |matches: &dyn Fn(&Face) -> bool| {
            self.faces
                .iter()
                .enumerate()
                .filter(|(_, f)| matches(f))
                .min_by_key(|(_, f)| f.style_distance(spec))
                .map(|(i, _)| i)
        };

        let default_family = &self.faces[self.default_face].family;
        best(&|f: &Face| f.family.eq_ignore_ascii_case(family))
            .or_else(|| {
                let class = GenericClass::of(family);
                best(&|f: &Face| f.belongs_to(class))
            })
            .or_else(|| best(&|f: &Face| &f.family == default_family))
            .unwrap_or(self.default_face)
    }

    /// The face that draws `ch` in `spec`: the selected face, or the first
    /// face that has a glyph for it.
    pub fn font_for(&self, ch: char, spec: &FontSpec<'_>) -> &FontArc {
        let selected = &self.faces[self.select(spec)].font;
        if ch.is_control() || selected.glyph_id(ch).0 != 0 {
            return selected;
        }
        self.faces
            .iter()
            .map(|f| &f.font)
            .find(|font| font.glyph_id(ch).0 != 0)
            .unwrap_or(selected)
    }

    /// Describe the face a spec resolves to.
    pub fn face_info(&self, spec: &FontSpec<'_>) -> FaceInfo<'_> {
        let face = &self.faces[self.select(spec)];
        FaceInfo {
            family: &face.family,
            bold: face.bold,
            italic: face.italic,
            monospaced: face.monospaced,
        }
    }
}

impl TextMeasure for FontBook {
    fn advance(&self, ch: char, font: &FontSpec<'_>) -> f32 {
        let face = self.font_for(ch, font);
        face.as_scaled(em_scale(face, font.size))
            .h_advance(face.glyph_id(ch))
    }
}
