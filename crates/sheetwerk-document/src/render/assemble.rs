// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page assembler — fit rendered page images onto fixed-size sheets and
// write them as one PDF using `lopdf`.
//
// Each raster is stored once as an image XObject. JPEG data passes through
// unchanged as DCTDecode; raw RGB samples are Flate-compressed.

use image::codecs::jpeg::JpegEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use sheetwerk_core::error::{Result, SheetwerkError};
use sheetwerk_core::{RenderConfig, SheetSize};
use tracing::{debug, info, instrument};

use super::raster::RenderedPage;

/// Pixel data of one embedded image.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    /// 8-bit baseline or progressive JPEG with one (gray) or three (RGB)
    /// components.
    Jpeg { bytes: Vec<u8>, gray: bool },
    /// Raw 8-bit RGB samples, row-major.
    Rgb(Vec<u8>),
}

/// A page image ready for embedding.
#[derive(Debug, Clone)]
pub struct EncodedPage {
    pub pixels: PixelData,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub logical_width: f32,
    pub logical_height: f32,
}

/// Compress a rendered page as baseline JPEG.
pub fn encode_page(page: &RenderedPage, quality: u8) -> Result<EncodedPage> {
    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100));
    page.image
        .write_with_encoder(encoder)
        .map_err(|err| SheetwerkError::ImageError(format!("JPEG encoding failed: {err}")))?;
    Ok(EncodedPage {
        pixels: PixelData::Jpeg { bytes: jpeg, gray: false },
        pixel_width: page.image.width(),
        pixel_height: page.image.height(),
        logical_width: page.logical_width,
        logical_height: page.logical_height,
    })
}

/// Where an image lands on its sheet. `x`/`y` are the lower-left corner in
/// PDF user space (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub sheet: SheetSize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

impl Placement {
    /// A sheet exactly the size of the image, drawn unscaled at the origin.
    pub fn natural(width: f32, height: f32) -> Self {
        Self {
            sheet: SheetSize::new(width, height),
            x: 0.0,
            y: 0.0,
            width,
            height,
            scale: 1.0,
        }
    }
}

/// Choose the sheet and the scale-to-fit placement for an image of the
/// given logical size. Wide images go landscape; images are shrunk to fit
/// inside the margins but never enlarged, and sit at the top-left margin.
pub fn place_on_sheet(width: f32, height: f32, config: &RenderConfig) -> Placement {
    let sheet = if width > height {
        config.landscape_sheet
    } else {
        config.portrait_sheet
    };
    let margin = config.page_margin;
    let scale = ((sheet.width_pt - 2.0 * margin) / width)
        .min((sheet.height_pt - 2.0 * margin) / height)
        .min(1.0);
    let (scaled_w, scaled_h) = (width * scale, height * scale);
    Placement {
        sheet,
        x: margin,
        y: sheet.height_pt - scaled_h - margin,
        width: scaled_w,
        height: scaled_h,
        scale,
    }
}

#[derive(Debug, Clone)]
pub struct OutputPage {
    pub image: EncodedPage,
    pub placement: Placement,
}

/// The pages of one output PDF, in order.
#[derive(Debug, Clone, Default)]
pub struct OutputDocument {
    pages: Vec<OutputPage>,
}

impl OutputDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page, choosing its sheet and placement.
    pub fn push(&mut self, image: EncodedPage, config: &RenderConfig) {
        let placement = place_on_sheet(image.logical_width, image.logical_height, config);
        self.pages.push(OutputPage { image, placement });
    }

    /// Append a page with a placement chosen by the caller.
    pub fn push_placed(&mut self, image: EncodedPage, placement: Placement) {
        self.pages.push(OutputPage { image, placement });
    }

    pub fn pages(&self) -> &[OutputPage] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Serialize as a PDF. An empty document is still a valid, zero-page PDF.
    #[instrument(skip(self), fields(pages = self.pages.len()))]
    pub fn to_pdf_bytes(&self, title: &str) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            kids.push(Object::Reference(add_page(&mut doc, pages_id, page)?));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
            "Producer" => Object::string_literal("SheetWerk"),
        });
        doc.trailer.set("Info", info_id);

        let mut output = Vec::new();
        doc.save_to(&mut output)
            .map_err(|err| SheetwerkError::PdfError(format!("failed to serialise PDF: {err}")))?;

        info!(output_bytes = output.len(), "PDF assembled");
        Ok(output)
    }
}

fn add_page(doc: &mut Document, pages_id: ObjectId, page: &OutputPage) -> Result<ObjectId> {
    let image = &page.image;
    let p = &page.placement;

    let mut image_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(image.pixel_width),
        "Height" => i64::from(image.pixel_height),
        "BitsPerComponent" => 8_i64,
    };
    let image_stream = match &image.pixels {
        PixelData::Jpeg { bytes, gray } => {
            image_dict.set("ColorSpace", if *gray { "DeviceGray" } else { "DeviceRGB" });
            image_dict.set("Filter", "DCTDecode");
            Stream::new(image_dict, bytes.clone()).with_compression(false)
        }
        PixelData::Rgb(samples) => {
            image_dict.set("ColorSpace", "DeviceRGB");
            let mut stream = Stream::new(image_dict, samples.clone());
            stream
                .compress()
                .map_err(|err| SheetwerkError::PdfError(format!("failed to compress image: {err}")))?;
            stream
        }
    };
    let image_id = doc.add_object(image_stream);

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(p.width),
                    Object::Real(0.0),
                    Object::Real(0.0),
                    Object::Real(p.height),
                    Object::Real(p.x),
                    Object::Real(p.y),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content
        .encode()
        .map_err(|err| SheetwerkError::PdfError(format!("failed to encode page content: {err}")))?;
    let content_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), encoded));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(p.sheet.width_pt),
            Object::Real(p.sheet.height_pt),
        ],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                "Im0" => image_id,
            },
        },
    });
    debug!(?page_id, scale = p.scale, "Page added");
    Ok(page_id)
}

#[cfg(test)]
mod tests {
    use image::RgbImage;

    use super::*;

    fn rendered(logical_width: f32, logical_height: f32) -> RenderedPage {
        RenderedPage {
            image: RgbImage::from_pixel(30, 20, image::Rgb([250, 10, 10])),
            logical_width,
            logical_height,
        }
    }

    fn media_box(doc: &Document, page: ObjectId) -> Vec<f32> {
        doc.get_dictionary(page)
            .unwrap()
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o.as_float().unwrap())
            .collect()
    }

    #[test]
    fn small_tall_page_is_portrait_and_unscaled() {
        let cfg = RenderConfig::default();
        let p = place_on_sheet(200.0, 300.0, &cfg);
        assert_eq!(p.sheet, SheetSize::A4_PORTRAIT);
        assert_eq!(p.scale, 1.0);
        assert_eq!((p.x, p.y), (20.0, 842.0 - 300.0 - 20.0));
    }

    #[test]
    fn wide_page_is_landscape_and_shrunk() {
        let cfg = RenderConfig::default();
        let p = place_on_sheet(2300.0, 400.0, &cfg);
        assert_eq!(p.sheet, SheetSize::A3_LANDSCAPE);
        assert!((p.scale - 1150.0 / 2300.0).abs() < 1e-6);
        assert!((p.width - 1150.0).abs() < 1e-3);
        assert!(p.x + p.width <= 1190.0 - 20.0 + 1e-3);
    }

    #[test]
    fn tall_page_is_limited_by_height() {
        let cfg = RenderConfig::default();
        let p = place_on_sheet(300.0, 1604.0, &cfg);
        assert_eq!(p.sheet, SheetSize::A4_PORTRAIT);
        assert!((p.height - 802.0).abs() < 1e-3);
        assert!((p.y - 20.0).abs() < 1e-3);
    }

    #[test]
    fn square_page_is_portrait() {
        let p = place_on_sheet(500.0, 500.0, &RenderConfig::default());
        assert_eq!(p.sheet, SheetSize::A4_PORTRAIT);
    }

    #[test]
    fn empty_document_is_a_valid_pdf() {
        let bytes = OutputDocument::new().to_pdf_bytes("empty").unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 0);
    }

    #[test]
    fn pages_keep_order_and_sheet_size() {
        let cfg = RenderConfig::default();
        let mut out = OutputDocument::new();
        out.push(encode_page(&rendered(200.0, 300.0), 30).unwrap(), &cfg);
        out.push(encode_page(&rendered(900.0, 300.0), 30).unwrap(), &cfg);
        let bytes = out.to_pdf_bytes("two").unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);
        assert_eq!(media_box(&doc, pages[&1]), vec![0.0, 0.0, 595.0, 842.0]);
        assert_eq!(media_box(&doc, pages[&2]), vec![0.0, 0.0, 1190.0, 842.0]);
    }

    #[test]
    fn jpeg_is_embedded_verbatim() {
        let cfg = RenderConfig::default();
        let encoded = encode_page(&rendered(100.0, 100.0), 30).unwrap();
        let PixelData::Jpeg { bytes: jpeg, gray: false } = encoded.pixels.clone() else {
            panic!("rendered pages encode as RGB JPEG");
        };
        assert!(jpeg.starts_with(&[0xFF, 0xD8]));
        let mut out = OutputDocument::new();
        out.push(encoded, &cfg);
        let doc = Document::load_mem(&out.to_pdf_bytes("img").unwrap()).unwrap();

        let embedded = doc
            .objects
            .values()
            .filter_map(|o| o.as_stream().ok())
            .find(|s| s.dict.get(b"Subtype").and_then(|v| v.as_name()).ok() == Some(b"Image".as_slice()))
            .unwrap();
        assert_eq!(embedded.content, jpeg);
        assert_eq!(embedded.dict.get(b"Width").unwrap().as_i64().unwrap(), 30);
    }

    #[test]
    fn natural_placement_fills_its_own_sheet() {
        let p = Placement::natural(640.0, 480.0);
        assert_eq!(p.sheet, SheetSize::new(640.0, 480.0));
        assert_eq!((p.x, p.y, p.width, p.height, p.scale), (0.0, 0.0, 640.0, 480.0, 1.0));
    }

    #[test]
    fn raw_rgb_is_flate_compressed() {
        let mut out = OutputDocument::new();
        out.push_placed(
            EncodedPage {
                pixels: PixelData::Rgb(vec![200; 4 * 2 * 3]),
                pixel_width: 4,
                pixel_height: 2,
                logical_width: 4.0,
                logical_height: 2.0,
            },
            Placement::natural(4.0, 2.0),
        );
        let doc = Document::load_mem(&out.to_pdf_bytes("raw").unwrap()).unwrap();
        let pages = doc.get_pages();
        assert_eq!(media_box(&doc, pages[&1]), vec![0.0, 0.0, 4.0, 2.0]);

        let embedded = doc
            .objects
            .values()
            .filter_map(|o| o.as_stream().ok())
            .find(|s| s.dict.get(b"Subtype").and_then(|v| v.as_name()).ok() == Some(b"Image".as_slice()))
            .unwrap();
        assert_eq!(embedded.dict.get(b"Filter").unwrap().as_name().unwrap(), b"FlateDecode");
        assert_eq!(embedded.decompressed_content().unwrap(), vec![200; 24]);
    }
}
