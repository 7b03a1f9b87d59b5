// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image to PDF — one page per image, each page exactly the image's size.
//
// Pixels map to points one to one. Eight-bit gray and RGB JPEGs are embedded
// as they are; everything else (PNG, CMYK or 12-bit JPEG) is decoded,
// flattened onto white and stored as raw RGB.

use image::{DynamicImage, ImageFormat, RgbImage};
use sheetwerk_core::error::{Result, SheetwerkError};
use tracing::{debug, info, instrument};

use crate::render::{EncodedPage, OutputDocument, PixelData, Placement};

/// Build a PDF with one page per image, in the order given.
#[instrument(skip_all, fields(images = images.len()))]
pub fn images_to_pdf(images: &[&[u8]]) -> Result<Vec<u8>> {
    if images.is_empty() {
        return Err(SheetwerkError::InvalidRequest("no images uploaded".into()));
    }

    let mut output = OutputDocument::new();
    for (index, bytes) in images.iter().enumerate() {
        let page = embed_image(bytes)
            .map_err(|err| SheetwerkError::ImageError(format!("image #{}: {err}", index + 1)))?;
        let placement = Placement::natural(page.logical_width, page.logical_height);
        output.push_placed(page, placement);
    }

    let pdf = output.to_pdf_bytes("Images")?;
    info!(pages = output.len(), "Images assembled");
    Ok(pdf)
}

/// Prepare one image for embedding at its natural size.
fn embed_image(bytes: &[u8]) -> Result<EncodedPage> {
    let format = image::guess_format(bytes)
        .map_err(|err| SheetwerkError::ImageError(format!("unknown image format: {err}")))?;
    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|err| SheetwerkError::ImageError(format!("failed to decode image: {err}")))?;
    let (width, height) = (decoded.width(), decoded.height());

    let passthrough = match (format, jpeg_frame(bytes)) {
        (ImageFormat::Jpeg, Some((8, 1))) => Some(true),
        (ImageFormat::Jpeg, Some((8, 3))) => Some(false),
        _ => None,
    };
    let pixels = match passthrough {
        Some(gray) => PixelData::Jpeg {
            bytes: bytes.to_vec(),
            gray,
        },
        None => PixelData::Rgb(flatten_on_white(&decoded).into_raw()),
    };
    debug!(?format, width, height, passthrough = passthrough.is_some(), "Image prepared");

    Ok(EncodedPage {
        pixels,
        pixel_width: width,
        pixel_height: height,
        logical_width: width as f32,
        logical_height: height as f32,
    })
}

/// Composite any transparency onto a white background.
fn flatten_on_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = u32::from(a);
        let over = |c: u8| ((u32::from(c) * a + 255 * (255 - a)) / 255) as u8;
        image::Rgb([over(r), over(g), over(b)])
    })
}

/// Sample precision and component count from a JPEG's start-of-frame header.
fn jpeg_frame(bytes: &[u8]) -> Option<(u8, u8)> {
    if !bytes.starts_with(&[0xFF, 0xD8]) {
        return None;
    }
    let mut i = 2;
    while i + 4 <= bytes.len() {
        if bytes[i] != 0xFF {
            return None;
        }
        let marker = bytes[i + 1];
        match marker {
            0xFF => {
                i += 1;
                continue;
            }
            0x01 | 0xD0..=0xD7 => {
                i += 2;
                continue;
            }
            _ => {}
        }
        // SOF0..SOF15, except DHT, JPG and DAC.
        if (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            return Some((*bytes.get(i + 4)?, *bytes.get(i + 9)?));
        }
        let length = u16::from_be_bytes([bytes[i + 2], bytes[i + 3]]) as usize;
        i += 2 + length;
    }
    None
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{GrayImage, Luma, Rgba, RgbaImage};
    use lopdf::Document;

    use super::*;

    fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, format).unwrap();
        bytes.into_inner()
    }

    fn media_boxes(pdf: &[u8]) -> Vec<Vec<f32>> {
        let doc = Document::load_mem(pdf).unwrap();
        doc.get_pages()
            .values()
            .map(|id| {
                doc.get_dictionary(*id)
                    .unwrap()
                    .get(b"MediaBox")
                    .unwrap()
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|o| o.as_float().unwrap())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn each_image_is_a_page_at_its_own_size() {
        let png = encode(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 30, image::Rgb([10, 20, 30]))),
            ImageFormat::Png,
        );
        let jpeg = encode(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 64, image::Rgb([200, 0, 0]))),
            ImageFormat::Jpeg,
        );
        let pdf = images_to_pdf(&[&png, &jpeg]).unwrap();
        assert_eq!(
            media_boxes(&pdf),
            vec![vec![0.0, 0.0, 40.0, 30.0], vec![0.0, 0.0, 16.0, 64.0]]
        );
    }

    #[test]
    fn rgb_jpeg_passes_through() {
        let jpeg = encode(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, image::Rgb([0, 90, 200]))),
            ImageFormat::Jpeg,
        );
        assert_eq!(jpeg_frame(&jpeg), Some((8, 3)));
        let page = embed_image(&jpeg).unwrap();
        assert_eq!(
            page.pixels,
            PixelData::Jpeg {
                bytes: jpeg,
                gray: false
            }
        );
    }

    #[test]
    fn gray_jpeg_keeps_one_component() {
        let jpeg = encode(
            DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([128]))),
            ImageFormat::Jpeg,
        );
        let page = embed_image(&jpeg).unwrap();
        assert!(matches!(page.pixels, PixelData::Jpeg { gray: true, .. }));
    }

    #[test]
    fn transparent_png_is_flattened_on_white() {
        let mut rgba = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 0, Rgba([255, 0, 0, 255]));
        let png = encode(DynamicImage::ImageRgba8(rgba), ImageFormat::Png);
        let page = embed_image(&png).unwrap();
        assert_eq!(page.pixels, PixelData::Rgb(vec![255, 255, 255, 255, 0, 0]));
    }

    #[test]
    fn no_images_is_a_rejection() {
        assert!(images_to_pdf(&[]).unwrap_err().is_rejection());
    }

    #[test]
    fn undecodable_image_names_its_position() {
        let png = encode(
            DynamicImage::ImageRgb8(RgbImage::new(2, 2)),
            ImageFormat::Png,
        );
        let truncated = &png[..png.len() / 2];
        let err = images_to_pdf(&[&png, truncated]).unwrap_err();
        assert!(matches!(&err, SheetwerkError::ImageError(msg) if msg.starts_with("image #2")));
    }

    #[test]
    fn jpeg_frame_ignores_non_jpeg() {
        assert_eq!(jpeg_frame(b"\x89PNG\r\n\x1a\n"), None);
        assert_eq!(jpeg_frame(&[0xFF, 0xD8, 0xFF]), None);
    }
}
