// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Multipart upload collection and form-field parsing.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::Multipart;
use sheetwerk_core::DocumentType;
use sheetwerk_core::error::{Result, SheetwerkError};
use tracing::debug;

use crate::error::ApiError;

/// Name of the multipart field carrying documents.
const FILE_FIELD: &str = "file";

/// Most page numbers a page list may expand to.
pub const MAX_PAGE_LIST: usize = 10_000;

/// Everything a client sent in one multipart body.
#[derive(Debug, Default)]
pub struct Upload {
    /// `file` parts, in the order they were sent.
    pub files: Vec<Bytes>,
    fields: HashMap<String, String>,
}

impl Upload {
    /// Drain a multipart body into memory.
    pub async fn read(mut multipart: Multipart) -> std::result::Result<Self, ApiError> {
        let mut upload = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            if name == FILE_FIELD {
                upload.files.push(field.bytes().await?);
            } else {
                let value = field.text().await?;
                upload.fields.insert(name, value);
            }
        }
        debug!(
            files = upload.files.len(),
            fields = upload.fields.len(),
            "Upload received"
        );
        Ok(upload)
    }

    /// The text of a non-file field, trimmed. Blank counts as absent.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// The one uploaded document, which must be of type `expected`.
    pub fn single_file(&self, expected: DocumentType) -> Result<Bytes> {
        match self.files.as_slice() {
            [] => Err(SheetwerkError::InvalidRequest(format!(
                "no `{FILE_FIELD}` field in the upload"
            ))),
            [file] => {
                require_type(file, |found| found == expected)?;
                Ok(file.clone())
            }
            files => Err(SheetwerkError::InvalidRequest(format!(
                "expected one file, got {}",
                files.len()
            ))),
        }
    }

    /// All uploaded documents, each of type `expected`.
    pub fn all_files(&self, expected: DocumentType) -> Result<&[Bytes]> {
        self.all_matching(|found| found == expected)
    }

    /// All uploaded documents, each a PNG or JPEG image.
    pub fn all_images(&self) -> Result<&[Bytes]> {
        self.all_matching(|found| found.is_image())
    }

    fn all_matching(&self, accept: impl Fn(DocumentType) -> bool) -> Result<&[Bytes]> {
        if self.files.is_empty() {
            return Err(SheetwerkError::InvalidRequest(format!(
                "no `{FILE_FIELD}` field in the upload"
            )));
        }
        for file in &self.files {
            require_type(file, &accept)?;
        }
        Ok(&self.files)
    }
}

fn require_type(bytes: &[u8], accept: impl Fn(DocumentType) -> bool) -> Result<()> {
    match DocumentType::sniff(bytes) {
        Some(found) if accept(found) => Ok(()),
        Some(found) => Err(SheetwerkError::UnsupportedDocument(found.mime_type().into())),
        None if bytes.is_empty() => Err(SheetwerkError::InvalidRequest("the uploaded file is empty".into())),
        None => Err(SheetwerkError::UnsupportedDocument("unrecognised content".into())),
    }
}

/// Parse a 1-based page list such as `"1,3"` or `"2-4, 7"`.
///
/// A missing or blank list yields an empty vector. Order and repeats are
/// kept, so the same syntax serves both page selection and reordering.
/// A list expanding to more than [`MAX_PAGE_LIST`] pages is rejected before
/// any range is materialised.
pub fn parse_page_list(list: Option<&str>) -> Result<Vec<u32>> {
    let Some(list) = list else {
        return Ok(Vec::new());
    };
    let invalid = |part: &str| SheetwerkError::InvalidRequest(format!("invalid page number: {part:?}"));
    let page = |part: &str| -> Result<u32> {
        match part.trim().parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(invalid(part)),
        }
    };

    let too_long = || {
        SheetwerkError::InvalidRequest(format!(
            "page list expands to more than {MAX_PAGE_LIST} pages"
        ))
    };

    let mut pages = Vec::new();
    for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (from, to) = match part.split_once('-') {
            Some((from, to)) => (page(from)?, page(to)?),
            None => {
                let n = page(part)?;
                (n, n)
            }
        };
        if from > to {
            return Err(invalid(part));
        }
        let span = (to - from) as usize + 1;
        if span > MAX_PAGE_LIST - pages.len() {
            return Err(too_long());
        }
        pages.extend(from..=to);
    }
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_lists_keep_order_and_expand_ranges() {
        assert_eq!(parse_page_list(None).unwrap(), Vec::<u32>::new());
        assert_eq!(parse_page_list(Some("3,1,2")).unwrap(), vec![3, 1, 2]);
        assert_eq!(parse_page_list(Some(" 2-4 , 7,")).unwrap(), vec![2, 3, 4, 7]);
        assert_eq!(parse_page_list(Some("1,1")).unwrap(), vec![1, 1]);
    }

    #[test]
    fn bad_page_numbers_are_rejected() {
        for bad in ["0", "x", "-1", "4-2", "1.5"] {
            let err = parse_page_list(Some(bad)).unwrap_err();
            assert!(err.is_rejection(), "{bad}");
        }
    }

    #[test]
    fn huge_ranges_are_rejected() {
        for huge in ["1-30000000", "1-4000000000", "2-10001"] {
            let err = parse_page_list(Some(huge)).unwrap_err();
            assert!(err.is_rejection(), "{huge}");
        }
        assert_eq!(parse_page_list(Some("1-10000")).unwrap().len(), MAX_PAGE_LIST);
    }

    #[test]
    fn many_small_ranges_share_one_limit() {
        let list = vec!["1-5000"; 2].join(",");
        assert_eq!(parse_page_list(Some(&list)).unwrap().len(), MAX_PAGE_LIST);

        let list = vec!["1-5000"; 3].join(",");
        assert!(parse_page_list(Some(&list)).unwrap_err().is_rejection());

        let singles = vec!["1"; MAX_PAGE_LIST + 1].join(",");
        assert!(parse_page_list(Some(&singles)).unwrap_err().is_rejection());
    }

    #[test]
    fn single_file_checks_count_and_type() {
        let pdf = Bytes::from_static(b"%PDF-1.7 ...");
        let xlsx = Bytes::from_static(b"PK\x03\x04...");

        let none = Upload::default();
        assert!(none.single_file(DocumentType::Pdf).unwrap_err().is_rejection());

        let one = Upload {
            files: vec![xlsx.clone()],
            ..Default::default()
        };
        assert_eq!(one.single_file(DocumentType::Xlsx).unwrap(), xlsx);
        assert!(matches!(
            one.single_file(DocumentType::Pdf),
            Err(SheetwerkError::UnsupportedDocument(_))
        ));

        let two = Upload {
            files: vec![pdf.clone(), pdf],
            ..Default::default()
        };
        assert!(two.single_file(DocumentType::Pdf).is_err());
        assert_eq!(two.all_files(DocumentType::Pdf).unwrap().len(), 2);
    }

    #[test]
    fn image_uploads_mix_png_and_jpeg() {
        let png = Bytes::from_static(b"\x89PNG\r\n\x1a\n....");
        let jpeg = Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xE0]);
        let pdf = Bytes::from_static(b"%PDF-1.7 ...");

        let images = Upload {
            files: vec![png.clone(), jpeg.clone()],
            ..Default::default()
        };
        assert_eq!(images.all_images().unwrap().len(), 2);

        let mixed = Upload {
            files: vec![png, pdf],
            ..Default::default()
        };
        assert!(matches!(
            mixed.all_images(),
            Err(SheetwerkError::UnsupportedDocument(_))
        ));
        assert!(Upload::default().all_images().unwrap_err().is_rejection());
    }

    #[test]
    fn blank_fields_count_as_absent() {
        let mut upload = Upload::default();
        upload.fields.insert("angle".into(), " 180 ".into());
        upload.fields.insert("pages".into(), "   ".into());
        assert_eq!(upload.field("angle"), Some("180"));
        assert_eq!(upload.field("pages"), None);
        assert_eq!(upload.field("order"), None);
    }
}
